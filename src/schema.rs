//! Read queries over the three logical table families: fact tables (one row
//! per area x variable x source table), column metadata and table metadata.
//!
//! The original data pipeline published these as Parquet and queried them
//! with string-built SQL. Here every lookup is a projection over in-memory
//! frames with values carried out-of-band, so there is no identifier
//! escaping to get wrong. Trimming before comparison is preserved because
//! the published tables carry stray whitespace in their key columns.
//!
//! A miss is never an error at this layer: an absent table, column or row
//! degrades to an empty result or an identity fallback.

use chrono::NaiveDate;
use color_eyre::Result;
use polars::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::cli::{AdminLevel, Language};
use crate::store::{DataStore, COLUMNS_METADATA, TABLES_METADATA};

/// A resolver result that distinguishes "genuinely resolved" from
/// "defaulted", without ever being an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub fallback: bool,
}

impl<T> Resolved<T> {
    pub fn exact(value: T) -> Self {
        Self {
            value,
            fallback: false,
        }
    }

    pub fn defaulted(value: T) -> Self {
        Self {
            value,
            fallback: true,
        }
    }
}

/// A metadata cell, decoded from whatever type the Parquet column carried
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    Str(String),
    Num(f64),
    Date(NaiveDate),
    Bool(bool),
    Null,
}

impl MetaValue {
    fn from_any(value: &AnyValue) -> Self {
        match value {
            AnyValue::Null => Self::Null,
            AnyValue::String(s) => Self::Str((*s).to_string()),
            AnyValue::StringOwned(s) => Self::Str(s.to_string()),
            AnyValue::Boolean(b) => Self::Bool(*b),
            AnyValue::Date(days) => match date_from_days(*days) {
                Some(d) => Self::Date(d),
                None => Self::Null,
            },
            AnyValue::Datetime(v, unit, _) => match date_from_timestamp_ms(to_ms(*v, *unit)) {
                Some(d) => Self::Date(d),
                None => Self::Null,
            },
            AnyValue::DatetimeOwned(v, unit, _) => match date_from_timestamp_ms(to_ms(*v, *unit)) {
                Some(d) => Self::Date(d),
                None => Self::Null,
            },
            other => match coerce_numeric(other) {
                Some(n) => Self::Num(n),
                None => Self::Str(format!("{}", other)),
            },
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(s) => write!(f, "{}", s),
            Self::Num(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Self::Date(d) => write!(f, "{}", d),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Null => Ok(()),
        }
    }
}

/// A single metadata row as a free-form key/value record
pub type MetaRecord = BTreeMap<String, MetaValue>;

/// A raw `date` cell from table metadata, before parsing.
///
/// The published tables are inconsistent here: some carry a proper DATE
/// column, some epoch timestamps, some `DD.MM.YYYY` text.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDate {
    Date(NaiveDate),
    /// Epoch milliseconds
    Timestamp(i64),
    Number(f64),
    Text(String),
}

impl RawDate {
    fn from_any(value: &AnyValue) -> Option<Self> {
        match value {
            AnyValue::Null => None,
            AnyValue::Date(days) => date_from_days(*days).map(Self::Date),
            AnyValue::Datetime(v, unit, _) => Some(Self::Timestamp(to_ms(*v, *unit))),
            AnyValue::DatetimeOwned(v, unit, _) => Some(Self::Timestamp(to_ms(*v, *unit))),
            AnyValue::String(s) => {
                let s = s.trim();
                (!s.is_empty()).then(|| Self::Text(s.to_string()))
            }
            AnyValue::StringOwned(s) => {
                let s = s.as_str().trim();
                (!s.is_empty()).then(|| Self::Text(s.to_string()))
            }
            other => coerce_numeric(other).map(Self::Number),
        }
    }
}

impl fmt::Display for RawDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Date(d) => write!(f, "{}", d),
            Self::Timestamp(ms) => write!(f, "{}", ms),
            Self::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{}", n)
                }
            }
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// Distinct, trimmed, non-empty localized category paths of variables whose
/// owning source table matches `level`, sorted lexicographically ascending.
///
/// The sort order is load-bearing: it becomes the tree builder's child order.
pub fn distinct_category_paths(
    store: &DataStore,
    language: Language,
    level: AdminLevel,
) -> Result<Vec<String>> {
    let (Some(columns), Some(tables)) =
        (store.frame(COLUMNS_METADATA), store.frame(TABLES_METADATA))
    else {
        return Ok(Vec::new());
    };

    // Source tables at the requested administrative level
    let mut level_ids: BTreeSet<String> = BTreeSet::new();
    if let (Ok(ids), Ok(levels)) = (tables.column("data_table_id"), tables.column("adm_level")) {
        for i in 0..tables.height() {
            let matches_level = str_cell(levels, i)
                .map(|v| v.trim() == level.as_str())
                .unwrap_or(false);
            if matches_level {
                if let Some(id) = str_cell(ids, i) {
                    level_ids.insert(id.trim().to_string());
                }
            }
        }
    }

    let (Ok(paths), Ok(owners)) = (
        columns.column(language.category_column()),
        columns.column("data_table_id"),
    ) else {
        return Ok(Vec::new());
    };

    let mut distinct: BTreeSet<String> = BTreeSet::new();
    for i in 0..columns.height() {
        let Some(path) = str_cell(paths, i) else {
            continue;
        };
        let path = path.trim();
        if path.is_empty() {
            continue;
        }
        let owned_by_level = str_cell(owners, i)
            .map(|id| level_ids.contains(id.trim()))
            .unwrap_or(false);
        if owned_by_level {
            distinct.insert(path.to_string());
        }
    }

    Ok(distinct.into_iter().collect())
}

/// Map a localized category path to its canonical English path.
///
/// English input is already canonical; a Polish path that matches no
/// metadata row falls back to the input unchanged - better an unresolved
/// label than a dropped dataset.
pub fn canonical_path_for_localized_leaf(
    store: &DataStore,
    localized_path: &str,
    language: Language,
) -> Result<Resolved<String>> {
    let input = localized_path.trim().to_string();
    if language == Language::En {
        return Ok(Resolved::exact(input));
    }

    let Some(columns) = store.frame(COLUMNS_METADATA) else {
        return Ok(Resolved::defaulted(input));
    };
    let (Ok(localized), Ok(english)) = (
        columns.column(Language::Pl.category_column()),
        columns.column(Language::En.category_column()),
    ) else {
        return Ok(Resolved::defaulted(input));
    };

    for i in 0..columns.height() {
        let hit = str_cell(localized, i)
            .map(|v| v.trim() == input)
            .unwrap_or(false);
        if hit {
            if let Some(eng) = str_cell(english, i) {
                return Ok(Resolved::exact(eng.trim().to_string()));
            }
        }
    }

    Ok(Resolved::defaulted(input))
}

/// Every (source table, value column) pair measuring the canonical path.
///
/// When a table carries several columns for the same category, the
/// lexicographically first column name wins and later ones are dropped.
pub fn variants_for_canonical_path(
    store: &DataStore,
    canonical_path: &str,
) -> Result<BTreeMap<String, String>> {
    let canonical = canonical_path.trim();
    let Some(columns) = store.frame(COLUMNS_METADATA) else {
        return Ok(BTreeMap::new());
    };
    let (Ok(english), Ok(tables), Ok(names)) = (
        columns.column(Language::En.category_column()),
        columns.column("data_table_id"),
        columns.column("column_name"),
    ) else {
        return Ok(BTreeMap::new());
    };

    let mut pairs: Vec<(String, String)> = Vec::new();
    for i in 0..columns.height() {
        let hit = str_cell(english, i)
            .map(|v| v.trim() == canonical)
            .unwrap_or(false);
        if !hit {
            continue;
        }
        let (Some(table_id), Some(column)) = (str_cell(tables, i), str_cell(names, i)) else {
            continue;
        };
        let (table_id, column) = (table_id.trim(), column.trim());
        if table_id.is_empty() || column.is_empty() {
            continue;
        }
        pairs.push((table_id.to_string(), column.to_string()));
    }

    // First (table, column) in lexicographic order wins per table
    pairs.sort();
    let mut mapping = BTreeMap::new();
    for (table_id, column) in pairs {
        mapping.entry(table_id).or_insert(column);
    }
    Ok(mapping)
}

/// Per-area values for one (value column, source table) pair at a level.
///
/// Area names are trimmed; stored values that are not numeric (including
/// nulls) become `None`, never zero, and the row is kept so a consumer can
/// render an explicit "no data" state.
pub fn area_values(
    store: &DataStore,
    value_column: &str,
    table_id: &str,
    level: AdminLevel,
) -> Result<Vec<(String, Option<f64>)>> {
    fetch_fact_rows(store, value_column, table_id, level, false)
}

/// Like [`area_values`], but when the exact variable-name match returns no
/// rows, retries matching by string suffix. The legacy pipeline used this
/// against tables storing full paths in `variable_name`; it can mismatch
/// when two categories share a suffix, so it is opt-in.
pub fn area_values_with_suffix_fallback(
    store: &DataStore,
    value_column: &str,
    table_id: &str,
    level: AdminLevel,
) -> Result<Vec<(String, Option<f64>)>> {
    let exact = fetch_fact_rows(store, value_column, table_id, level, false)?;
    if !exact.is_empty() {
        return Ok(exact);
    }
    fetch_fact_rows(store, value_column, table_id, level, true)
}

fn fetch_fact_rows(
    store: &DataStore,
    value_column: &str,
    table_id: &str,
    level: AdminLevel,
    suffix_match: bool,
) -> Result<Vec<(String, Option<f64>)>> {
    let Some(facts) = store.frame(level.fact_table()) else {
        return Ok(Vec::new());
    };
    let (Ok(areas), Ok(variables), Ok(owners)) = (
        facts.column(level.area_column()),
        facts.column("variable_name"),
        facts.column("data_table_id"),
    ) else {
        return Ok(Vec::new());
    };
    let Some(value_col) = fact_value_column(facts, level) else {
        return Ok(Vec::new());
    };
    let Ok(values) = facts.column(&value_col) else {
        return Ok(Vec::new());
    };

    let wanted_variable = value_column.trim();
    let wanted_table = table_id.trim();

    let mut rows = Vec::new();
    for i in 0..facts.height() {
        let variable_hit = str_cell(variables, i)
            .map(|v| {
                let v = v.trim();
                if suffix_match {
                    v.ends_with(wanted_variable)
                } else {
                    v == wanted_variable
                }
            })
            .unwrap_or(false);
        if !variable_hit {
            continue;
        }
        let table_hit = str_cell(owners, i)
            .map(|v| v.trim() == wanted_table)
            .unwrap_or(false);
        if !table_hit {
            continue;
        }
        let Some(area) = str_cell(areas, i) else {
            continue;
        };
        let value = values.get(i).ok().as_ref().and_then(coerce_numeric);
        rows.push((area.trim().to_string(), value));
    }
    Ok(rows)
}

/// Discover the numeric value column of a fact table: a column literally
/// named "value" wins, otherwise the first numeric column that is not an
/// identifier or label.
fn fact_value_column(facts: &DataFrame, level: AdminLevel) -> Option<String> {
    for column in facts.get_columns() {
        if column.name().to_lowercase() == "value" {
            return Some(column.name().to_string());
        }
    }
    for column in facts.get_columns() {
        let name = column.name().as_str();
        if name.eq_ignore_ascii_case(level.area_column())
            || name == "variable_name"
            || name == "data_table_id"
        {
            continue;
        }
        if is_numeric_dtype(column.dtype()) {
            return Some(name.to_string());
        }
    }
    None
}

/// Single-row lookup of table metadata; empty record on miss
pub fn table_metadata(store: &DataStore, table_id: &str) -> Result<MetaRecord> {
    let Some(tables) = store.frame(TABLES_METADATA) else {
        return Ok(MetaRecord::new());
    };
    let Ok(ids) = tables.column("data_table_id") else {
        return Ok(MetaRecord::new());
    };

    let wanted = table_id.trim();
    for i in 0..tables.height() {
        let hit = str_cell(ids, i).map(|v| v.trim() == wanted).unwrap_or(false);
        if hit {
            return Ok(record_at(tables, i));
        }
    }
    Ok(MetaRecord::new())
}

/// Single-row lookup of column metadata; empty record on miss
pub fn column_metadata(store: &DataStore, value_column: &str, table_id: &str) -> Result<MetaRecord> {
    let Some(columns) = store.frame(COLUMNS_METADATA) else {
        return Ok(MetaRecord::new());
    };
    let (Ok(names), Ok(ids)) = (columns.column("column_name"), columns.column("data_table_id"))
    else {
        return Ok(MetaRecord::new());
    };

    let (wanted_column, wanted_table) = (value_column.trim(), table_id.trim());
    for i in 0..columns.height() {
        let column_hit = str_cell(names, i)
            .map(|v| v.trim() == wanted_column)
            .unwrap_or(false);
        let table_hit = str_cell(ids, i)
            .map(|v| v.trim() == wanted_table)
            .unwrap_or(false);
        if column_hit && table_hit {
            return Ok(record_at(columns, i));
        }
    }
    Ok(MetaRecord::new())
}

/// Batch lookup of raw `date` values for the given source tables.
/// Tables with a null/absent date simply have no entry.
pub fn dates_for_source_tables(
    store: &DataStore,
    table_ids: &[String],
) -> Result<BTreeMap<String, RawDate>> {
    let mut dates = BTreeMap::new();
    if table_ids.is_empty() {
        return Ok(dates);
    }
    let Some(tables) = store.frame(TABLES_METADATA) else {
        return Ok(dates);
    };
    let (Ok(ids), Ok(raw_dates)) = (tables.column("data_table_id"), tables.column("date")) else {
        return Ok(dates);
    };

    let wanted: BTreeSet<&str> = table_ids.iter().map(|s| s.trim()).collect();
    for i in 0..tables.height() {
        let Some(id) = str_cell(ids, i) else {
            continue;
        };
        let id = id.trim();
        if !wanted.contains(id) {
            continue;
        }
        if let Ok(value) = raw_dates.get(i) {
            if let Some(raw) = RawDate::from_any(&value) {
                dates.entry(id.to_string()).or_insert(raw);
            }
        }
    }
    Ok(dates)
}

fn record_at(df: &DataFrame, row: usize) -> MetaRecord {
    let mut record = MetaRecord::new();
    for column in df.get_columns() {
        if let Ok(value) = column.get(row) {
            record.insert(column.name().to_string(), MetaValue::from_any(&value));
        }
    }
    record
}

fn str_cell(column: &Column, row: usize) -> Option<String> {
    match column.get(row) {
        Ok(AnyValue::String(s)) => Some(s.to_string()),
        Ok(AnyValue::StringOwned(s)) => Some(s.to_string()),
        _ => None,
    }
}

fn coerce_numeric(value: &AnyValue) -> Option<f64> {
    match value {
        AnyValue::Float64(v) => Some(*v),
        AnyValue::Float32(v) => Some(*v as f64),
        AnyValue::Int8(v) => Some(*v as f64),
        AnyValue::Int16(v) => Some(*v as f64),
        AnyValue::Int32(v) => Some(*v as f64),
        AnyValue::Int64(v) => Some(*v as f64),
        AnyValue::UInt8(v) => Some(*v as f64),
        AnyValue::UInt16(v) => Some(*v as f64),
        AnyValue::UInt32(v) => Some(*v as f64),
        AnyValue::UInt64(v) => Some(*v as f64),
        AnyValue::String(s) => s.trim().parse().ok(),
        AnyValue::StringOwned(s) => s.as_str().trim().parse().ok(),
        _ => None,
    }
}

fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::Float32
            | DataType::Float64
    )
}

pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp(i64::from(days) * 86_400, 0).map(|dt| dt.date_naive())
}

pub(crate) fn date_from_timestamp_ms(ms: i64) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

fn to_ms(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Milliseconds => value,
        TimeUnit::Microseconds => value / 1_000,
        TimeUnit::Nanoseconds => value / 1_000_000,
    }
}
