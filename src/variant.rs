//! Variant resolution: for a canonical category path, find every source
//! table measuring it, attach a parsed collection date and a display label,
//! and order the list date-ascending with undated variants last.

use chrono::{Datelike, NaiveDate};
use color_eyre::Result;
use std::cmp::Ordering;

use crate::cli::Language;
use crate::schema::{self, RawDate};
use crate::store::DataStore;

/// One source table providing a measurement for a dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    pub table_id: String,
    /// Fact-table `variable_name` holding the measured value
    pub value_column: String,
    pub date: Option<NaiveDate>,
    pub label: String,
}

const MONTHS_EN: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

// Genitive forms, as used in Polish dates
const MONTHS_PL: [&str; 12] = [
    "stycznia",
    "lutego",
    "marca",
    "kwietnia",
    "maja",
    "czerwca",
    "lipca",
    "sierpnia",
    "września",
    "października",
    "listopada",
    "grudnia",
];

/// Long date form: "1 January 1921" / "1 stycznia 1921"
pub fn format_long_date(date: NaiveDate, language: Language) -> String {
    let month = date.month0() as usize;
    let name = match language {
        Language::En => MONTHS_EN[month],
        Language::Pl => MONTHS_PL[month],
    };
    format!("{} {} {}", date.day(), name, date.year())
}

/// Parse a stored date cell into a calendar date; `None` rather than an
/// error for anything unparseable.
pub fn parse_raw_date(raw: &RawDate) -> Option<NaiveDate> {
    match raw {
        RawDate::Date(date) => Some(*date),
        RawDate::Timestamp(ms) => schema::date_from_timestamp_ms(*ms),
        RawDate::Number(n) => {
            if n.is_finite() {
                schema::date_from_timestamp_ms(*n as i64)
            } else {
                None
            }
        }
        RawDate::Text(text) => parse_date_text(text),
    }
}

fn parse_date_text(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    // Numeric strings are epoch milliseconds (negative for pre-1970)
    if let Ok(ms) = text.parse::<i64>() {
        return schema::date_from_timestamp_ms(ms);
    }
    if let Ok(ms) = text.parse::<f64>() {
        if ms.is_finite() {
            return schema::date_from_timestamp_ms(ms as i64);
        }
    }
    // The published metadata writes dates as DD.MM.YYYY
    if let Ok(date) = NaiveDate::parse_from_str(text, "%d.%m.%Y") {
        return Some(date);
    }
    // Best effort beyond that
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    None
}

/// Resolve all variants of a canonical category path, ordered by parsed
/// date ascending with undated variants after all dated ones; ties break by
/// label, then table id. The first entry is the caller's default selection.
pub fn resolve_variants(
    store: &DataStore,
    canonical_path: &str,
    language: Language,
) -> Result<Vec<Variant>> {
    let mapping = schema::variants_for_canonical_path(store, canonical_path)?;
    let table_ids: Vec<String> = mapping.keys().cloned().collect();
    let raw_dates = schema::dates_for_source_tables(store, &table_ids)?;

    let mut variants: Vec<Variant> = mapping
        .into_iter()
        .map(|(table_id, value_column)| {
            let raw = raw_dates.get(&table_id);
            let date = raw.and_then(parse_raw_date);
            let label = match (date, raw) {
                (Some(date), _) => format_long_date(date, language),
                (None, Some(raw)) => raw.to_string(),
                (None, None) => table_id.clone(),
            };
            Variant {
                table_id,
                value_column,
                date,
                label,
            }
        })
        .collect();

    variants.sort_by(compare_variants);
    Ok(variants)
}

fn compare_variants(a: &Variant, b: &Variant) -> Ordering {
    let by_date = match (a.date, b.date) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_date
        .then_with(|| a.label.cmp(&b.label))
        .then_with(|| a.table_id.cmp(&b.table_id))
}
