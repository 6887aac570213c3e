//! CSV export: pivoting every variant of a dataset into one wide table,
//! standard CSV quoting, and filename sanitization.

use color_eyre::Result;
use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use crate::areas::{fetch_area_values, AreaValue};
use crate::cli::{AdminLevel, Language};
use crate::store::DataStore;
use crate::variant::resolve_variants;

/// Row-per-area, column-per-variant pivot of one dataset
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    /// Canonical category path of the dataset
    pub dataset: String,
    /// Variant labels, in variant (date-ascending) order
    pub columns: Vec<String>,
    /// Rows sorted by area name ascending
    pub rows: Vec<WideRow>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WideRow {
    pub area: String,
    /// One cell per variant column; `None` = no measurement, not zero
    pub cells: Vec<Option<f64>>,
}

/// Fetch every variant of `canonical_path` and pivot into a wide table
/// keyed by area name. The row set is the union of area names across all
/// variants; an area missing from one variant's result gets an absent cell,
/// not an omitted row.
pub fn export_all_variants(
    store: &DataStore,
    canonical_path: &str,
    level: AdminLevel,
    language: Language,
) -> Result<WideTable> {
    let variants = resolve_variants(store, canonical_path, language)?;

    let mut cells_by_area: BTreeMap<String, Vec<Option<f64>>> = BTreeMap::new();
    for (index, variant) in variants.iter().enumerate() {
        let values = fetch_area_values(store, &variant.value_column, &variant.table_id, level)?;
        for area_value in values {
            let cells = cells_by_area
                .entry(area_value.area_name)
                .or_insert_with(|| vec![None; variants.len()]);
            cells[index] = area_value.value;
        }
    }

    Ok(WideTable {
        dataset: canonical_path.trim().to_string(),
        columns: variants.into_iter().map(|v| v.label).collect(),
        rows: cells_by_area
            .into_iter()
            .map(|(area, cells)| WideRow { area, cells })
            .collect(),
    })
}

/// Quote a field per standard CSV rules: wrap in quotes and double internal
/// quotes when the field contains a comma, quote or line break.
pub fn csv_field(field: &str) -> Cow<'_, str> {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

fn fmt_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn push_row(out: &mut String, fields: &[&str]) {
    let mut first = true;
    for field in fields {
        if !first {
            out.push(',');
        }
        out.push_str(&csv_field(field));
        first = false;
    }
    out.push('\n');
}

/// Serialize a wide table; absent cells render as empty fields,
/// distinguishing "no measurement" from zero.
pub fn wide_table_to_csv(table: &WideTable) -> String {
    let mut out = String::new();
    let mut header: Vec<&str> = vec!["Area"];
    header.extend(table.columns.iter().map(|c| c.as_str()));
    push_row(&mut out, &header);

    for row in &table.rows {
        let cells: Vec<String> = row
            .cells
            .iter()
            .map(|c| c.map(fmt_value).unwrap_or_default())
            .collect();
        let mut fields: Vec<&str> = vec![row.area.as_str()];
        fields.extend(cells.iter().map(|c| c.as_str()));
        push_row(&mut out, &fields);
    }
    out
}

/// Serialize one variant's values, sorted by area name for determinism
pub fn area_values_to_csv(values: &[AreaValue], label: &str) -> String {
    let mut sorted: Vec<&AreaValue> = values.iter().collect();
    sorted.sort_by(|a, b| a.area_name.cmp(&b.area_name));

    let mut out = String::new();
    push_row(&mut out, &["Area", label]);
    for value in sorted {
        let cell = value.value.map(fmt_value).unwrap_or_default();
        push_row(&mut out, &[value.area_name.as_str(), cell.as_str()]);
    }
    out
}

/// Derive an export file name (without extension) from the dataset path and
/// variant label: anything outside `[A-Za-z0-9_\- ]` becomes `_`, whitespace
/// runs collapse to one `_`, truncated to 120 characters.
pub fn export_file_name(dataset_path: &str, variant_label: &str) -> String {
    static ILLEGAL: OnceLock<Regex> = OnceLock::new();
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let illegal = ILLEGAL.get_or_init(|| Regex::new(r"[^A-Za-z0-9_\- ]").expect("static regex"));
    let whitespace = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("static regex"));

    let raw = format!("{} {}", dataset_path.trim(), variant_label.trim());
    let cleaned = illegal.replace_all(&raw, "_");
    let collapsed = whitespace.replace_all(&cleaned, "_");
    collapsed.chars().take(120).collect()
}

/// Trivial I/O wrapper so callers stay path-based
pub fn write_csv(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents)?;
    Ok(())
}
