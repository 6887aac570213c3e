//! Display projections over the free-form metadata records: provenance
//! source lists, bilingual descriptions and completeness statistics.
//!
//! The metadata tables store list-valued provenance fields as Python-style
//! list text (`['a', 'b']`), so list parsing accepts single- or
//! double-quoted bracketed text and falls back to a top-level comma split.

use crate::cli::Language;
use crate::schema::{MetaRecord, MetaValue};
use crate::variant::{format_long_date, parse_raw_date};

/// One provenance entry: "Source, p. 12 (30 in PDF)" plus a link
#[derive(Debug, Clone, PartialEq)]
pub struct SourceItem {
    pub label: String,
    pub href: String,
}

/// Parse a possibly list-valued metadata cell into its items
pub fn parse_list_field(value: &MetaValue) -> Vec<String> {
    if value.is_null() {
        return Vec::new();
    }
    let text = value.to_string();
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.starts_with('[') && text.ends_with(']') {
        let jsonish = text.replace('\'', "\"");
        if let Ok(serde_json::Value::Array(items)) = serde_json::from_str::<serde_json::Value>(&jsonish)
        {
            return items
                .iter()
                .map(|item| match item {
                    serde_json::Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                })
                .collect();
        }
        // Not valid JSON even after quote swapping: split on top-level commas
        return text[1..text.len() - 1]
            .split(',')
            .map(|part| {
                part.trim()
                    .trim_matches(|c| c == '"' || c == '\'')
                    .to_string()
            })
            .filter(|part| !part.is_empty())
            .collect();
    }
    vec![text.to_string()]
}

fn list_field(meta: &MetaRecord, singular: &str, plural: &str) -> Vec<String> {
    meta.get(singular)
        .or_else(|| meta.get(plural))
        .map(parse_list_field)
        .unwrap_or_default()
}

/// Zip the parallel provenance lists (source / table / page / pdf page /
/// link) into labeled entries; blank sources are skipped.
pub fn source_items(meta: &MetaRecord) -> Vec<SourceItem> {
    let sources = list_field(meta, "source", "sources");
    let pages = list_field(meta, "page", "pages");
    let pdf_pages = list_field(meta, "pdf_page", "pdf_pages");
    let links = list_field(meta, "links", "link");
    let tables = list_field(meta, "table", "tables");

    let mut items = Vec::new();
    for (i, source) in sources.iter().enumerate() {
        let source = source.trim();
        if source.is_empty() {
            continue;
        }
        let mut label = source.to_string();
        if let Some(table) = tables.get(i).map(|t| t.trim()).filter(|t| !t.is_empty()) {
            label.push_str(&format!(", table {}", table));
        }
        let page = pages.get(i).map(|p| p.trim()).unwrap_or("");
        let pdf = pdf_pages.get(i).map(|p| p.trim()).unwrap_or("");
        match (page.is_empty(), pdf.is_empty()) {
            (false, false) => label.push_str(&format!(", p. {} ({} in PDF)", page, pdf)),
            (false, true) => label.push_str(&format!(", p. {}", page)),
            (true, false) => label.push_str(&format!(" ({} in PDF)", pdf)),
            (true, true) => {}
        }
        let href = links
            .get(i)
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .unwrap_or("#")
            .to_string();
        items.push(SourceItem { label, href });
    }
    items
}

/// Format a stored date-ish metadata value for display. Numbers use the
/// magnitude heuristic the original viewer used: below 1e12 they are epoch
/// seconds, above that epoch milliseconds.
pub fn format_date_value(value: &MetaValue, language: Language) -> Option<String> {
    match value {
        MetaValue::Date(date) => Some(format_long_date(*date, language)),
        MetaValue::Num(n) => {
            let ms = if n.abs() < 1e12 { n * 1000.0 } else { *n };
            let raw = crate::schema::RawDate::Number(ms);
            match parse_raw_date(&raw) {
                Some(date) => Some(format_long_date(date, language)),
                None => Some(value.to_string()),
            }
        }
        MetaValue::Str(s) => {
            let trimmed = s.trim();
            // Numeric strings take the same seconds/milliseconds heuristic
            if let Ok(n) = trimmed.parse::<f64>() {
                return format_date_value(&MetaValue::Num(n), language);
            }
            let raw = crate::schema::RawDate::Text(trimmed.to_string());
            match parse_raw_date(&raw) {
                Some(date) => Some(format_long_date(date, language)),
                None => Some(trimmed.to_string()).filter(|s| !s.is_empty()),
            }
        }
        MetaValue::Null | MetaValue::Bool(_) => None,
    }
}

fn non_empty_str(meta: &MetaRecord, key: &str) -> Option<String> {
    meta.get(key)
        .and_then(MetaValue::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Well-known table-metadata fields for the info panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableInfo {
    pub description: Option<String>,
    pub date: Option<String>,
    pub admin_state_date: Option<String>,
    pub standardization: Option<String>,
    pub imputation: Option<String>,
    pub sources: Vec<SourceItem>,
}

impl TableInfo {
    pub fn from_record(meta: &MetaRecord, language: Language) -> Self {
        let description = match language {
            Language::Pl => non_empty_str(meta, "description_pol"),
            Language::En => non_empty_str(meta, "description_eng"),
        };
        let date = meta
            .get("date")
            .and_then(|v| format_date_value(v, language));
        let admin_state_date = meta
            .get("adm_state_date")
            .or_else(|| meta.get("orig_adm_state_date"))
            .and_then(|v| format_date_value(v, language));
        Self {
            description,
            date,
            admin_state_date,
            standardization: non_empty_str(meta, "standardization_comments"),
            imputation: non_empty_str(meta, "imputation_method"),
            sources: source_items(meta),
        }
    }
}

/// Well-known column-metadata fields for the info panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnInfo {
    /// Localized category path of the measured variable
    pub name: Option<String>,
    pub unit: Option<String>,
    /// Percent, rounded to two decimals
    pub completeness_pct: Option<f64>,
    /// "present/total" before imputation
    pub count_present: Option<String>,
    pub count_missing: Option<String>,
    pub completeness_after_pct: Option<f64>,
    pub count_present_after: Option<String>,
    pub count_missing_after: Option<String>,
}

fn pct(meta: &MetaRecord, key: &str) -> Option<f64> {
    let v = meta.get(key)?.as_num()?;
    Some((v * 10_000.0).round() / 100.0)
}

impl ColumnInfo {
    pub fn from_record(meta: &MetaRecord, language: Language) -> Self {
        let name = non_empty_str(meta, language.category_column());
        let present = meta.get("n_not_na").and_then(MetaValue::as_num);
        let missing = meta.get("n_na").and_then(MetaValue::as_num);
        let total = present.unwrap_or(0.0) + missing.unwrap_or(0.0);
        let counts = |count: Option<f64>| {
            count.map(|c| format!("{}/{}", c as i64, total as i64))
        };

        Self {
            name,
            unit: non_empty_str(meta, "unit"),
            completeness_pct: pct(meta, "completeness"),
            count_present: counts(present),
            count_missing: counts(missing),
            completeness_after_pct: pct(meta, "completeness_after_imputation"),
            count_present_after: counts(
                meta.get("n_not_na_after_imputation").and_then(MetaValue::as_num),
            ),
            count_missing_after: counts(
                meta.get("n_na_after_imputation").and_then(MetaValue::as_num),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> MetaValue {
        MetaValue::Str(v.to_string())
    }

    #[test]
    fn test_parse_list_field_variants() {
        assert_eq!(
            parse_list_field(&s("['a', 'b']")),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(
            parse_list_field(&s("[\"a\", \"b\"]")),
            vec!["a".to_string(), "b".to_string()]
        );
        assert_eq!(parse_list_field(&s("scalar")), vec!["scalar".to_string()]);
        assert_eq!(parse_list_field(&s("  ")), Vec::<String>::new());
        assert_eq!(parse_list_field(&MetaValue::Null), Vec::<String>::new());
        assert_eq!(parse_list_field(&MetaValue::Num(12.0)), vec!["12".to_string()]);
        // Unbalanced quoting falls back to the comma split
        assert_eq!(
            parse_list_field(&s("[GUS 1923, GUS 1933]")),
            vec!["GUS 1923".to_string(), "GUS 1933".to_string()]
        );
    }

    #[test]
    fn test_source_items_zip() {
        let mut meta = MetaRecord::new();
        meta.insert("source".to_string(), s("['Rocznik A', '', 'Rocznik B']"));
        meta.insert("page".to_string(), s("['12', '', '']"));
        meta.insert("pdf_page".to_string(), s("['30', '', '41']"));
        meta.insert("links".to_string(), s("['http://a', '', '']"));
        meta.insert("table".to_string(), s("['7', '', '']"));

        let items = source_items(&meta);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].label, "Rocznik A, table 7, p. 12 (30 in PDF)");
        assert_eq!(items[0].href, "http://a");
        assert_eq!(items[1].label, "Rocznik B (41 in PDF)");
        assert_eq!(items[1].href, "#");
    }

    #[test]
    fn test_table_info_language_pick() {
        let mut meta = MetaRecord::new();
        meta.insert("description_eng".to_string(), s("Census of 1921"));
        meta.insert("description_pol".to_string(), s("Spis z 1921"));
        meta.insert("date".to_string(), s("30.09.1921"));
        meta.insert("standardization_comments".to_string(), s("  "));

        let en = TableInfo::from_record(&meta, Language::En);
        assert_eq!(en.description.as_deref(), Some("Census of 1921"));
        assert_eq!(en.date.as_deref(), Some("30 September 1921"));
        assert!(en.standardization.is_none());

        let pl = TableInfo::from_record(&meta, Language::Pl);
        assert_eq!(pl.description.as_deref(), Some("Spis z 1921"));
        assert_eq!(pl.date.as_deref(), Some("30 września 1921"));
    }

    #[test]
    fn test_column_info_counts_and_completeness() {
        let mut meta = MetaRecord::new();
        meta.insert("category_eng".to_string(), s("Demographics/Population/Total"));
        meta.insert("unit".to_string(), s("persons"));
        meta.insert("completeness".to_string(), MetaValue::Num(0.97561));
        meta.insert("n_not_na".to_string(), MetaValue::Num(240.0));
        meta.insert("n_na".to_string(), MetaValue::Num(6.0));
        meta.insert(
            "n_not_na_after_imputation".to_string(),
            MetaValue::Num(246.0),
        );

        let info = ColumnInfo::from_record(&meta, Language::En);
        assert_eq!(info.name.as_deref(), Some("Demographics/Population/Total"));
        assert_eq!(info.unit.as_deref(), Some("persons"));
        assert_eq!(info.completeness_pct, Some(97.56));
        assert_eq!(info.count_present.as_deref(), Some("240/246"));
        assert_eq!(info.count_missing.as_deref(), Some("6/246"));
        assert_eq!(info.count_present_after.as_deref(), Some("246/246"));
        assert!(info.count_missing_after.is_none());
        assert!(info.completeness_after_pct.is_none());
    }

    #[test]
    fn test_format_date_value_epoch_seconds_heuristic() {
        // -1522800000 s = 1921-09-30T00:00:00Z
        let v = MetaValue::Num(-1_522_800_000.0);
        assert_eq!(
            format_date_value(&v, Language::En).as_deref(),
            Some("30 September 1921")
        );
    }

    #[test]
    fn test_format_date_value_numeric_string_uses_same_heuristic() {
        // Stored as text, still epoch seconds below the 1e12 cutoff
        let seconds = s(" -1522800000 ");
        assert_eq!(
            format_date_value(&seconds, Language::En).as_deref(),
            Some("30 September 1921")
        );
        // Above the cutoff the value is already milliseconds
        let millis = s("1522800000000");
        assert_eq!(
            format_date_value(&millis, Language::Pl).as_deref(),
            Some("4 kwietnia 2018")
        );
    }
}
