//! Per-area value fetching and area-name normalization.
//!
//! Geographic boundary features and fact rows are independently sourced;
//! they only join reliably after case/whitespace normalization, so every
//! row gets an uppercased `area_id` alongside its display name.

use color_eyre::Result;

use crate::cli::AdminLevel;
use crate::schema;
use crate::store::DataStore;

/// One administrative area's value for a (variant, level) pair.
/// `value: None` means "no data", which is distinct from zero.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaValue {
    /// Trimmed, uppercased join key
    pub area_id: String,
    /// Trimmed original-case display name
    pub area_name: String,
    pub value: Option<f64>,
}

/// Fetch per-area values for a resolved (value column, source table) pair.
/// No ordering is imposed; consumers needing a deterministic order sort
/// explicitly.
pub fn fetch_area_values(
    store: &DataStore,
    value_column: &str,
    table_id: &str,
    level: AdminLevel,
) -> Result<Vec<AreaValue>> {
    let rows = schema::area_values(store, value_column, table_id, level)?;
    Ok(rows
        .into_iter()
        .map(|(area_name, value)| AreaValue {
            area_id: area_name.to_uppercase(),
            area_name,
            value,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn test_normalization_scenario() {
        // warsaw/100 and " Kraków "/null -> WARSAW/100 and KRAKÓW/absent
        let facts = df!(
            "District" => ["warsaw", " Kraków "],
            "variable_name" => ["pop", "pop"],
            "data_table_id" => ["t1", "t1"],
            "value" => [Some(100.0), None],
        )
        .unwrap();
        let store = DataStore::from_frames([("district_datasets", facts)]);

        let values = fetch_area_values(&store, "pop", "t1", AdminLevel::District).unwrap();
        assert_eq!(
            values,
            vec![
                AreaValue {
                    area_id: "WARSAW".to_string(),
                    area_name: "warsaw".to_string(),
                    value: Some(100.0),
                },
                AreaValue {
                    area_id: "KRAKÓW".to_string(),
                    area_name: "Kraków".to_string(),
                    value: None,
                },
            ]
        );
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let store = DataStore::from_frames(Vec::<(String, DataFrame)>::new());
        let values = fetch_area_values(&store, "pop", "t1", AdminLevel::City).unwrap();
        assert!(values.is_empty());
    }
}
