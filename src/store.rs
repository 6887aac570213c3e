use color_eyre::eyre::eyre;
use color_eyre::Result;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Column-metadata table: one row per (column, source table) with bilingual
/// category paths, unit and completeness statistics.
pub const COLUMNS_METADATA: &str = "columns_metadata";

/// Table-metadata table: one row per source table with dates, provenance and
/// standardization notes.
pub const TABLES_METADATA: &str = "data_tables_metadata";

/// Known Parquet sources, (table name, file name).
const SOURCES: [(&str, &str); 5] = [
    ("city_datasets", "City_datasets.parquet"),
    ("district_datasets", "District_datasets.parquet"),
    ("region_datasets", "Region_datasets.parquet"),
    (COLUMNS_METADATA, "columns_metadata.parquet"),
    (TABLES_METADATA, "data_tables_metadata.parquet"),
];

/// Outcome of loading one source file
#[derive(Debug, Clone)]
pub struct TableStatus {
    pub table: String,
    pub rows: Option<usize>,
    pub error: Option<String>,
}

impl TableStatus {
    pub fn loaded(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-table load outcomes, in source order
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub tables: Vec<TableStatus>,
}

/// Owned data-access context: one in-memory frame per logical table.
///
/// The store is read-only after construction; everything downstream is a
/// derived projection. An absent table is not an error here - queries
/// against it return empty results.
pub struct DataStore {
    tables: BTreeMap<String, DataFrame>,
}

impl DataStore {
    /// Load the known Parquet sources from `dir`.
    ///
    /// Individual file failures are non-fatal and recorded in the report;
    /// the two metadata tables are required for tree building and their
    /// absence fails the whole load.
    pub fn open(dir: &Path) -> Result<(Self, LoadReport)> {
        let mut tables = BTreeMap::new();
        let mut report = LoadReport::default();

        for (name, file) in SOURCES {
            let path = dir.join(file);
            match load_parquet(&path) {
                Ok(df) => {
                    report.tables.push(TableStatus {
                        table: name.to_string(),
                        rows: Some(df.height()),
                        error: None,
                    });
                    tables.insert(name.to_string(), df);
                }
                Err(e) => {
                    report.tables.push(TableStatus {
                        table: name.to_string(),
                        rows: None,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        for required in [COLUMNS_METADATA, TABLES_METADATA] {
            if !tables.contains_key(required) {
                return Err(eyre!(
                    "Required metadata table '{}' could not be loaded from {}",
                    required,
                    dir.display()
                ));
            }
        }

        Ok((Self { tables }, report))
    }

    /// Build a store directly from frames (tests, injected fixtures)
    pub fn from_frames<I, S>(frames: I) -> Self
    where
        I: IntoIterator<Item = (S, DataFrame)>,
        S: Into<String>,
    {
        Self {
            tables: frames
                .into_iter()
                .map(|(name, df)| (name.into(), df))
                .collect(),
        }
    }

    /// Get a table's frame, `None` when the table was never loaded
    pub fn frame(&self, name: &str) -> Option<&DataFrame> {
        self.tables.get(name)
    }

    /// Get a lazy handle on a table
    pub fn lazy(&self, name: &str) -> Option<LazyFrame> {
        self.frame(name).map(|df| df.clone().lazy())
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(|s| s.as_str())
    }
}

fn load_parquet(path: &Path) -> Result<DataFrame> {
    let pl_path = PlPath::Local(Arc::from(path));
    let df = LazyFrame::scan_parquet(pl_path, Default::default())?.collect()?;
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn write_parquet(path: &Path, mut df: DataFrame) {
        let file = File::create(path).unwrap();
        ParquetWriter::new(file).finish(&mut df).unwrap();
    }

    fn metadata_frames() -> (DataFrame, DataFrame) {
        let columns = df!(
            "data_table_id" => ["t1"],
            "column_name" => ["population"],
            "category_eng" => ["Demographics/Population"],
            "category_pol" => ["Demografia/Ludność"],
        )
        .unwrap();
        let tables = df!(
            "data_table_id" => ["t1"],
            "adm_level" => ["District"],
            "date" => ["01.01.1921"],
        )
        .unwrap();
        (columns, tables)
    }

    #[test]
    fn test_open_requires_metadata_tables() {
        let dir = tempfile::tempdir().unwrap();
        // No files at all: every load fails, including the required ones
        assert!(DataStore::open(dir.path()).is_err());
    }

    #[test]
    fn test_open_tolerates_missing_fact_tables() {
        let dir = tempfile::tempdir().unwrap();
        let (columns, tables) = metadata_frames();
        write_parquet(&dir.path().join("columns_metadata.parquet"), columns);
        write_parquet(&dir.path().join("data_tables_metadata.parquet"), tables);

        let (store, report) = DataStore::open(dir.path()).unwrap();
        assert!(store.frame(COLUMNS_METADATA).is_some());
        assert!(store.frame("district_datasets").is_none());

        let failed: Vec<_> = report
            .tables
            .iter()
            .filter(|t| !t.loaded())
            .map(|t| t.table.clone())
            .collect();
        assert_eq!(
            failed,
            vec!["city_datasets", "district_datasets", "region_datasets"]
        );
    }

    #[test]
    fn test_open_reports_row_counts() {
        let dir = tempfile::tempdir().unwrap();
        let (columns, tables) = metadata_frames();
        write_parquet(&dir.path().join("columns_metadata.parquet"), columns);
        write_parquet(&dir.path().join("data_tables_metadata.parquet"), tables);

        let (_, report) = DataStore::open(dir.path()).unwrap();
        let columns_status = report
            .tables
            .iter()
            .find(|t| t.table == COLUMNS_METADATA)
            .unwrap();
        assert_eq!(columns_status.rows, Some(1));
    }
}
