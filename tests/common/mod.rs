use polars::prelude::*;
use std::fs::File;
use std::path::Path;

pub fn write_parquet(path: &Path, mut df: DataFrame) {
    let file = File::create(path).unwrap();
    ParquetWriter::new(file).finish(&mut df).unwrap();
}

/// Write a small but complete on-disk store: both metadata tables plus the
/// district fact table. Two sources measure Demographics/Population/Total
/// (the 1921 and 1931 censuses), one undated source measures Urban.
pub fn write_sample_store(dir: &Path) {
    let columns = df!(
        "data_table_id" => ["census_1921", "census_1931", "yearbook"],
        "column_name" => ["pop_total", "pop_total", "pop_urban"],
        "category_eng" => [
            "Demographics/Population/Total",
            "Demographics/Population/Total",
            "Demographics/Population/Urban",
        ],
        "category_pol" => [
            "Demografia/Ludność/Ogółem",
            "Demografia/Ludność/Ogółem",
            "Demografia/Ludność/Miejska",
        ],
        "unit" => ["persons", "persons", "persons"],
        "completeness" => [1.0, 0.975, 0.5],
        "n_not_na" => [4i64, 39, 2],
        "n_na" => [0i64, 1, 2],
    )
    .unwrap();

    let tables = df!(
        "data_table_id" => ["census_1921", "census_1931", "yearbook"],
        "adm_level" => ["District", "District", "District"],
        "date" => [Some("30.09.1921"), Some("09.12.1931"), None],
        "description_eng" => [
            Some("First general census"),
            Some("Second general census"),
            None,
        ],
        "description_pol" => [
            Some("Pierwszy spis powszechny"),
            Some("Drugi spis powszechny"),
            None,
        ],
        "source" => [Some("['GUS 1927']"), Some("['GUS 1938']"), None],
        "page" => [Some("['12']"), Some("['44']"), None],
    )
    .unwrap();

    let facts = df!(
        "District" => [
            " Warszawa ", "Kraków", "Poznań",
            "Warszawa", "Wilno",
            "Warszawa",
        ],
        "variable_name" => [
            "pop_total", "pop_total", "pop_total",
            "pop_total", "pop_total",
            "pop_urban",
        ],
        "data_table_id" => [
            "census_1921", "census_1921", "census_1921",
            "census_1931", "census_1931",
            "yearbook",
        ],
        "value" => [
            Some(936_700.0), None, Some(169_400.0),
            Some(1_171_900.0), Some(195_100.0),
            Some(936_700.0),
        ],
    )
    .unwrap();

    write_parquet(&dir.join("columns_metadata.parquet"), columns);
    write_parquet(&dir.join("data_tables_metadata.parquet"), tables);
    write_parquet(&dir.join("District_datasets.parquet"), facts);
}
