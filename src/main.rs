use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use std::path::PathBuf;

use polstat::cli::Args;
use polstat::export::{
    area_values_to_csv, export_file_name, wide_table_to_csv, write_csv,
};
use polstat::meta::{ColumnInfo, TableInfo};
use polstat::tree::{dataset_id_for_path, CategoryNode};
use polstat::{
    AdminLevel, AppConfig, ConfigManager, DataStore, Explorer, Language, LoadReport, Selection,
    APP_NAME,
};

fn print_tree(nodes: &[CategoryNode]) {
    for node in nodes {
        let marker = if node.dataset_id.is_some() { "*" } else { "" };
        println!("{}{}{}", "  ".repeat(node.level), node.name, marker);
        print_tree(&node.children);
    }
}

fn print_load_warnings(report: &LoadReport) {
    for status in report.tables.iter().filter(|t| !t.loaded()) {
        if let Some(error) = &status.error {
            eprintln!("warning: table '{}' not loaded: {}", status.table, error);
        }
    }
}

fn print_selection(explorer: &Explorer, selection: &Selection) -> Result<()> {
    println!("Dataset: {}", selection.path);
    if selection.canonical_is_fallback {
        println!("(no canonical mapping; using the path as-is)");
    } else if selection.canonical != selection.path {
        println!("Canonical: {}", selection.canonical);
    }

    if selection.variants.is_empty() {
        println!("No variants found for this dataset.");
        return Ok(());
    }

    println!("Variants:");
    for (i, variant) in selection.variants.iter().enumerate() {
        let active = if i == selection.active_variant { ">" } else { " " };
        println!("{} [{}] {}", active, i, variant.label);
    }

    let table_info = TableInfo::from_record(&explorer.active_table_metadata()?, explorer.language());
    if let Some(description) = &table_info.description {
        println!("Description: {}", description);
    }
    if let Some(date) = &table_info.date {
        println!("Date: {}", date);
    }
    if let Some(adm) = &table_info.admin_state_date {
        println!("Administrative state as of: {}", adm);
    }
    for source in &table_info.sources {
        println!("Source: {}", source.label);
    }

    let column_info =
        ColumnInfo::from_record(&explorer.active_column_metadata()?, explorer.language());
    if let Some(unit) = &column_info.unit {
        println!("Unit: {}", unit);
    }
    if let (Some(pct), Some(present)) =
        (column_info.completeness_pct, &column_info.count_present)
    {
        println!("Completeness: {}% ({})", pct, present);
    }

    println!();
    for value in &selection.values {
        match value.value {
            Some(v) => println!("{}\t{}", value.area_name, v),
            None => println!("{}\t-", value.area_name),
        }
    }
    Ok(())
}

fn export_dir(arg: &Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    arg.clone()
        .or_else(|| config.export_dir.clone())
        .ok_or_else(|| eyre!("No export directory given and none configured"))
}

fn run(args: &Args, config: &AppConfig) -> Result<()> {
    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| config.data_dir.clone())
        .ok_or_else(|| eyre!("No data directory given and none configured"))?;
    let language = args
        .language
        .or_else(|| config.language())
        .unwrap_or(Language::En);
    let level = args
        .level
        .or_else(|| config.level())
        .unwrap_or(AdminLevel::District);

    let (store, report) = DataStore::open(&data_dir)?;
    print_load_warnings(&report);

    let mut explorer = Explorer::new(store, language, level);

    if args.tree {
        print_tree(&explorer.category_tree()?);
        return Ok(());
    }

    let dataset = match &args.dataset {
        Some(dataset) => dataset,
        None => {
            print_tree(&explorer.category_tree()?);
            return Ok(());
        }
    };
    let dataset_id =
        dataset_id_for_path(dataset).ok_or_else(|| eyre!("Empty dataset path: '{}'", dataset))?;
    explorer.select_dataset(&dataset_id)?;
    if let Some(index) = args.variant {
        if explorer.select_variant(index)?.map(|s| s.active_variant) != Some(index) {
            return Err(eyre!("No variant with index {}", index));
        }
    }

    let selection = match explorer.selection() {
        Some(selection) => selection.clone(),
        None => return Ok(()),
    };
    print_selection(&explorer, &selection)?;

    if args.export.is_some() {
        let dir = export_dir(&args.export, config)?;
        let table = explorer
            .export_all()?
            .ok_or_else(|| eyre!("Nothing selected to export"))?;
        let path = dir.join(format!(
            "{}.csv",
            export_file_name(&table.dataset, "all variants")
        ));
        write_csv(&path, &wide_table_to_csv(&table))?;
        println!("Exported {}", path.display());
    }

    if args.export_variant.is_some() {
        let dir = export_dir(&args.export_variant, config)?;
        let variant = selection
            .active_variant()
            .ok_or_else(|| eyre!("No active variant to export"))?;
        let path = dir.join(format!(
            "{}.csv",
            export_file_name(&selection.canonical, &variant.label)
        ));
        write_csv(&path, &area_values_to_csv(&selection.values, &variant.label))?;
        println!("Exported {}", path.display());
    }

    Ok(())
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    if args.write_config {
        let manager = ConfigManager::new(APP_NAME)?;
        let path = manager.write_default_config(false)?;
        println!("Wrote default config to {}", path.display());
        return Ok(());
    }

    let config = AppConfig::load(&ConfigManager::new(APP_NAME)?)?;
    run(&args, &config)
}
