use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// UI language for category labels and date formatting
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum Language {
    /// English - canonical category paths
    En,
    /// Polish - localized category paths
    Pl,
}

impl Language {
    /// Column of `columns_metadata` holding the category path in this language
    pub fn category_column(&self) -> &'static str {
        match self {
            Self::En => "category_eng",
            Self::Pl => "category_pol",
        }
    }
}

/// Administrative level of a dataset: district, region (voivodship) or city
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum AdminLevel {
    District,
    Region,
    City,
}

impl AdminLevel {
    /// Name of the fact table holding this level's values
    pub fn fact_table(&self) -> &'static str {
        match self {
            Self::District => "district_datasets",
            Self::Region => "region_datasets",
            Self::City => "city_datasets",
        }
    }

    /// Name of the area-name column in this level's fact table
    pub fn area_column(&self) -> &'static str {
        match self {
            Self::District => "District",
            Self::Region => "Region",
            Self::City => "City",
        }
    }

    /// Value stored in `data_tables_metadata.adm_level` for this level
    pub fn as_str(&self) -> &'static str {
        self.area_column()
    }
}

/// Command-line arguments for polstat
#[derive(Parser, Debug)]
#[command(version, about = "polstat")]
pub struct Args {
    /// Directory containing the dataset Parquet files
    /// (falls back to `data_dir` from the config file)
    pub data_dir: Option<PathBuf>,

    /// UI language for category labels and dates
    #[arg(long = "language", value_enum)]
    pub language: Option<Language>,

    /// Administrative level to explore
    #[arg(long = "level", value_enum)]
    pub level: Option<AdminLevel>,

    /// Print the category tree and exit
    #[arg(long = "tree", action)]
    pub tree: bool,

    /// Select a dataset by its category path (in the active language)
    #[arg(long = "dataset")]
    pub dataset: Option<String>,

    /// Variant index to display (0-based, date-ascending order)
    #[arg(long = "variant")]
    pub variant: Option<usize>,

    /// Write a wide CSV with every variant of the selected dataset
    /// into this directory
    #[arg(long = "export")]
    pub export: Option<PathBuf>,

    /// Write a CSV for the active variant only into this directory
    #[arg(long = "export-variant")]
    pub export_variant: Option<PathBuf>,

    /// Write a default config file and exit
    #[arg(long = "write-config", action)]
    pub write_config: bool,
}
