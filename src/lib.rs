//! Dataset resolution and query layer for interwar Poland (1918-1939)
//! statistical tables: a category tree over bilingual metadata, variant
//! resolution with a stable date ordering, per-area value fetching and
//! CSV export.

pub mod areas;
pub mod cli;
pub mod config;
pub mod explorer;
pub mod export;
pub mod meta;
pub mod schema;
pub mod store;
pub mod tree;
pub mod variant;

pub use areas::AreaValue;
pub use cli::{AdminLevel, Args, Language};
pub use config::{AppConfig, ConfigManager};
pub use explorer::{Explorer, FetchToken, Selection};
pub use export::WideTable;
pub use store::{DataStore, LoadReport};
pub use tree::CategoryNode;
pub use variant::Variant;

/// Application name used for the config directory and other app-specific paths
pub const APP_NAME: &str = "polstat";
