pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use adapters::{http::HttpOfferSource, storage::LocalStorage};
pub use app::export::ReportExporter;
pub use config::{toml_config::TomlConfig, CliConfig};
pub use core::engine::{CompareEngine, ComparisonRun};
pub use utils::error::{CompareError, Result};
