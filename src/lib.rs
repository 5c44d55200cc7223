pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, RunMode};

pub use adapters::{LocalStorage, MemoryStorage};
pub use config::TomlConfig;
pub use crate::core::builder::{BuildMode, ReviewBuilder};
pub use domain::model::{AggregatedResult, Dataset, MissingReferencePolicy};
pub use utils::error::{Result, ReviewError};
