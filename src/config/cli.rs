use crate::config::toml_config::TomlConfig;
use crate::core::builder::BuildMode;
use crate::core::report::OutputFormat;
use crate::core::MissingReferencePolicy;
use crate::utils::error::Result;
use clap::{Parser, ValueEnum};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    Sync,
    Callbacks,
    Deferred,
    Async,
    /// Run every mode and check the results agree.
    All,
}

impl RunMode {
    pub fn build_mode(&self) -> Option<BuildMode> {
        match self {
            RunMode::Sync => Some(BuildMode::Sync),
            RunMode::Callbacks => Some(BuildMode::Callbacks),
            RunMode::Deferred => Some(BuildMode::Deferred),
            RunMode::Async => Some(BuildMode::Async),
            RunMode::All => None,
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "review-builder")]
#[command(about = "Join products, reviews and users into enriched reviews")]
pub struct CliConfig {
    /// TOML configuration file; flags below override it
    #[arg(short, long)]
    pub config: Option<String>,

    #[arg(long)]
    pub data_dir: Option<String>,

    #[arg(long)]
    pub products: Option<String>,

    #[arg(long)]
    pub reviews: Option<String>,

    #[arg(long)]
    pub users: Option<String>,

    #[arg(long, value_enum, default_value_t = RunMode::Async)]
    pub mode: RunMode,

    /// How to handle reviews whose product or user does not exist
    #[arg(long, value_enum)]
    pub on_missing: Option<MissingReferencePolicy>,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,

    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Single-line JSON output
    #[arg(long)]
    pub compact: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

impl CliConfig {
    /// Loads the TOML file when one is given, then applies the flag overrides.
    pub fn resolve(&self) -> Result<TomlConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path);
                TomlConfig::from_file(path)?
            }
            None => TomlConfig::default(),
        };

        if let Some(data_dir) = &self.data_dir {
            config.sources.data_dir = data_dir.clone();
        }
        if let Some(products) = &self.products {
            config.sources.products = products.clone();
        }
        if let Some(reviews) = &self.reviews {
            config.sources.reviews = reviews.clone();
        }
        if let Some(users) = &self.users {
            config.sources.users = users.clone();
        }
        if let Some(policy) = self.on_missing {
            config.join.on_missing = policy;
        }
        if let Some(output) = &self.output {
            config.output.path = Some(output.clone());
        }
        if let Some(format) = self.format {
            config.output.format = format;
        }
        if self.compact {
            config.output.pretty = false;
        }

        Ok(config)
    }
}
