use crate::core::report::OutputFormat;
use crate::core::{ConfigProvider, Dataset, MissingReferencePolicy};
use crate::utils::error::{Result, ReviewError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub sources: SourcesConfig,
    #[serde(default)]
    pub join: JoinConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_products")]
    pub products: String,
    #[serde(default = "default_reviews")]
    pub reviews: String,
    #[serde(default = "default_users")]
    pub users: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinConfig {
    #[serde(default)]
    pub on_missing: MissingReferencePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Relative to the working directory; stdout when absent.
    pub path: Option<String>,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default = "default_pretty")]
    pub pretty: bool,
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_products() -> String {
    Dataset::Products.file_name().to_string()
}

fn default_reviews() -> String {
    Dataset::Reviews.file_name().to_string()
}

fn default_users() -> String {
    Dataset::Users.file_name().to_string()
}

fn default_pretty() -> bool {
    true
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            products: default_products(),
            reviews: default_reviews(),
            users: default_users(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: None,
            format: OutputFormat::default(),
            pretty: default_pretty(),
        }
    }
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    ///
    /// A configuration file must name its data through a `[sources]` table;
    /// the other tables fall back to their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ReviewError::IoError)?;
        let table = Self::parse_table(&content)?;

        if !table.contains_key("sources") {
            return Err(ReviewError::MissingConfigError {
                field: "sources".to_string(),
            });
        }

        toml::Value::Table(table)
            .try_into()
            .map_err(Self::parsing_error)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(Self::parsing_error)
    }

    fn parse_table(content: &str) -> Result<toml::Table> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(Self::parsing_error)
    }

    fn parsing_error(e: toml::de::Error) -> ReviewError {
        ReviewError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        }
    }

    /// 替換環境變數 (例如 ${DATA_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReviewError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn source_files(&self) -> [&str; 3] {
        [
            self.sources.products.as_str(),
            self.sources.reviews.as_str(),
            self.sources.users.as_str(),
        ]
    }
}

impl ConfigProvider for TomlConfig {
    fn data_dir(&self) -> &str {
        &self.sources.data_dir
    }

    fn source_path(&self, dataset: Dataset) -> &str {
        match dataset {
            Dataset::Products => &self.sources.products,
            Dataset::Reviews => &self.sources.reviews,
            Dataset::Users => &self.sources.users,
        }
    }

    fn missing_reference_policy(&self) -> MissingReferencePolicy {
        self.join.on_missing
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("sources.data_dir", &self.sources.data_dir)?;

        let files = self.source_files();
        for (dataset, file) in Dataset::ALL.iter().zip(files) {
            validation::validate_path(&format!("sources.{}", dataset), file)?;
        }
        validation::validate_file_extensions("sources", &files, &["json"])?;
        validation::validate_distinct("sources", &files)?;

        if let Some(path) = &self.output.path {
            validation::validate_non_empty_string("output.path", path)?;
            validation::validate_path("output.path", path)?;
        }

        Ok(())
    }
}
