use crate::domain::model::Dataset;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("Failed to read {dataset} data from '{path}': {source}")]
    ReadError {
        dataset: Dataset,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {dataset} data: {source}")]
    ParseError {
        dataset: Dataset,
        #[source]
        source: serde_json::Error,
    },

    #[error("Review #{review_index} references unknown {entity} id {id}")]
    JoinError {
        review_index: usize,
        entity: &'static str,
        id: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Source,
    Data,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReviewError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ReviewError::ReadError { .. } => ErrorCategory::Source,
            ReviewError::ParseError { .. }
            | ReviewError::JoinError { .. }
            | ReviewError::ProcessingError { .. } => ErrorCategory::Data,
            ReviewError::IoError(_)
            | ReviewError::SerializationError(_)
            | ReviewError::CsvError(_) => ErrorCategory::Output,
            ReviewError::ConfigError { .. }
            | ReviewError::ConfigValidationError { .. }
            | ReviewError::InvalidConfigValueError { .. }
            | ReviewError::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Source => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReviewError::ReadError { path, .. } => {
                format!("Check that '{}' exists and is readable", path)
            }
            ReviewError::ParseError { dataset, .. } => {
                format!("Make sure {} contains a valid JSON array", dataset.file_name())
            }
            ReviewError::JoinError { .. } => {
                "Fix the dangling reference or rerun with --on-missing null".to_string()
            }
            ReviewError::IoError(_) => "Check the output path and its permissions".to_string(),
            ReviewError::SerializationError(_) | ReviewError::CsvError(_) => {
                "Try another output format".to_string()
            }
            ReviewError::ConfigError { .. }
            | ReviewError::ConfigValidationError { .. }
            | ReviewError::InvalidConfigValueError { .. }
            | ReviewError::MissingConfigError { .. } => {
                "Review the command line flags or the TOML configuration file".to_string()
            }
            ReviewError::ProcessingError { .. } => {
                "Rerun with --verbose to see the individual build results".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            ReviewError::ReadError { dataset, .. } => {
                format!("Could not read the {} data", dataset)
            }
            ReviewError::ParseError { dataset, .. } => {
                format!("The {} data is not valid JSON", dataset)
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReviewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_names_dataset_and_path() {
        let err = ReviewError::ReadError {
            dataset: Dataset::Reviews,
            path: "data/reviews.json".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };

        assert_eq!(
            err.to_string(),
            "Failed to read reviews data from 'data/reviews.json': gone"
        );
        assert_eq!(err.category(), ErrorCategory::Source);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.recovery_suggestion().contains("data/reviews.json"));
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = ReviewError::MissingConfigError {
            field: "sources.data_dir".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}
