use crate::utils::error::{Result, ReviewError};
use std::collections::HashSet;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(ReviewError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(ReviewError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_file_extensions(
    field_name: &str,
    files: &[&str],
    allowed_extensions: &[&str],
) -> Result<()> {
    let allowed_set: HashSet<&str> = allowed_extensions.iter().copied().collect();

    for file in files {
        match std::path::Path::new(file)
            .extension()
            .and_then(|ext| ext.to_str())
        {
            Some(extension) if allowed_set.contains(extension) => {}
            Some(extension) => {
                return Err(ReviewError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.to_string(),
                    reason: format!(
                        "Unsupported file extension: {}. Allowed extensions: {}",
                        extension,
                        allowed_extensions.join(", ")
                    ),
                });
            }
            None => {
                return Err(ReviewError::InvalidConfigValueError {
                    field: field_name.to_string(),
                    value: file.to_string(),
                    reason: "File has no extension or invalid filename".to_string(),
                });
            }
        }
    }

    Ok(())
}

/// The three sources must be distinct files.
pub fn validate_distinct(field_name: &str, files: &[&str]) -> Result<()> {
    let mut seen = HashSet::new();
    for file in files {
        if !seen.insert(*file) {
            return Err(ReviewError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: file.to_string(),
                reason: "The same file is used for more than one source".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ReviewError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path() {
        assert!(validate_path("data_dir", "./data").is_ok());
        assert!(validate_path("data_dir", "").is_err());
        assert!(validate_path("data_dir", "da\0ta").is_err());
    }

    #[test]
    fn test_validate_file_extensions() {
        let files = ["products.json", "reviews.json"];
        assert!(validate_file_extensions("sources", &files, &["json"]).is_ok());

        assert!(validate_file_extensions("sources", &["users.csv"], &["json"]).is_err());
        assert!(validate_file_extensions("sources", &["users"], &["json"]).is_err());
    }

    #[test]
    fn test_validate_distinct() {
        assert!(validate_distinct("sources", &["a.json", "b.json", "c.json"]).is_ok());
        assert!(validate_distinct("sources", &["a.json", "b.json", "a.json"]).is_err());
    }

    #[test]
    fn test_validate_non_empty_string() {
        assert!(validate_non_empty_string("output.path", "report.json").is_ok());
        assert!(validate_non_empty_string("output.path", "   ").is_err());
    }
}
