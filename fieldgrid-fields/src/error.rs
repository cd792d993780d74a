//! Error types for the schema registry

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema and field-kind operations
pub type Result<T> = std::result::Result<T, FieldsError>;

/// Errors that can occur in schema loading or field formatting
#[derive(Debug, Error)]
pub enum FieldsError {
    /// A field kind could not format a value
    #[error("cannot format field '{field}': {message}")]
    Format { field: String, message: String },

    /// Schema directory could not be used
    #[error("schema directory not usable: {path}")]
    NotInitialized { path: PathBuf },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl FieldsError {
    /// Build a formatting failure for `field`.
    pub fn format(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Format {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_display() {
        let err = FieldsError::format("price", "expected a number, got \"abc\"");
        assert_eq!(
            err.to_string(),
            "cannot format field 'price': expected a number, got \"abc\""
        );
    }
}
