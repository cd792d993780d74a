//! Error types for the resolution engine

use fieldgrid_fields::FieldsError;
use thiserror::Error;

/// Result type for row building
pub type Result<T> = std::result::Result<T, ResolveError>;

/// Failures the engine cannot recover from locally.
///
/// Malformed keys, missing definitions and absent brick or store data are
/// not errors: they resolve to empty values. Only a field kind failing to
/// format a value aborts the row.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// A field kind rejected the value it was asked to format
    #[error("cannot resolve '{key}': {source}")]
    FieldKind {
        key: String,
        #[source]
        source: FieldsError,
    },
}

impl ResolveError {
    pub(crate) fn field_kind(key: &str, source: FieldsError) -> Self {
        Self::FieldKind {
            key: key.to_string(),
            source,
        }
    }

    /// The requested key the failure belongs to.
    pub fn key(&self) -> &str {
        match self {
            Self::FieldKind { key, .. } => key,
        }
    }
}
