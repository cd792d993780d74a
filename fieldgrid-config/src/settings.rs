//! The settings consumed by the resolution engine and the CLI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Largest accepted `size_precision`.
const MAX_SIZE_PRECISION: usize = 6;

/// Rendering settings for grid rows and CSV export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    /// Locale used when a request names none and no current locale is set.
    pub default_locale: String,
    /// Exact language tokens recognized as `field~<lang>` suffixes.
    /// Empty means any token that looks like a locale is accepted.
    pub valid_languages: Vec<String>,
    /// chrono format string for timestamps in CSV mode.
    pub date_format: String,
    /// Decimals shown in the human-readable `size` column.
    pub size_precision: usize,
    /// Preview placeholder for assets; `{id}` is replaced by the element id.
    pub preview_url: String,
    /// Directory holding `classes/`, `bricks/` and `store-keys/`.
    pub schema_dir: Option<PathBuf>,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            default_locale: "en".to_string(),
            valid_languages: Vec::new(),
            date_format: "%Y-%m-%d %H:%M".to_string(),
            size_precision: 2,
            preview_url: "/admin/asset/get-image-thumbnail?id={id}&treepreview=true".to_string(),
            schema_dir: None,
        }
    }
}

impl GridSettings {
    /// Reject settings the engine cannot work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.default_locale.trim().is_empty() {
            return Err(ConfigError::invalid_value(
                "default_locale",
                "must not be empty",
            ));
        }
        if self.size_precision > MAX_SIZE_PRECISION {
            return Err(ConfigError::invalid_value(
                "size_precision",
                format!("must be at most {MAX_SIZE_PRECISION}"),
            ));
        }
        if self.valid_languages.iter().any(|l| l.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "valid_languages",
                "entries must not be empty",
            ));
        }
        Ok(())
    }

    /// Render the preview placeholder for an element id.
    pub fn preview_for(&self, id: i64) -> String {
        self.preview_url.replace("{id}", &id.to_string())
    }
}
