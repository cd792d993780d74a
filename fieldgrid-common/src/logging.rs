//! Log formatting helpers for FieldGrid.

use serde::Serialize;
use std::fmt::Debug;

/// Renders a serializable value as YAML on the lines after a log message.
///
/// The row builder logs every finished row at `trace` level through this
/// wrapper, so a row shows up as a readable block of columns instead of one
/// long `Debug` line:
///
/// ```ignore
/// trace!(element = element.id, "row built: {}", Pretty(&row));
/// ```
///
/// A value that fails to serialize falls back to `{:#?}`.
pub struct Pretty<T>(pub T);

impl<T: Serialize + Debug> std::fmt::Display for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_yaml_ng::to_string(&self.0) {
            Ok(yaml) => write!(f, "\n{}", yaml),
            Err(_) => write!(f, "\n{:#?}", self.0),
        }
    }
}

impl<T: Serialize + Debug> std::fmt::Debug for Pretty<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
