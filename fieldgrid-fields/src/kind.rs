//! The [`FieldKind`] seam and the registry that maps field-type ids to kinds.
//!
//! A kind answers three questions about a raw value of its type: is it empty
//! (drives inheritance), what does the grid show, and what goes into a CSV
//! cell. Kinds are looked up by id; a missing kind is `None` and callers pass
//! the raw value through unchanged.

use std::collections::HashMap;
use std::fmt::{self, Write};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde_json::Value;

use crate::error::Result;
use crate::kinds;
use crate::types::FieldDef;

/// Formatted grid output of one field.
#[derive(Debug, Clone, PartialEq)]
pub enum GridCell {
    /// A single value stored under the requested key.
    Value(Value),
    /// Several keys to merge into the row instead of the requested key.
    Merge(IndexMap<String, Value>),
}

impl GridCell {
    /// Collapse to one value; merged maps become a JSON object.
    pub fn into_value(self) -> Value {
        match self {
            GridCell::Value(v) => v,
            GridCell::Merge(map) => Value::Object(map.into_iter().collect()),
        }
    }
}

/// Everything a kind may consult while formatting.
#[derive(Clone, Copy)]
pub struct FormatContext<'a> {
    /// For kinds that format children (localized fields).
    pub registry: &'a FieldKindRegistry,
    /// Locale of the request.
    pub locale: &'a str,
    /// Element the value is shown for (not necessarily its owner).
    pub element_id: i64,
    /// chrono format for timestamps in CSV mode.
    pub date_format: &'a str,
}

impl fmt::Debug for FormatContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatContext")
            .field("locale", &self.locale)
            .field("element_id", &self.element_id)
            .field("date_format", &self.date_format)
            .finish()
    }
}

/// Behavior for one field-type identifier.
pub trait FieldKind: Send + Sync + fmt::Debug {
    /// Identifier matched against [`FieldType::kind_id`](crate::FieldType::kind_id).
    fn id(&self) -> &str;

    /// Whether `value` counts as absent. Empty values are inherited.
    fn is_empty(&self, value: &Value) -> bool {
        is_blank(value)
    }

    /// Value shown in the grid.
    fn format_for_grid(
        &self,
        def: &FieldDef,
        value: &Value,
        ctx: &FormatContext<'_>,
    ) -> Result<GridCell> {
        let _ = (def, ctx);
        Ok(GridCell::Value(value.clone()))
    }

    /// Text written to a CSV cell.
    fn format_for_csv(&self, def: &FieldDef, value: &Value, ctx: &FormatContext<'_>) -> Result<String> {
        let _ = (def, ctx);
        Ok(csv_text(value))
    }
}

/// `null` and `""` are blank; everything else carries a value.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Plain-text rendering of a raw value for CSV cells.
pub fn csv_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => (if *b { "1" } else { "0" }).to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(csv_text).collect::<Vec<_>>().join(","),
        Value::Object(_) => value.to_string(),
    }
}

/// Render a unix timestamp (seconds, UTC) with a chrono format string.
/// `None` when the timestamp is out of range or the format is invalid.
pub fn format_timestamp(ts: i64, format: &str) -> Option<String> {
    let datetime = DateTime::<Utc>::from_timestamp(ts, 0)?;
    let mut out = String::new();
    write!(out, "{}", datetime.format(format)).ok()?;
    Some(out)
}

/// Maps field-type ids to kinds. Built once, then shared read-only.
#[derive(Debug, Clone, Default)]
pub struct FieldKindRegistry {
    kinds: HashMap<String, Arc<dyn FieldKind>>,
}

impl FieldKindRegistry {
    /// An empty registry: every lookup misses and values pass through raw.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with a kind for every [`FieldType`](crate::FieldType).
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for kind in kinds::builtin() {
            registry.register(kind);
        }
        registry
    }

    /// Add or replace the kind for its id. Returns the kind it replaced.
    pub fn register(&mut self, kind: Arc<dyn FieldKind>) -> Option<Arc<dyn FieldKind>> {
        self.kinds.insert(kind.id().to_string(), kind)
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn FieldKind>> {
        self.kinds.get(id).cloned()
    }

    /// The kind handling `def`'s type.
    pub fn for_field(&self, def: &FieldDef) -> Option<Arc<dyn FieldKind>> {
        self.get(def.kind_id())
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}
