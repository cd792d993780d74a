//! Built-in field kinds, one per [`FieldType`](crate::FieldType).

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Number, Value};

use crate::error::{FieldsError, Result};
use crate::kind::{csv_text, format_timestamp, is_blank, FieldKind, FormatContext, GridCell};
use crate::types::{FieldDef, FieldType};

/// Field-type identifiers of the built-in kinds.
pub mod ids {
    pub const INPUT: &str = "input";
    pub const TEXTAREA: &str = "textarea";
    pub const WYSIWYG: &str = "wysiwyg";
    pub const NUMERIC: &str = "numeric";
    pub const CHECKBOX: &str = "checkbox";
    pub const DATE: &str = "date";
    pub const DATETIME: &str = "datetime";
    pub const SELECT: &str = "select";
    pub const MULTISELECT: &str = "multiselect";
    pub const MANY_TO_ONE_RELATION: &str = "many-to-one-relation";
    pub const MANY_TO_MANY_RELATION: &str = "many-to-many-relation";
    pub const REVERSE_RELATION: &str = "reverse-relation";
    pub const LOCALIZEDFIELDS: &str = "localizedfields";
    pub const OBJECTBRICKS: &str = "objectbricks";
    pub const CLASSIFICATIONSTORE: &str = "classificationstore";
}

const DATE_ONLY_FORMAT: &str = "%Y-%m-%d";

/// All built-in kinds.
pub fn builtin() -> Vec<Arc<dyn FieldKind>> {
    vec![
        Arc::new(TextKind(ids::INPUT)),
        Arc::new(TextKind(ids::TEXTAREA)),
        Arc::new(TextKind(ids::WYSIWYG)),
        Arc::new(TextKind(ids::SELECT)),
        Arc::new(NumericKind),
        Arc::new(CheckboxKind),
        Arc::new(DateKind { with_time: false }),
        Arc::new(DateKind { with_time: true }),
        Arc::new(MultiselectKind),
        Arc::new(ManyToOneKind),
        Arc::new(ManyToManyKind),
        Arc::new(ReverseRelationKind),
        Arc::new(LocalizedFieldsKind),
        Arc::new(ContainerKind(ids::OBJECTBRICKS)),
        Arc::new(ContainerKind(ids::CLASSIFICATIONSTORE)),
    ]
}

/// Strings shown as-is: input, textarea, wysiwyg, select.
#[derive(Debug)]
pub struct TextKind(&'static str);

impl FieldKind for TextKind {
    fn id(&self) -> &str {
        self.0
    }
}

#[derive(Debug)]
pub struct NumericKind;

impl NumericKind {
    fn number(def: &FieldDef, value: &Value) -> Result<Option<Number>> {
        match value {
            Value::Null => Ok(None),
            Value::Number(n) => Ok(Some(n.clone())),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    return Ok(Some(Number::from(i)));
                }
                trimmed
                    .parse::<f64>()
                    .ok()
                    .and_then(Number::from_f64)
                    .map(Some)
                    .ok_or_else(|| {
                        FieldsError::format(&def.name, format!("expected a number, got {value}"))
                    })
            }
            other => Err(FieldsError::format(
                &def.name,
                format!("expected a number, got {other}"),
            )),
        }
    }
}

impl FieldKind for NumericKind {
    fn id(&self) -> &str {
        ids::NUMERIC
    }

    fn format_for_grid(
        &self,
        def: &FieldDef,
        value: &Value,
        _ctx: &FormatContext<'_>,
    ) -> Result<GridCell> {
        let number = Self::number(def, value)?;
        Ok(GridCell::Value(number.map(Value::Number).unwrap_or(Value::Null)))
    }

    fn format_for_csv(&self, def: &FieldDef, value: &Value, _ctx: &FormatContext<'_>) -> Result<String> {
        let Some(number) = Self::number(def, value)? else {
            return Ok(String::new());
        };
        match (&def.type_, number.as_f64()) {
            (FieldType::Numeric { decimal_precision: Some(p) }, Some(f)) => {
                let precision = *p;
                Ok(format!("{f:.precision$}"))
            }
            _ => Ok(number.to_string()),
        }
    }
}

#[derive(Debug)]
pub struct CheckboxKind;

impl FieldKind for CheckboxKind {
    fn id(&self) -> &str {
        ids::CHECKBOX
    }

    fn is_empty(&self, value: &Value) -> bool {
        value.is_null()
    }
}

/// Unix timestamps (seconds).
#[derive(Debug)]
pub struct DateKind {
    with_time: bool,
}

impl DateKind {
    fn timestamp(def: &FieldDef, value: &Value) -> Result<Option<i64>> {
        match value {
            Value::Null => Ok(None),
            Value::String(s) if s.is_empty() => Ok(None),
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(Some)
                .ok_or_else(|| FieldsError::format(&def.name, format!("invalid timestamp {n}"))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| FieldsError::format(&def.name, format!("invalid timestamp {value}"))),
            other => Err(FieldsError::format(
                &def.name,
                format!("invalid timestamp {other}"),
            )),
        }
    }
}

impl FieldKind for DateKind {
    fn id(&self) -> &str {
        if self.with_time {
            ids::DATETIME
        } else {
            ids::DATE
        }
    }

    fn format_for_grid(
        &self,
        def: &FieldDef,
        value: &Value,
        _ctx: &FormatContext<'_>,
    ) -> Result<GridCell> {
        let ts = Self::timestamp(def, value)?;
        Ok(GridCell::Value(ts.map(Value::from).unwrap_or(Value::Null)))
    }

    fn format_for_csv(&self, def: &FieldDef, value: &Value, ctx: &FormatContext<'_>) -> Result<String> {
        let Some(ts) = Self::timestamp(def, value)? else {
            return Ok(String::new());
        };
        let format = if self.with_time {
            ctx.date_format
        } else {
            DATE_ONLY_FORMAT
        };
        format_timestamp(ts, format).ok_or_else(|| {
            FieldsError::format(&def.name, format!("cannot render timestamp {ts} as '{format}'"))
        })
    }
}

fn is_empty_collection(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        other => is_blank(other),
    }
}

#[derive(Debug)]
pub struct MultiselectKind;

impl FieldKind for MultiselectKind {
    fn id(&self) -> &str {
        ids::MULTISELECT
    }

    fn is_empty(&self, value: &Value) -> bool {
        is_empty_collection(value)
    }
}

/// Relation targets are `{id, type, path}` objects.
fn relation_path(value: &Value) -> Option<&str> {
    value.get("path").and_then(Value::as_str)
}

fn relation_csv(value: &Value) -> Option<String> {
    let path = relation_path(value)?;
    let kind = value.get("type").and_then(Value::as_str).unwrap_or("object");
    Some(format!("{kind}:{path}"))
}

#[derive(Debug)]
pub struct ManyToOneKind;

impl FieldKind for ManyToOneKind {
    fn id(&self) -> &str {
        ids::MANY_TO_ONE_RELATION
    }

    fn is_empty(&self, value: &Value) -> bool {
        is_empty_collection(value)
    }

    fn format_for_grid(
        &self,
        _def: &FieldDef,
        value: &Value,
        _ctx: &FormatContext<'_>,
    ) -> Result<GridCell> {
        Ok(GridCell::Value(
            relation_path(value).map(Value::from).unwrap_or(Value::Null),
        ))
    }

    fn format_for_csv(&self, _def: &FieldDef, value: &Value, _ctx: &FormatContext<'_>) -> Result<String> {
        Ok(relation_csv(value).unwrap_or_default())
    }
}

#[derive(Debug)]
pub struct ManyToManyKind;

impl FieldKind for ManyToManyKind {
    fn id(&self) -> &str {
        ids::MANY_TO_MANY_RELATION
    }

    fn is_empty(&self, value: &Value) -> bool {
        is_empty_collection(value)
    }

    fn format_for_grid(
        &self,
        _def: &FieldDef,
        value: &Value,
        _ctx: &FormatContext<'_>,
    ) -> Result<GridCell> {
        let Some(items) = value.as_array() else {
            return Ok(GridCell::Value(Value::Null));
        };
        let rows = items
            .iter()
            .map(|item| {
                Value::Array(vec![
                    item.get("id").cloned().unwrap_or(Value::Null),
                    item.get("path").cloned().unwrap_or(Value::Null),
                    item.get("type").cloned().unwrap_or(Value::Null),
                ])
            })
            .collect();
        Ok(GridCell::Value(Value::Array(rows)))
    }

    fn format_for_csv(&self, _def: &FieldDef, value: &Value, _ctx: &FormatContext<'_>) -> Result<String> {
        Ok(value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(relation_csv)
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default())
    }
}

/// Owned elsewhere; never carries a value on this side.
#[derive(Debug)]
pub struct ReverseRelationKind;

impl FieldKind for ReverseRelationKind {
    fn id(&self) -> &str {
        ids::REVERSE_RELATION
    }

    fn is_empty(&self, _value: &Value) -> bool {
        true
    }

    fn format_for_csv(&self, _def: &FieldDef, _value: &Value, _ctx: &FormatContext<'_>) -> Result<String> {
        Ok(String::new())
    }
}

/// The localized-fields container. Raw values are `{locale: {field: value}}`;
/// the grid gets one entry per child field for the requested locale.
#[derive(Debug)]
pub struct LocalizedFieldsKind;

impl LocalizedFieldsKind {
    fn children_for_locale(
        def: &FieldDef,
        value: &Value,
        ctx: &FormatContext<'_>,
    ) -> Result<IndexMap<String, Value>> {
        let locale_values = value.get(ctx.locale);
        let mut merged = IndexMap::new();
        for child in def.children() {
            let raw = locale_values
                .and_then(|m| m.get(&child.name))
                .cloned()
                .unwrap_or(Value::Null);
            let formatted = match ctx.registry.for_field(child) {
                Some(kind) => kind.format_for_grid(child, &raw, ctx)?.into_value(),
                None => raw,
            };
            merged.insert(child.name.clone(), formatted);
        }
        Ok(merged)
    }
}

impl FieldKind for LocalizedFieldsKind {
    fn id(&self) -> &str {
        ids::LOCALIZEDFIELDS
    }

    fn is_empty(&self, value: &Value) -> bool {
        match value {
            Value::Object(locales) => locales.values().all(|fields| match fields {
                Value::Object(map) => map.values().all(is_blank),
                other => is_blank(other),
            }),
            other => is_blank(other),
        }
    }

    fn format_for_grid(
        &self,
        def: &FieldDef,
        value: &Value,
        ctx: &FormatContext<'_>,
    ) -> Result<GridCell> {
        Ok(GridCell::Merge(Self::children_for_locale(def, value, ctx)?))
    }

    fn format_for_csv(&self, def: &FieldDef, value: &Value, ctx: &FormatContext<'_>) -> Result<String> {
        let merged = Self::children_for_locale(def, value, ctx)?;
        Ok(Value::Object(merged.into_iter().collect()).to_string())
    }
}

/// Structural containers (bricks, classification stores) shown raw.
#[derive(Debug)]
pub struct ContainerKind(&'static str);

impl FieldKind for ContainerKind {
    fn id(&self) -> &str {
        self.0
    }

    fn is_empty(&self, value: &Value) -> bool {
        is_empty_collection(value)
    }

    fn format_for_csv(&self, _def: &FieldDef, value: &Value, _ctx: &FormatContext<'_>) -> Result<String> {
        Ok(if value.is_null() {
            String::new()
        } else {
            value.to_string()
        })
    }
}
