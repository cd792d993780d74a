//! System columns: values computed from the element itself, never inherited.

use fieldgrid_common::format_bytes;
use fieldgrid_config::GridSettings;
use fieldgrid_fields::{format_timestamp, is_blank, ClassDef};
use serde_json::Value;

use crate::element::{Element, ElementType};
use crate::path::FieldReference;

/// Column names answered from element properties.
pub const SYSTEM_COLUMNS: &[&str] = &[
    "id",
    "type",
    "key",
    "filename",
    "fullpath",
    "path",
    "published",
    "creationDate",
    "modificationDate",
    "classname",
    "size",
    "preview",
];

pub fn is_system_column(name: &str) -> bool {
    SYSTEM_COLUMNS.contains(&name)
}

/// Computes system columns for one row.
#[derive(Debug, Clone, Copy)]
pub struct SystemColumns<'a> {
    settings: &'a GridSettings,
    csv_mode: bool,
}

impl<'a> SystemColumns<'a> {
    pub fn new(settings: &'a GridSettings, csv_mode: bool) -> Self {
        Self { settings, csv_mode }
    }

    /// Value of system column `name`; `None` when `name` is not one.
    pub fn value(&self, element: &Element, class: Option<&ClassDef>, name: &str) -> Option<Value> {
        let value = match name {
            "id" => Value::from(element.id),
            "type" => Value::from(element.element_type.as_str()),
            "key" | "filename" => Value::from(element.key.as_str()),
            "fullpath" => Value::from(element.full_path()),
            "path" => Value::from(element.path.as_str()),
            "published" => self.flag(element.published),
            "creationDate" => self.timestamp(element.creation_date),
            "modificationDate" => self.timestamp(element.modification_date),
            "classname" => class.map_or(Value::Null, |c| Value::from(c.name())),
            "size" => match (element.element_type, element.file_size) {
                (ElementType::Asset, Some(bytes)) => {
                    Value::from(format_bytes(bytes, self.settings.size_precision))
                }
                _ => Value::Null,
            },
            "preview" if element.element_type == ElementType::Asset => {
                Value::from(self.settings.preview_for(element.id))
            }
            "preview" => Value::Null,
            _ => return None,
        };
        Some(value)
    }

    fn flag(&self, on: bool) -> Value {
        if self.csv_mode {
            Value::from(if on { "1" } else { "0" })
        } else {
            Value::Bool(on)
        }
    }

    fn timestamp(&self, ts: Option<i64>) -> Value {
        let Some(ts) = ts else {
            return Value::Null;
        };
        if !self.csv_mode {
            return Value::from(ts);
        }
        format_timestamp(ts, &self.settings.date_format)
            .map(Value::from)
            .unwrap_or(Value::Null)
    }
}

/// System column for `reference`, if it is one. `name~system` always is; a
/// bare name only when no class field or metadata entry shadows it.
pub(crate) fn system_value(
    system: &SystemColumns<'_>,
    element: &Element,
    class: Option<&ClassDef>,
    reference: &FieldReference,
) -> Option<Value> {
    let FieldReference::Plain { name, qualifier } = reference else {
        return None;
    };
    if reference.is_system() {
        return Some(system.value(element, class, name).unwrap_or(Value::Null));
    }
    let shadowed = match class {
        Some(class) => class.locate(name).is_some(),
        None => element.values.get(name).is_some_and(|v| !is_blank(v)),
    };
    if qualifier.is_some() || shadowed || !is_system_column(name) {
        return None;
    }
    system.value(element, class, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn asset() -> Element {
        let mut asset = Element::new(42, ElementType::Asset).with_key("/images/", "chair.jpg");
        asset.file_size = Some(1536);
        asset.published = true;
        asset.creation_date = Some(1_700_000_000);
        asset
    }

    #[rstest]
    #[case("id", json!(42))]
    #[case("type", json!("asset"))]
    #[case("filename", json!("chair.jpg"))]
    #[case("fullpath", json!("/images/chair.jpg"))]
    #[case("path", json!("/images/"))]
    #[case("published", json!(true))]
    #[case("creationDate", json!(1_700_000_000))]
    #[case("modificationDate", Value::Null)]
    #[case("size", json!("1.5 KB"))]
    #[case("preview", json!("/admin/asset/get-image-thumbnail?id=42&treepreview=true"))]
    #[case("classname", Value::Null)]
    fn asset_columns(#[case] name: &str, #[case] expected: Value) {
        let settings = GridSettings::default();
        let columns = SystemColumns::new(&settings, false);
        assert_eq!(columns.value(&asset(), None, name), Some(expected));
    }

    #[test]
    fn csv_mode_formats_dates_and_flags() {
        let settings = GridSettings::default();
        let columns = SystemColumns::new(&settings, true);
        assert_eq!(
            columns.value(&asset(), None, "creationDate"),
            Some(json!("2023-11-14 22:13"))
        );
        assert_eq!(columns.value(&asset(), None, "published"), Some(json!("1")));
    }

    #[test]
    fn object_columns() {
        let settings = GridSettings::default();
        let columns = SystemColumns::new(&settings, false);
        let class = ClassDef::new("product", "Product", true, vec![]);
        let object = Element::object(5, "product");
        assert_eq!(columns.value(&object, Some(&class), "classname"), Some(json!("Product")));
        assert_eq!(columns.value(&object, Some(&class), "size"), Some(Value::Null));
        assert_eq!(columns.value(&object, Some(&class), "preview"), Some(Value::Null));
        assert_eq!(columns.value(&object, Some(&class), "title"), None);
    }

    #[test]
    fn system_keys_and_shadowing() {
        let settings = GridSettings::default();
        let columns = SystemColumns::new(&settings, false);
        let class = ClassDef::new(
            "product",
            "Product",
            true,
            vec![fieldgrid_fields::FieldDef::new("key", fieldgrid_fields::FieldType::Input)],
        );
        let object = Element::object(5, "product").with_key("/", "chair");
        let parse = crate::path::parse;

        assert_eq!(system_value(&columns, &object, Some(&class), &parse("id")), Some(json!(5)));
        assert_eq!(system_value(&columns, &object, Some(&class), &parse("key")), None);
        assert_eq!(
            system_value(&columns, &object, Some(&class), &parse("key~system")),
            Some(json!("chair"))
        );
        assert_eq!(
            system_value(&columns, &object, Some(&class), &parse("bogus~system")),
            Some(Value::Null)
        );
        assert_eq!(system_value(&columns, &object, Some(&class), &parse("id~de")), None);

        let asset = asset().with_value("size", json!("large"));
        assert_eq!(system_value(&columns, &asset, None, &parse("size")), None);
        assert_eq!(
            system_value(&columns, &asset, None, &parse("filename")),
            Some(json!("chair.jpg"))
        );
    }
}
