//! The element model: content nodes and their locally-set values.
//!
//! Elements are read-only inputs. Object field values live in `values`,
//! including localized-fields containers, whose raw value has the shape
//! `{locale: {field: value}}`. Bricks and classification stores carry their
//! own nested maps.

use fieldgrid_common::constants::DEFAULT_STORE_LOCALE;
use fieldgrid_fields::is_blank;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identity of an element.
pub type ElementId = i64;

/// Type tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Object,
    Variant,
    Folder,
    Asset,
    Document,
}

impl ElementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementType::Object => "object",
            ElementType::Variant => "variant",
            ElementType::Folder => "folder",
            ElementType::Asset => "asset",
            ElementType::Document => "document",
        }
    }

    /// Objects and variants carry a class definition and may inherit.
    pub fn is_object_like(&self) -> bool {
        matches!(self, ElementType::Object | ElementType::Variant)
    }
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed sub-object attached under an objectbricks container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Brick {
    values: IndexMap<String, Value>,
}

impl Brick {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    /// Raw value of a brick field; `None` when the brick never set it.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.values.get(field)
    }
}

/// Key/value sub-store addressed by `(group, key, locale)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassificationStore {
    groups: IndexMap<u64, IndexMap<u64, IndexMap<String, Value>>>,
}

impl ClassificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(
        mut self,
        group_id: u64,
        key_id: u64,
        locale: impl Into<String>,
        value: Value,
    ) -> Self {
        self.groups
            .entry(group_id)
            .or_default()
            .entry(key_id)
            .or_default()
            .insert(locale.into(), value);
        self
    }

    /// Value of `(group, key)` in `locale`.
    ///
    /// With `fallback`, a missing or blank value in `locale` is looked up
    /// again in the `default` locale. A key absent in every locale is `None`.
    ///
    /// The store only holds raw values, so there is no raw/formatted switch:
    /// formatting through the key's kind happens in
    /// [`ClassificationStoreResolver`](crate::ClassificationStoreResolver).
    pub fn get_localized_key_value(
        &self,
        group_id: u64,
        key_id: u64,
        locale: &str,
        fallback: bool,
    ) -> Option<Value> {
        let locales = self.groups.get(&group_id)?.get(&key_id)?;
        match locales.get(locale) {
            Some(value) if !is_blank(value) => Some(value.clone()),
            found if fallback && locale != DEFAULT_STORE_LOCALE => locales
                .get(DEFAULT_STORE_LOCALE)
                .or(found)
                .cloned(),
            found => found.cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// A content node: document, asset, folder, object or variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub id: ElementId,
    #[serde(default)]
    pub parent_id: Option<ElementId>,
    #[serde(rename = "type")]
    pub element_type: ElementType,
    /// Class of objects and variants.
    #[serde(default)]
    pub class_id: Option<String>,
    /// Path of the parent, ending in `/`.
    #[serde(default = "root_path")]
    pub path: String,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub creation_date: Option<i64>,
    #[serde(default)]
    pub modification_date: Option<i64>,
    /// Size in bytes, assets only.
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Object field values, or language-neutral metadata of other elements.
    #[serde(default)]
    pub values: IndexMap<String, Value>,
    /// Per-language metadata of assets and documents: `{lang: {name: value}}`.
    #[serde(default)]
    pub localized: IndexMap<String, IndexMap<String, Value>>,
    /// Bricks by container field, then by brick type.
    #[serde(default)]
    pub bricks: IndexMap<String, IndexMap<String, Brick>>,
    /// Classification stores by field name.
    #[serde(default)]
    pub stores: IndexMap<String, ClassificationStore>,
}

fn root_path() -> String {
    "/".to_string()
}

impl Element {
    pub fn new(id: ElementId, element_type: ElementType) -> Self {
        Self {
            id,
            parent_id: None,
            element_type,
            class_id: None,
            path: root_path(),
            key: String::new(),
            published: false,
            creation_date: None,
            modification_date: None,
            file_size: None,
            mime_type: None,
            values: IndexMap::new(),
            localized: IndexMap::new(),
            bricks: IndexMap::new(),
            stores: IndexMap::new(),
        }
    }

    /// An object of `class_id`.
    pub fn object(id: ElementId, class_id: impl Into<String>) -> Self {
        let mut element = Self::new(id, ElementType::Object);
        element.class_id = Some(class_id.into());
        element
    }

    pub fn with_parent(mut self, parent_id: ElementId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn with_key(mut self, path: impl Into<String>, key: impl Into<String>) -> Self {
        self.path = path.into();
        self.key = key.into();
        self
    }

    pub fn with_value(mut self, field: impl Into<String>, value: Value) -> Self {
        self.values.insert(field.into(), value);
        self
    }

    pub fn with_localized(
        mut self,
        locale: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> Self {
        self.localized
            .entry(locale.into())
            .or_default()
            .insert(name.into(), value);
        self
    }

    pub fn with_brick(
        mut self,
        container: impl Into<String>,
        brick_type: impl Into<String>,
        brick: Brick,
    ) -> Self {
        self.bricks
            .entry(container.into())
            .or_default()
            .insert(brick_type.into(), brick);
        self
    }

    pub fn with_store(mut self, field: impl Into<String>, store: ClassificationStore) -> Self {
        self.stores.insert(field.into(), store);
        self
    }

    /// Path plus key, e.g. `/products/chair`.
    pub fn full_path(&self) -> String {
        if self.key.is_empty() {
            return self.path.clone();
        }
        if self.path.ends_with('/') {
            format!("{}{}", self.path, self.key)
        } else {
            format!("{}/{}", self.path, self.key)
        }
    }

    /// Raw value of a top-level field; `Null` when unset.
    pub fn value(&self, field: &str) -> Value {
        self.values.get(field).cloned().unwrap_or(Value::Null)
    }

    /// The brick of `brick_type` under `container`, if present.
    pub fn brick(&self, container: &str, brick_type: &str) -> Option<&Brick> {
        self.bricks.get(container)?.get(brick_type)
    }

    pub fn store(&self, field: &str) -> Option<&ClassificationStore> {
        self.stores.get(field)
    }

    /// Localized metadata of a non-object element, falling back to the
    /// language-neutral entry.
    pub fn metadata(&self, name: &str, language: Option<&str>) -> Value {
        language
            .and_then(|lang| self.localized.get(lang))
            .and_then(|entries| entries.get(name))
            .filter(|v| !is_blank(v))
            .or_else(|| self.values.get(name))
            .cloned()
            .unwrap_or(Value::Null)
    }
}

/// Value of `field` inside a localized container's raw `{locale: {field: value}}` map.
pub(crate) fn localized_value(container: &Value, locale: &str, field: &str) -> Value {
    container
        .get(locale)
        .and_then(|fields| fields.get(field))
        .cloned()
        .unwrap_or(Value::Null)
}
