//! Core schema types for the registry.
//!
//! All types serialize to/from YAML via serde. Field definitions describe
//! named, typed attributes. Class definitions list the fields of one object
//! class; brick definitions list the fields of one brick type; store key
//! definitions describe a single key of a classification store.

use std::collections::HashMap;

use fieldgrid_common::constants::LOCALIZED_CONTAINER;
use serde::{Deserialize, Serialize};

use crate::kinds::ids;

/// A single option in a select or multi-select field.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default)]
    pub order: i32,
}

/// The type of a field: determines what shape the value takes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FieldType {
    Input,
    Textarea,
    Wysiwyg,
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        decimal_precision: Option<usize>,
    },
    Checkbox,
    Date,
    Datetime,
    Select {
        #[serde(default)]
        options: Vec<SelectOption>,
        /// Name of a dynamic options provider; its options are emitted next to the value.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        options_provider: Option<String>,
    },
    Multiselect {
        #[serde(default)]
        options: Vec<SelectOption>,
    },
    ManyToOneRelation,
    ManyToManyRelation,
    /// Owned by another class; readable only from the owning side.
    ReverseRelation { owner_class: String, owner_field: String },
    /// Per-locale container of child fields.
    Localizedfields {
        #[serde(default)]
        children: Vec<FieldDef>,
    },
    /// Container of typed bricks.
    Objectbricks {
        #[serde(default)]
        allowed_types: Vec<String>,
    },
    Classificationstore {
        #[serde(default)]
        localized: bool,
    },
}

impl FieldType {
    /// Identifier of the [`FieldKind`](crate::FieldKind) handling this type.
    pub fn kind_id(&self) -> &'static str {
        match self {
            FieldType::Input => ids::INPUT,
            FieldType::Textarea => ids::TEXTAREA,
            FieldType::Wysiwyg => ids::WYSIWYG,
            FieldType::Numeric { .. } => ids::NUMERIC,
            FieldType::Checkbox => ids::CHECKBOX,
            FieldType::Date => ids::DATE,
            FieldType::Datetime => ids::DATETIME,
            FieldType::Select { .. } => ids::SELECT,
            FieldType::Multiselect { .. } => ids::MULTISELECT,
            FieldType::ManyToOneRelation => ids::MANY_TO_ONE_RELATION,
            FieldType::ManyToManyRelation => ids::MANY_TO_MANY_RELATION,
            FieldType::ReverseRelation { .. } => ids::REVERSE_RELATION,
            FieldType::Localizedfields { .. } => ids::LOCALIZEDFIELDS,
            FieldType::Objectbricks { .. } => ids::OBJECTBRICKS,
            FieldType::Classificationstore { .. } => ids::CLASSIFICATIONSTORE,
        }
    }
}

/// A field definition: the complete schema for a single named attribute.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub type_: FieldType,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, type_: FieldType) -> Self {
        Self {
            name: name.into(),
            title: None,
            type_,
        }
    }

    pub fn kind_id(&self) -> &'static str {
        self.type_.kind_id()
    }

    /// Whether elements expose a readable value for this field.
    /// Reverse relations live on the owning class and have no accessor here.
    pub fn has_accessor(&self) -> bool {
        !matches!(self.type_, FieldType::ReverseRelation { .. })
    }

    pub fn is_localized_container(&self) -> bool {
        matches!(self.type_, FieldType::Localizedfields { .. })
    }

    /// Child definitions of a localized-fields container; empty for anything else.
    pub fn children(&self) -> &[FieldDef] {
        match &self.type_ {
            FieldType::Localizedfields { children } => children,
            _ => &[],
        }
    }

    pub fn child(&self, name: &str) -> Option<&FieldDef> {
        self.children().iter().find(|c| c.name == name)
    }
}

/// Where a field name points inside a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldLocation {
    TopLevel(usize),
    Localized { container: usize, child: usize },
}

/// A located field: its definition and, when it lives inside the
/// localized-fields container, that container's definition.
#[derive(Debug, Clone, Copy)]
pub struct FieldSlot<'a> {
    pub def: &'a FieldDef,
    pub container: Option<&'a FieldDef>,
}

impl FieldSlot<'_> {
    pub fn is_localized(&self) -> bool {
        self.container.is_some()
    }
}

/// On-disk shape of a class definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ClassDefFile {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    allow_inherit: bool,
    #[serde(default)]
    fields: Vec<FieldDef>,
}

/// A class definition with a name index built once at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ClassDefFile", into = "ClassDefFile")]
pub struct ClassDef {
    id: String,
    name: String,
    allow_inherit: bool,
    fields: Vec<FieldDef>,
    index: HashMap<String, FieldLocation>,
}

impl From<ClassDefFile> for ClassDef {
    fn from(file: ClassDefFile) -> Self {
        let name = file.name.unwrap_or_else(|| file.id.clone());
        ClassDef::new(file.id, name, file.allow_inherit, file.fields)
    }
}

impl From<ClassDef> for ClassDefFile {
    fn from(def: ClassDef) -> Self {
        Self {
            name: (def.name != def.id).then_some(def.name),
            id: def.id,
            allow_inherit: def.allow_inherit,
            fields: def.fields,
        }
    }
}

impl ClassDef {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        allow_inherit: bool,
        fields: Vec<FieldDef>,
    ) -> Self {
        let index = build_index(&fields);
        Self {
            id: id.into(),
            name: name.into(),
            allow_inherit,
            fields,
            index,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether empty values are inherited from parent objects of this class.
    pub fn allow_inherit(&self) -> bool {
        self.allow_inherit
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Top-level field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        match self.index.get(name)? {
            FieldLocation::TopLevel(i) => Some(&self.fields[*i]),
            FieldLocation::Localized { .. } => None,
        }
    }

    /// Locate a field at top level first, then inside the localized-fields container.
    pub fn locate(&self, name: &str) -> Option<FieldSlot<'_>> {
        match *self.index.get(name)? {
            FieldLocation::TopLevel(i) => Some(FieldSlot {
                def: &self.fields[i],
                container: None,
            }),
            FieldLocation::Localized { container, child } => {
                let container = &self.fields[container];
                Some(FieldSlot {
                    def: &container.children()[child],
                    container: Some(container),
                })
            }
        }
    }

    /// The class's localized-fields container, if any.
    pub fn localized_container(&self) -> Option<&FieldDef> {
        self.field(LOCALIZED_CONTAINER)
            .filter(|f| f.is_localized_container())
            .or_else(|| self.fields.iter().find(|f| f.is_localized_container()))
    }

    /// The objectbricks container that accepts `brick_type`.
    pub fn brick_container_for(&self, brick_type: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| match &f.type_ {
            FieldType::Objectbricks { allowed_types } => {
                allowed_types.iter().any(|t| t == brick_type)
            }
            _ => false,
        })
    }
}

fn build_index(fields: &[FieldDef]) -> HashMap<String, FieldLocation> {
    let mut index = HashMap::new();
    for (i, field) in fields.iter().enumerate() {
        index.insert(field.name.clone(), FieldLocation::TopLevel(i));
        for (c, child) in field.children().iter().enumerate() {
            index
                .entry(child.name.clone())
                .or_insert(FieldLocation::Localized {
                    container: i,
                    child: c,
                });
        }
    }
    index
}

/// A brick definition: the fields carried by one brick type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrickDef {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl BrickDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// A field inside the brick's own localized container `container`.
    pub fn inner_field(&self, container: &str, name: &str) -> Option<&FieldDef> {
        self.field(container)
            .filter(|c| c.is_localized_container())
            .and_then(|c| c.child(name))
    }
}

/// Definition of one classification-store key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreKeyDef {
    pub id: u64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_: FieldType,
}

impl StoreKeyDef {
    /// The key viewed as a field definition, for kind lookup and formatting.
    pub fn as_field_def(&self) -> FieldDef {
        FieldDef::new(self.name.clone(), self.type_.clone())
    }
}
