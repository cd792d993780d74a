//! InheritanceResolver: a field's effective value along the parent chain.
//!
//! An object whose class allows inheritance and whose local value is empty
//! takes the value of its closest inheritable ancestor that has one. The
//! walk is iterative and stops at the first non-empty value or when no
//! inheritable parent remains.

use std::collections::HashSet;
use std::sync::Arc;

use fieldgrid_fields::{
    is_blank, BrickDef, ClassDef, FieldDef, FieldKind, FieldKindRegistry, FieldType,
};
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::element::{localized_value, Element, ElementId, ElementType};
use crate::path::{BrickRef, FieldReference};
use crate::repository::ElementRepository;

/// The effective value of one field for one element.
#[derive(Debug, Clone)]
pub struct ResolvedValue {
    pub value: Value,
    /// Element the value was requested for.
    pub requested_element_id: ElementId,
    /// Element that supplied the value.
    pub owner_element_id: ElementId,
    pub definition: Option<FieldDef>,
    /// `None` when no definition was found or no kind is registered for it.
    pub kind: Option<Arc<dyn FieldKind>>,
    pub is_empty: bool,
    /// The field lives inside a localized-fields container.
    pub localized: bool,
}

impl ResolvedValue {
    /// An empty value owned by the requesting element.
    pub fn empty(element_id: ElementId) -> Self {
        Self {
            value: Value::Null,
            requested_element_id: element_id,
            owner_element_id: element_id,
            definition: None,
            kind: None,
            is_empty: true,
            localized: false,
        }
    }

    pub fn inherited(&self) -> bool {
        self.owner_element_id != self.requested_element_id
    }
}

/// Emptiness per the field's kind; blank when no kind is known.
pub(crate) fn kind_is_empty(kind: Option<&Arc<dyn FieldKind>>, value: &Value) -> bool {
    match kind {
        Some(kind) => kind.is_empty(value),
        None => is_blank(value),
    }
}

/// Successive ancestors values are inherited from: objects or variants of
/// the element's class. Folders are skipped; anything else ends the walk.
pub(crate) struct InheritableParents<'r> {
    repository: &'r dyn ElementRepository,
    class_id: Option<String>,
    current: ElementId,
    seen: HashSet<ElementId>,
    done: bool,
}

pub(crate) fn inheritable_parents<'r>(
    repository: &'r dyn ElementRepository,
    element: &Element,
) -> InheritableParents<'r> {
    InheritableParents {
        repository,
        class_id: element.class_id.clone(),
        current: element.id,
        seen: HashSet::from([element.id]),
        done: false,
    }
}

impl Iterator for InheritableParents<'_> {
    type Item = Arc<Element>;

    fn next(&mut self) -> Option<Arc<Element>> {
        if self.done {
            return None;
        }
        let mut cursor = self.repository.get_parent(self.current);
        while let Some(parent) = cursor {
            if !self.seen.insert(parent.id) {
                warn!(element = self.current, parent = parent.id, "parent cycle, stopping inheritance");
                break;
            }
            match parent.element_type {
                ElementType::Folder => cursor = self.repository.get_parent(parent.id),
                t if t.is_object_like() && parent.class_id == self.class_id => {
                    self.current = parent.id;
                    return Some(parent);
                }
                _ => break,
            }
        }
        self.done = true;
        None
    }
}

/// How a resolved definition reads its raw value from an element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Accessor {
    Field(String),
    Localized { container: String, field: String },
    Brick { container: String, brick_type: String, field: String },
    BrickLocalized {
        container: String,
        brick_type: String,
        inner: String,
        field: String,
    },
    /// Defined, but not readable on this side (reverse relations).
    None,
}

impl Accessor {
    fn read(&self, element: &Element, locale: &str) -> Value {
        match self {
            Accessor::Field(name) => element.value(name),
            Accessor::Localized { container, field } => {
                localized_value(&element.value(container), locale, field)
            }
            Accessor::Brick {
                container,
                brick_type,
                field,
            } => element
                .brick(container, brick_type)
                .and_then(|brick| brick.get(field))
                .cloned()
                .unwrap_or(Value::Null),
            Accessor::BrickLocalized {
                container,
                brick_type,
                inner,
                field,
            } => element
                .brick(container, brick_type)
                .and_then(|brick| brick.get(inner))
                .map(|values| localized_value(values, locale, field))
                .unwrap_or(Value::Null),
            Accessor::None => Value::Null,
        }
    }
}

/// A field definition located for a reference.
struct Target {
    def: FieldDef,
    accessor: Accessor,
    localized: bool,
}

/// Resolves plain and brick references, walking parents for empty values.
pub struct InheritanceResolver<'a> {
    repository: &'a dyn ElementRepository,
    kinds: &'a FieldKindRegistry,
}

impl<'a> InheritanceResolver<'a> {
    pub fn new(repository: &'a dyn ElementRepository, kinds: &'a FieldKindRegistry) -> Self {
        Self { repository, kinds }
    }

    /// Effective value of `reference` on `element` in `locale`.
    ///
    /// A language hint on the reference overrides `locale`. Store
    /// coordinates are not handled here and resolve empty.
    pub fn resolve(&self, element: &Element, reference: &FieldReference, locale: &str) -> ResolvedValue {
        let locale = reference.language().unwrap_or(locale);

        let Some(class) = self.repository.get_class_definition(element) else {
            return self.resolve_metadata(element, reference, locale);
        };

        let Some(target) = self.locate(&class, reference) else {
            debug!(element = element.id, key = %reference, class = class.id(), "no field definition");
            return ResolvedValue::empty(element.id);
        };
        let kind = self.kinds.for_field(&target.def);

        let local = target.accessor.read(element, locale);
        let mut owner = element.id;
        let mut value = local.clone();
        let has_accessor = target.accessor != Accessor::None;

        if has_accessor && class.allow_inherit() && kind_is_empty(kind.as_ref(), &local) {
            for parent in inheritable_parents(self.repository, element) {
                let candidate = target.accessor.read(&parent, locale);
                if !kind_is_empty(kind.as_ref(), &candidate) {
                    trace!(element = element.id, owner = parent.id, key = %reference, "inherited");
                    owner = parent.id;
                    value = candidate;
                    break;
                }
            }
        }

        let is_empty = kind_is_empty(kind.as_ref(), &value);
        ResolvedValue {
            value,
            requested_element_id: element.id,
            owner_element_id: owner,
            definition: Some(target.def),
            kind,
            is_empty,
            localized: target.localized,
        }
    }

    fn locate(&self, class: &ClassDef, reference: &FieldReference) -> Option<Target> {
        match reference {
            FieldReference::Plain { name, .. } => {
                let slot = class.locate(name)?;
                let accessor = match slot.container {
                    _ if !slot.def.has_accessor() => Accessor::None,
                    Some(container) => Accessor::Localized {
                        container: container.name.clone(),
                        field: slot.def.name.clone(),
                    },
                    None => Accessor::Field(slot.def.name.clone()),
                };
                Some(Target {
                    def: slot.def.clone(),
                    accessor,
                    localized: slot.is_localized(),
                })
            }
            FieldReference::Brick(brick) => self.locate_brick(class, brick),
            FieldReference::Store { .. } => None,
        }
    }

    fn locate_brick(&self, class: &ClassDef, brick: &BrickRef) -> Option<Target> {
        let container = brick_container(class, brick)?;
        let definition = self.repository.get_brick_definition(&brick.brick_type)?;
        let field = brick.field_name();

        if let Some(inner) = brick.inner_container() {
            let def = definition.inner_field(inner, field)?;
            return Some(Target {
                def: def.clone(),
                accessor: Accessor::BrickLocalized {
                    container,
                    brick_type: brick.brick_type.clone(),
                    inner: inner.to_string(),
                    field: field.to_string(),
                },
                localized: true,
            });
        }

        if let Some(def) = definition.field(field) {
            return Some(Target {
                def: def.clone(),
                accessor: Accessor::Brick {
                    container,
                    brick_type: brick.brick_type.clone(),
                    field: field.to_string(),
                },
                localized: false,
            });
        }

        let (inner, def) = brick_localized_field(&definition, field)?;
        Some(Target {
            def: def.clone(),
            accessor: Accessor::BrickLocalized {
                container,
                brick_type: brick.brick_type.clone(),
                inner: inner.to_string(),
                field: field.to_string(),
            },
            localized: true,
        })
    }

    /// Assets, documents and folders: metadata without inheritance.
    fn resolve_metadata(&self, element: &Element, reference: &FieldReference, locale: &str) -> ResolvedValue {
        if element.element_type.is_object_like() {
            debug!(element = element.id, class = ?element.class_id, "no class definition");
            return ResolvedValue::empty(element.id);
        }
        let FieldReference::Plain { name, .. } = reference else {
            return ResolvedValue::empty(element.id);
        };
        let value = element.metadata(name, Some(locale));
        ResolvedValue {
            is_empty: is_blank(&value),
            value,
            ..ResolvedValue::empty(element.id)
        }
    }
}

/// Objectbricks container for a brick reference: the descriptor's
/// `fieldname` when it accepts the type, else the first container that does.
fn brick_container(class: &ClassDef, brick: &BrickRef) -> Option<String> {
    let named = brick
        .descriptor
        .as_ref()
        .and_then(|d| d.fieldname.as_deref())
        .and_then(|name| class.field(name))
        .filter(|def| match &def.type_ {
            FieldType::Objectbricks { allowed_types } => {
                allowed_types.iter().any(|t| *t == brick.brick_type)
            }
            _ => false,
        });
    named
        .or_else(|| class.brick_container_for(&brick.brick_type))
        .map(|def| def.name.clone())
}

/// A brick field that lives in one of the brick's localized containers.
fn brick_localized_field<'b>(brick: &'b BrickDef, field: &str) -> Option<(&'b str, &'b FieldDef)> {
    brick
        .fields
        .iter()
        .filter(|f| f.is_localized_container())
        .find_map(|container| container.child(field).map(|def| (container.name.as_str(), def)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Brick;
    use crate::repository::MemoryRepository;
    use fieldgrid_fields::{SchemaContext, SchemaDefaults};
    use serde_json::json;

    fn schema(allow_inherit: bool) -> SchemaContext {
        SchemaContext::from_defaults(
            SchemaDefaults::new()
                .class(ClassDef::new(
                    "product",
                    "Product",
                    allow_inherit,
                    vec![
                        FieldDef::new("title", FieldType::Input),
                        FieldDef::new("price", FieldType::Numeric { decimal_precision: Some(2) }),
                        FieldDef::new(
                            "localizedfields",
                            FieldType::Localizedfields {
                                children: vec![FieldDef::new("description", FieldType::Textarea)],
                            },
                        ),
                        FieldDef::new(
                            "bricks",
                            FieldType::Objectbricks {
                                allowed_types: vec!["dimensions".into()],
                            },
                        ),
                        FieldDef::new(
                            "vendors",
                            FieldType::ReverseRelation {
                                owner_class: "vendor".into(),
                                owner_field: "products".into(),
                            },
                        ),
                    ],
                ))
                .class(ClassDef::new(
                    "category",
                    "Category",
                    true,
                    vec![FieldDef::new("title", FieldType::Input)],
                ))
                .brick(BrickDef {
                    key: "dimensions".into(),
                    title: None,
                    fields: vec![
                        FieldDef::new("width", FieldType::Numeric { decimal_precision: None }),
                        FieldDef::new(
                            "localizedfields",
                            FieldType::Localizedfields {
                                children: vec![FieldDef::new("note", FieldType::Input)],
                            },
                        ),
                    ],
                }),
        )
    }

    fn repository(allow_inherit: bool, elements: Vec<Element>) -> MemoryRepository {
        MemoryRepository::new(Arc::new(schema(allow_inherit))).with_elements(elements)
    }

    fn resolve(repo: &MemoryRepository, id: ElementId, key: &str, locale: &str) -> ResolvedValue {
        let kinds = FieldKindRegistry::with_builtin();
        let element = repo.get(id).unwrap();
        InheritanceResolver::new(repo, &kinds).resolve(&element, &crate::path::parse(key), locale)
    }

    #[test]
    fn local_value_wins() {
        let repo = repository(
            true,
            vec![
                Element::object(2, "product").with_value("title", json!("Parent")),
                Element::object(5, "product").with_parent(2).with_value("title", json!("Own")),
            ],
        );
        let resolved = resolve(&repo, 5, "title", "en");
        assert_eq!(resolved.value, json!("Own"));
        assert_eq!(resolved.owner_element_id, 5);
        assert!(!resolved.inherited());
    }

    #[test]
    fn empty_value_inherits_from_parent() {
        let repo = repository(
            true,
            vec![
                Element::object(2, "product").with_value("title", json!("Parent Title")),
                Element::object(5, "product").with_parent(2).with_value("title", json!("")),
            ],
        );
        let resolved = resolve(&repo, 5, "title", "en");
        assert_eq!(resolved.value, json!("Parent Title"));
        assert_eq!(resolved.owner_element_id, 2);
        assert!(!resolved.is_empty);
        assert!(resolved.inherited());
    }

    #[test]
    fn walk_skips_empty_ancestors_and_folders() {
        let repo = repository(
            true,
            vec![
                Element::object(1, "product").with_value("title", json!("Root")),
                Element::object(2, "product").with_parent(1).with_value("title", json!("Grand")),
                Element::new(3, ElementType::Folder).with_parent(2),
                Element::object(4, "product").with_parent(3),
                Element::object(5, "product").with_parent(4).with_value("title", json!("")),
            ],
        );
        let resolved = resolve(&repo, 5, "title", "en");
        assert_eq!(resolved.value, json!("Grand"));
        assert_eq!(resolved.owner_element_id, 2);
    }

    #[test]
    fn other_class_ends_the_walk() {
        let repo = repository(
            true,
            vec![
                Element::object(1, "product").with_value("title", json!("Far")),
                Element::object(2, "category").with_parent(1).with_value("title", json!("Cat")),
                Element::object(5, "product").with_parent(2),
            ],
        );
        let resolved = resolve(&repo, 5, "title", "en");
        assert_eq!(resolved.value, Value::Null);
        assert_eq!(resolved.owner_element_id, 5);
        assert!(resolved.is_empty);
    }

    #[test]
    fn non_inheritable_class_does_not_walk() {
        let repo = repository(
            false,
            vec![
                Element::object(2, "product").with_value("title", json!("Parent")),
                Element::object(5, "product").with_parent(2).with_value("title", json!("")),
            ],
        );
        let resolved = resolve(&repo, 5, "title", "en");
        assert_eq!(resolved.value, json!(""));
        assert_eq!(resolved.owner_element_id, 5);
        assert!(resolved.is_empty);
    }

    #[test]
    fn exhausted_chain_keeps_own_value() {
        let repo = repository(
            true,
            vec![
                Element::object(2, "product").with_value("title", json!("")),
                Element::object(5, "product").with_parent(2).with_value("title", json!("")),
            ],
        );
        let resolved = resolve(&repo, 5, "title", "en");
        assert_eq!(resolved.value, json!(""));
        assert_eq!(resolved.owner_element_id, 5);
    }

    #[test]
    fn zero_is_not_empty() {
        let repo = repository(
            true,
            vec![
                Element::object(2, "product").with_value("price", json!(10)),
                Element::object(5, "product").with_parent(2).with_value("price", json!(0)),
            ],
        );
        assert_eq!(resolve(&repo, 5, "price", "en").value, json!(0));
    }

    #[test]
    fn localized_field_per_locale() {
        let repo = repository(
            true,
            vec![
                Element::object(2, "product").with_value(
                    "localizedfields",
                    json!({"de": {"description": "Elternteil"}, "en": {"description": "Parent"}}),
                ),
                Element::object(5, "product").with_parent(2).with_value(
                    "localizedfields",
                    json!({"de": {"description": "Eigen"}}),
                ),
            ],
        );
        let de = resolve(&repo, 5, "description~de", "en");
        assert_eq!(de.value, json!("Eigen"));
        assert!(de.localized);
        assert!(!de.inherited());

        let en = resolve(&repo, 5, "description", "en");
        assert_eq!(en.value, json!("Parent"));
        assert_eq!(en.owner_element_id, 2);
    }

    #[test]
    fn brick_fields() {
        let repo = repository(
            true,
            vec![
                Element::object(2, "product").with_brick(
                    "bricks",
                    "dimensions",
                    Brick::new().with_value("width", json!(40)),
                ),
                Element::object(5, "product").with_parent(2).with_brick(
                    "bricks",
                    "dimensions",
                    Brick::new().with_value("localizedfields", json!({"en": {"note": "narrow"}})),
                ),
            ],
        );
        let width = resolve(&repo, 5, "dimensions~width", "en");
        assert_eq!(width.value, json!(40));
        assert_eq!(width.owner_element_id, 2);

        let note = resolve(&repo, 5, "dimensions~note", "en");
        assert_eq!(note.value, json!("narrow"));
        assert!(note.localized);

        let descriptor = r#"?{"containerKey":"dimensions","fieldname":"bricks","brickfield":"note"}~note"#;
        assert_eq!(resolve(&repo, 5, descriptor, "en").value, json!("narrow"));
    }

    #[test]
    fn missing_brick_is_empty() {
        let repo = repository(true, vec![Element::object(5, "product")]);
        let resolved = resolve(&repo, 5, "dimensions~width", "en");
        assert!(resolved.is_empty);
        assert!(resolved.definition.is_some());
        assert!(resolve(&repo, 5, "colors~width", "en").definition.is_none());
    }

    #[test]
    fn schema_drift_is_empty() {
        let repo = repository(true, vec![Element::object(5, "product")]);
        let resolved = resolve(&repo, 5, "discontinued", "en");
        assert!(resolved.is_empty);
        assert!(resolved.definition.is_none());
        assert_eq!(resolved.owner_element_id, 5);
    }

    #[test]
    fn reverse_relation_has_no_value() {
        let repo = repository(
            true,
            vec![
                Element::object(2, "product").with_value("vendors", json!([1])),
                Element::object(5, "product").with_parent(2).with_value("vendors", json!([1])),
            ],
        );
        let resolved = resolve(&repo, 5, "vendors", "en");
        assert_eq!(resolved.value, Value::Null);
        assert_eq!(resolved.owner_element_id, 5);
    }

    #[test]
    fn assets_read_metadata() {
        let repo = repository(
            true,
            vec![
                Element::new(1, ElementType::Asset)
                    .with_value("alt", json!("Chair"))
                    .with_localized("de", "alt", json!("Stuhl")),
                Element::new(9, ElementType::Asset)
                    .with_parent(1)
                    .with_value("caption", json!("")),
            ],
        );
        assert_eq!(resolve(&repo, 1, "alt~de", "en").value, json!("Stuhl"));
        assert_eq!(resolve(&repo, 1, "alt", "de").value, json!("Stuhl"));
        assert_eq!(resolve(&repo, 1, "alt", "fr").value, json!("Chair"));
        let caption = resolve(&repo, 9, "caption", "en");
        assert!(caption.is_empty);
        assert_eq!(caption.owner_element_id, 9);
    }

    #[test]
    fn parent_cycle_stops() {
        let repo = repository(
            true,
            vec![
                Element::object(2, "product").with_parent(5),
                Element::object(5, "product").with_parent(2),
            ],
        );
        let resolved = resolve(&repo, 5, "title", "en");
        assert!(resolved.is_empty);
        assert_eq!(resolved.owner_element_id, 5);
    }
}
