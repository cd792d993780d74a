//! ClassificationStoreResolver: values addressed by `(store field, group, key)`.
//!
//! The resolver picks the locale (a non-localized store always reads
//! `default`), reads the value with default-locale fallback, and formats it
//! through the kind of the store key's declared type.

use std::sync::Arc;

use fieldgrid_common::constants::DEFAULT_STORE_LOCALE;
use fieldgrid_fields::{
    csv_text, ClassDef, FieldDef, FieldKind, FieldKindRegistry, FieldType, FormatContext, Result,
};
use serde_json::Value;
use tracing::{debug, trace};

use crate::element::Element;
use crate::inheritance::{inheritable_parents, kind_is_empty, ResolvedValue};
use crate::path::StoreCoordinate;
use crate::repository::ElementRepository;

pub struct ClassificationStoreResolver<'a> {
    repository: &'a dyn ElementRepository,
    kinds: &'a FieldKindRegistry,
}

impl<'a> ClassificationStoreResolver<'a> {
    pub fn new(repository: &'a dyn ElementRepository, kinds: &'a FieldKindRegistry) -> Self {
        Self { repository, kinds }
    }

    /// Raw value at `coordinate`, or `Null` when the element has no such
    /// store field or the key is absent in every locale.
    pub fn resolve(&self, element: &Element, coordinate: StoreCoordinate<'_>, requested_locale: &str) -> Value {
        let Some(class) = self.repository.get_class_definition(element) else {
            return Value::Null;
        };
        let Some(localized) = store_localization(&class, coordinate.field) else {
            debug!(element = element.id, field = coordinate.field, "no classification store accessor");
            return Value::Null;
        };
        read(element, coordinate, locale_for(localized, requested_locale))
    }

    /// Like [`resolve`](Self::resolve), but an empty value is taken from the
    /// closest inheritable parent that has one when the class allows it.
    pub fn resolve_inherited(
        &self,
        element: &Element,
        coordinate: StoreCoordinate<'_>,
        requested_locale: &str,
    ) -> ResolvedValue {
        let Some(class) = self.repository.get_class_definition(element) else {
            return ResolvedValue::empty(element.id);
        };
        let Some(localized) = store_localization(&class, coordinate.field) else {
            debug!(element = element.id, field = coordinate.field, "no classification store accessor");
            return ResolvedValue::empty(element.id);
        };
        let locale = locale_for(localized, requested_locale);
        let definition = self.key_definition(coordinate);
        let kind = definition.as_ref().and_then(|def| self.kinds.for_field(def));

        let mut value = read(element, coordinate, locale);
        let mut owner = element.id;
        if class.allow_inherit() && kind_is_empty(kind.as_ref(), &value) {
            for parent in inheritable_parents(self.repository, element) {
                let candidate = read(&parent, coordinate, locale);
                if !kind_is_empty(kind.as_ref(), &candidate) {
                    trace!(element = element.id, owner = parent.id, field = coordinate.field, "inherited store value");
                    owner = parent.id;
                    value = candidate;
                    break;
                }
            }
        }

        ResolvedValue {
            is_empty: kind_is_empty(kind.as_ref(), &value),
            value,
            requested_element_id: element.id,
            owner_element_id: owner,
            definition,
            kind,
            localized,
        }
    }

    /// Store key viewed as a field definition.
    pub fn key_definition(&self, coordinate: StoreCoordinate<'_>) -> Option<FieldDef> {
        self.repository
            .get_store_key(coordinate.key_id)
            .map(|key| key.as_field_def())
    }

    /// Grid value through the key's kind; raw when the key or kind is unknown.
    pub fn format_for_grid(&self, resolved: &ResolvedValue, ctx: &FormatContext<'_>) -> Result<Value> {
        match formatter(resolved) {
            Some((def, kind)) => Ok(kind.format_for_grid(def, &resolved.value, ctx)?.into_value()),
            None => Ok(resolved.value.clone()),
        }
    }

    pub fn format_for_csv(&self, resolved: &ResolvedValue, ctx: &FormatContext<'_>) -> Result<String> {
        match formatter(resolved) {
            Some((def, kind)) => kind.format_for_csv(def, &resolved.value, ctx),
            None => Ok(csv_text(&resolved.value)),
        }
    }
}

fn formatter(resolved: &ResolvedValue) -> Option<(&FieldDef, &Arc<dyn FieldKind>)> {
    Some((resolved.definition.as_ref()?, resolved.kind.as_ref()?))
}

/// Whether `field` is a localized classification store; `None` when the
/// class has no such store field.
fn store_localization(class: &ClassDef, field: &str) -> Option<bool> {
    match &class.field(field)?.type_ {
        FieldType::Classificationstore { localized } => Some(*localized),
        _ => None,
    }
}

fn locale_for(localized: bool, requested: &str) -> &str {
    if localized {
        requested
    } else {
        DEFAULT_STORE_LOCALE
    }
}

fn read(element: &Element, coordinate: StoreCoordinate<'_>, locale: &str) -> Value {
    element
        .store(coordinate.field)
        .and_then(|store| {
            store.get_localized_key_value(coordinate.group_id, coordinate.key_id, locale, true)
        })
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ClassificationStore;
    use crate::repository::MemoryRepository;
    use fieldgrid_fields::{SchemaContext, SchemaDefaults, StoreKeyDef};
    use serde_json::json;

    fn repository(localized: bool, elements: Vec<Element>) -> MemoryRepository {
        let schema = SchemaContext::from_defaults(
            SchemaDefaults::new()
                .class(ClassDef::new(
                    "product",
                    "Product",
                    true,
                    vec![
                        FieldDef::new("attrs", FieldType::Classificationstore { localized }),
                        FieldDef::new("title", FieldType::Input),
                    ],
                ))
                .store_key(StoreKeyDef {
                    id: 17,
                    name: "weight".into(),
                    description: None,
                    type_: FieldType::Numeric { decimal_precision: Some(1) },
                }),
        );
        MemoryRepository::new(Arc::new(schema)).with_elements(elements)
    }

    fn coordinate(field: &str) -> StoreCoordinate<'_> {
        StoreCoordinate {
            field,
            group_id: 3,
            key_id: 17,
        }
    }

    fn ctx(kinds: &FieldKindRegistry) -> FormatContext<'_> {
        FormatContext {
            registry: kinds,
            locale: "de",
            element_id: 5,
            date_format: "%Y-%m-%d",
        }
    }

    #[test]
    fn non_localized_store_ignores_requested_locale() {
        let store = ClassificationStore::new()
            .with_value(3, 17, "default", json!("12"))
            .with_value(3, 17, "fr", json!("99"));
        let repo = repository(false, vec![Element::object(5, "product").with_store("attrs", store)]);
        let kinds = FieldKindRegistry::with_builtin();
        let resolver = ClassificationStoreResolver::new(&repo, &kinds);
        let element = repo.get(5).unwrap();

        let fr = resolver.resolve(&element, coordinate("attrs"), "fr");
        let de = resolver.resolve(&element, coordinate("attrs"), "de");
        assert_eq!(fr, de);
        assert_eq!(fr, json!("12"));
    }

    #[test]
    fn localized_store_reads_requested_locale() {
        let store = ClassificationStore::new()
            .with_value(3, 17, "default", json!("12"))
            .with_value(3, 17, "fr", json!("99"));
        let repo = repository(true, vec![Element::object(5, "product").with_store("attrs", store)]);
        let kinds = FieldKindRegistry::with_builtin();
        let resolver = ClassificationStoreResolver::new(&repo, &kinds);
        let element = repo.get(5).unwrap();

        assert_eq!(resolver.resolve(&element, coordinate("attrs"), "fr"), json!("99"));
        assert_eq!(resolver.resolve(&element, coordinate("attrs"), "de"), json!("12"));
    }

    #[test]
    fn missing_accessor_is_null() {
        let repo = repository(false, vec![Element::object(5, "product")]);
        let kinds = FieldKindRegistry::with_builtin();
        let resolver = ClassificationStoreResolver::new(&repo, &kinds);
        let element = repo.get(5).unwrap();

        assert_eq!(resolver.resolve(&element, coordinate("specs"), "de"), Value::Null);
        assert_eq!(resolver.resolve(&element, coordinate("title"), "de"), Value::Null);
        assert_eq!(resolver.resolve(&element, coordinate("attrs"), "de"), Value::Null);
        let resolved = resolver.resolve_inherited(&element, coordinate("specs"), "de");
        assert!(resolved.definition.is_none());
    }

    #[test]
    fn empty_store_value_is_inherited() {
        let parent_store = ClassificationStore::new().with_value(3, 17, "default", json!(4.3));
        let repo = repository(
            false,
            vec![
                Element::object(2, "product").with_store("attrs", parent_store),
                Element::object(5, "product").with_parent(2),
            ],
        );
        let kinds = FieldKindRegistry::with_builtin();
        let resolver = ClassificationStoreResolver::new(&repo, &kinds);
        let element = repo.get(5).unwrap();

        let resolved = resolver.resolve_inherited(&element, coordinate("attrs"), "de");
        assert_eq!(resolved.value, json!(4.3));
        assert_eq!(resolved.owner_element_id, 2);
        assert!(resolved.inherited());

        assert_eq!(resolver.format_for_grid(&resolved, &ctx(&kinds)).unwrap(), json!(4.3));
        assert_eq!(resolver.format_for_csv(&resolved, &ctx(&kinds)).unwrap(), "4.3");
    }

    #[test]
    fn unknown_key_passes_raw_value() {
        let store = ClassificationStore::new().with_value(3, 18, "default", json!("raw"));
        let repo = repository(false, vec![Element::object(5, "product").with_store("attrs", store)]);
        let kinds = FieldKindRegistry::with_builtin();
        let resolver = ClassificationStoreResolver::new(&repo, &kinds);
        let element = repo.get(5).unwrap();
        let coordinate = StoreCoordinate {
            field: "attrs",
            group_id: 3,
            key_id: 18,
        };

        let resolved = resolver.resolve_inherited(&element, coordinate, "de");
        assert!(resolved.kind.is_none());
        assert_eq!(resolver.format_for_grid(&resolved, &ctx(&kinds)).unwrap(), json!("raw"));
    }
}
