//! Data access consumed by the resolvers.
//!
//! The engine never fetches anything itself: parents, class definitions,
//! brick definitions and store key definitions all come through
//! [`ElementRepository`]. Implementations must be safe to read concurrently
//! while a batch of rows is built.

use std::collections::HashMap;
use std::sync::Arc;

use fieldgrid_fields::{BrickDef, ClassDef, SchemaContext, StoreKeyDef};

use crate::element::{Element, ElementId};

/// Read-only access to elements and their schema.
pub trait ElementRepository: Send + Sync {
    /// Element by id.
    fn get(&self, id: ElementId) -> Option<Arc<Element>>;

    /// Parent of the element with `id`; `None` for the root or an unknown id.
    fn get_parent(&self, id: ElementId) -> Option<Arc<Element>> {
        let parent_id = self.get(id)?.parent_id?;
        self.get(parent_id)
    }

    /// Class definition of an object or variant; `None` for other elements.
    fn get_class_definition(&self, element: &Element) -> Option<Arc<ClassDef>>;

    fn get_brick_definition(&self, brick_type: &str) -> Option<Arc<BrickDef>>;

    fn get_store_key(&self, key_id: u64) -> Option<Arc<StoreKeyDef>>;
}

/// An [`ElementRepository`] over elements held in memory and a loaded schema.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    schema: Arc<SchemaContext>,
    elements: HashMap<ElementId, Arc<Element>>,
}

impl MemoryRepository {
    pub fn new(schema: Arc<SchemaContext>) -> Self {
        Self {
            schema,
            elements: HashMap::new(),
        }
    }

    /// Add an element, replacing any element with the same id.
    pub fn insert(&mut self, element: Element) -> Arc<Element> {
        let element = Arc::new(element);
        self.elements.insert(element.id, Arc::clone(&element));
        element
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        for element in elements {
            self.insert(element);
        }
        self
    }

    /// Element ids, sorted.
    pub fn ids(&self) -> Vec<ElementId> {
        let mut ids: Vec<ElementId> = self.elements.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn schema(&self) -> &SchemaContext {
        &self.schema
    }
}

impl ElementRepository for MemoryRepository {
    fn get(&self, id: ElementId) -> Option<Arc<Element>> {
        self.elements.get(&id).cloned()
    }

    fn get_class_definition(&self, element: &Element) -> Option<Arc<ClassDef>> {
        if !element.element_type.is_object_like() {
            return None;
        }
        self.schema.class(element.class_id.as_deref()?)
    }

    fn get_brick_definition(&self, brick_type: &str) -> Option<Arc<BrickDef>> {
        self.schema.brick(brick_type)
    }

    fn get_store_key(&self, key_id: u64) -> Option<Arc<StoreKeyDef>> {
        self.schema.store_key(key_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::ElementType;
    use fieldgrid_fields::{FieldDef, FieldType, SchemaDefaults};

    fn repository() -> MemoryRepository {
        let schema = SchemaContext::from_defaults(SchemaDefaults::new().class(ClassDef::new(
            "product",
            "Product",
            true,
            vec![FieldDef::new("title", FieldType::Input)],
        )));
        MemoryRepository::new(Arc::new(schema)).with_elements([
            Element::new(1, ElementType::Folder),
            Element::object(2, "product").with_parent(1),
            Element::object(3, "unknown").with_parent(2),
        ])
    }

    #[test]
    fn parent_lookup() {
        let repo = repository();
        assert_eq!(repo.get_parent(2).map(|p| p.id), Some(1));
        assert!(repo.get_parent(1).is_none());
        assert!(repo.get_parent(99).is_none());
        assert_eq!(repo.ids(), vec![1, 2, 3]);
    }

    #[test]
    fn class_definition_only_for_known_objects() {
        let repo = repository();
        let folder = repo.get(1).unwrap();
        let product = repo.get(2).unwrap();
        let orphan = repo.get(3).unwrap();
        assert!(repo.get_class_definition(&folder).is_none());
        assert_eq!(repo.get_class_definition(&product).unwrap().id(), "product");
        assert!(repo.get_class_definition(&orphan).is_none());
    }
}
