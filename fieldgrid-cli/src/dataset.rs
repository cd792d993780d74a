//! YAML dataset loading.

use std::path::Path;

use anyhow::Context;
use fieldgrid_resolve::{Element, MemoryPermissions};
use serde::Deserialize;

/// Elements to resolve against, with optional per-user language grants.
///
/// ```yaml
/// elements:
///   - id: 2
///     type: object
///     classId: product
///     values:
///       title: Chair
/// permissions:
///   editor:
///     view: [de]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub elements: Vec<Element>,
    #[serde(default)]
    pub permissions: MemoryPermissions,
}

impl Dataset {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading dataset {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parsing dataset {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let dataset: Dataset = serde_yaml_ng::from_str(text)?;
        if let Some(duplicate) = first_duplicate(&dataset.elements) {
            anyhow::bail!("element {duplicate} appears more than once");
        }
        Ok(dataset)
    }
}

fn first_duplicate(elements: &[Element]) -> Option<i64> {
    let mut seen = std::collections::HashSet::new();
    elements.iter().map(|e| e.id).find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldgrid_resolve::ElementType;

    #[test]
    fn parses_elements_and_permissions() {
        let dataset = Dataset::parse(
            r#"
elements:
  - id: 2
    type: object
    classId: product
    values:
      title: Chair
  - id: 9
    type: asset
    parentId: 1
permissions:
  editor:
    view: [de]
"#,
        )
        .unwrap();
        assert_eq!(dataset.elements.len(), 2);
        assert_eq!(dataset.elements[1].element_type, ElementType::Asset);
        assert_eq!(dataset.elements[1].parent_id, Some(1));
        assert_ne!(dataset.permissions, MemoryPermissions::default());
    }

    #[test]
    fn permissions_are_optional() {
        let dataset = Dataset::parse("elements: []").unwrap();
        assert!(dataset.elements.is_empty());
        assert_eq!(dataset.permissions, MemoryPermissions::default());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Dataset::parse(
            "elements:\n  - {id: 3, type: folder}\n  - {id: 3, type: folder}\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("element 3"));
    }
}
