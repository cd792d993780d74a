//! Rows resolved against a schema loaded from YAML files on disk.

use std::sync::Arc;

use fieldgrid_fields::SchemaContext;
use fieldgrid_resolve::{Element, ElementRepository, GridEngine, MemoryRepository, RequestContext, RowOptions};
use serde_json::json;
use tempfile::TempDir;

const PRODUCT: &str = r#"
id: product
name: Product
allow_inherit: true
fields:
  - name: title
    type:
      kind: input
  - name: released
    type:
      kind: date
  - name: localizedfields
    type:
      kind: localizedfields
      children:
        - name: name
          type:
            kind: input
  - name: attrs
    type:
      kind: classificationstore
      localized: true
"#;

const WEIGHT: &str = r#"
id: 17
name: weight
type:
  kind: numeric
  decimal_precision: 1
"#;

async fn engine(dir: &TempDir, elements: Vec<Element>) -> GridEngine {
    let root = dir.path().join("schema");
    std::fs::create_dir_all(root.join("classes")).unwrap();
    std::fs::create_dir_all(root.join("store-keys")).unwrap();
    std::fs::write(root.join("classes/product.yaml"), PRODUCT).unwrap();
    std::fs::write(root.join("store-keys/17.yaml"), WEIGHT).unwrap();

    let schema = SchemaContext::open(&root).build().await.unwrap();
    let repository = MemoryRepository::new(Arc::new(schema)).with_elements(elements);
    GridEngine::builder(Arc::new(repository)).build()
}

#[tokio::test]
async fn yaml_schema_drives_resolution() {
    let dir = TempDir::new().unwrap();
    let elements: Vec<Element> = serde_json::from_value(json!([
        {
            "id": 2,
            "type": "object",
            "classId": "product",
            "values": {
                "title": "Parent",
                "released": 1700000000,
                "localizedfields": {"de": {"name": "Stuhl"}}
            },
            "stores": {"attrs": {"3": {"17": {"de": 12.34, "default": 1}}}}
        },
        {"id": 5, "parentId": 2, "type": "object", "classId": "product"}
    ]))
    .unwrap();
    let engine = engine(&dir, elements).await;
    let child = engine.repository().get(5).unwrap();

    let fields = ["title", "released", "name", "~classificationstore~attrs~3-17"];
    let grid = engine
        .build_row(&child, &fields, Some("de"), RowOptions::default(), &RequestContext::admin())
        .unwrap();
    assert_eq!(grid.get("title"), Some(&json!("Parent")));
    assert_eq!(grid.get("released"), Some(&json!(1_700_000_000)));
    assert_eq!(grid.get("name"), Some(&json!("Stuhl")));
    assert_eq!(grid.get("~classificationstore~attrs~3-17"), Some(&json!(12.34)));

    let csv = engine
        .build_row(&child, &fields, Some("de"), RowOptions::csv(), &RequestContext::admin())
        .unwrap();
    assert_eq!(csv.get("released"), Some(&json!("2023-11-14")));
    assert_eq!(csv.get("~classificationstore~attrs~3-17"), Some(&json!("12.3")));

    let fr = engine
        .build_row(&child, &fields[3..], Some("fr"), RowOptions::csv(), &RequestContext::admin())
        .unwrap();
    assert_eq!(fr.get("~classificationstore~attrs~3-17"), Some(&json!("1.0")));
}
