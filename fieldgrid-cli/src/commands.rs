//! Command handlers. Each returns the JSON values to print, one per line.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use fieldgrid_config::GridSettings;
use fieldgrid_fields::SchemaContext;
use fieldgrid_resolve::{
    Element, ElementId, GridEngine, MemoryRepository, Principal, RequestContext, RowOptions,
};
use serde_json::{json, Value};

use crate::cli::Source;
use crate::dataset::Dataset;

/// A loaded schema and dataset, ready to answer requests.
pub struct Session {
    engine: GridEngine,
    /// Element ids in dataset order.
    ids: Vec<ElementId>,
    request: RequestContext,
    locale: Option<String>,
}

impl Session {
    /// Loads the schema and dataset named by `source`.
    pub async fn open(source: &Source, settings: GridSettings) -> anyhow::Result<Self> {
        let schema_dir: PathBuf = source
            .schema
            .clone()
            .or_else(|| settings.schema_dir.clone())
            .context("no schema directory: pass --schema or set schema_dir in config")?;
        let schema = SchemaContext::open(&schema_dir)
            .build()
            .await
            .with_context(|| format!("loading schema from {}", schema_dir.display()))?;
        let dataset = Dataset::load(&source.data)?;
        tracing::debug!(
            schema = %schema_dir.display(),
            elements = dataset.elements.len(),
            "dataset loaded"
        );

        let ids = dataset.elements.iter().map(|e| e.id).collect();
        let repository = MemoryRepository::new(Arc::new(schema)).with_elements(dataset.elements);
        let engine = GridEngine::builder(Arc::new(repository))
            .settings(settings)
            .permissions(dataset.permissions)
            .build();
        let request = match &source.user {
            Some(name) => RequestContext::new(Principal::user(name.clone())),
            None => RequestContext::admin(),
        };

        Ok(Self {
            engine,
            ids,
            request,
            locale: source.locale.clone(),
        })
    }

    fn element(&self, id: ElementId) -> anyhow::Result<Arc<Element>> {
        self.engine
            .repository()
            .get(id)
            .with_context(|| format!("element {id} not found"))
    }

    /// Grid rows for `ids`, or for every element when `ids` is empty.
    ///
    /// A row that fails to build is reported in place as
    /// `{"id": .., "error": ..}` so one bad element does not hide the others.
    pub fn rows(&self, fields: &[String], ids: &[ElementId], csv: bool) -> anyhow::Result<Vec<Value>> {
        let ids = if ids.is_empty() { &self.ids[..] } else { ids };
        let options = if csv { RowOptions::csv() } else { RowOptions::default() };

        ids.iter()
            .map(|&id| {
                let element = self.element(id)?;
                let row = self.engine.build_row(
                    &element,
                    fields,
                    self.locale.as_deref(),
                    options,
                    &self.request,
                );
                Ok(match row {
                    Ok(row) => row.to_grid_json(),
                    Err(e) => {
                        tracing::warn!(id, error = %e, "row failed");
                        json!({ "id": id, "error": e.to_string() })
                    }
                })
            })
            .collect()
    }

    /// Effective value of `key` for element `id`, with its provenance.
    pub fn resolve(&self, id: ElementId, key: &str) -> anyhow::Result<Value> {
        let element = self.element(id)?;
        let resolved = self.engine.resolve(&element, key, self.locale.as_deref());
        Ok(json!({
            "key": key,
            "value": resolved.value,
            "ownerElementId": resolved.owner_element_id,
            "inherited": resolved.inherited(),
            "empty": resolved.is_empty,
            "localized": resolved.localized,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const CLASS: &str = r#"
id: product
allow_inherit: true
fields:
  - name: title
    type:
      kind: input
  - name: price
    type:
      kind: numeric
      decimal_precision: 2
  - name: localizedfields
    type:
      kind: localizedfields
      children:
        - name: name
          type:
            kind: input
"#;

    const DATA: &str = r#"
elements:
  - id: 2
    type: object
    classId: product
    values:
      title: Chair
      price: 12.5
      localizedfields:
        de: {name: Stuhl}
        en: {name: Chair}
  - id: 5
    type: object
    parentId: 2
    classId: product
    values:
      price: "oops"
permissions:
  editor:
    view: [en]
"#;

    async fn session(dir: &TempDir, user: Option<&str>) -> Session {
        let schema = dir.path().join("schema");
        std::fs::create_dir_all(schema.join("classes")).unwrap();
        std::fs::write(schema.join("classes/product.yaml"), CLASS).unwrap();
        let data = dir.path().join("data.yaml");
        std::fs::write(&data, DATA).unwrap();

        let source = Source {
            schema: Some(schema),
            data,
            locale: Some("de".into()),
            user: user.map(str::to_string),
        };
        Session::open(&source, GridSettings::default()).await.unwrap()
    }

    #[tokio::test]
    async fn rows_for_every_element() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, None).await;
        let rows = session.rows(&["id".into(), "title".into()], &[], false).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["title"], json!("Chair"));
        assert_eq!(rows[1]["title"], json!("Chair"));
        assert_eq!(rows[1]["inheritedFields"]["title"]["objectid"], json!(2));
    }

    #[tokio::test]
    async fn failing_row_is_reported_in_place() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, None).await;
        let rows = session.rows(&["price".into()], &[5, 2], true).unwrap();
        assert_eq!(rows[0]["id"], json!(5));
        assert!(rows[0]["error"].as_str().unwrap().contains("price"));
        assert_eq!(rows[1]["price"], json!("12.50"));
    }

    #[tokio::test]
    async fn unknown_element_is_an_error() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, None).await;
        assert!(session.rows(&["id".into()], &[404], false).is_err());
        assert!(session.resolve(404, "id").is_err());
    }

    #[tokio::test]
    async fn resolve_reports_provenance() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, None).await;
        let value = session.resolve(5, "name").unwrap();
        assert_eq!(value["value"], json!("Stuhl"));
        assert_eq!(value["ownerElementId"], json!(2));
        assert_eq!(value["inherited"], json!(true));
        assert_eq!(value["localized"], json!(true));
    }

    #[tokio::test]
    async fn user_permissions_apply() {
        let dir = TempDir::new().unwrap();
        let session = session(&dir, Some("editor")).await;
        let rows = session.rows(&["name".into()], &[2], false).unwrap();
        assert_eq!(rows[0]["metadata"]["permission"]["name"]["noView"], json!(1));
    }

    #[tokio::test]
    async fn missing_schema_directory_is_explained() {
        let dir = TempDir::new().unwrap();
        let source = Source {
            schema: None,
            data: dir.path().join("data.yaml"),
            locale: None,
            user: None,
        };
        let err = Session::open(&source, GridSettings::default()).await.err().unwrap();
        assert!(err.to_string().contains("--schema"));
    }
}
