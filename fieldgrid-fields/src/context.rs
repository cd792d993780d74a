//! SchemaContext: read-only registry of class, brick and store-key definitions.
//!
//! Definitions live as YAML files under a schema directory. The context is
//! built once (creating directories and seeding defaults), then shared
//! immutably by every resolution in a batch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::fs;
use tracing::debug;
use ulid::Ulid;

use crate::error::{FieldsError, Result};
use crate::types::{BrickDef, ClassDef, StoreKeyDef};

const CLASSES_DIR: &str = "classes";
const BRICKS_DIR: &str = "bricks";
const STORE_KEYS_DIR: &str = "store-keys";

/// Default definitions seeded into a schema directory.
///
/// Consumers build this to pass to `SchemaContextBuilder::with_defaults()`.
/// On build, defaults that don't already exist on disk are written.
pub struct SchemaDefaults {
    classes: Vec<ClassDef>,
    bricks: Vec<BrickDef>,
    store_keys: Vec<StoreKeyDef>,
}

impl SchemaDefaults {
    pub fn new() -> Self {
        Self {
            classes: Vec::new(),
            bricks: Vec::new(),
            store_keys: Vec::new(),
        }
    }

    /// Add a default class definition.
    pub fn class(mut self, def: ClassDef) -> Self {
        self.classes.push(def);
        self
    }

    /// Add a default brick definition.
    pub fn brick(mut self, def: BrickDef) -> Self {
        self.bricks.push(def);
        self
    }

    /// Add a default classification-store key definition.
    pub fn store_key(mut self, def: StoreKeyDef) -> Self {
        self.store_keys.push(def);
        self
    }
}

impl Default for SchemaDefaults {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `SchemaContext`. Created by `SchemaContext::open()`.
pub struct SchemaContextBuilder {
    root: PathBuf,
    defaults: Option<SchemaDefaults>,
}

impl SchemaContextBuilder {
    /// Provide default definitions.
    /// Defaults are seeded on first open; existing definitions are preserved.
    pub fn with_defaults(mut self, defaults: SchemaDefaults) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Build the context: create directories, seed defaults, load from disk.
    pub async fn build(self) -> Result<SchemaContext> {
        let root = self.root;
        if root.exists() && !root.is_dir() {
            return Err(FieldsError::NotInitialized { path: root });
        }

        for dir in [CLASSES_DIR, BRICKS_DIR, STORE_KEYS_DIR] {
            fs::create_dir_all(root.join(dir)).await?;
        }

        if let Some(defaults) = self.defaults {
            seed_defaults(&root, &defaults).await?;
        }

        let mut ctx = SchemaContext::empty();
        for def in load_dir::<ClassDef>(&root.join(CLASSES_DIR)).await? {
            ctx.insert_class(def);
        }
        for def in load_dir::<BrickDef>(&root.join(BRICKS_DIR)).await? {
            ctx.insert_brick(def);
        }
        for def in load_dir::<StoreKeyDef>(&root.join(STORE_KEYS_DIR)).await? {
            ctx.insert_store_key(def);
        }
        ctx.root = Some(root);

        debug!(
            classes = ctx.classes.len(),
            bricks = ctx.bricks.len(),
            store_keys = ctx.store_keys.len(),
            "schema context opened"
        );

        Ok(ctx)
    }
}

/// Seed default definitions whose files don't already exist.
///
/// Files are named after the class id, brick key and store key id, so a
/// customized file on disk always wins over the default.
async fn seed_defaults(root: &Path, defaults: &SchemaDefaults) -> Result<()> {
    for def in &defaults.classes {
        seed_one(&root.join(CLASSES_DIR), def.id(), def).await?;
    }
    for def in &defaults.bricks {
        seed_one(&root.join(BRICKS_DIR), &def.key, def).await?;
    }
    for def in &defaults.store_keys {
        seed_one(&root.join(STORE_KEYS_DIR), &def.id.to_string(), def).await?;
    }
    Ok(())
}

async fn seed_one<T: Serialize>(dir: &Path, name: &str, def: &T) -> Result<()> {
    let path = dir.join(format!("{name}.yaml"));
    if path.exists() {
        return Ok(());
    }
    let yaml = serde_yaml_ng::to_string(def)?;
    atomic_write(&path, yaml.as_bytes()).await?;
    debug!(%name, dir = %dir.display(), "seeded default definition");
    Ok(())
}

/// Read every `.yaml` file in `dir`, skipping files that fail to parse.
async fn load_dir<T: DeserializeOwned>(dir: &Path) -> Result<Vec<T>> {
    let mut defs = Vec::new();
    let mut entries = fs::read_dir(dir).await?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) == Some("yaml") {
            paths.push(path);
        }
    }
    // Deterministic load order regardless of directory iteration order.
    paths.sort();

    for path in paths {
        let content = fs::read_to_string(&path).await?;
        match serde_yaml_ng::from_str::<T>(&content) {
            Ok(def) => defs.push(def),
            Err(e) => {
                tracing::warn!(?path, %e, "skipping invalid definition");
            }
        }
    }
    Ok(defs)
}

/// Class, brick and store-key definitions.
///
/// Owns a directory on disk with the structure:
/// ```text
/// schema/
///   classes/       ← one .yaml per class (named by class id)
///   bricks/        ← one .yaml per brick type
///   store-keys/    ← one .yaml per classification-store key (named by key id)
/// ```
#[derive(Debug, Clone)]
pub struct SchemaContext {
    root: Option<PathBuf>,
    classes: HashMap<String, Arc<ClassDef>>,
    bricks: HashMap<String, Arc<BrickDef>>,
    store_keys: HashMap<u64, Arc<StoreKeyDef>>,
}

impl SchemaContext {
    /// Open or create a schema directory. Returns a builder for optional configuration.
    ///
    /// ```rust,ignore
    /// let schema = SchemaContext::open(path).build().await?;
    ///
    /// let schema = SchemaContext::open(path)
    ///     .with_defaults(my_defaults())
    ///     .build()
    ///     .await?;
    /// ```
    pub fn open(root: impl Into<PathBuf>) -> SchemaContextBuilder {
        SchemaContextBuilder {
            root: root.into(),
            defaults: None,
        }
    }

    /// Build a context straight from definitions, without touching disk.
    pub fn from_defaults(defaults: SchemaDefaults) -> Self {
        let mut ctx = Self::empty();
        for def in defaults.classes {
            ctx.insert_class(def);
        }
        for def in defaults.bricks {
            ctx.insert_brick(def);
        }
        for def in defaults.store_keys {
            ctx.insert_store_key(def);
        }
        ctx
    }

    fn empty() -> Self {
        Self {
            root: None,
            classes: HashMap::new(),
            bricks: HashMap::new(),
            store_keys: HashMap::new(),
        }
    }

    fn insert_class(&mut self, def: ClassDef) {
        self.classes.insert(def.id().to_string(), Arc::new(def));
    }

    fn insert_brick(&mut self, def: BrickDef) {
        self.bricks.insert(def.key.clone(), Arc::new(def));
    }

    fn insert_store_key(&mut self, def: StoreKeyDef) {
        self.store_keys.insert(def.id, Arc::new(def));
    }

    pub fn class(&self, id: &str) -> Option<Arc<ClassDef>> {
        self.classes.get(id).cloned()
    }

    pub fn brick(&self, key: &str) -> Option<Arc<BrickDef>> {
        self.bricks.get(key).cloned()
    }

    pub fn store_key(&self, id: u64) -> Option<Arc<StoreKeyDef>> {
        self.store_keys.get(&id).cloned()
    }

    /// Class ids, sorted.
    pub fn class_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.classes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// The directory this context was loaded from; `None` for in-memory contexts.
    pub fn root(&self) -> Option<&Path> {
        self.root.as_deref()
    }
}

/// Write to a temp file then rename for atomic persistence.
async fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no parent dir"))?;
    let tmp = dir.join(format!(".tmp_{}", Ulid::new()));
    fs::write(&tmp, data).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}
