//! Attribute-value resolution engine
//!
//! Computes the value a grid column or CSV export shows for one field of one
//! content element. A requested key is parsed into a [`FieldReference`]
//! (plain field, brick field or classification-store coordinate), resolved
//! against the element, falling back along the parent chain when the local
//! value is empty and the class allows inheritance, then formatted by the
//! field's [`FieldKind`](fieldgrid_fields::FieldKind).
//!
//! # Architecture
//!
//! - **Pure**: no I/O of its own; parents and definitions come from an
//!   [`ElementRepository`]
//! - **Degrading**: malformed keys, missing definitions and absent brick or
//!   store data resolve to empty values instead of errors
//! - **Stateless per call**: a [`GridEngine`] is `Send + Sync` and rows for
//!   different elements can be built in parallel
//!
//! ```ignore
//! let engine = GridEngine::builder(Arc::new(repository)).build();
//! let row = engine.build_row(&element, &["id", "title~de"], None, RowOptions::default(), &RequestContext::admin())?;
//! println!("{}", row.to_grid_json());
//! ```

pub mod context;
pub mod element;
pub mod engine;
pub mod error;
pub mod inheritance;
pub mod path;
pub mod repository;
pub mod row;
pub mod services;
pub mod store;
pub mod system;

pub use context::{CalculatedColumn, HelperColumns, RequestContext};
pub use element::{Brick, ClassificationStore, Element, ElementId, ElementType};
pub use engine::{GridEngine, GridEngineBuilder};
pub use error::{ResolveError, Result};
pub use inheritance::{InheritanceResolver, ResolvedValue};
pub use path::{parse, BrickDescriptor, BrickRef, FieldReference, KeyParser, KeyQualifier, StoreCoordinate};
pub use repository::{ElementRepository, MemoryRepository};
pub use row::{GridRow, GridRowBuilder, InheritanceInfo, PermissionFlags, RowOptions};
pub use services::{
    AllowAll, CurrentLocale, LanguageGrants, LanguagePermission, MemoryPermissions,
    PermissionService, Principal, StaticLocale,
};
pub use store::ClassificationStoreResolver;
pub use system::{is_system_column, SystemColumns, SYSTEM_COLUMNS};
