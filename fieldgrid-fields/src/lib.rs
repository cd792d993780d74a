//! Schema registry and field kinds
//!
//! `fieldgrid-fields` owns everything the resolution engine knows about the
//! *shape* of content: class definitions, brick definitions, classification
//! store key definitions, and the pluggable [`FieldKind`] behavior attached to
//! every field type. It knows nothing about element values.
//!
//! # Architecture
//!
//! - **Schema-only**: definitions, never field values
//! - **YAML on disk**: one file per class, brick and store key
//! - **Loaded once**: a built [`SchemaContext`] is immutable and `Sync`, so a
//!   batch of row builds can share it across threads
//! - **Pluggable kinds**: [`FieldKindRegistry`] maps a field-type id to its
//!   emptiness test and grid/CSV formatting

pub mod context;
pub mod error;
pub mod kind;
pub mod kinds;
pub mod types;

pub use context::{SchemaContext, SchemaContextBuilder, SchemaDefaults};
pub use error::{FieldsError, Result};
pub use kind::{csv_text, format_timestamp, is_blank, FieldKind, FieldKindRegistry, FormatContext, GridCell};
pub use types::{
    BrickDef, ClassDef, FieldDef, FieldSlot, FieldType, SelectOption, StoreKeyDef,
};
