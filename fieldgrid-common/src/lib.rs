//! # FieldGrid Common
//!
//! Foundational pieces shared by every FieldGrid crate.
//!
//! ## Modules
//!
//! - [`constants`] - Field-key separators, reserved container names and locales
//! - [`logging`] - The [`Pretty`] wrapper for structured values in log lines
//! - [`utils`] - Small formatting helpers used by system columns

pub mod constants;
pub mod logging;
pub mod utils;

pub use logging::Pretty;
pub use utils::format::format_bytes;
