//! # Common Utility Functions
//!
//! Pure helpers shared across crates. Nothing here performs I/O.

pub mod format;
