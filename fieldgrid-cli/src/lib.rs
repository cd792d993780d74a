//! FieldGrid CLI library: argument definitions, dataset loading and command handlers.

pub mod cli;
pub mod commands;
pub mod dataset;

pub use cli::{Cli, Commands, Source};
pub use commands::Session;
pub use dataset::Dataset;
