//! CLI definition for the `fieldgrid` command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// FieldGrid - attribute values for data grids and CSV exports
///
/// Loads class, brick and store-key definitions from a schema directory and
/// elements from a YAML dataset, then prints rows or single values as JSON.
#[derive(Parser, Debug)]
#[command(name = "fieldgrid")]
#[command(version)]
#[command(about = "Resolve grid rows and field values from a YAML dataset")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Source {
    /// Schema directory (classes/, bricks/, store-keys/); defaults to `schema_dir` from config
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// YAML dataset with `elements` and optional `permissions`
    #[arg(long)]
    pub data: PathBuf,

    /// Request locale; falls back to the configured default
    #[arg(short, long)]
    pub locale: Option<String>,

    /// Resolve as this user instead of an administrator
    #[arg(short, long)]
    pub user: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print one grid row per element as JSON lines
    Row {
        #[command(flatten)]
        source: Source,

        /// Requested keys, comma separated (e.g. `id,title~de,#depth`)
        #[arg(short, long, value_delimiter = ',', required = true)]
        fields: Vec<String>,

        /// Element ids; every element of the dataset when omitted
        #[arg(short, long)]
        element: Vec<i64>,

        /// Format values for CSV export instead of the grid
        #[arg(long)]
        csv: bool,
    },
    /// Print the effective raw value of one key for one element
    Resolve {
        #[command(flatten)]
        source: Source,

        /// Element id
        element: i64,

        /// Requested key
        key: String,
    },
}
