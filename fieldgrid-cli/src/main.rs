//! FieldGrid CLI - resolve grid rows and field values from a YAML dataset.
//!
//! Commands:
//! - `fieldgrid row --data <file> --fields <keys>`: one JSON grid row per element
//! - `fieldgrid resolve --data <file> <element> <key>`: one resolved value as JSON
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

use std::io::{self, Write};

use clap::Parser;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use fieldgrid::{Cli, Commands, Session};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("fieldgrid=debug,fieldgrid_resolve=debug,fieldgrid_fields=debug,fieldgrid_config=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = result_to_exit(dispatch(cli.command).await);
    std::process::exit(exit_code);
}

async fn dispatch(command: Commands) -> anyhow::Result<()> {
    let settings = fieldgrid_config::load_settings()?;
    let lines = match command {
        Commands::Row {
            source,
            fields,
            element,
            csv,
        } => Session::open(&source, settings)
            .await?
            .rows(&fields, &element, csv)?,
        Commands::Resolve {
            source,
            element,
            key,
        } => vec![Session::open(&source, settings).await?.resolve(element, &key)?],
    };
    write_lines(&lines)
}

fn write_lines(lines: &[Value]) -> anyhow::Result<()> {
    let mut stdout = io::stdout().lock();
    for line in lines {
        serde_json::to_writer(&mut stdout, line)?;
        stdout.write_all(b"\n")?;
    }
    Ok(())
}

/// Convert a `Result<(), E: Display>` to an exit code.
fn result_to_exit<E: std::fmt::Display>(result: Result<(), E>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}
