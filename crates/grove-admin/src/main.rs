//! Grove store administration tool
//!
//! Operator commands for store files that are not open elsewhere.
//!
//! # Usage
//!
//! ```bash
//! # Create an empty node store (nodes.db and nodes.db.id)
//! grove-admin create --kind node nodes.db
//!
//! # Print statistics, optionally with a store configuration file
//! grove-admin stats --kind node nodes.db --config store.toml --json
//!
//! # Rebuild the id file after a crash
//! grove-admin rebuild --kind node nodes.db
//!
//! # Show an id file header without opening it
//! grove-admin ids nodes.db.id
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use grove_common::ErrorKind;
use grove_storage::id::IdError;
use grove_storage::store::{StoreError, StoreKind};
use tracing_subscriber::EnvFilter;

mod commands;
mod formatter;

use formatter::OutputFormat;

/// Grove store administration tool
#[derive(Parser, Debug)]
#[command(
    name = "grove-admin",
    author = "Grove Team",
    version,
    about = "Administration tool for Grove record stores",
    long_about = "Creates, inspects and repairs Grove record store files.\n\n\
                  Stores must not be open in another process while this tool runs."
)]
struct Args {
    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info", env = "GROVE_LOG_LEVEL")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty store and its id file
    Create {
        /// Store kind
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Data file path
        path: PathBuf,
    },

    /// Open a store, print its statistics and close it
    Stats {
        /// Store kind
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Data file path
        path: PathBuf,

        /// Store configuration file (TOML)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Rebuild the id file of a store from its data file
    Rebuild {
        /// Store kind
        #[arg(long, value_enum)]
        kind: KindArg,

        /// Data file path
        path: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print the header of an id file
    Ids {
        /// Id file path
        path: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Store kind argument
#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    /// Node store
    Node,
    /// Relationship store
    Relationship,
}

impl From<KindArg> for StoreKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Node => StoreKind::Node,
            KindArg::Relationship => StoreKind::Relationship,
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match error_kind(&e) {
                Some(kind) => eprintln!("Error [{kind}]: {e:#}"),
                None => eprintln!("Error: {e:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    let output = match command {
        Commands::Create { kind, path } => {
            commands::create(kind.into(), &path)?;
            format!("created {} store at {}", StoreKind::from(kind), path.display())
        }
        Commands::Stats {
            kind,
            path,
            config,
            json,
        } => {
            let config = commands::load_config(config.as_deref())?;
            let stats = commands::stats(kind.into(), &path, &config)?;
            formatter::format_stats(&stats, OutputFormat::from_flag(json))?
        }
        Commands::Rebuild { kind, path, json } => {
            let report = commands::rebuild(kind.into(), &path)?;
            formatter::format_report(&report, OutputFormat::from_flag(json))?
        }
        Commands::Ids { path, json } => {
            let header = commands::ids(&path)?;
            formatter::format_header(&header, OutputFormat::from_flag(json))?
        }
    };

    println!("{output}");
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Finds the storage error kind behind a command failure.
fn error_kind(err: &anyhow::Error) -> Option<ErrorKind> {
    err.chain().find_map(|cause| {
        cause
            .downcast_ref::<StoreError>()
            .map(StoreError::kind)
            .or_else(|| cause.downcast_ref::<IdError>().map(IdError::kind))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_stats() {
        let args = Args::parse_from([
            "grove-admin",
            "stats",
            "--kind",
            "relationship",
            "rels.db",
            "--json",
        ]);
        assert_eq!(args.log_level, "info");
        match args.command {
            Commands::Stats {
                kind,
                path,
                config,
                json,
            } => {
                assert_eq!(StoreKind::from(kind), StoreKind::Relationship);
                assert_eq!(path, PathBuf::from("rels.db"));
                assert!(config.is_none());
                assert!(json);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_error_kind_lookup() {
        let err = anyhow::Error::new(StoreError::Closed).context("reading stats");
        assert_eq!(error_kind(&err), Some(ErrorKind::IllegalState));

        let err = anyhow::Error::new(IdError::Closed);
        assert_eq!(error_kind(&err), Some(ErrorKind::IllegalState));

        assert_eq!(error_kind(&anyhow::anyhow!("bad input")), None);
    }
}
