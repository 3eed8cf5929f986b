//! cli
//!
//! Command-line interface for the store.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and install the tracing subscriber
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Every mutating command runs the same cycle
//! against the store directory:
//!
//! ```text
//! lock -> load -> one Store operation -> save -> unlock
//! ```
//!
//! All tree changes go through [`crate::store::Store`].

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use tracing_subscriber::EnvFilter;

use crate::core::config::Config;
use crate::store::{Store, StoreDir, StoreError};
use crate::ui::output::Verbosity;

/// Per-invocation context shared by handlers.
#[derive(Debug)]
pub struct Context {
    /// Resolved store directory.
    pub store_dir: PathBuf,
    /// Loaded configuration.
    pub config: Config,
    /// Output verbosity.
    pub verbosity: Verbosity,
}

impl Context {
    /// Lock the store directory and load the store.
    pub fn open_store(&self) -> Result<(StoreDir, Store)> {
        let dir = StoreDir::open(&self.store_dir)
            .map_err(StoreError::from)
            .with_context(|| format!("Failed to open store at {}", self.store_dir.display()))?;
        let schema = self.config.schema().context("Invalid [schema] configuration")?;
        let store = dir
            .load(Box::new(schema))
            .map_err(StoreError::from)
            .context("Failed to load store")?;
        Ok((dir, store))
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    init_tracing(cli.debug, config.log_filter());
    if let Some(path) = config.loaded_from() {
        tracing::debug!(config = %path.display(), "configuration loaded");
    }

    let store_dir = match cli.store.clone() {
        Some(dir) => dir,
        None => config.store_dir().context("Failed to resolve store directory")?,
    };

    let ctx = Context {
        store_dir,
        config,
        verbosity: Verbosity::from_flags(cli.quiet, cli.debug),
    };

    commands::dispatch(cli.command, &ctx)
}

/// Install the stderr subscriber.
///
/// `RUST_LOG` wins, then `--debug`, then the configured filter, then `warn`.
fn init_tracing(debug: bool, configured: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directive = if debug {
            "debug"
        } else {
            configured.unwrap_or("warn")
        };
        EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
