//! AssayCli application.
//!
//! Wires the loaded configuration and a [`QueryEngine`] to the parsed
//! command line.

use std::io::IsTerminal;

use assay_core::{Error, QueryEngine, Result};
use assay_engine::ProcessEngine;
use clap::{ArgMatches, Command};
use tracing_subscriber::EnvFilter;

use crate::cli::{self, GlobalArgs};
use crate::commands::version;
use crate::config::AssayConfig;
use crate::dispatch::ProviderCommand;

// ============================================================================
// AssayCli
// ============================================================================

/// The CLI application, parameterized over the engine it drives.
pub struct AssayCli<E: QueryEngine> {
    config: AssayConfig,
    engine: E,
    commands: Vec<ProviderCommand>,
}

impl AssayCli<ProcessEngine> {
    /// Create from CLI args, loading config from file/env.
    ///
    /// `commands` are the provider commands the command line was parsed
    /// with.
    pub fn from_args(args: &GlobalArgs, commands: Vec<ProviderCommand>) -> Result<Self> {
        let config = AssayConfig::load(args.config.as_deref())?;
        let engine = ProcessEngine::new(config.engine.path.clone())
            .with_args(config.engine.args.iter().cloned());
        Ok(Self::with_commands(config, engine, commands))
    }
}

impl<E: QueryEngine> AssayCli<E> {
    /// Create a new CLI application with the built-in commands.
    pub fn new(config: AssayConfig, engine: E) -> Result<Self> {
        Ok(Self::with_commands(config, engine, cli::provider_commands()?))
    }

    pub fn with_commands(config: AssayConfig, engine: E, commands: Vec<ProviderCommand>) -> Self {
        Self {
            config,
            engine,
            commands,
        }
    }

    /// Get a reference to the loaded configuration.
    pub fn config(&self) -> &AssayConfig {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The command line this application understands.
    pub fn command(&self) -> Command {
        cli::build_cli(&self.commands)
    }

    /// Run the command selected by `matches`.
    pub fn run(&self, matches: &ArgMatches) -> Result<()> {
        match matches.subcommand() {
            Some((version::NAME, _)) => {
                version::run();
                Ok(())
            }
            Some((name, sub)) => {
                let command = self
                    .commands
                    .iter()
                    .find(|cmd| cmd.name() == name)
                    .ok_or_else(|| Error::usage(format!("unknown command '{name}'")))?;
                command.dispatch(sub, self.config.settings(), &self.engine)
            }
            None => Err(Error::usage("no command given")),
        }
    }
}

/// Initialise tracing-based logging on stderr.
///
/// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
/// Colour is only used when stderr is a terminal.
pub fn init_logging(verbose: bool, quiet: bool) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if quiet {
        EnvFilter::new("warn")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Ignore error if a subscriber is already set (e.g. in tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();
}

// ============================================================================
// Tests
// ============================================================================
