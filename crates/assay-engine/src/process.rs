//! External engine process.
//!
//! The engine is a separate executable. For every invocation the
//! configuration is serialized to JSON in a private temporary file and the
//! engine is started as
//!
//! ```text
//! <program> [args...] run|shell --run-config <file>
//! ```
//!
//! with the terminal's stdin, stdout and stderr inherited, so query output
//! and the interactive session go straight to the user. The temporary file
//! is removed once the engine exits.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

use assay_core::{Error, QueryEngine, Result, RunConfig, ShellConfig};
use serde::Serialize;

/// Runs queries and shells by spawning the engine executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessEngine {
    /// Executable used when none is configured.
    pub const DEFAULT_PROGRAM: &'static str = "assay-engine";

    /// Create an engine that runs `program`, looked up on `PATH` when it is
    /// not a path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the mode (`run` / `shell`).
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// The engine executable.
    pub fn program(&self) -> &Path {
        &self.program
    }

    fn invoke<T: Serialize>(&self, mode: &str, config: &T) -> std::result::Result<(), String> {
        let mut file = tempfile::Builder::new()
            .prefix("assay-run-")
            .suffix(".json")
            .tempfile()
            .map_err(|e| format!("cannot create configuration file: {e}"))?;
        serde_json::to_writer(&mut file, config)
            .map_err(|e| format!("cannot serialize configuration: {e}"))?;
        file.flush()
            .map_err(|e| format!("cannot write configuration file: {e}"))?;

        tracing::debug!(
            program = %self.program.display(),
            mode,
            config = %file.path().display(),
            "starting engine"
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(mode)
            .arg("--run-config")
            .arg(file.path())
            .status()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => format!(
                    "engine executable '{}' not found; set engine.path in the config file",
                    self.program.display()
                ),
                _ => format!("cannot start engine '{}': {e}", self.program.display()),
            })?;

        tracing::debug!(%status, "engine finished");

        if status.success() {
            Ok(())
        } else {
            Err(format!("engine exited with {status}"))
        }
    }
}

impl Default for ProcessEngine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM)
    }
}

impl QueryEngine for ProcessEngine {
    fn run_query(&self, config: &RunConfig) -> Result<()> {
        self.invoke("run", config).map_err(Error::query)
    }

    fn start_shell(&self, config: &ShellConfig) -> Result<()> {
        self.invoke("shell", config).map_err(Error::shell)
    }
}
