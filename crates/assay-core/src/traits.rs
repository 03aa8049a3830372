//! The engine seam.
//!
//! Query evaluation, asset discovery and provider connections live outside
//! this workspace. The CLI reaches them only through [`QueryEngine`], by
//! handing over a fully built configuration.

use crate::Result;
use crate::run_config::{RunConfig, ShellConfig};

/// External query/scan engine.
///
/// Implementations own everything that happens after the configuration is
/// built: connecting to the target, evaluating the query, printing results,
/// and the interactive read-eval-print loop.
pub trait QueryEngine {
    /// Run exactly one query and print its result.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Query`](crate::Error::Query) if the engine fails.
    fn run_query(&self, config: &RunConfig) -> Result<()>;

    /// Start an interactive session and block until it ends.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Shell`](crate::Error::Shell) if the session cannot
    /// be started or ends with a failure.
    fn start_shell(&self, config: &ShellConfig) -> Result<()>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    fn run_query(&self, config: &RunConfig) -> Result<()> {
        (**self).run_query(config)
    }

    fn start_shell(&self, config: &ShellConfig) -> Result<()> {
        (**self).start_shell(config)
    }
}
