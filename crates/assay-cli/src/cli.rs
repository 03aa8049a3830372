//! CLI argument parsing and command definitions.
//!
//! Global flags are declared with the `clap` derive API; the `run` and
//! `shell` command trees are generated from the target table and attached
//! with the builder API.

use assay_core::{Result, TargetTable, version};
use clap::{Command, CommandFactory, Parser};

use crate::commands;
use crate::dispatch::ProviderCommand;

// ============================================================================
// CLI argument types
// ============================================================================

/// Flags accepted by every command.
#[derive(Parser, Debug, Clone, Default, PartialEq, Eq)]
#[command(
    name = "assay",
    author,
    version = version::version(),
    about = "Run security and compliance queries against local and remote assets",
    long_about = None
)]
pub struct GlobalArgs {
    /// Path to configuration file.
    #[arg(long, env = "ASSAY_CONFIG", global = true)]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// The provider-dispatching commands, `run` and `shell`.
pub fn provider_commands() -> Result<Vec<ProviderCommand>> {
    let table = TargetTable::builtin()?;
    Ok(vec![
        ProviderCommand::new(commands::run::opts(), table)?,
        ProviderCommand::new(commands::shell::opts(), table)?,
    ])
}

/// The complete command line: global flags, `commands`, and `version`.
pub fn build_cli(commands: &[ProviderCommand]) -> Command {
    let cli = GlobalArgs::command()
        .subcommand_required(true)
        .arg_required_else_help(true);
    commands
        .iter()
        .fold(cli, |cli, cmd| cli.subcommand(cmd.command()))
        .subcommand(commands::version::command())
}

/// The complete command line with the built-in commands.
pub fn command() -> Result<Command> {
    Ok(build_cli(&provider_commands()?))
}
