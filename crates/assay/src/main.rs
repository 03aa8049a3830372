//! The `assay` binary.
//!
//! All errors end up here: they are logged once and mapped to the process
//! exit code. Argument errors are reported by `clap` itself.

use std::process::ExitCode;

use assay_cli::commands::version;
use assay_cli::{AssayCli, GlobalArgs, cli, init_logging};
use assay_core::Error;
use clap::FromArgMatches;

fn main() -> ExitCode {
    let commands = match cli::provider_commands() {
        Ok(commands) => commands,
        Err(err) => {
            init_logging(false, false);
            return fail(&err);
        }
    };
    let matches = cli::build_cli(&commands).get_matches();
    let args = GlobalArgs::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());

    init_logging(args.verbose, args.quiet);

    // `version` does not depend on the config file.
    if matches.subcommand_name() == Some(version::NAME) {
        version::run();
        return ExitCode::SUCCESS;
    }

    match AssayCli::from_args(&args, commands).and_then(|app| app.run(&matches)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(&err),
    }
}

fn fail(err: &Error) -> ExitCode {
    tracing::error!("{err}");
    ExitCode::from(err.exit_code())
}
