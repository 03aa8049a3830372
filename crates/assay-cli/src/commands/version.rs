//! `assay version`.

use assay_core::version;
use clap::Command;

pub const NAME: &str = "version";

pub fn command() -> Command {
    Command::new(NAME).about("Display the version and build of assay")
}

/// Print version information. Never fails.
pub fn run() {
    println!("{}", version::info());
}
