//! `assay run`: execute a single query against one target.

use assay_core::{DiscoveryMode, QueryEngine, Result, RunConfig, SettingKey};

use crate::binder::Binding;
use crate::dispatch::{CommandDocs, CommandOpts, Invocation};
use crate::flags::{self, FlagSpec};

pub const FLAGS: &[FlagSpec] = &[
    FlagSpec::bool("parse", "Parse the query and return its logical structure"),
    FlagSpec::bool("ast", "Parse the query and return its abstract syntax tree (AST)"),
    FlagSpec::bool("json", "Run the query and return the result as JSON").short('j'),
    FlagSpec::string("query", "Query to run").hidden(),
    FlagSpec::string("command", "Query to run").short('c'),
    flags::PASSWORD,
    flags::ASK_PASS,
    flags::IDENTITY_FILE,
    flags::INSECURE,
    flags::SUDO,
    flags::PLATFORM_ID,
    flags::INSTANCES,
    flags::HOST_MACHINES,
    FlagSpec::bool(
        "record",
        "Record provider calls (operating system providers only)",
    )
    .hidden(),
    FlagSpec::string(
        "record-file",
        "File the recorded provider calls are written to (operating system providers only)",
    )
    .hidden(),
    flags::PATH,
    flags::OPTION,
    flags::discover(DiscoveryMode::RUN),
    flags::DISCOVER_FILTER,
];

pub const BINDINGS: &[Binding] = &[
    Binding::new("insecure", SettingKey::Insecure),
    Binding::new("sudo", SettingKey::SudoActive),
    Binding::new("output", SettingKey::Output),
    Binding::new("vault", SettingKey::VaultName),
    Binding::new("platform-id", SettingKey::PlatformId),
    Binding::new("query", SettingKey::Query),
    Binding::new("command", SettingKey::Command),
    Binding::new("record", SettingKey::Record),
    Binding::new("record-file", SettingKey::RecordFile),
];

pub fn opts() -> CommandOpts {
    CommandOpts {
        name: "run",
        short: "Run a query",
        long: "Run a single query against a target and print its result.",
        flags: FLAGS,
        bindings: BINDINGS,
        docs: CommandDocs::default(),
        run,
    }
}

fn run(invocation: Invocation, engine: &dyn QueryEngine) -> Result<()> {
    let config = RunConfig::build(&invocation.request)?;
    tracing::debug!(
        provider = %config.target.provider,
        output = ?config.output,
        "running query"
    );
    engine.run_query(&config)
}
