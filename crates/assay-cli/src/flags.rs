//! Flag schema builder.
//!
//! Commands declare their flags as static [`FlagSpec`] tables. A spec turns
//! into a `clap::Arg` with [`FlagSpec::to_arg`]; after parsing,
//! [`read_values`] collects the typed values the configuration builders
//! need. Nothing here validates combinations of flags; that is left to
//! [`RunConfig::build`](assay_core::RunConfig::build).

use std::collections::BTreeMap;

use assay_core::provider::ProviderFlag;
use assay_core::{DiscoveryMode, FlagValues, Secret};
use clap::builder::PossibleValuesParser;
use clap::{Arg, ArgAction, ArgMatches};

/// Value shape of a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagKind {
    /// Switch, `false` unless given.
    Bool,
    /// Single string value, unset unless given.
    String,
    /// Repeatable `KEY=VALUE` pairs, also accepted comma-separated.
    Map,
    /// One discovery mode out of the given set, `auto` by default.
    Discovery(&'static [DiscoveryMode]),
}

/// Declaration of one command flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagSpec {
    pub name: &'static str,
    pub short: Option<char>,
    pub kind: FlagKind,
    pub help: &'static str,
    /// Hidden flags parse normally but are left out of help output.
    pub hidden: bool,
    pub env: Option<&'static str>,
}

impl FlagSpec {
    pub const fn new(name: &'static str, kind: FlagKind, help: &'static str) -> Self {
        Self {
            name,
            short: None,
            kind,
            help,
            hidden: false,
            env: None,
        }
    }

    pub const fn bool(name: &'static str, help: &'static str) -> Self {
        Self::new(name, FlagKind::Bool, help)
    }

    pub const fn string(name: &'static str, help: &'static str) -> Self {
        Self::new(name, FlagKind::String, help)
    }

    pub const fn map(name: &'static str, help: &'static str) -> Self {
        Self::new(name, FlagKind::Map, help)
    }

    pub const fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub const fn env(mut self, env: &'static str) -> Self {
        self.env = Some(env);
        self
    }

    /// Build the `clap` argument for this flag.
    pub fn to_arg(&self) -> Arg {
        let mut arg = Arg::new(self.name)
            .long(self.name)
            .help(self.help)
            .hide(self.hidden);
        if let Some(short) = self.short {
            arg = arg.short(short);
        }
        if let Some(env) = self.env {
            arg = arg.env(env);
        }

        match self.kind {
            FlagKind::Bool => arg.action(ArgAction::SetTrue),
            FlagKind::String => arg.action(ArgAction::Set).value_name("VALUE"),
            FlagKind::Map => arg
                .action(ArgAction::Append)
                .value_name("KEY=VALUE")
                .value_delimiter(',')
                .value_parser(parse_key_value),
            FlagKind::Discovery(modes) => arg
                .action(ArgAction::Set)
                .value_name("MODE")
                .value_parser(PossibleValuesParser::new(DiscoveryMode::names(modes)))
                .default_value(DiscoveryMode::Auto.as_str()),
        }
    }
}

/// `clap` argument for a provider-specific flag.
pub fn provider_arg(flag: &ProviderFlag) -> Arg {
    let mut arg = Arg::new(flag.name)
        .long(flag.name)
        .help(flag.help)
        .value_name("VALUE")
        .action(ArgAction::Set);
    if let Some(env) = flag.env {
        arg = arg.env(env).hide_env_values(flag.secret);
    }
    arg
}

// ============================================================================
// Shared connection flags
// ============================================================================

pub const PASSWORD: FlagSpec =
    FlagSpec::string("password", "Password for the connection, e.g. for SSH or WinRM").short('p');
pub const ASK_PASS: FlagSpec = FlagSpec::bool("ask-pass", "Prompt for the connection password");
pub const IDENTITY_FILE: FlagSpec =
    FlagSpec::string("identity-file", "Private key file used for authentication").short('i');
pub const INSECURE: FlagSpec =
    FlagSpec::bool("insecure", "Disable TLS/SSL checks or SSH host key configuration");
pub const SUDO: FlagSpec = FlagSpec::bool("sudo", "Elevate privileges with sudo");
pub const PLATFORM_ID: FlagSpec =
    FlagSpec::string("platform-id", "Select a specific target asset by platform ID");
pub const INSTANCES: FlagSpec =
    FlagSpec::bool("instances", "Also scan instances (only applies to API targets like AWS)");
pub const HOST_MACHINES: FlagSpec = FlagSpec::bool(
    "host-machines",
    "Also scan host machines like ESXi servers (only applies to vSphere)",
);
pub const RECORD: FlagSpec = FlagSpec::bool("record", "Record provider calls").hidden();
pub const PATH: FlagSpec = FlagSpec::string("path", "Path to a local file or directory");
pub const OPTION: FlagSpec = FlagSpec::map("option", "Additional connection options (KEY=VALUE)");
pub const DISCOVER_FILTER: FlagSpec = FlagSpec::map(
    "discover-filter",
    "Additional filter for asset discovery (KEY=VALUE)",
);

/// `--discover` restricted to `modes`.
pub const fn discover(modes: &'static [DiscoveryMode]) -> FlagSpec {
    FlagSpec::new(
        "discover",
        FlagKind::Discovery(modes),
        "Enable the discovery of nested assets",
    )
}

/// Value parser for `KEY=VALUE` flags.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ============================================================================
// Reading parsed values
// ============================================================================

/// Collect the flag values of one invocation.
///
/// `provider_flags` are the provider-specific flags visible at the selected
/// target; values of secret flags end up in `provider_secrets`. Flags not
/// declared on the command read as unset.
pub fn read_values(matches: &ArgMatches, provider_flags: &[&ProviderFlag]) -> FlagValues {
    let mut provider_options = BTreeMap::new();
    let mut provider_secrets = BTreeMap::new();
    for flag in provider_flags {
        if let Some(value) = string(matches, flag.name) {
            if flag.secret {
                provider_secrets.insert(flag.name.to_string(), Secret::new(value));
            } else {
                provider_options.insert(flag.name.to_string(), value);
            }
        }
    }

    FlagValues {
        password: string(matches, PASSWORD.name).map(Secret::new),
        ask_pass: switch(matches, ASK_PASS.name),
        identity_file: string(matches, IDENTITY_FILE.name),
        instances: switch(matches, INSTANCES.name),
        host_machines: switch(matches, HOST_MACHINES.name),
        path: string(matches, PATH.name),
        options: pairs(matches, OPTION.name),
        discover: string(matches, "discover")
            .and_then(|mode| mode.parse().ok())
            .unwrap_or_default(),
        discover_filter: pairs(matches, DISCOVER_FILTER.name),
        json: switch(matches, "json"),
        parse: switch(matches, "parse"),
        ast: switch(matches, "ast"),
        provider_options,
        provider_secrets,
    }
}

fn switch(matches: &ArgMatches, id: &str) -> bool {
    matches
        .try_get_one::<bool>(id)
        .ok()
        .flatten()
        .copied()
        .unwrap_or(false)
}

/// Empty strings read as unset.
fn string(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .try_get_one::<String>(id)
        .ok()
        .flatten()
        .filter(|value| !value.is_empty())
        .cloned()
}

fn pairs(matches: &ArgMatches, id: &str) -> BTreeMap<String, String> {
    matches
        .try_get_many::<(String, String)>(id)
        .ok()
        .flatten()
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}
