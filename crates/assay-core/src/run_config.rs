//! Run and shell configuration.
//!
//! [`RunConfig`] and [`ShellConfig`] are the normalized, immutable parameter
//! sets handed to a [`QueryEngine`](crate::QueryEngine). They are built once
//! per invocation from a [`RunRequest`]: the resolved target, positional
//! arguments, the flags read straight from the command line, and the bound
//! [`Settings`]. Building is where flag combinations are validated; a
//! failure here is a configuration error and the engine is never called.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveryMode;
use crate::provider::{AssetType, ProviderType, ResolvedTarget};
use crate::settings::Settings;
use crate::util::paths::expand_tilde;
use crate::{Error, Result};

// ============================================================================
// Secret
// ============================================================================

/// A credential value that never shows up in debug output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The underlying value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

// ============================================================================
// Inputs
// ============================================================================

/// Flag values that are read directly from the command line rather than
/// through the settings store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagValues {
    pub password: Option<Secret>,
    pub ask_pass: bool,
    pub identity_file: Option<String>,
    pub instances: bool,
    pub host_machines: bool,
    pub path: Option<String>,
    pub options: BTreeMap<String, String>,
    pub discover: DiscoveryMode,
    pub discover_filter: BTreeMap<String, String>,
    pub json: bool,
    pub parse: bool,
    pub ast: bool,
    /// Provider-specific flags such as `--region`.
    pub provider_options: BTreeMap<String, String>,
    /// Provider-specific secret flags such as `--token`.
    pub provider_secrets: BTreeMap<String, Secret>,
}

/// Everything needed to build a run or shell configuration.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub target: ResolvedTarget,
    pub args: Vec<String>,
    pub flags: FlagValues,
    pub settings: Settings,
}

// ============================================================================
// Configuration types
// ============================================================================

/// Where the connection password comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "value", rename_all = "kebab-case")]
pub enum PasswordSource {
    #[default]
    None,
    /// Given with `--password`.
    Value(Secret),
    /// `--ask-pass`: the engine prompts for it.
    Prompt,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub password: PasswordSource,
    pub identity_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sudo {
    pub active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub credentials: Credentials,
    pub insecure: bool,
    pub sudo: Sudo,
    pub path: Option<PathBuf>,
    pub options: BTreeMap<String, String>,
    pub provider_options: BTreeMap<String, String>,
    pub provider_secrets: BTreeMap<String, Secret>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Discovery {
    /// Always non-empty; contains the `--discover` mode plus the modes
    /// implied by `--instances` and `--host-machines`.
    pub targets: BTreeSet<DiscoveryMode>,
    pub filter: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetSelection {
    /// Positional target arguments, e.g. `user@host`.
    pub args: Vec<String>,
    pub platform_id: Option<String>,
    pub discovery: Discovery,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recording {
    pub file: PathBuf,
}

/// How the result of a single query is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    /// Logical structure of the parsed query.
    Parse,
    /// Abstract syntax tree of the query.
    Ast,
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "parse" => Ok(Self::Parse),
            "ast" => Ok(Self::Ast),
            other => Err(Error::config(format!(
                "unknown output format '{other}'; use text, json, parse or ast"
            ))),
        }
    }
}

/// Target, selection, and connection parameters shared by run and shell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    pub provider: ProviderType,
    pub asset: AssetType,
    pub selection: AssetSelection,
    pub connection: Connection,
    pub recording: Option<Recording>,
    pub vault: Option<String>,
}

/// Parameters for running exactly one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(flatten)]
    pub target: TargetConfig,
    pub query: String,
    pub output: OutputFormat,
}

/// Parameters for an interactive query session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellConfig {
    #[serde(flatten)]
    pub target: TargetConfig,
    /// Command executed when the session starts.
    pub command: Option<String>,
    pub incognito: bool,
    pub policies: Vec<String>,
    /// Banner printed by the session; set by the shell command.
    pub welcome_message: Option<String>,
}

// ============================================================================
// Builders
// ============================================================================

impl TargetConfig {
    /// Validate and normalize the parts shared by run and shell.
    pub fn build(req: &RunRequest) -> Result<Self> {
        let flags = &req.flags;
        let settings = &req.settings;
        let provider = req.target.provider;

        let password = match (&flags.password, flags.ask_pass) {
            (Some(_), true) => {
                return Err(Error::config(
                    "--ask-pass and --password are mutually exclusive",
                ));
            }
            (Some(secret), false) => PasswordSource::Value(secret.clone()),
            (None, true) => PasswordSource::Prompt,
            (None, false) => PasswordSource::None,
        };

        let identity_file = match flags.identity_file.as_deref() {
            Some(raw) => {
                let path = expand_tilde(raw);
                if !path.is_file() {
                    return Err(Error::config(format!(
                        "identity file {} does not exist",
                        path.display()
                    )));
                }
                Some(path)
            }
            None => None,
        };

        check_provider_options(provider, flags)?;

        let recording = if settings.record() || settings.record_file.is_some() {
            if !provider.is_operating_system() {
                return Err(Error::config(format!(
                    "recording is only supported for operating system providers, not {provider}"
                )));
            }
            let file = match settings.record_file.as_deref() {
                Some(file) => expand_tilde(file),
                None => default_recording_file(Local::now()),
            };
            Some(Recording { file })
        } else {
            None
        };

        let mut targets = BTreeSet::from([flags.discover]);
        if flags.instances {
            targets.insert(DiscoveryMode::Instances);
        }
        if flags.host_machines {
            targets.insert(DiscoveryMode::HostMachines);
        }

        Ok(Self {
            provider,
            asset: req.target.asset,
            selection: AssetSelection {
                args: req.args.clone(),
                platform_id: settings.platform_id.clone(),
                discovery: Discovery {
                    targets,
                    filter: flags.discover_filter.clone(),
                },
            },
            connection: Connection {
                credentials: Credentials {
                    password,
                    identity_file,
                },
                insecure: settings.insecure(),
                sudo: Sudo {
                    active: settings.sudo_active(),
                },
                path: flags.path.as_deref().map(expand_tilde),
                options: flags.options.clone(),
                provider_options: flags.provider_options.clone(),
                provider_secrets: flags.provider_secrets.clone(),
            },
            recording,
            vault: settings.vault_name.clone(),
        })
    }
}

impl RunConfig {
    /// Build the configuration for a single query.
    ///
    /// The query comes from `--command`, falling back to the hidden
    /// `--query` flag. Output precedence is `--ast`, `--parse`, `--json`,
    /// then the configured `output` format.
    pub fn build(req: &RunRequest) -> Result<Self> {
        let target = TargetConfig::build(req)?;

        let query = req
            .settings
            .command
            .clone()
            .or_else(|| req.settings.query.clone())
            .ok_or_else(|| Error::config("no query provided; pass one with --command"))?;

        let flags = &req.flags;
        let output = if flags.ast {
            OutputFormat::Ast
        } else if flags.parse {
            OutputFormat::Parse
        } else if flags.json {
            OutputFormat::Json
        } else {
            match req.settings.output.as_deref() {
                Some(format) => format.parse()?,
                None => OutputFormat::Text,
            }
        };

        Ok(Self {
            target,
            query,
            output,
        })
    }
}

impl ShellConfig {
    /// Build the configuration for an interactive session.
    pub fn build(req: &RunRequest) -> Result<Self> {
        let target = TargetConfig::build(req)?;
        Ok(Self {
            target,
            command: req.settings.command.clone(),
            incognito: req.settings.incognito(),
            policies: req.settings.policies.clone().unwrap_or_default(),
            welcome_message: None,
        })
    }
}

/// File used by `--record` when no `--record-file` is given.
pub fn default_recording_file(now: DateTime<Local>) -> PathBuf {
    PathBuf::from(format!("recording-{}.toml", now.format("%Y%m%d%H%M%S")))
}

fn check_provider_options(provider: ProviderType, flags: &FlagValues) -> Result<()> {
    let has_option = |name: &str| flags.provider_options.contains_key(name);
    let has_secret = |name: &str| flags.provider_secrets.contains_key(name);

    match provider {
        ProviderType::Github if !has_secret("token") => Err(Error::config(
            "a GitHub token is required; pass --token or set GITHUB_TOKEN",
        )),
        ProviderType::Gitlab if !has_secret("token") => Err(Error::config(
            "a GitLab token is required; pass --token or set GITLAB_TOKEN",
        )),
        ProviderType::Gitlab if !has_option("group") => {
            Err(Error::config("a GitLab group is required; pass --group"))
        }
        ProviderType::Ms365 if !has_option("tenant-id") || !has_option("client-id") => Err(
            Error::config("Microsoft 365 requires --tenant-id and --client-id"),
        ),
        ProviderType::Ms365 if !has_secret("client-secret") && !has_option("certificate-path") => {
            Err(Error::config(
                "Microsoft 365 requires --client-secret or --certificate-path",
            ))
        }
        ProviderType::Azure if has_option("client-id") && !has_option("tenant-id") => Err(
            Error::config("--client-id requires --tenant-id for Azure"),
        ),
        _ => Ok(()),
    }
}

// ============================================================================
// Tests
// ============================================================================
