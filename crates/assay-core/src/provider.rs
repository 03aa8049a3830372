//! Provider and asset types, and the target table that maps subcommand paths
//! onto them.
//!
//! The CLI exposes every provider as a (possibly nested) subcommand of `run`
//! and `shell`, e.g. `run container image ubuntu:22.04`. The path tokens
//! (`["container", "image"]`) are looked up in a [`TargetTable`]; a match
//! yields exactly one [`ResolvedTarget`], anything else is a usage error.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

// ============================================================================
// Provider / asset enums
// ============================================================================

/// Target category the engine connects to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderType {
    Local,
    Mock,
    Vagrant,
    Terraform,
    Ssh,
    Winrm,
    Container,
    ContainerRegistry,
    Docker,
    Kubernetes,
    Aws,
    AwsEc2Connect,
    AwsEc2Ebs,
    AwsSsm,
    Azure,
    Gcp,
    Vsphere,
    Github,
    Gitlab,
    Ms365,
    Host,
    Arista,
}

impl ProviderType {
    /// Stable identifier, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Mock => "mock",
            Self::Vagrant => "vagrant",
            Self::Terraform => "terraform",
            Self::Ssh => "ssh",
            Self::Winrm => "winrm",
            Self::Container => "container",
            Self::ContainerRegistry => "container-registry",
            Self::Docker => "docker",
            Self::Kubernetes => "kubernetes",
            Self::Aws => "aws",
            Self::AwsEc2Connect => "aws-ec2-connect",
            Self::AwsEc2Ebs => "aws-ec2-ebs",
            Self::AwsSsm => "aws-ssm",
            Self::Azure => "azure",
            Self::Gcp => "gcp",
            Self::Vsphere => "vsphere",
            Self::Github => "github",
            Self::Gitlab => "gitlab",
            Self::Ms365 => "ms365",
            Self::Host => "host",
            Self::Arista => "arista",
        }
    }

    /// Operating-system providers, the only ones whose calls can be recorded.
    pub fn is_operating_system(&self) -> bool {
        matches!(
            self,
            Self::Local
                | Self::Mock
                | Self::Vagrant
                | Self::Ssh
                | Self::Winrm
                | Self::Container
                | Self::Docker
        )
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sub-target within a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetType {
    /// Let the engine detect the asset kind from the target argument.
    Default,
    Container,
    Image,
    Registry,
    Instance,
    Volume,
    Snapshot,
    Account,
    Project,
    Organization,
    Repository,
    Group,
    Tenant,
    Vm,
    Hcl,
    Plan,
    State,
}

impl AssetType {
    /// Stable identifier, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Container => "container",
            Self::Image => "image",
            Self::Registry => "registry",
            Self::Instance => "instance",
            Self::Volume => "volume",
            Self::Snapshot => "snapshot",
            Self::Account => "account",
            Self::Project => "project",
            Self::Organization => "organization",
            Self::Repository => "repository",
            Self::Group => "group",
            Self::Tenant => "tenant",
            Self::Vm => "vm",
            Self::Hcl => "hcl",
            Self::Plan => "plan",
            Self::State => "state",
        }
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Target table entries
// ============================================================================

/// Positional argument contract of a target subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetArgs {
    /// The subcommand takes no positional argument.
    None,
    /// One optional positional argument with the given value name.
    Optional(&'static str),
    /// One required positional argument with the given value name.
    Required(&'static str),
}

/// A string flag only meaningful for one provider (e.g. `--region` for aws).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderFlag {
    pub name: &'static str,
    pub help: &'static str,
    /// Environment variable consulted when the flag is absent.
    pub env: Option<&'static str>,
    /// Secret values are redacted from debug output.
    pub secret: bool,
}

impl ProviderFlag {
    const fn plain(name: &'static str, help: &'static str) -> Self {
        Self {
            name,
            help,
            env: None,
            secret: false,
        }
    }

    const fn secret(name: &'static str, help: &'static str, env: Option<&'static str>) -> Self {
        Self {
            name,
            help,
            env,
            secret: true,
        }
    }
}

/// One entry of the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSpec {
    /// Subcommand tokens leading to this target.
    pub path: &'static [&'static str],
    /// Key used to look up documentation overrides.
    pub key: &'static str,
    pub provider: ProviderType,
    pub asset: AssetType,
    pub args: TargetArgs,
    /// Default one-line description.
    pub short: &'static str,
    /// Provider-specific flags, inherited by nested targets.
    pub flags: &'static [ProviderFlag],
}

impl TargetSpec {
    /// The subcommand name of this entry (last path token).
    pub fn name(&self) -> &'static str {
        self.path.last().copied().unwrap_or_default()
    }

    fn parent(&self) -> &'static [&'static str] {
        let path = self.path;
        &path[..path.len().saturating_sub(1)]
    }
}

const AWS_FLAGS: &[ProviderFlag] = &[
    ProviderFlag::plain("region", "AWS region to scan"),
    ProviderFlag::plain("profile", "AWS configuration profile to use"),
];

const AZURE_FLAGS: &[ProviderFlag] = &[
    ProviderFlag::plain("subscription", "Azure subscription ID"),
    ProviderFlag::plain("tenant-id", "Azure tenant ID"),
    ProviderFlag::plain("client-id", "Azure client (application) ID"),
    ProviderFlag::secret("client-secret", "Azure client secret", None),
];

const GCP_FLAGS: &[ProviderFlag] = &[ProviderFlag::plain("project-id", "GCP project ID")];

const GITHUB_FLAGS: &[ProviderFlag] = &[ProviderFlag::secret(
    "token",
    "GitHub personal access token",
    Some("GITHUB_TOKEN"),
)];

const GITLAB_FLAGS: &[ProviderFlag] = &[
    ProviderFlag::plain("group", "GitLab group to scan"),
    ProviderFlag::secret("token", "GitLab personal access token", Some("GITLAB_TOKEN")),
];

const KUBERNETES_FLAGS: &[ProviderFlag] = &[
    ProviderFlag::plain("context", "kubeconfig context to use"),
    ProviderFlag::plain("namespace", "only scan resources in this namespace"),
];

const MS365_FLAGS: &[ProviderFlag] = &[
    ProviderFlag::plain("tenant-id", "Microsoft 365 tenant ID"),
    ProviderFlag::plain("client-id", "Microsoft 365 client (application) ID"),
    ProviderFlag::secret("client-secret", "Microsoft 365 client secret", None),
    ProviderFlag::plain("certificate-path", "path to a PKCS #12 certificate"),
    ProviderFlag::secret("certificate-secret", "passphrase of the certificate", None),
];

macro_rules! target {
    ([$($seg:literal),+], $key:literal, $provider:ident, $asset:ident, $args:expr, $short:literal) => {
        target!([$($seg),+], $key, $provider, $asset, $args, $short, &[])
    };
    ([$($seg:literal),+], $key:literal, $provider:ident, $asset:ident, $args:expr, $short:literal, $flags:expr) => {
        TargetSpec {
            path: &[$($seg),+],
            key: $key,
            provider: ProviderType::$provider,
            asset: AssetType::$asset,
            args: $args,
            short: $short,
            flags: $flags,
        }
    };
}

/// All targets understood by `run` and `shell`.
pub static TARGETS: &[TargetSpec] = &[
    target!(["local"], "local", Local, Default, TargetArgs::None, "Scan the local system"),
    target!(["mock"], "mock", Mock, Default, TargetArgs::Required("RECORDING"), "Scan a recorded asset"),
    target!(["vagrant"], "vagrant", Vagrant, Default, TargetArgs::Required("HOST"), "Scan a Vagrant host"),
    target!(["terraform"], "terraform", Terraform, Hcl, TargetArgs::Required("PATH"), "Scan Terraform HCL files"),
    target!(["terraform", "plan"], "terraform-plan", Terraform, Plan, TargetArgs::Required("PLAN"), "Scan a Terraform plan file"),
    target!(["terraform", "state"], "terraform-state", Terraform, State, TargetArgs::Required("STATE"), "Scan a Terraform state file"),
    target!(["ssh"], "ssh", Ssh, Default, TargetArgs::Required("USER@HOST"), "Scan a remote system via SSH"),
    target!(["winrm"], "winrm", Winrm, Default, TargetArgs::Required("USER@HOST"), "Scan a remote system via WinRM"),
    target!(["container"], "container", Container, Default, TargetArgs::Required("ID"), "Scan a container, an image, or a registry"),
    target!(["container", "image"], "container-image", Container, Image, TargetArgs::Required("IMAGE"), "Scan a container image"),
    target!(["container", "registry"], "container-registry", ContainerRegistry, Registry, TargetArgs::Required("REGISTRY"), "Scan a container registry"),
    target!(["docker"], "docker", Docker, Default, TargetArgs::Required("ID"), "Scan a Docker container or image"),
    target!(["docker", "container"], "docker-container", Docker, Container, TargetArgs::Required("ID"), "Scan a Docker container"),
    target!(["docker", "image"], "docker-image", Docker, Image, TargetArgs::Required("IMAGE"), "Scan a Docker image"),
    target!(["kubernetes"], "kubernetes", Kubernetes, Default, TargetArgs::Optional("MANIFEST"), "Scan a Kubernetes cluster or manifest", KUBERNETES_FLAGS),
    target!(["aws"], "aws", Aws, Account, TargetArgs::None, "Scan an AWS account", AWS_FLAGS),
    target!(["aws", "ec2"], "aws-ec2", Aws, Instance, TargetArgs::Required("USER@HOST"), "Scan an AWS EC2 instance"),
    target!(["aws", "ec2", "connect"], "aws-ec2-connect", AwsEc2Connect, Instance, TargetArgs::Required("USER@HOST"), "Scan an AWS EC2 instance via EC2 Instance Connect"),
    target!(["aws", "ec2", "ebs"], "aws-ec2-ebs-instance", AwsEc2Ebs, Instance, TargetArgs::Required("INSTANCE"), "Scan an AWS EC2 instance via an EBS volume scan"),
    target!(["aws", "ec2", "ebs", "volume"], "aws-ec2-ebs-volume", AwsEc2Ebs, Volume, TargetArgs::Required("VOLUME"), "Scan an AWS EBS volume"),
    target!(["aws", "ec2", "ebs", "snapshot"], "aws-ec2-ebs-snapshot", AwsEc2Ebs, Snapshot, TargetArgs::Required("SNAPSHOT"), "Scan an AWS EBS snapshot"),
    target!(["aws", "ec2", "ssm"], "aws-ec2-ssm", AwsSsm, Instance, TargetArgs::Required("INSTANCE"), "Scan an AWS EC2 instance via AWS Systems Manager"),
    target!(["azure"], "azure", Azure, Account, TargetArgs::None, "Scan a Microsoft Azure subscription", AZURE_FLAGS),
    target!(["gcp"], "gcp", Gcp, Project, TargetArgs::None, "Scan a Google Cloud project", GCP_FLAGS),
    target!(["gcp", "gcr"], "gcp-gcr", Gcp, Registry, TargetArgs::Required("PROJECT"), "Scan a Google Container Registry"),
    target!(["vsphere"], "vsphere", Vsphere, Default, TargetArgs::Required("USER@HOST"), "Scan a VMware vSphere API endpoint"),
    target!(["vsphere", "vm"], "vsphere-vm", Vsphere, Vm, TargetArgs::Required("USER@HOST"), "Scan a VMware vSphere VM"),
    target!(["github"], "github", Github, Default, TargetArgs::Required("NAME"), "Scan a GitHub organization or repository", GITHUB_FLAGS),
    target!(["github", "org"], "github-org", Github, Organization, TargetArgs::Required("ORG"), "Scan a GitHub organization"),
    target!(["github", "repo"], "github-repo", Github, Repository, TargetArgs::Required("OWNER/REPO"), "Scan a GitHub repository"),
    target!(["gitlab"], "gitlab", Gitlab, Group, TargetArgs::None, "Scan a GitLab group", GITLAB_FLAGS),
    target!(["ms365"], "ms365", Ms365, Tenant, TargetArgs::None, "Scan a Microsoft 365 tenant", MS365_FLAGS),
    target!(["host"], "host", Host, Default, TargetArgs::Required("HOST"), "Scan a host endpoint"),
    target!(["arista"], "arista", Arista, Default, TargetArgs::Required("USER@HOST"), "Scan an Arista EOS endpoint"),
];

// ============================================================================
// TargetTable
// ============================================================================

/// Provider/asset pair selected for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub provider: ProviderType,
    pub asset: AssetType,
    /// Docs key of the table entry the path matched.
    pub key: &'static str,
}

impl From<&TargetSpec> for ResolvedTarget {
    fn from(spec: &TargetSpec) -> Self {
        Self {
            provider: spec.provider,
            asset: spec.asset,
            key: spec.key,
        }
    }
}

/// Validated lookup table from subcommand paths to targets.
#[derive(Debug, Clone, Copy)]
pub struct TargetTable {
    specs: &'static [TargetSpec],
}

impl TargetTable {
    /// The built-in table, validated.
    pub fn builtin() -> Result<Self> {
        Self::new(TARGETS)
    }

    /// Create a table from `specs`, rejecting duplicates and orphans.
    pub fn new(specs: &'static [TargetSpec]) -> Result<Self> {
        let mut paths = HashSet::new();
        let mut keys = HashSet::new();

        for spec in specs {
            if spec.path.is_empty() {
                return Err(Error::invalid_data(format!(
                    "target '{}' has an empty path",
                    spec.key
                )));
            }
            if !paths.insert(spec.path) {
                return Err(Error::invalid_data(format!(
                    "duplicate target path '{}'",
                    spec.path.join(" ")
                )));
            }
            if !keys.insert(spec.key) {
                return Err(Error::invalid_data(format!(
                    "duplicate target key '{}'",
                    spec.key
                )));
            }
        }

        for spec in specs {
            let parent = spec.parent();
            if !parent.is_empty() && !paths.contains(&parent) {
                return Err(Error::invalid_data(format!(
                    "target '{}' is nested under unknown target '{}'",
                    spec.path.join(" "),
                    parent.join(" ")
                )));
            }
        }

        Ok(Self { specs })
    }

    /// All entries, in declaration order.
    pub fn specs(&self) -> &'static [TargetSpec] {
        self.specs
    }

    /// Entry whose path equals `path`.
    pub fn get<S: AsRef<str>>(&self, path: &[S]) -> Option<&'static TargetSpec> {
        self.specs.iter().find(|spec| {
            spec.path.len() == path.len()
                && spec.path.iter().zip(path).all(|(a, b)| *a == b.as_ref())
        })
    }

    /// Direct children of `parent` (top-level targets for an empty parent).
    pub fn children<'a>(
        &'a self,
        parent: &'a [&'static str],
    ) -> impl Iterator<Item = &'static TargetSpec> + 'a {
        self.specs.iter().filter(move |spec| spec.parent() == parent)
    }

    /// Resolve a subcommand path to exactly one target.
    ///
    /// An empty path selects the local system.
    pub fn resolve<S: AsRef<str>>(&self, path: &[S]) -> Result<ResolvedTarget> {
        if path.is_empty() {
            return self
                .get(&["local"])
                .map(ResolvedTarget::from)
                .ok_or_else(|| Error::usage("no default target is available"));
        }

        match self.get(path) {
            Some(spec) => {
                log::debug!(
                    "resolved target '{}' to {}/{}",
                    spec.path.join(" "),
                    spec.provider,
                    spec.asset
                );
                Ok(spec.into())
            }
            None => {
                let joined: Vec<&str> = path.iter().map(AsRef::as_ref).collect();
                Err(Error::usage(format!(
                    "unknown target '{}'",
                    joined.join(" ")
                )))
            }
        }
    }

    /// Provider flags visible at `path`: those of the entry and its ancestors.
    pub fn flags_for(&self, path: &[&'static str]) -> Vec<&'static ProviderFlag> {
        let mut flags: Vec<&'static ProviderFlag> = Vec::new();
        for len in 1..=path.len() {
            if let Some(spec) = self.get(&path[..len]) {
                for flag in spec.flags {
                    if !flags.iter().any(|f| f.name == flag.name) {
                        flags.push(flag);
                    }
                }
            }
        }
        flags
    }
}

// ============================================================================
// Tests
// ============================================================================
