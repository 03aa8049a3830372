//! Asset discovery modes.
//!
//! The `--discover` flag selects which nested assets the engine enumerates.
//! `run` accepts the full set; `shell` a narrower one.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Which nested assets are enumerated for scanning.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum DiscoveryMode {
    /// Provider default.
    #[default]
    Auto,
    All,
    Instances,
    HostInstances,
    HostMachines,
    Container,
    ContainerImages,
    Pods,
    Cronjobs,
    Statefulsets,
    Deployments,
    Jobs,
    Replicasets,
    Daemonsets,
}

impl DiscoveryMode {
    /// Modes accepted by `run`.
    pub const RUN: &'static [DiscoveryMode] = &[
        Self::Auto,
        Self::All,
        Self::Instances,
        Self::HostInstances,
        Self::HostMachines,
        Self::Container,
        Self::ContainerImages,
        Self::Pods,
        Self::Cronjobs,
        Self::Statefulsets,
        Self::Deployments,
        Self::Jobs,
        Self::Replicasets,
        Self::Daemonsets,
    ];

    /// Modes accepted by `shell`.
    pub const SHELL: &'static [DiscoveryMode] = &[
        Self::Auto,
        Self::All,
        Self::Instances,
        Self::HostInstances,
        Self::HostMachines,
        Self::Container,
        Self::ContainerImages,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::All => "all",
            Self::Instances => "instances",
            Self::HostInstances => "host-instances",
            Self::HostMachines => "host-machines",
            Self::Container => "container",
            Self::ContainerImages => "container-images",
            Self::Pods => "pods",
            Self::Cronjobs => "cronjobs",
            Self::Statefulsets => "statefulsets",
            Self::Deployments => "deployments",
            Self::Jobs => "jobs",
            Self::Replicasets => "replicasets",
            Self::Daemonsets => "daemonsets",
        }
    }

    /// String forms of `modes`, for help text and value validation.
    pub fn names(modes: &[DiscoveryMode]) -> Vec<&'static str> {
        modes.iter().map(DiscoveryMode::as_str).collect()
    }
}

impl fmt::Display for DiscoveryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DiscoveryMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::RUN
            .iter()
            .copied()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| Error::usage(format!("unsupported discovery mode '{s}'")))
    }
}
