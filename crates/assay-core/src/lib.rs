//! Assay Core: shared types, errors, and run configuration.
//!
//! This crate has no internal Assay dependencies and no CLI dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`provider`]: Provider/asset types and the target table
//! - [`discovery`]: Asset discovery modes
//! - [`settings`]: The settings store flags are bound to
//! - [`run_config`]: Run and shell configuration builders
//! - [`traits`]: The [`QueryEngine`] seam
//! - [`version`]: Product version information
//! - [`util`]: Path helpers

pub mod discovery;
pub mod error;
pub mod provider;
pub mod run_config;
pub mod settings;
pub mod traits;
pub mod util;
pub mod version;

// Re-export key types at crate root for convenience
pub use discovery::DiscoveryMode;
pub use error::{Error, Result};
pub use provider::{AssetType, ProviderType, ResolvedTarget, TargetTable};
pub use run_config::{FlagValues, OutputFormat, RunConfig, RunRequest, Secret, ShellConfig};
pub use settings::{SettingKey, SettingValue, Settings};
pub use traits::QueryEngine;
