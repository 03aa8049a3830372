//! Command-line front end for the Assay scanner.
//!
//! This crate turns the command line into exactly one engine call: it
//! declares the flags of each command, binds flag values into the settings
//! store, resolves the selected target, builds the run configuration, and
//! hands it to a [`QueryEngine`](assay_core::QueryEngine).
//!
//! # Key Abstractions
//!
//! - [`AssayCli`]: Application parameterized over the query engine
//! - [`ProviderCommand`]: Command tree generated from the target table
//! - [`FlagSpec`](flags::FlagSpec) / [`Binding`](binder::Binding): Declarative
//!   flag and settings tables

pub mod app;
pub mod binder;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dispatch;
pub mod flags;

pub use app::{AssayCli, init_logging};
pub use cli::GlobalArgs;
pub use config::AssayConfig;
pub use dispatch::{CommandOpts, Invocation, ProviderCommand};
