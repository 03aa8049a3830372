//! The `run`, `shell`, and `version` commands.

pub mod run;
pub mod shell;
pub mod version;
