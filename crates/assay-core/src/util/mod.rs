//! Utility modules.
//!
//! # Modules
//!
//! - [`paths`]: Path helpers (tilde expansion)

pub mod paths;
