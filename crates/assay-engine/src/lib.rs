//! Query engine implementations.
//!
//! - [`ProcessEngine`]: hands the configuration to an external engine
//!   executable
//! - [`MockEngine`]: records calls instead of executing them, for tests

mod mock;
mod process;

pub use mock::{EngineCall, MockEngine};
pub use process::ProcessEngine;
