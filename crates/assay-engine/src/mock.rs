//! Mock engine for testing.

use std::sync::{Arc, Mutex, PoisonError};

use assay_core::{Error, QueryEngine, Result, RunConfig, ShellConfig};

/// A call received by [`MockEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    /// `run_query` was called with this configuration.
    Query(RunConfig),
    /// `start_shell` was called with this configuration.
    Shell(ShellConfig),
}

/// Engine that records calls instead of executing them.
///
/// Clones share the same call log, so a test can keep one handle and give
/// another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct MockEngine {
    calls: Arc<Mutex<Vec<EngineCall>>>,
    failure: Option<String>,
}

impl MockEngine {
    /// Creates a mock engine whose calls succeed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock engine whose calls are recorded and then fail with
    /// `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            calls: Arc::default(),
            failure: Some(message.into()),
        }
    }

    /// All calls received so far, oldest first.
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn record(&self, call: EngineCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

impl QueryEngine for MockEngine {
    fn run_query(&self, config: &RunConfig) -> Result<()> {
        self.record(EngineCall::Query(config.clone()));
        match &self.failure {
            Some(message) => Err(Error::query(message.clone())),
            None => Ok(()),
        }
    }

    fn start_shell(&self, config: &ShellConfig) -> Result<()> {
        self.record(EngineCall::Shell(config.clone()));
        match &self.failure {
            Some(message) => Err(Error::shell(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assay_core::{FlagValues, RunRequest, Settings, TargetTable};

    fn run_config() -> RunConfig {
        let mut settings = Settings::default();
        settings.command = Some("true".into());
        let req = RunRequest {
            target: TargetTable::builtin().unwrap().resolve(&["local"]).unwrap(),
            args: Vec::new(),
            flags: FlagValues::default(),
            settings,
        };
        RunConfig::build(&req).unwrap()
    }

    #[test]
    fn test_mock_records_calls() {
        let engine = MockEngine::new();
        engine.run_query(&run_config()).unwrap();
        engine.run_query(&run_config()).unwrap();

        assert_eq!(engine.call_count(), 2);
        assert!(matches!(&engine.calls()[0], EngineCall::Query(c) if c.query == "true"));
    }

    #[test]
    fn test_mock_clone_shares_log() {
        let engine = MockEngine::new();
        let handle = engine.clone();
        engine.run_query(&run_config()).unwrap();
        assert_eq!(handle.call_count(), 1);
    }

    #[test]
    fn test_mock_failing() {
        let engine = MockEngine::failing("connection refused");
        let err = engine.run_query(&run_config()).unwrap_err();
        assert!(matches!(err, Error::Query(_)));
        assert!(err.to_string().contains("connection refused"));
        assert_eq!(engine.call_count(), 1);
    }
}
