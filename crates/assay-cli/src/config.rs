//! Configuration for the Assay CLI.
//!
//! Provides the [`AssayConfig`] struct that loads from TOML files,
//! environment variables, and defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `ASSAY_CONFIG` environment variable
//! 3. XDG default: `~/.config/assay/config.toml`
//! 4. Built-in defaults
//!
//! The loaded values seed the [`Settings`] store; flags given on the command
//! line override them.

use assay_core::util::paths::expand_tilde;
use assay_core::{Error, Result, Settings};
use confyg::{Confygery, env};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the Assay CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssayConfig {
    /// Disable TLS/SSL and SSH host key checks by default.
    #[serde(deserialize_with = "flag")]
    pub insecure: Option<bool>,

    /// Platform ID of the asset to select.
    pub platform_id: Option<String>,

    /// Output format for `run` (`text`, `json`, `parse`, `ast`).
    pub output: Option<String>,

    /// Run shell sessions without reporting results upstream.
    #[serde(deserialize_with = "flag")]
    pub incognito: Option<bool>,

    /// Policies loaded into shell sessions.
    #[serde(deserialize_with = "list")]
    pub policies: Option<Vec<String>>,

    pub sudo: SudoConfig,

    pub vault: VaultConfig,

    pub engine: EngineConfig,
}

/// Privilege elevation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SudoConfig {
    #[serde(deserialize_with = "flag")]
    pub active: Option<bool>,
}

/// Credential vault.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VaultConfig {
    pub name: Option<String>,
}

/// The external query engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable, looked up on `PATH` when not absolute.
    pub path: String,

    /// Arguments placed before the engine mode.
    #[serde(deserialize_with = "args")]
    pub args: Vec<String>,
}

// ============================================================================
// Environment-tolerant fields
// ============================================================================

// Values from `ASSAY_*` variables reach serde as strings, so the typed fields
// below also accept their string spelling.

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagRepr {
    Bool(bool),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListRepr {
    Items(Vec<String>),
    Text(String),
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<bool>, D::Error> {
    match Option::<FlagRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FlagRepr::Bool(value)) => Ok(Some(value)),
        Some(FlagRepr::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" | "on" => Ok(Some(true)),
            "false" | "0" | "no" | "off" => Ok(Some(false)),
            _ => Err(de::Error::custom(format!(
                "invalid boolean '{text}'; use true or false"
            ))),
        },
    }
}

/// A list, or a comma-separated string.
fn list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Vec<String>>, D::Error> {
    Ok(match Option::<ListRepr>::deserialize(deserializer)? {
        None => None,
        Some(ListRepr::Items(items)) => Some(items),
        Some(ListRepr::Text(text)) => Some(
            text.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(String::from)
                .collect(),
        ),
    })
}

fn args<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Vec<String>, D::Error> {
    Ok(list(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            path: assay_engine::ProcessEngine::DEFAULT_PROGRAM.to_string(),
            args: Vec::new(),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl AssayConfig {
    /// Load configuration from file, environment, and defaults.
    ///
    /// A missing file is not an error; the defaults are used instead.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                log::debug!("loading config from {}", path.display());
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level("ASSAY");
        env_opts.add_section("sudo");
        env_opts.add_section("vault");
        env_opts.add_section("engine");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        let config: Self = builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))?;

        Ok(config)
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        // 1. Explicit --config flag
        if let Some(path) = explicit {
            return Some(expand_tilde(path));
        }

        // 2. ASSAY_CONFIG env var
        if let Ok(path) = std::env::var("ASSAY_CONFIG") {
            return Some(expand_tilde(&path));
        }

        // 3. XDG default
        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("assay").join("config.toml"))
    }

    /// The settings store seeded with this configuration.
    pub fn settings(&self) -> Settings {
        Settings {
            insecure: self.insecure,
            sudo_active: self.sudo.active,
            output: self.output.clone(),
            vault_name: self.vault.name.clone(),
            platform_id: self.platform_id.clone(),
            incognito: self.incognito,
            policies: self.policies.clone(),
            ..Settings::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// RAII guard for env var manipulation in tests.
    struct EnvGuard {
        key: String,
        prev: Option<String>,
    }

    #[allow(unsafe_code)]
    impl EnvGuard {
        fn new(key: &str, value: &str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: only the single test touching ASSAY_* variables runs this.
            unsafe { std::env::set_var(key, value) };
            Self {
                key: key.to_string(),
                prev,
            }
        }

        fn remove(key: &str) -> Self {
            let prev = std::env::var(key).ok();
            // SAFETY: see `new`.
            unsafe { std::env::remove_var(key) };
            Self {
                key: key.to_string(),
                prev,
            }
        }
    }

    #[allow(unsafe_code)]
    impl Drop for EnvGuard {
        fn drop(&mut self) {
            // SAFETY: see `new`.
            unsafe {
                match &self.prev {
                    Some(val) => std::env::set_var(&self.key, val),
                    None => std::env::remove_var(&self.key),
                }
            }
        }
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        let path = path.to_str().unwrap().to_string();
        (dir, path)
    }

    // ------------------------------------------------------------------------
    // Default tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_assay_config_default() {
        let config = AssayConfig::default();
        assert!(config.insecure.is_none());
        assert!(config.sudo.active.is_none());
        assert_eq!(config.engine.path, "assay-engine");
        assert!(config.engine.args.is_empty());
        assert_eq!(config.settings(), Settings::default());
    }

    // ------------------------------------------------------------------------
    // Serialization tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_assay_config_from_toml() {
        let toml_str = r#"
            insecure = true
            platform_id = "//platformid.example.com/machines/abc"
            output = "json"
            incognito = true
            policies = ["linux-baseline", "ssh-hardening"]

            [sudo]
            active = true

            [vault]
            name = "team-vault"

            [engine]
            path = "/opt/assay/bin/engine"
            args = ["--log-level", "warn"]
        "#;

        let config: AssayConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.insecure, Some(true));
        assert_eq!(config.sudo.active, Some(true));
        assert_eq!(config.vault.name.as_deref(), Some("team-vault"));
        assert_eq!(config.engine.path, "/opt/assay/bin/engine");
        assert_eq!(config.engine.args, vec!["--log-level", "warn"]);

        let settings = config.settings();
        assert!(settings.insecure());
        assert!(settings.sudo_active());
        assert_eq!(settings.output.as_deref(), Some("json"));
        assert_eq!(settings.vault_name.as_deref(), Some("team-vault"));
        assert_eq!(
            settings.policies,
            Some(vec!["linux-baseline".to_string(), "ssh-hardening".to_string()])
        );
        assert!(settings.command.is_none());
    }

    #[test]
    fn test_typed_fields_accept_strings() {
        let config: AssayConfig = toml::from_str(
            r#"
                insecure = "false"
                incognito = "yes"
                policies = "a,b"

                [sudo]
                active = ""

                [engine]
                args = "--log-level,warn"
            "#,
        )
        .unwrap();
        assert_eq!(config.insecure, Some(false));
        assert_eq!(config.incognito, Some(true));
        assert!(config.sudo.active.is_none());
        assert_eq!(config.policies, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(config.engine.args, vec!["--log-level", "warn"]);

        let err = toml::from_str::<AssayConfig>(r#"insecure = "not-a-bool""#).unwrap_err();
        assert!(err.to_string().contains("invalid boolean"));
    }

    #[test]
    fn test_assay_config_to_toml() {
        let config = AssayConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[engine]"));
        assert!(toml_str.contains("path = \"assay-engine\""));

        let parsed: AssayConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    // ------------------------------------------------------------------------
    // Loading tests
    // ------------------------------------------------------------------------

    #[test]
    fn test_assay_config_load_from_file() {
        let (_dir, path) = write_config(
            r#"
                platform_id = "abc"
                [engine]
                path = "/usr/local/bin/engine"
            "#,
        );

        let config = AssayConfig::load(Some(&path)).unwrap();
        assert_eq!(config.platform_id.as_deref(), Some("abc"));
        assert_eq!(config.engine.path, "/usr/local/bin/engine");
    }

    #[test]
    fn test_assay_config_load_defaults() {
        let config = AssayConfig::load(Some("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.engine.path, "assay-engine");
        assert!(config.platform_id.is_none());
    }

    // Everything that reads or writes ASSAY_* variables lives in this one
    // test so that no other test observes them.
    #[test]
    fn test_assay_config_environment() {
        // Env vars override file values.
        let (_dir, path) = write_config(
            r#"
                insecure = false
                [vault]
                name = "file-vault"
            "#,
        );
        {
            let _guard = EnvGuard::new("ASSAY_VAULT_NAME", "env-vault");
            let config = AssayConfig::load(Some(&path)).unwrap();
            assert_eq!(config.vault.name.as_deref(), Some("env-vault"));
            assert_eq!(config.insecure, Some(false));
        }

        // Typed fields accept the string form env vars arrive in.
        {
            let _insecure = EnvGuard::new("ASSAY_INSECURE", "true");
            let _incognito = EnvGuard::new("ASSAY_INCOGNITO", "1");
            let _sudo = EnvGuard::new("ASSAY_SUDO_ACTIVE", "TRUE");
            let _policies = EnvGuard::new("ASSAY_POLICIES", "linux-baseline, ssh-hardening");
            let config = AssayConfig::load(Some(&path)).unwrap();
            assert_eq!(config.insecure, Some(true));
            assert_eq!(config.incognito, Some(true));
            assert_eq!(config.sudo.active, Some(true));
            assert_eq!(
                config.policies,
                Some(vec!["linux-baseline".to_string(), "ssh-hardening".to_string()])
            );
            assert!(config.settings().insecure());
        }

        // resolve_config_path
        {
            let _guard = EnvGuard::new("ASSAY_CONFIG", "/env/config.toml");
            assert_eq!(
                AssayConfig::resolve_config_path(Some("/explicit/config.toml")),
                Some(PathBuf::from("/explicit/config.toml"))
            );
            assert_eq!(
                AssayConfig::resolve_config_path(None),
                Some(PathBuf::from("/env/config.toml"))
            );
        }
        {
            let _guard = EnvGuard::remove("ASSAY_CONFIG");
            assert_eq!(
                AssayConfig::resolve_config_path(None),
                AssayConfig::default_config_path()
            );
        }
    }

    #[test]
    fn test_default_config_path_ends_with_assay() {
        if let Some(path) = AssayConfig::default_config_path() {
            assert!(path.ends_with("assay/config.toml"));
        }
    }
}
