//! The settings store.
//!
//! [`Settings`] holds the option values that flags are bound to before the
//! run configuration is built. It is seeded from the config file, updated
//! by the CLI's binder, read once by [`RunConfig::build`](crate::RunConfig::build)
//! and then dropped. Each field is an `Option` so that "not set" can be told
//! apart from an explicit default.

use std::fmt;

/// Keys of the settings store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SettingKey {
    Insecure,
    SudoActive,
    Output,
    VaultName,
    PlatformId,
    Query,
    Command,
    Record,
    RecordFile,
    Incognito,
    Policies,
}

impl SettingKey {
    /// Dotted option name, as used in config files.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insecure => "insecure",
            Self::SudoActive => "sudo.active",
            Self::Output => "output",
            Self::VaultName => "vault.name",
            Self::PlatformId => "platform-id",
            Self::Query => "query",
            Self::Command => "command",
            Self::Record => "record",
            Self::RecordFile => "record-file",
            Self::Incognito => "incognito",
            Self::Policies => "policies",
        }
    }
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value copied from a flag into the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingValue {
    Bool(bool),
    Text(String),
    List(Vec<String>),
}

/// Bound option values for one invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub insecure: Option<bool>,
    pub sudo_active: Option<bool>,
    pub output: Option<String>,
    pub vault_name: Option<String>,
    pub platform_id: Option<String>,
    pub query: Option<String>,
    pub command: Option<String>,
    pub record: Option<bool>,
    pub record_file: Option<String>,
    pub incognito: Option<bool>,
    pub policies: Option<Vec<String>>,
}

impl Settings {
    /// Whether `key` already holds a value.
    pub fn is_set(&self, key: SettingKey) -> bool {
        match key {
            SettingKey::Insecure => self.insecure.is_some(),
            SettingKey::SudoActive => self.sudo_active.is_some(),
            SettingKey::Output => self.output.is_some(),
            SettingKey::VaultName => self.vault_name.is_some(),
            SettingKey::PlatformId => self.platform_id.is_some(),
            SettingKey::Query => self.query.is_some(),
            SettingKey::Command => self.command.is_some(),
            SettingKey::Record => self.record.is_some(),
            SettingKey::RecordFile => self.record_file.is_some(),
            SettingKey::Incognito => self.incognito.is_some(),
            SettingKey::Policies => self.policies.is_some(),
        }
    }

    /// Store `value` under `key`.
    ///
    /// A value of the wrong shape for the key is coerced the way a flag
    /// parser would: text `"true"` becomes a boolean, a boolean becomes its
    /// text form, text becomes a one-element list.
    pub fn set(&mut self, key: SettingKey, value: SettingValue) {
        match key {
            SettingKey::Insecure => self.insecure = Some(value.into_bool()),
            SettingKey::SudoActive => self.sudo_active = Some(value.into_bool()),
            SettingKey::Record => self.record = Some(value.into_bool()),
            SettingKey::Incognito => self.incognito = Some(value.into_bool()),
            SettingKey::Output => self.output = value.into_text(),
            SettingKey::VaultName => self.vault_name = value.into_text(),
            SettingKey::PlatformId => self.platform_id = value.into_text(),
            SettingKey::Query => self.query = value.into_text(),
            SettingKey::Command => self.command = value.into_text(),
            SettingKey::RecordFile => self.record_file = value.into_text(),
            SettingKey::Policies => self.policies = Some(value.into_list()),
        }
    }

    pub fn insecure(&self) -> bool {
        self.insecure.unwrap_or(false)
    }

    pub fn sudo_active(&self) -> bool {
        self.sudo_active.unwrap_or(false)
    }

    pub fn record(&self) -> bool {
        self.record.unwrap_or(false)
    }

    pub fn incognito(&self) -> bool {
        self.incognito.unwrap_or(false)
    }
}

impl SettingValue {
    fn into_bool(self) -> bool {
        match self {
            Self::Bool(b) => b,
            Self::Text(s) => matches!(s.as_str(), "true" | "1" | "yes"),
            Self::List(items) => !items.is_empty(),
        }
    }

    /// Empty strings count as "no value".
    fn into_text(self) -> Option<String> {
        let text = match self {
            Self::Bool(b) => b.to_string(),
            Self::Text(s) => s,
            Self::List(items) => items.join(","),
        };
        (!text.is_empty()).then_some(text)
    }

    fn into_list(self) -> Vec<String> {
        match self {
            Self::List(items) => items,
            Self::Text(s) if s.is_empty() => Vec::new(),
            Self::Text(s) => vec![s],
            Self::Bool(b) => vec![b.to_string()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unset() {
        let settings = Settings::default();
        assert!(!settings.is_set(SettingKey::Insecure));
        assert!(!settings.is_set(SettingKey::Command));
        assert!(!settings.insecure());
        assert!(!settings.sudo_active());
    }

    #[test]
    fn test_set_bool() {
        let mut settings = Settings::default();
        settings.set(SettingKey::SudoActive, SettingValue::Bool(true));
        assert!(settings.is_set(SettingKey::SudoActive));
        assert!(settings.sudo_active());
    }

    #[test]
    fn test_set_text_and_empty_text() {
        let mut settings = Settings::default();
        settings.set(SettingKey::Command, SettingValue::Text("asset.name".into()));
        assert_eq!(settings.command.as_deref(), Some("asset.name"));

        settings.set(SettingKey::PlatformId, SettingValue::Text(String::new()));
        assert!(settings.platform_id.is_none());
    }

    #[test]
    fn test_set_coerces_text_to_bool() {
        let mut settings = Settings::default();
        settings.set(SettingKey::Insecure, SettingValue::Text("true".into()));
        assert!(settings.insecure());
        settings.set(SettingKey::Insecure, SettingValue::Text("no".into()));
        assert!(!settings.insecure());
    }

    #[test]
    fn test_set_policies_from_text() {
        let mut settings = Settings::default();
        settings.set(SettingKey::Policies, SettingValue::Text("cis-linux".into()));
        assert_eq!(settings.policies, Some(vec!["cis-linux".to_string()]));
    }

    #[test]
    fn test_key_names() {
        assert_eq!(SettingKey::SudoActive.as_str(), "sudo.active");
        assert_eq!(SettingKey::VaultName.to_string(), "vault.name");
    }
}
