//! Configuration binder: copies selected flag values into [`Settings`].

use assay_core::{SettingKey, SettingValue, Settings};
use clap::ArgMatches;
use clap::parser::ValueSource;

/// Binds one flag to one settings key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub flag: &'static str,
    pub key: SettingKey,
}

impl Binding {
    pub const fn new(flag: &'static str, key: SettingKey) -> Self {
        Self { flag, key }
    }
}

/// Apply `bindings` to `settings`.
///
/// A flag given on the command line or through its environment variable
/// always wins. A flag left at its default only fills keys the config file
/// did not set. Bindings naming a flag the command does not declare, or a
/// string flag that was not given or given as an empty string, leave the
/// key untouched.
pub fn bind(matches: &ArgMatches, bindings: &[Binding], settings: &mut Settings) {
    for binding in bindings {
        let Some(value) = flag_value(matches, binding.flag) else {
            continue;
        };
        let explicit = matches!(
            matches.value_source(binding.flag),
            Some(ValueSource::CommandLine | ValueSource::EnvVariable)
        );
        if explicit || !settings.is_set(binding.key) {
            log::trace!("binding --{} to {}", binding.flag, binding.key);
            settings.set(binding.key, value);
        }
    }
}

fn flag_value(matches: &ArgMatches, flag: &str) -> Option<SettingValue> {
    if !matches.ids().any(|id| id.as_str() == flag) {
        return None;
    }
    if let Ok(Some(value)) = matches.try_get_one::<bool>(flag) {
        return Some(SettingValue::Bool(*value));
    }
    if let Ok(Some(values)) = matches.try_get_many::<String>(flag) {
        let mut values: Vec<String> = values.filter(|v| !v.is_empty()).cloned().collect();
        return match values.len() {
            0 => None,
            1 => Some(SettingValue::Text(values.remove(0))),
            _ => Some(SettingValue::List(values)),
        };
    }
    None
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::flags::{FlagSpec, INSECURE, SUDO};
    use clap::Command;

    const BINDINGS: &[Binding] = &[
        Binding::new("insecure", SettingKey::Insecure),
        Binding::new("sudo", SettingKey::SudoActive),
        Binding::new("command", SettingKey::Command),
        Binding::new("vault", SettingKey::VaultName),
    ];

    fn matches(args: &[&str]) -> ArgMatches {
        Command::new("test")
            .arg(INSECURE.to_arg())
            .arg(SUDO.to_arg())
            .arg(FlagSpec::string("command", "query").short('c').to_arg())
            .try_get_matches_from(std::iter::once("test").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_explicit_flags_are_bound() {
        let mut settings = Settings::default();
        bind(&matches(&["--sudo", "-c", "asset.name"]), BINDINGS, &mut settings);
        assert_eq!(settings.sudo_active, Some(true));
        assert_eq!(settings.command.as_deref(), Some("asset.name"));
    }

    #[test]
    fn test_defaults_fill_unset_keys() {
        let mut settings = Settings::default();
        bind(&matches(&[]), BINDINGS, &mut settings);
        assert_eq!(settings.insecure, Some(false));
        assert!(settings.command.is_none());
    }

    #[test]
    fn test_defaults_do_not_override_config_values() {
        let mut settings = Settings {
            insecure: Some(true),
            command: Some("from.config".into()),
            ..Settings::default()
        };
        bind(&matches(&[]), BINDINGS, &mut settings);
        assert_eq!(settings.insecure, Some(true));
        assert_eq!(settings.command.as_deref(), Some("from.config"));
    }

    #[test]
    fn test_explicit_flags_override_config_values() {
        let mut settings = Settings {
            command: Some("from.config".into()),
            ..Settings::default()
        };
        bind(&matches(&["--command", "from.flag"]), BINDINGS, &mut settings);
        assert_eq!(settings.command.as_deref(), Some("from.flag"));
    }

    #[test]
    fn test_empty_explicit_string_keeps_config_value() {
        let mut settings = Settings {
            command: Some("from.config".into()),
            ..Settings::default()
        };
        bind(&matches(&["-c", ""]), BINDINGS, &mut settings);
        assert_eq!(settings.command.as_deref(), Some("from.config"));

        let mut settings = Settings::default();
        bind(&matches(&["--command="]), BINDINGS, &mut settings);
        assert!(!settings.is_set(SettingKey::Command));
    }

    #[test]
    fn test_undeclared_flag_binds_nothing() {
        let mut settings = Settings {
            vault_name: Some("team-vault".into()),
            ..Settings::default()
        };
        bind(&matches(&[]), BINDINGS, &mut settings);
        assert_eq!(settings.vault_name.as_deref(), Some("team-vault"));
    }

    #[test]
    fn test_binding_order_does_not_matter() {
        let reversed: Vec<Binding> = BINDINGS.iter().rev().copied().collect();
        let args = ["--insecure", "-c", "x"];

        let mut a = Settings::default();
        bind(&matches(&args), BINDINGS, &mut a);
        let mut b = Settings::default();
        bind(&matches(&args), &reversed, &mut b);
        assert_eq!(a, b);
    }
}
