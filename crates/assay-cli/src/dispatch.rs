//! Command dispatcher.
//!
//! A [`ProviderCommand`] turns a [`CommandOpts`] descriptor and the target
//! table into a `clap` command tree (`run`, `run local`, `run container
//! image`, ...) and, once parsed, routes the invocation to the descriptor's
//! callback with the resolved provider and asset type.

use assay_core::provider::{TargetArgs, TargetSpec};
use assay_core::{Error, QueryEngine, Result, RunRequest, Settings, TargetTable};
use clap::{Arg, ArgMatches, Command};

use crate::binder::{self, Binding};
use crate::flags::{self, FlagSpec};

/// Id of the positional target argument on target subcommands.
pub const TARGET_ARG: &str = "target";

/// Documentation override for one target subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocsEntry {
    /// Docs key of the target table entry.
    pub key: &'static str,
    pub short: &'static str,
    pub long: Option<&'static str>,
}

/// Documentation overrides, keyed by docs key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandDocs {
    pub entries: &'static [DocsEntry],
}

impl CommandDocs {
    pub fn get(&self, key: &str) -> Option<&'static DocsEntry> {
        self.entries.iter().find(|entry| entry.key == key)
    }
}

/// What a command callback receives.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Name of the top-level command (`run`, `shell`).
    pub command: &'static str,
    pub request: RunRequest,
}

/// Callback run once flags are bound and the target is resolved.
pub type RunFn = fn(Invocation, &dyn QueryEngine) -> Result<()>;

/// Static description of a provider-dispatching command.
#[derive(Debug, Clone, Copy)]
pub struct CommandOpts {
    pub name: &'static str,
    pub short: &'static str,
    pub long: &'static str,
    pub flags: &'static [FlagSpec],
    pub bindings: &'static [Binding],
    pub docs: CommandDocs,
    pub run: RunFn,
}

/// A command whose subcommands are the targets of a [`TargetTable`].
#[derive(Debug, Clone, Copy)]
pub struct ProviderCommand {
    opts: CommandOpts,
    table: TargetTable,
}

impl ProviderCommand {
    /// Pair `opts` with `table`.
    ///
    /// Every documentation override must name an entry of the table.
    pub fn new(opts: CommandOpts, table: TargetTable) -> Result<Self> {
        for entry in opts.docs.entries {
            if !table.specs().iter().any(|spec| spec.key == entry.key) {
                return Err(Error::invalid_data(format!(
                    "{}: documentation for unknown target '{}'",
                    opts.name, entry.key
                )));
            }
        }
        Ok(Self { opts, table })
    }

    pub fn name(&self) -> &'static str {
        self.opts.name
    }

    /// Build the `clap` command tree.
    ///
    /// Command flags are global so they may follow any target subcommand.
    pub fn command(&self) -> Command {
        let cmd = Command::new(self.opts.name)
            .about(self.opts.short)
            .long_about(self.opts.long);
        let cmd = self
            .opts
            .flags
            .iter()
            .fold(cmd, |cmd, flag| cmd.arg(flag.to_arg().global(true)));
        self.table
            .children(&[])
            .fold(cmd, |cmd, spec| cmd.subcommand(self.target_command(spec)))
    }

    fn target_command(&self, spec: &'static TargetSpec) -> Command {
        let docs = self.opts.docs.get(spec.key);
        let mut cmd = Command::new(spec.name()).about(docs.map_or(spec.short, |d| d.short));
        if let Some(long) = docs.and_then(|d| d.long) {
            cmd = cmd.long_about(long);
        }

        cmd = match spec.args {
            TargetArgs::None => cmd,
            TargetArgs::Optional(name) => cmd.arg(Arg::new(TARGET_ARG).value_name(name)),
            TargetArgs::Required(name) => {
                cmd.arg(Arg::new(TARGET_ARG).value_name(name).required(true))
            }
        };

        for flag in spec.flags {
            cmd = cmd.arg(flags::provider_arg(flag).global(true));
        }

        let mut children = self.table.children(spec.path).peekable();
        if children.peek().is_some() {
            // `container image ubuntu` must not demand `container`'s own target.
            cmd = cmd.subcommand_negates_reqs(true);
        }
        children.fold(cmd, |cmd, child| cmd.subcommand(self.target_command(child)))
    }

    /// Run the invocation described by `matches`, the matches of this
    /// command.
    ///
    /// `settings` is the store seeded from the config file. The target is
    /// resolved before anything else, so an unknown path never reaches the
    /// callback or the engine.
    pub fn dispatch(
        &self,
        matches: &ArgMatches,
        settings: Settings,
        engine: &dyn QueryEngine,
    ) -> Result<()> {
        let mut path: Vec<&str> = Vec::new();
        let mut leaf = matches;
        while let Some((name, sub)) = leaf.subcommand() {
            path.push(name);
            leaf = sub;
        }

        let target = self.table.resolve(&path)?;
        let spec_path = self.table.get(&path).map_or(&[][..], |spec| spec.path);

        let mut settings = settings;
        binder::bind(leaf, self.opts.bindings, &mut settings);

        let provider_flags = self.table.flags_for(spec_path);
        let flags = flags::read_values(leaf, &provider_flags);
        let args = leaf
            .try_get_many::<String>(TARGET_ARG)
            .ok()
            .flatten()
            .map(|values| values.cloned().collect())
            .unwrap_or_default();

        tracing::debug!(
            command = self.opts.name,
            provider = %target.provider,
            asset = %target.asset,
            "dispatching"
        );

        (self.opts.run)(
            Invocation {
                command: self.opts.name,
                request: RunRequest {
                    target,
                    args,
                    flags,
                    settings,
                },
            },
            engine,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::flags::{PASSWORD, SUDO};
    use assay_core::{AssetType, ProviderType, SettingKey};
    use std::sync::{Mutex, MutexGuard, PoisonError};

    static SEEN: Mutex<Vec<Invocation>> = Mutex::new(Vec::new());
    static SERIAL: Mutex<()> = Mutex::new(());

    fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
        mutex.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(invocation: Invocation, _engine: &dyn QueryEngine) -> Result<()> {
        lock(&SEEN).push(invocation);
        Ok(())
    }

    const FLAGS: &[FlagSpec] = &[SUDO, PASSWORD];
    const BINDINGS: &[Binding] = &[Binding::new("sudo", SettingKey::SudoActive)];
    const DOCS: &[DocsEntry] = &[DocsEntry {
        key: "docker-image",
        short: "Scan a Docker image by name",
        long: Some("Scan a Docker image, pulling it first if needed."),
    }];

    fn opts() -> CommandOpts {
        CommandOpts {
            name: "probe",
            short: "Probe a target",
            long: "Probe a target.",
            flags: FLAGS,
            bindings: BINDINGS,
            docs: CommandDocs { entries: DOCS },
            run: remember,
        }
    }

    fn command() -> ProviderCommand {
        ProviderCommand::new(opts(), TargetTable::builtin().unwrap()).unwrap()
    }

    /// Parse `args`, dispatch, and return what the callback saw.
    fn invoke(args: &[&str]) -> Result<Invocation> {
        let cmd = command();
        let matches = cmd
            .command()
            .try_get_matches_from(std::iter::once("probe").chain(args.iter().copied()))
            .unwrap();
        let engine = assay_engine::MockEngine::new();
        let _serial = lock(&SERIAL);
        lock(&SEEN).clear();
        cmd.dispatch(&matches, Settings::default(), &engine)?;
        Ok(lock(&SEEN).pop().unwrap())
    }

    #[test]
    fn test_command_tree_is_consistent() {
        command().command().debug_assert();
    }

    #[test]
    fn test_every_table_path_is_a_subcommand() {
        let cmd = command().command();
        for spec in TargetTable::builtin().unwrap().specs() {
            let mut node = &cmd;
            for token in spec.path {
                node = node.find_subcommand(token).unwrap();
            }
            assert_eq!(node.get_name(), spec.name());
        }
    }

    #[test]
    fn test_dispatch_nested_target() {
        let seen = invoke(&["container", "image", "ubuntu:22.04", "--sudo"]).unwrap();
        assert_eq!(seen.command, "probe");
        assert_eq!(seen.request.target.provider, ProviderType::Container);
        assert_eq!(seen.request.target.asset, AssetType::Image);
        assert_eq!(seen.request.args, vec!["ubuntu:22.04"]);
        assert_eq!(seen.request.settings.sudo_active, Some(true));
    }

    #[test]
    fn test_dispatch_without_target_is_local() {
        let seen = invoke(&["--password", "secret"]).unwrap();
        assert_eq!(seen.request.target.provider, ProviderType::Local);
        assert_eq!(seen.request.target.asset, AssetType::Default);
        assert!(seen.request.args.is_empty());
        assert_eq!(seen.request.flags.password.unwrap().expose(), "secret");
    }

    #[test]
    fn test_provider_flags_inherited_by_children() {
        let seen = invoke(&["github", "repo", "acme/widgets", "--token", "ghp_x"]).unwrap();
        assert_eq!(seen.request.target.asset, AssetType::Repository);
        assert_eq!(
            seen.request.flags.provider_secrets["token"].expose(),
            "ghp_x"
        );
    }

    #[test]
    fn test_unknown_target_rejected_by_parser() {
        let err = command()
            .command()
            .try_get_matches_from(["probe", "bogus-target"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_required_target_argument() {
        let err = command()
            .command()
            .try_get_matches_from(["probe", "ssh"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_docs_override_and_default_short_help() {
        let cmd = command().command();
        let docker = cmd.find_subcommand("docker").unwrap();
        let image = docker.find_subcommand("image").unwrap();
        assert_eq!(
            image.get_about().unwrap().to_string(),
            "Scan a Docker image by name"
        );
        let container = docker.find_subcommand("container").unwrap();
        assert_eq!(
            container.get_about().unwrap().to_string(),
            "Scan a Docker container"
        );
    }

    #[test]
    fn test_docs_for_unknown_key_rejected() {
        const BAD: &[DocsEntry] = &[DocsEntry {
            key: "floppy-disk",
            short: "x",
            long: None,
        }];
        let opts = CommandOpts {
            docs: CommandDocs { entries: BAD },
            ..opts()
        };
        assert!(ProviderCommand::new(opts, TargetTable::builtin().unwrap()).is_err());
    }
}
