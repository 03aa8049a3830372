//! `assay shell`: interactive query session against one target.

use assay_core::{DiscoveryMode, QueryEngine, Result, SettingKey, ShellConfig, version};

use crate::binder::Binding;
use crate::dispatch::{CommandDocs, CommandOpts, DocsEntry, Invocation};
use crate::flags::{self, FlagSpec};

pub const FLAGS: &[FlagSpec] = &[
    flags::PASSWORD,
    flags::ASK_PASS,
    FlagSpec::string("command", "Command to run when the shell starts").short('c'),
    flags::IDENTITY_FILE,
    flags::INSECURE,
    flags::SUDO,
    flags::PLATFORM_ID,
    flags::INSTANCES,
    flags::HOST_MACHINES,
    flags::RECORD,
    flags::PATH,
    flags::OPTION,
    flags::discover(DiscoveryMode::SHELL),
    flags::DISCOVER_FILTER,
];

// `incognito`, `policy`, `output` and `vault` are not shell flags; their keys
// keep the config-file values.
pub const BINDINGS: &[Binding] = &[
    Binding::new("incognito", SettingKey::Incognito),
    Binding::new("insecure", SettingKey::Insecure),
    Binding::new("policy", SettingKey::Policies),
    Binding::new("sudo", SettingKey::SudoActive),
    Binding::new("output", SettingKey::Output),
    Binding::new("vault", SettingKey::VaultName),
    Binding::new("platform-id", SettingKey::PlatformId),
    Binding::new("command", SettingKey::Command),
    Binding::new("record", SettingKey::Record),
];

const fn short(key: &'static str, short: &'static str) -> DocsEntry {
    DocsEntry {
        key,
        short,
        long: None,
    }
}

const fn long(key: &'static str, short: &'static str, long: &'static str) -> DocsEntry {
    DocsEntry {
        key,
        short,
        long: Some(long),
    }
}

pub const DOCS: &[DocsEntry] = &[
    short("local", "Connect to the local machine"),
    long(
        "mock",
        "Connect to a mock target (a simulated asset)",
        "Connect to a simulated asset whose data was recorded earlier.
Pass the recording as the argument:

    assay shell container ubuntu:latest --record
    assay shell mock recording-20240519173543.toml
",
    ),
    short("vagrant", "Connect to a Vagrant host"),
    short("terraform", "Connect to the Terraform files (.tf) in a path"),
    short("ssh", "Connect to an SSH target"),
    short("winrm", "Connect to a WinRM target"),
    long(
        "container",
        "Connect to a container, an image, or a registry",
        "Connect to a container, a container image, or a container registry. The
kind of target is detected from the given ID, which may be abbreviated:

    assay shell container b62b276baab6
    assay shell container b62
    assay shell container ubuntu:latest

Use a subcommand to pick an image or a registry explicitly:

    assay shell container image ubuntu:22.04
    assay shell container registry registry.example.com/project/repository
",
    ),
    short("container-image", "Connect to a container image"),
    long(
        "container-registry",
        "Connect to a container registry",
        "Connect to a container registry. Works with most registry flavors:

    assay shell container registry registry.example.com/project/repository
    assay shell container registry yourname.azurecr.io
    assay shell container registry 123456789.dkr.ecr.us-east-1.amazonaws.com/repository
",
    ),
    long(
        "docker",
        "Connect to a Docker container or image",
        "Connect to a Docker container or image, detected from the given ID. Use a
subcommand to restrict the lookup to containers or images:

    assay shell docker b62b276baab6
    assay shell docker container b62b
    assay shell docker image ubuntu:latest
",
    ),
    long(
        "docker-container",
        "Connect to a Docker container",
        "Connect to a Docker container, given by ID (e.g. b62b276baab6) or by name
(e.g. elated_poincare).",
    ),
    long(
        "docker-image",
        "Connect to a Docker image",
        "Connect to a Docker image, given by ID (e.g. b6f507652425) or by name
(e.g. ubuntu:latest).",
    ),
    short("kubernetes", "Connect to a Kubernetes cluster or manifest"),
    long(
        "aws",
        "Connect to an AWS account or instance",
        "Connect to an AWS account using the local AWS configuration. Use the
subcommands to connect to EC2 instances.",
    ),
    short("aws-ec2", "Connect to an AWS instance using one of the available connectors"),
    short("aws-ec2-connect", "Connect to an AWS instance using EC2 Instance Connect"),
    long(
        "aws-ec2-ebs-instance",
        "Connect to an AWS instance using an EBS volume scan (requires an AWS host)",
        "Connect to an AWS instance through a scan of its EBS volume. The scan must
run on an instance inside AWS.",
    ),
    long(
        "aws-ec2-ebs-volume",
        "Connect to an AWS EBS volume (requires an AWS host)",
        "Connect to a specific AWS EBS volume. The scan must run on an instance
inside AWS.",
    ),
    long(
        "aws-ec2-ebs-snapshot",
        "Connect to an AWS EBS snapshot (requires an AWS host)",
        "Connect to a specific AWS EBS snapshot. The scan must run on an instance
inside AWS.",
    ),
    short("aws-ec2-ssm", "Connect to an AWS instance using AWS Systems Manager"),
    long(
        "azure",
        "Connect to a Microsoft Azure subscription or instance",
        "Connect to a Microsoft Azure subscription using the local Azure
configuration. Scanning Azure compute instances additionally needs SSH
access to them.",
    ),
    short("gcp", "Connect to a Google Cloud project"),
    short("gcp-gcr", "Connect to a Google Container Registry (GCR)"),
    short("vsphere", "Connect to a VMware vSphere API endpoint"),
    short("vsphere-vm", "Connect to a VMware vSphere VM"),
    short("github", "Connect to a GitHub organization or repository"),
    short("github-org", "Connect to a GitHub organization"),
    short("github-repo", "Connect to a GitHub repository"),
    short("gitlab", "Connect to a GitLab group"),
    long(
        "ms365",
        "Connect to a Microsoft 365 tenant",
        "Open a shell on a Microsoft 365 tenant with a client secret:

    assay shell ms365 --tenant-id <TENANT> --client-id <CLIENT> --client-secret <SECRET>

or with a PKCS #12 certificate:

    assay shell ms365 --tenant-id <TENANT> --client-id <CLIENT> --certificate-path cert.pfx --certificate-secret <SECRET>
",
    ),
    short("host", "Connect to a host endpoint"),
    short("arista", "Connect to an Arista EOS endpoint"),
];

const LOGO: &str = r"  __ _  ___ ___  __ _ _   _
 / _` |/ __/ __|/ _` | | | |
| (_| |\__ \__ \ (_| | |_| |
 \__,_||___/___/\__,_|\__, |
                      |___/";

pub fn opts() -> CommandOpts {
    CommandOpts {
        name: "shell",
        short: "Interactive query shell",
        long: "Explore a target interactively by running queries in a shell.",
        flags: FLAGS,
        bindings: BINDINGS,
        docs: CommandDocs { entries: DOCS },
        run,
    }
}

/// Banner shown when a session starts.
pub fn welcome_message(version: &str) -> String {
    format!("{LOGO}\n  interactive shell {version}\n")
}

fn run(invocation: Invocation, engine: &dyn QueryEngine) -> Result<()> {
    let mut config = ShellConfig::build(&invocation.request)?;
    config.welcome_message = Some(welcome_message(version::version()));
    tracing::debug!(provider = %config.target.provider, "starting shell");
    engine.start_shell(&config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::dispatch::ProviderCommand;
    use assay_core::{AssetType, ProviderType, Settings, TargetTable};
    use assay_engine::{EngineCall, MockEngine};

    fn command() -> ProviderCommand {
        ProviderCommand::new(opts(), TargetTable::builtin().unwrap()).unwrap()
    }

    fn dispatch(args: &[&str], settings: Settings, engine: &MockEngine) -> Result<()> {
        let cmd = command();
        let matches = cmd
            .command()
            .try_get_matches_from(std::iter::once("shell").chain(args.iter().copied()))
            .unwrap();
        cmd.dispatch(&matches, settings, engine)
    }

    fn only_shell(engine: &MockEngine) -> ShellConfig {
        let calls = engine.calls();
        assert_eq!(calls.len(), 1, "{calls:?}");
        match &calls[0] {
            EngineCall::Shell(config) => config.clone(),
            other => unreachable!("expected a shell call, got {other:?}"),
        }
    }

    #[test]
    fn test_docs_cover_every_target_with_own_docs() {
        let table = TargetTable::builtin().unwrap();
        for entry in DOCS {
            assert!(table.specs().iter().any(|spec| spec.key == entry.key));
        }
        assert!(command().command().find_subcommand("mock").is_some());
    }

    #[test]
    fn test_docs_override_short_help() {
        let cmd = command().command();
        let local = cmd.find_subcommand("local").unwrap();
        assert_eq!(
            local.get_about().unwrap().to_string(),
            "Connect to the local machine"
        );
        // No override for terraform plans: the table's description is used.
        let plan = cmd
            .find_subcommand("terraform")
            .and_then(|tf| tf.find_subcommand("plan"))
            .unwrap();
        assert_eq!(
            plan.get_about().unwrap().to_string(),
            "Scan a Terraform plan file"
        );
    }

    #[test]
    fn test_shell_sets_welcome_message() {
        let engine = MockEngine::new();
        dispatch(&[], Settings::default(), &engine).unwrap();
        let config = only_shell(&engine);
        let banner = config.welcome_message.unwrap();
        assert!(banner.contains(version::version()));
    }

    #[test]
    fn test_shell_needs_no_query() {
        let engine = MockEngine::new();
        dispatch(
            &["docker", "image", "ubuntu:latest", "-c", "packages"],
            Settings::default(),
            &engine,
        )
        .unwrap();
        let config = only_shell(&engine);
        assert_eq!(config.target.provider, ProviderType::Docker);
        assert_eq!(config.target.asset, AssetType::Image);
        assert_eq!(config.command.as_deref(), Some("packages"));
    }

    #[test]
    fn test_shell_incognito_and_policies_from_config() {
        let engine = MockEngine::new();
        let settings = Settings {
            incognito: Some(true),
            policies: Some(vec!["linux-baseline".into()]),
            ..Settings::default()
        };
        dispatch(&["local"], settings, &engine).unwrap();
        let config = only_shell(&engine);
        assert!(config.incognito);
        assert_eq!(config.policies, vec!["linux-baseline"]);
    }

    #[test]
    fn test_shell_rejects_run_only_discovery_modes() {
        let err = command()
            .command()
            .try_get_matches_from(["shell", "--discover", "pods"])
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_shell_engine_failure_propagates() {
        let engine = MockEngine::failing("no tty");
        let err = dispatch(&[], Settings::default(), &engine).unwrap_err();
        assert_eq!(err.to_string(), "failed to start shell: no tty");
    }

    #[test]
    fn test_shell_record_on_cloud_provider_fails() {
        let engine = MockEngine::new();
        let err = dispatch(&["aws", "--record"], Settings::default(), &engine).unwrap_err();
        assert!(err.to_string().starts_with("failed to prepare config"));
        assert!(err.to_string().contains("recording"));
        assert_eq!(engine.call_count(), 0);
    }

    #[test]
    fn test_welcome_message_format() {
        let banner = welcome_message("9.0.0");
        assert!(banner.starts_with(LOGO));
        assert!(banner.contains("9.0.0"));
    }
}
