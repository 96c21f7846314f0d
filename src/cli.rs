//! CLI argument parsing and command definitions

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// A command-line management client for KuberDock
#[derive(Debug, Parser)]
#[command(
    name = "kdctl",
    author,
    version,
    about = "A command-line management client for KuberDock",
    propagate_version = true,
    after_help = "Use 'kdctl <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,
    #[command(subcommand)]
    pub command: Command,
}

/// Global options available to all commands
#[derive(Debug, Clone, Args)]
pub struct GlobalOpts {
    /// Output format (json, yaml, table, auto)
    #[arg(
        short = 'o',
        long = "output",
        value_enum,
        global = true,
        conflicts_with = "json"
    )]
    pub output_format: Option<OutputFormat>,

    /// Output as JSON (shorthand for -o json)
    #[arg(long, global = true)]
    pub json: bool,

    /// KuberDock server URL
    #[arg(short = 's', long, env = "KD_SERVER", global = true)]
    pub server: Option<String>,

    /// User name for basic authentication and login
    #[arg(long, env = "KD_USER", global = true)]
    pub user: Option<String>,

    /// Password for basic authentication and login
    #[arg(long, env = "KD_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// API token (takes precedence over a stored login session)
    #[arg(long, env = "KD_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Skip SSL certificate verification
    #[arg(short = 'k', long, global = true)]
    pub insecure: bool,

    /// Override config file path
    #[arg(long, value_name = "PATH", env = "KDCTL_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Reduce output to only errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase logging verbosity (stackable: -v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Enable debug logging (equivalent to -vv)
    #[arg(long, global = true)]
    pub debug: bool,

    /// Enable trace logging
    #[arg(long, global = true)]
    pub trace: bool,

    /// Disable colored output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Hide table headers
    #[arg(long, global = true)]
    pub no_headers: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[non_exhaustive]
pub enum OutputFormat {
    Json,
    Yaml,
    Table,
    Auto,
}

/// Select a resource with a numeric id by `--id` or `--name`
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct Selector {
    /// Resource id
    #[arg(long)]
    pub id: Option<u64>,

    /// Resource name
    #[arg(long)]
    pub name: Option<String>,
}

/// Select a resource with a string id (pods, persistent disks)
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct TextSelector {
    /// Resource id
    #[arg(long)]
    pub id: Option<String>,

    /// Resource name
    #[arg(long)]
    pub name: Option<String>,
}

/// JSON request body, from a file or inline
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct Payload {
    /// Read the JSON payload from a file ('-' for stdin)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Inline JSON payload
    #[arg(value_name = "JSON")]
    pub inline: Option<String>,
}

/// Template variable values for `create-pod`; empty when omitted
#[derive(Debug, Clone, Args)]
#[group(multiple = false)]
pub struct Values {
    /// Read the JSON values from a file ('-' for stdin)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Inline JSON values
    #[arg(value_name = "JSON")]
    pub inline: Option<String>,
}

/// Predefined application template text, from a file or inline
#[derive(Debug, Clone, Args)]
#[group(required = true, multiple = false)]
pub struct TemplateSource {
    /// Read the YAML template from a file ('-' for stdin)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Inline YAML template
    #[arg(value_name = "TEMPLATE")]
    pub inline: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage base domains
    Domains {
        #[command(subcommand)]
        command: DomainsCommand,
    },

    /// Search and inspect Docker images
    Images {
        #[command(subcommand)]
        command: ImagesCommand,
    },

    /// Manage pods
    Pods {
        #[command(subcommand)]
        command: PodsCommand,
    },

    /// Manage predefined application templates
    #[command(name = "predefined-apps")]
    PredefinedApps {
        #[command(subcommand)]
        command: PredefinedAppsCommand,
    },

    /// Manage persistent storage volumes
    Pstorage {
        #[command(subcommand)]
        command: PstorageCommand,
    },

    /// Inspect and change cluster-wide settings
    #[command(name = "system-settings")]
    SystemSettings {
        #[command(subcommand)]
        command: SystemSettingsCommand,
    },

    /// Obtain an API token and store it for later commands
    Login,

    /// Forget the stored API token
    Logout,

    /// Inspect and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Subcommand)]
pub enum DomainsCommand {
    /// List domains
    List,

    /// Show one domain
    Get {
        #[command(flatten)]
        selector: Selector,
    },

    /// Add a domain
    Create {
        /// Domain name (e.g., example.com)
        #[arg(long)]
        name: String,

        #[command(flatten)]
        certificate: CertificateArgs,
    },

    /// Rename a domain or replace its certificate
    Update {
        #[command(flatten)]
        selector: Selector,

        /// New domain name
        #[arg(long)]
        new_name: Option<String>,

        #[command(flatten)]
        certificate: CertificateArgs,
    },

    /// Delete a domain
    Delete {
        #[command(flatten)]
        selector: Selector,
    },
}

/// Wildcard certificate for a domain
#[derive(Debug, Clone, Args)]
pub struct CertificateArgs {
    /// PEM certificate file
    #[arg(long, value_name = "FILE", requires = "key")]
    pub certificate: Option<PathBuf>,

    /// PEM private key file
    #[arg(long, value_name = "FILE", requires = "certificate")]
    pub key: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum ImagesCommand {
    /// Search images in a registry
    Search {
        /// Search string
        #[arg(long)]
        search_key: String,

        /// Result page, starting at 1
        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        /// Registry URL (defaults to Docker Hub on the server side)
        #[arg(long, value_name = "URL")]
        registry: Option<String>,
    },

    /// Show an image's default command, ports, volumes and env
    Get {
        /// Image name (e.g., nginx:latest)
        #[arg(long)]
        image: String,
    },
}

/// Node and container names for container-level pod commands
#[derive(Debug, Clone, Args)]
pub struct ContainerTarget {
    /// Node the containers run on
    #[arg(long)]
    pub host: String,

    /// Container names, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub containers: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum PodsCommand {
    /// List pods
    List {
        /// Only pods of this user (admin only)
        #[arg(long)]
        owner: Option<String>,
    },

    /// Show one pod
    Get {
        #[command(flatten)]
        selector: TextSelector,
    },

    /// Create a pod from a JSON description
    Create {
        #[command(flatten)]
        payload: Payload,
    },

    /// Update a pod from a JSON description
    Update {
        #[command(flatten)]
        selector: TextSelector,

        #[command(flatten)]
        payload: Payload,
    },

    /// Start a pod
    Start {
        #[command(flatten)]
        selector: TextSelector,
    },

    /// Stop a pod
    Stop {
        #[command(flatten)]
        selector: TextSelector,
    },

    /// Change the number of pod replicas
    Resize {
        #[command(flatten)]
        selector: TextSelector,

        /// Desired number of replicas
        #[arg(long)]
        replicas: u32,
    },

    /// Start containers of a pod on its node
    #[command(name = "container-start")]
    ContainerStart {
        #[command(flatten)]
        selector: TextSelector,

        #[command(flatten)]
        target: ContainerTarget,
    },

    /// Stop containers of a pod on its node
    #[command(name = "container-stop")]
    ContainerStop {
        #[command(flatten)]
        selector: TextSelector,

        #[command(flatten)]
        target: ContainerTarget,
    },

    /// Remove containers of a pod from its node
    #[command(name = "container-delete")]
    ContainerDelete {
        #[command(flatten)]
        selector: TextSelector,

        #[command(flatten)]
        target: ContainerTarget,
    },

    /// Delete a pod
    Delete {
        #[command(flatten)]
        selector: TextSelector,
    },

    /// Dump a pod's full server-side record (admin only)
    Dump {
        /// Pod id
        pod_id: String,
    },

    /// Dump many pods at once (admin only)
    #[command(name = "batch-dump")]
    BatchDump {
        /// If specified, only pods of this user will be dumped
        #[arg(long)]
        owner: Option<String>,

        /// If specified, dumps are saved as <target-dir>/<owner_id>/<pod_id>
        #[arg(long, value_name = "DIR")]
        target_dir: Option<PathBuf>,
    },
}

#[derive(Debug, Subcommand)]
pub enum PredefinedAppsCommand {
    /// List predefined applications
    List {
        /// Only return the template files
        #[arg(long)]
        file_only: bool,
    },

    /// Show one predefined application
    Get {
        #[command(flatten)]
        selector: Selector,

        /// Print only the template text
        #[arg(long)]
        file_only: bool,
    },

    /// Add a predefined application from a YAML template
    Create {
        /// Application name
        #[arg(long)]
        name: String,

        /// Where the template comes from
        #[arg(long, default_value = "kuberdock")]
        origin: String,

        #[command(flatten)]
        template: TemplateSource,
    },

    /// Replace a predefined application's template
    Update {
        #[command(flatten)]
        selector: Selector,

        /// New application name
        #[arg(long)]
        new_name: Option<String>,

        #[command(flatten)]
        template: TemplateSource,
    },

    /// Delete a predefined application
    Delete {
        #[command(flatten)]
        selector: Selector,
    },

    /// Create a pod from a predefined application
    #[command(name = "create-pod")]
    CreatePod {
        #[command(flatten)]
        selector: Selector,

        /// Plan index, starting at 0
        #[arg(long)]
        plan: u32,

        #[command(flatten)]
        values: Values,
    },

    /// Check a template without saving it
    #[command(name = "validate-template")]
    ValidateTemplate {
        #[command(flatten)]
        template: TemplateSource,
    },
}

#[derive(Debug, Subcommand)]
pub enum PstorageCommand {
    /// List persistent volumes
    List {
        /// Only volumes not mounted by any pod
        #[arg(long)]
        free_only: bool,
    },

    /// Show one persistent volume
    Get {
        #[command(flatten)]
        selector: TextSelector,
    },

    /// Create a persistent volume
    Create {
        /// Volume name
        #[arg(long)]
        name: String,

        /// Size in GB
        #[arg(long)]
        size: u32,
    },

    /// Delete a persistent volume
    Delete {
        #[command(flatten)]
        selector: TextSelector,
    },
}

#[derive(Debug, Subcommand)]
pub enum SystemSettingsCommand {
    /// List system settings
    List,

    /// Show one system setting
    Get {
        #[command(flatten)]
        selector: Selector,
    },

    /// Change a system setting
    Update {
        #[command(flatten)]
        selector: Selector,

        /// New value
        #[arg(long)]
        value: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show effective configuration
    Show,

    /// Print config file path
    Path,

    /// Get a specific configuration value
    Get {
        /// Configuration key (dot-separated path)
        key: Option<String>,
    },

    /// Reset configuration to defaults
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_by_id() {
        let cli = Cli::try_parse_from(["kdctl", "domains", "get", "--id", "3"]).unwrap();
        match cli.command {
            Command::Domains {
                command: DomainsCommand::Get { selector },
            } => {
                assert_eq!(selector.id, Some(3));
                assert!(selector.name.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_selector_requires_exactly_one() {
        assert!(Cli::try_parse_from(["kdctl", "domains", "get"]).is_err());
        assert!(
            Cli::try_parse_from(["kdctl", "domains", "get", "--id", "1", "--name", "x"]).is_err()
        );
        assert!(Cli::try_parse_from(["kdctl", "domains", "get", "--id", "abc"]).is_err());
    }

    #[test]
    fn test_pod_selector_accepts_uuid() {
        let cli = Cli::try_parse_from([
            "kdctl",
            "pods",
            "get",
            "--id",
            "0b4e5a3c-1f2d-4e5f-8a9b-0c1d2e3f4a5b",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Pods {
                command: PodsCommand::Get { .. }
            }
        ));
    }

    #[test]
    fn test_container_target_splits_names() {
        let cli = Cli::try_parse_from([
            "kdctl",
            "pods",
            "container-stop",
            "--name",
            "web",
            "--host",
            "node1",
            "--containers",
            "nginx,php",
        ])
        .unwrap();
        match cli.command {
            Command::Pods {
                command: PodsCommand::ContainerStop { target, .. },
            } => {
                assert_eq!(target.host, "node1");
                assert_eq!(target.containers, vec!["nginx", "php"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let missing = Cli::try_parse_from([
            "kdctl", "pods", "container-start", "--name", "web", "--host", "node1",
        ]);
        assert!(missing.is_err());
    }

    #[test]
    fn test_payload_file_or_inline() {
        let cli = Cli::try_parse_from(["kdctl", "pods", "create", "-f", "pod.json"]).unwrap();
        match cli.command {
            Command::Pods {
                command: PodsCommand::Create { payload },
            } => {
                assert_eq!(payload.file, Some(PathBuf::from("pod.json")));
                assert!(payload.inline.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["kdctl", "pods", "create", r#"{"name": "web"}"#]).unwrap();
        match cli.command {
            Command::Pods {
                command: PodsCommand::Create { payload },
            } => assert_eq!(payload.inline.as_deref(), Some(r#"{"name": "web"}"#)),
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["kdctl", "pods", "create"]).is_err());
        assert!(Cli::try_parse_from(["kdctl", "pods", "create", "-f", "a.json", "{}"]).is_err());
    }

    #[test]
    fn test_create_pod_values_optional() {
        let cli = Cli::try_parse_from([
            "kdctl",
            "predefined-apps",
            "create-pod",
            "--name",
            "wordpress",
            "--plan",
            "1",
        ])
        .unwrap();
        match cli.command {
            Command::PredefinedApps {
                command: PredefinedAppsCommand::CreatePod { plan, values, .. },
            } => {
                assert_eq!(plan, 1);
                assert!(values.file.is_none() && values.inline.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_images_page_starts_at_one() {
        assert!(
            Cli::try_parse_from(["kdctl", "images", "search", "--search-key", "nginx", "--page", "0"])
                .is_err()
        );
    }

    #[test]
    fn test_certificate_requires_key() {
        assert!(Cli::try_parse_from([
            "kdctl",
            "domains",
            "create",
            "--name",
            "example.com",
            "--certificate",
            "cert.pem"
        ])
        .is_err());
    }
}
