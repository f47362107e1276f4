use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "deploymeta")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Reconcile deployment metadata against a declared desired state", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Desired-state manifest
    #[arg(long, global = true, default_value = "deploymeta.toml")]
    pub manifest: PathBuf,

    /// Local state file
    #[arg(long, global = true, default_value = ".deploymeta/state.json")]
    pub state: PathBuf,

    #[command(flatten)]
    pub provider: ProviderArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Connection settings; each one overrides the config file
#[derive(Args, Debug, Clone, Default)]
pub struct ProviderArgs {
    /// Provider config file (default: ~/.config/deploymeta/config.toml)
    #[arg(long, global = true, env = "DEPLOYMETA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Base URL of the configuration service
    #[arg(long, global = true, env = "DEPLOYMETA_BASE_URL")]
    pub base_url: Option<String>,

    /// Licence key used to authenticate
    #[arg(long, global = true, env = "DEPLOYMETA_LICENCE_KEY", hide_env_values = true)]
    pub licence_key: Option<String>,

    /// Name of the deployment to manage
    #[arg(long, global = true, env = "DEPLOYMETA_DEPLOYMENT_NAME")]
    pub deployment_name: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Reconcile remote resources with the manifest
    Apply(ApplyArgs),

    /// Re-read tracked resources and update local state
    Refresh(TargetArgs),

    /// Adopt an existing remote resource into state
    Import {
        /// State address, e.g. dns_record.www
        address: String,

        /// Remote identifier of the resource
        id: String,
    },

    /// Delete every tracked resource
    Destroy(DestroyArgs),

    /// Inspect or edit local state
    #[command(subcommand)]
    State(StateCommand),

    /// Show the deployment's metadata
    Deployment {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Plan / Apply
// ============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Limit to a kind or one instance (e.g. dns_record or dns_record.www)
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PlanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Diff against local state without reading remote resources first
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show what would change without applying
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of resources reconciled in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,

    /// Retries for transient failures (only for operations safe to repeat)
    #[arg(long, default_value = "3")]
    pub retries: u32,

    /// Apply against local state without reading remote resources first
    #[arg(long)]
    pub no_refresh: bool,
}

#[derive(Args, Debug, Clone)]
pub struct DestroyArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Show what would be deleted without deleting
    #[arg(short, long)]
    pub dry_run: bool,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Number of resources deleted in parallel
    #[arg(short, long, default_value = "4")]
    pub jobs: usize,
}

// ============================================================================
// State Commands
// ============================================================================

#[derive(Subcommand)]
pub enum StateCommand {
    /// List tracked resources
    List,

    /// Show the attributes of one tracked resource
    Show {
        /// State address, e.g. dns_record.www
        address: String,
    },

    /// Stop tracking a resource without touching it remotely
    Rm {
        /// State address, e.g. dns_record.www
        address: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_apply_defaults() {
        let cli = Cli::try_parse_from(["deploymeta", "apply"]).unwrap();
        match cli.command {
            Command::Apply(args) => {
                assert_eq!(args.jobs, 4);
                assert_eq!(args.retries, 3);
                assert!(!args.dry_run);
                assert!(args.target.target.is_none());
            }
            _ => panic!("expected apply"),
        }
        assert_eq!(cli.state, PathBuf::from(".deploymeta/state.json"));
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "deploymeta",
            "plan",
            "--target",
            "dns_record.www",
            "--deployment-name",
            "acme",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.provider.deployment_name.as_deref(), Some("acme"));
        match cli.command {
            Command::Plan(args) => {
                assert_eq!(args.target.target.as_deref(), Some("dns_record.www"));
            }
            _ => panic!("expected plan"),
        }
    }

    #[test]
    fn test_import_takes_address_and_id() {
        let cli = Cli::try_parse_from(["deploymeta", "import", "dns_record.www", "dns-1"]).unwrap();
        match cli.command {
            Command::Import { address, id } => {
                assert_eq!(address, "dns_record.www");
                assert_eq!(id, "dns-1");
            }
            _ => panic!("expected import"),
        }
    }
}
