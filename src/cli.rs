use clap::{Parser, Subcommand};
use clap_complete::Shell;
use reconcile::DEFAULT_MAX_CONCURRENCY;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dashsync")]
#[command(version)]
#[command(about = "Pull, push and sync Grafana resources as local files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (default: ~/.config/dashsync/config.toml)
    #[arg(long, global = true, env = "DASHSYNC_CONFIG")]
    pub config: Option<String>,

    /// Context to use instead of the current one
    #[arg(long, global = true, env = "DASHSYNC_CONTEXT")]
    pub context: Option<String>,

    /// Server URL, overrides the context
    #[arg(long, global = true, env = "DASHSYNC_SERVER")]
    pub server: Option<String>,

    /// API token, overrides the context
    #[arg(long, global = true, env = "DASHSYNC_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Write remote resources to local files
    Pull(PullArgs),

    /// Upload local files, creating or updating remote resources
    Push(PushArgs),

    /// List the resource kinds the server exposes
    Kinds,

    /// Manage connection contexts
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Pull / Push
// ============================================================================

#[derive(Parser)]
pub struct PullArgs {
    /// Resources to pull: `dashboards`, `folders/a,b`, `alerts/<uid>` (default: all)
    pub selectors: Vec<String>,

    /// Directory to write resources to
    #[arg(short, long, default_value = "./resources")]
    pub path: PathBuf,

    /// Output format: json or yaml
    #[arg(short, long, default_value = "json")]
    pub output: String,

    /// Also pull resources managed by other tools
    #[arg(long)]
    pub include_managed: bool,

    /// Stop at the first error
    #[arg(long)]
    pub stop_on_error: bool,
}

#[derive(Parser)]
pub struct PushArgs {
    /// Resources to push: `dashboards`, `folders/a,b`, `alerts` (default: all)
    pub selectors: Vec<String>,

    /// Directories to read resources from
    #[arg(short, long, default_value = "./resources")]
    pub path: Vec<PathBuf>,

    /// Maximum number of concurrent requests
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrent: usize,

    /// Stop at the first error
    #[arg(long)]
    pub stop_on_error: bool,

    /// Show what would be done without changing anything
    #[arg(short, long)]
    pub dry_run: bool,

    /// Delete remote resources that no longer exist locally
    #[arg(long)]
    pub sync: bool,

    /// With --sync, also delete resources managed by other tools
    #[arg(long)]
    pub include_managed: bool,

    /// Don't ask for confirmation before deleting
    #[arg(short, long)]
    pub yes: bool,
}

// ============================================================================
// Config Commands
// ============================================================================

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the configuration (tokens redacted)
    View,

    /// Print the config file location
    Path,

    /// Switch the current context
    UseContext {
        /// Context name
        name: String,
    },

    /// Create or update a context
    SetContext {
        /// Context name
        name: String,

        /// Server URL
        #[arg(long)]
        server: Option<String>,

        /// API token
        #[arg(long)]
        token: Option<String>,

        /// Organization ID (on-prem servers)
        #[arg(long)]
        org_id: Option<u64>,

        /// Stack ID (Grafana Cloud)
        #[arg(long)]
        stack_id: Option<u64>,

        /// Explicit namespace, overrides org and stack IDs
        #[arg(long)]
        namespace: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_push_defaults() {
        let cli = Cli::try_parse_from(["dashsync", "push", "dashboards", "alerts"]).unwrap();
        let Command::Push(args) = cli.command else {
            panic!("expected push");
        };
        assert_eq!(args.selectors, vec!["dashboards", "alerts"]);
        assert_eq!(args.path, vec![PathBuf::from("./resources")]);
        assert_eq!(args.max_concurrent, DEFAULT_MAX_CONCURRENCY);
        assert!(!args.sync);
    }

    #[test]
    fn test_pull_output_is_free_text() {
        let cli = Cli::try_parse_from(["dashsync", "pull", "alerts", "-o", "xml"]).unwrap();
        let Command::Pull(args) = cli.command else {
            panic!("expected pull");
        };
        assert_eq!(args.output, "xml");
    }
}
