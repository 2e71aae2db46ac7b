use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// pgprovision - provisions a self-hosted PostgreSQL + pgAdmin stack
#[derive(Parser)]
#[command(name = "pgprovision")]
#[command(about = "Generates a consistent configuration bundle for a self-hosted database stack")]
#[command(version)]
pub struct Cli {
    /// Non-interactive mode: never read from the terminal.
    ///
    /// Permitted client addresses come only from --allow or the
    /// PGPROVISION_ALLOW environment variable, and writing requires --yes.
    #[arg(long, global = true)]
    pub non_interactive: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve parameters, generate credentials, and write the bundle
    Provision(ProvisionArgs),
    /// Compute and print the bundle without touching the filesystem
    Plan(PlanArgs),
    /// Validate a saved parameters file
    Validate {
        /// Path to the parameters file to validate
        config: PathBuf,
    },
}

#[derive(Args, Clone, Default)]
pub struct ProvisionArgs {
    /// Installation directory (default: /opt/pgstack)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Explicit server address; skips auto-detection
    #[arg(long)]
    pub host: Option<String>,

    /// Permitted client addresses (IPv4/IPv6, CIDR allowed; repeatable or comma separated)
    #[arg(long, value_delimiter = ',')]
    pub allow: Vec<String>,

    /// Skip the confirmation prompt before writing
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Keep secrets found in an existing environment file instead of rotating them
    #[arg(long)]
    pub keep_secrets: bool,

    /// Load saved parameters from a JSON file (flags still win)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Save the resolved parameters to a JSON file and exit without writing artifacts
    #[arg(long)]
    pub save_config: Option<PathBuf>,
}

#[derive(Args, Clone, Default)]
pub struct PlanArgs {
    /// Installation directory (default: /opt/pgstack)
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Explicit server address; skips auto-detection
    #[arg(long)]
    pub host: Option<String>,

    /// Permitted client addresses (IPv4/IPv6, CIDR allowed; repeatable or comma separated)
    #[arg(long, value_delimiter = ',')]
    pub allow: Vec<String>,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
