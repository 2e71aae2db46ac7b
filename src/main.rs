//! pgprovision - Main entry point
//!
//! Provisions a self-hosted PostgreSQL + pgAdmin stack: resolves
//! parameters, generates credentials, compiles access rules, renders the
//! artifact bundle, and writes it atomically after explicit confirmation.

use tracing::{debug, info};

use pgprovision::cli::{Cli, Commands, PlanArgs, ProvisionArgs};
use pgprovision::config_file::ProvisionConfig;
use pgprovision::error::{ProvisionError, Result};
use pgprovision::params::RawParameters;
use pgprovision::probe::EchoServiceDetector;
use pgprovision::pipeline;
use pgprovision::source::{InteractiveSource, NonInteractiveSource, ParameterSource};

/// Initialize the logger with appropriate settings
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Main application entry point
fn main() {
    init_tracing();
    debug!("pgprovision starting up");

    let cli = Cli::parse_args();
    if let Err(err) = run(cli) {
        eprintln!("✗ {}", err);
        if let ProvisionError::FileSystem { completed, .. } = &err {
            if !completed.is_empty() {
                eprintln!("  completed before the failure: {}", completed.join(", "));
            }
        }
        std::process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Some(Commands::Provision(args)) => run_provision(args, cli.non_interactive),
        Some(Commands::Plan(args)) => run_plan(args),
        Some(Commands::Validate { config }) => run_validate(&config),
        None => {
            info!("no command specified, starting provisioning");
            run_provision(ProvisionArgs::default(), cli.non_interactive)
        }
    }
}

/// Assemble raw inputs from flags, environment, and a saved parameters file.
fn gather_raw(
    dir: Option<std::path::PathBuf>,
    host: Option<String>,
    mut allow: Vec<String>,
    config: Option<&std::path::Path>,
) -> Result<RawParameters> {
    if allow.is_empty() {
        allow = NonInteractiveSource::permitted_from_env();
    }

    let overrides = RawParameters {
        install_dir: dir,
        host_address: host,
        permitted: allow,
    };

    match config {
        Some(path) => {
            let saved = ProvisionConfig::load_from_file(path)
                .map_err(|e| ProvisionError::validation(e.to_string()))?;
            saved
                .validate()
                .map_err(|e| ProvisionError::validation(e.to_string()))?;
            Ok(saved.into_raw(overrides))
        }
        None => Ok(overrides),
    }
}

fn run_provision(args: ProvisionArgs, non_interactive: bool) -> Result<()> {
    let raw = gather_raw(args.dir, args.host, args.allow, args.config.as_deref())?;

    if let Some(save_path) = args.save_config {
        let config = ProvisionConfig::from_raw(&raw);
        config
            .save_to_file(&save_path)
            .map_err(|e| ProvisionError::validation(e.to_string()))?;
        println!("✓ Parameters saved to {}", save_path.display());
        println!(
            "  Provision later with: pgprovision provision --config {}",
            save_path.display()
        );
        return Ok(());
    }

    let mut source: Box<dyn ParameterSource> = if non_interactive {
        Box::new(NonInteractiveSource::new(raw.permitted.clone(), args.yes))
    } else {
        Box::new(InteractiveSource::new(args.yes))
    };

    let detector = EchoServiceDetector::new();
    let report = pipeline::provision(raw, args.keep_secrets, source.as_mut(), &detector)?;

    println!("✓ Provisioning complete");
    println!("{}", report.summary());
    if let Some(report_file) = report.written.last() {
        println!();
        println!("Credentials report: {}", report_file.display());
    }
    if let Some(first) = report.written.first() {
        if let Some(dir) = first.parent() {
            println!("Start the stack with: docker compose up -d   (in {})", dir.display());
        }
    }
    Ok(())
}

fn run_plan(args: PlanArgs) -> Result<()> {
    let raw = gather_raw(args.dir, args.host, args.allow, None)?;
    let detector = EchoServiceDetector::new();
    let bundle = pipeline::plan(&raw, &detector)?;

    println!("{}", bundle.summary());
    println!();
    println!("Nothing was written. Run 'pgprovision provision' to apply.");
    Ok(())
}

fn run_validate(config: &std::path::Path) -> Result<()> {
    info!("validating parameters file: {}", config.display());
    let loaded = ProvisionConfig::load_from_file(config)
        .map_err(|e| ProvisionError::validation(e.to_string()))?;
    loaded
        .validate()
        .map_err(|e| ProvisionError::validation(e.to_string()))?;
    println!("✓ Parameters file is valid: {}", config.display());
    Ok(())
}
