mod registered_modules;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use menara_kit::bootstrap::{AppConfig, AppConfigProvider, CliArgs, init_logging};
use menara_kit::runtime::{RunOptions, ShutdownOptions, run};

/// Menara Server - multi-tenant modular web application host
#[derive(Parser)]
#[command(name = "menara-server")]
#[command(about = "Menara Server - multi-tenant modular web application host")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for the HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Validate configuration and exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(ref path) = cli.config {
        if !Path::new(path).is_file() {
            anyhow::bail!("config file does not exist: {}", path.to_string_lossy());
        }
    }

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        print_config: cli.print_config,
        verbose: cli.verbose,
        port: cli.port,
    };

    // Layered config: defaults -> YAML (if provided) -> env (MENARA__*) ->
    // CLI overrides.
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    init_logging(&config.logging);
    tracing::info!("Menara Server starting");

    if cli.print_config {
        println!("Effective configuration:\n{}", config.to_json_pretty()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(&config),
    }
}

fn check_config(config: &AppConfig) -> Result<()> {
    // load_or_default already validated the layers.
    println!("Configuration is valid");
    println!("{}", config.to_json_pretty()?);
    Ok(())
}

async fn run_server(config: AppConfig) -> Result<()> {
    tracing::info!("Initializing modules...");

    let run_options = RunOptions {
        modules_cfg: Arc::new(AppConfigProvider::new(config)),
        shutdown: ShutdownOptions::Signals,
    };

    run(run_options).await
}
