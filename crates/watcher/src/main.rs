//! Certwatch - Main entry point
//!
//! A certificate order expiry watcher with raced network time resolution.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use certwatch::i18n::Catalog;
use certwatch::logging;
use certwatch::watcher::Watcher;
use certwatch_config::Config;

/// Certwatch - certificate order expiry watcher
#[derive(Parser, Debug)]
#[command(name = "certwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(
        short = 'c',
        long = "config",
        env = "CERTWATCH_CONFIG",
        default_value = "config.json"
    )]
    config: PathBuf,

    /// Test configuration and exit
    #[arg(short = 't', long = "test")]
    test: bool,

    /// Enable verbose logging (debug level)
    #[arg(long = "verbose")]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate configuration file and exit
    Test,
    /// Report the remaining time without renewing
    Check,
    /// Run a full watch-and-renew pass (default)
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded =
        Config::load_or_create(&cli.config).context("failed to load configuration")?;
    let catalog = Catalog::new(&loaded.config.language);

    if loaded.newly_created {
        // Logging is not up yet; talk to the user directly.
        println!("{}", catalog.get("config_created"));
        println!(
            "{}",
            catalog.format("config_path", &[&loaded.path.display()])
        );
        return Ok(());
    }

    loaded
        .config
        .validate()
        .context("configuration validation failed")?;

    if cli.test || matches!(cli.command, Some(Commands::Test)) {
        return test_config(&loaded.config);
    }

    let log_path = logging::init(&loaded.config.log_settings, cli.verbose)
        .context("failed to initialize logging")?;
    info!(
        "{}",
        catalog.format("config_loaded", &[&loaded.path.display()])
    );
    debug!(log_file = %log_path.display(), "Logging initialized");

    let renew = !matches!(cli.command, Some(Commands::Check));
    let watcher = Watcher::new(loaded.config, catalog);
    watcher.run(renew).await?;

    Ok(())
}

/// Validate the configuration and print a summary.
fn test_config(config: &Config) -> Result<()> {
    println!("Configuration test successful:");
    println!("  - order service: {}", config.api_url);
    println!("  - target mark:   {:?}", config.target_mark);
    println!("  - renew before:  {} days", config.renew_before_days);
    println!("  - output dir:    {}", config.output_dir);
    Ok(())
}
