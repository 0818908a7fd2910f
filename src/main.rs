//! Nostalgia CLI
//!
//! Command-line front end for the nostalgia edit engine.
//!
//! # Features
//!
//! - Speed changes with re-timed audio
//! - Random multi-clip remixes
//! - Round (circular) masks with transparent corners
//! - The stutter preset
//! - Plan text generation and batch processing
//!
//! # Usage
//!
//! ```bash
//! nostalgia speed --input video.mp4 --multiplier 1.5
//! nostalgia remix --input video.mp4 --clips 8 --length 1.5 --seed 7
//! nostalgia batch --dir ./videos --op stutter --jobs 4
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use nostalgia_cli::adapters::init_tracing;
use nostalgia_cli::cli::commands::{self, CommandContext};
use nostalgia_cli::cli::{Cli, Commands};
use nostalgia_cli::config_initialization::initialize_configuration_hierarchy;
use nostalgia_cli::domain::model::CancelToken;

/// Main entry point for the nostalgia CLI application
#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse();

    let config = initialize_configuration_hierarchy(&cli)?;
    init_tracing(&config.logging, cli.quiet)?;
    info!("Starting nostalgia");

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling");
                cancel.cancel();
            }
        });
    }

    let ctx = CommandContext {
        config,
        cancel,
        json: cli.json,
        quiet: cli.quiet,
    };

    // Execute the requested command
    match cli.command {
        Commands::Plan(args) => commands::plan(&args)?,
        Commands::Probe(args) => commands::probe(&args, &ctx)?,
        Commands::Config(args) => commands::config(&args, &ctx)?,
        Commands::Batch(args) => commands::batch(args, ctx).await?,
        command => tokio::task::spawn_blocking(move || commands::edit(command, &ctx))
            .await
            .context("Edit task panicked")??,
    }

    info!("nostalgia completed successfully");
    Ok(())
}
