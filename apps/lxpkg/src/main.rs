//! lxpkg - Source-based package installer
//!
//! This is the main CLI application that drives all package operations
//! through the ops crate.

mod cli;
mod display;
mod error;
mod events;
mod logging;
mod setup;

use crate::cli::{Cli, Commands};
use crate::display::OutputRenderer;
use crate::error::CliError;
use crate::events::EventHandler;
use crate::setup::SystemSetup;
use clap::Parser;
use lxpkg_config::Config;
use lxpkg_events::EventReceiver;
use lxpkg_ops::{OperationResult, OpsCtx, Orchestrator};
use std::path::Path;
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    // Configuration decides where debug logs go, so it is loaded first
    let config = match load_config(&cli).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    };

    init_tracing(json_mode, cli.global.debug, &config.log_dir());

    if let Err(e) = run(cli, config).await {
        error!("Application error: {}", e);
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Load configuration with precedence file < environment < CLI flags
async fn load_config(cli: &Cli) -> Result<Config, CliError> {
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global);
    Ok(config)
}

/// Main application logic
async fn run(cli: Cli, config: Config) -> Result<(), CliError> {
    info!("Starting lxpkg v{}", env!("CARGO_PKG_VERSION"));

    cli.command
        .validate()
        .map_err(CliError::InvalidArguments)?;

    let renderer = OutputRenderer::new(
        cli.global.json,
        cli.global.color.unwrap_or(config.general.color),
    );

    let mut setup = SystemSetup::new(config);
    setup.initialize()?;

    let (event_sender, event_receiver) = lxpkg_events::channel();
    let ops_ctx = setup.into_context(event_sender)?;

    let mut event_handler =
        EventHandler::new(renderer.colors_enabled(), cli.global.debug, cli.global.json);

    let result =
        execute_command_with_events(cli.command, ops_ctx, event_receiver, &mut event_handler)
            .await?;

    renderer.render_result(&result)?;

    if let OperationResult::Install(job) = &result {
        if !result.is_success() {
            return Err(CliError::JobFailed(job.package.clone()));
        }
    }

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    ops_ctx: OpsCtx,
    mut event_receiver: EventReceiver,
    event_handler: &mut EventHandler,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ops_ctx));

    // Handle events concurrently with command execution
    loop {
        select! {
            // Command completed
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    event_handler.handle_event(event);
                }
                return result;
            }

            // Event received
            event = event_receiver.recv() => {
                match event {
                    Some(event) => event_handler.handle_event(event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    match command {
        Commands::Install { package } => {
            let orchestrator = Orchestrator::new(ctx)?;
            let job = orchestrator.start_install(package.trim())?;
            let snapshot = job.wait().await?;
            Ok(OperationResult::Install(snapshot))
        }

        Commands::Remove { package } => {
            let report = lxpkg_ops::remove(&ctx, package.trim()).await?;
            Ok(OperationResult::Removal(report))
        }

        Commands::Search { query } => {
            let results = lxpkg_ops::search_packages(&ctx, &query);
            Ok(OperationResult::SearchResults(results))
        }

        Commands::Info { package } => {
            let info = lxpkg_ops::package_info(&ctx, package.trim())?;
            Ok(OperationResult::PackageInfo(info))
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool, log_dir: &Path) {
    // Check if debug logging is enabled
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        let log_file = log_dir.join(format!(
            "lxpkg-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));
        let file = std::fs::create_dir_all(log_dir).and_then(|()| std::fs::File::create(&log_file));

        match file {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,lxpkg=debug,lxpkg_ops=debug"),
                        ),
                    )
                    .init();

                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) if !json_mode => {
                eprintln!("Warning: Failed to create log file: {e}");
            }
            Err(_) => {}
        }
    }

    if json_mode {
        // JSON mode: keep stdout and stderr clean for the JSON document
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,lxpkg=warn,lxpkg_ops=warn")
                }),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs) {
    if let Some(color) = global.color {
        config.general.color = color;
    }
    if let Some(root) = &global.source_root {
        config.paths.source_root = Some(root.clone());
    }
    if let Some(root) = &global.build_root {
        config.paths.build_root = Some(root.clone());
    }
    if let Some(root) = &global.install_root {
        config.paths.install_root = Some(root.clone());
    }
}
