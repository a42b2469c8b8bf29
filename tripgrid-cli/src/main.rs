// tripgrid-cli/src/main.rs
// ============================================================================
// Module: Tripgrid CLI Entry Point
// Description: Command dispatcher for the Tripgrid MCP server.
// Purpose: Load environment configuration, initialize logging, and serve.
// Dependencies: clap, tokio, tracing-subscriber, tripgrid-mcp
// ============================================================================

//! ## Overview
//! The CLI binds configuration from the environment, initializes the tracing
//! subscriber with the configured log filter, and runs the MCP server until
//! the process exits. `config check` validates the environment binding
//! without starting the server.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use tracing_subscriber::EnvFilter;
use tripgrid_config::TripgridConfig;
use tripgrid_mcp::McpServer;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "tripgrid", version, about = "Tripgrid multi-tenant MCP server")]
struct Cli {
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the MCP server on the configured port.
    Serve,
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the environment configuration and print the binding.
    Check,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = match TripgridConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("tripgrid: {err}");
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config.log_level);
    match cli.command {
        Commands::Serve => run_server(config),
        Commands::Config {
            command: ConfigCommand::Check,
        } => check_config(&config),
    }
}

/// Initializes the tracing subscriber honoring `LOG_LEVEL`.
fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs the MCP server on the tokio runtime.
fn run_server(config: TripgridConfig) -> ExitCode {
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            tracing::error!("runtime start failed: {err}");
            return ExitCode::FAILURE;
        }
    };
    let result = runtime.block_on(async {
        let server = McpServer::from_config(&config)?;
        server.serve().await
    });
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("server failed: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Validates and prints the effective configuration binding.
fn check_config(config: &TripgridConfig) -> ExitCode {
    println!("port: {}", config.server.port);
    println!("max body bytes: {}", config.server.max_body_bytes);
    println!(
        "token verification: {}",
        if config.idp.verification_enabled() { "enabled" } else { "disabled (decode-only)" }
    );
    if let Some(issuer) = config.idp.issuer() {
        println!("issuer: {issuer}");
    }
    println!(
        "booking data plane: {}",
        if config.data_plane.bookings_enabled() { "bound" } else { "unbound" }
    );
    println!(
        "policy resource: {}",
        if config.data_plane.policy_resource_enabled() { "bound" } else { "unbound" }
    );
    ExitCode::SUCCESS
}
