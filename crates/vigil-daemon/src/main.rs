//! `vigild`: standalone daemon binary for Vigil.
//!
//! Serves the session control surface over `WebSocket`. Agents run on the
//! dry-run scripted engine: the plan given with `--plan`, or a built-in
//! demo plan.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing::info;

use vigil_gateway::{CredentialDefaults, GatewayConfig, GatewayServer, HttpServiceFactory};
use vigil_runtime::{ScriptedLauncher, ScriptedPlan};
use vigil_telemetry::{LogFormat, setup_logging};

/// Vigil daemon: approval-gated browser agent sessions.
#[derive(Debug, Parser)]
#[command(name = "vigild")]
#[command(author, version, about = "Vigil daemon: approval-gated browser agent sessions")]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "VIGIL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listen address (e.g. `127.0.0.1:8765`).
    #[arg(long)]
    bind: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    /// Log format: pretty, compact, or json.
    #[arg(long)]
    log_format: Option<LogFormat>,

    /// JSON plan for the dry-run engine.
    #[arg(long)]
    plan: Option<PathBuf>,
}

impl Args {
    /// Configuration file contents with command-line overrides applied.
    fn gateway_config(&self) -> Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => GatewayConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.server.bind.clone_from(bind);
        }
        if self.verbose {
            config.logging.level = "debug".to_string();
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        Ok(config)
    }
}

async fn load_plan(path: Option<&PathBuf>) -> Result<ScriptedPlan> {
    match path {
        Some(path) => ScriptedPlan::load(path)
            .await
            .with_context(|| format!("Failed to load plan {}", path.display())),
        None => Ok(ScriptedPlan::demo()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.gateway_config()?;

    // Set up logging.
    let _log_guard = match setup_logging(&config.logging) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        },
    };

    let plan = load_plan(args.plan.as_ref()).await?;
    info!(steps = plan.steps.len(), "Dry-run engine ready");
    let launcher = Arc::new(ScriptedLauncher::new(plan));

    let server = GatewayServer::start(
        config,
        CredentialDefaults::from_env(),
        Arc::new(HttpServiceFactory::new(launcher)),
    )
    .await?;

    println!(
        "{}",
        format!("vigild listening on {}", server.ws_url())
            .cyan()
            .bold()
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        () = server.stopped() => {},
    }

    println!("\n{}", "Shutting down daemon...".yellow());
    server.shutdown().await;
    println!("{}", "Daemon stopped".green().bold());
    Ok(())
}
