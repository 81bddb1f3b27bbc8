//! FIX Gateway Binary
//!
//! Starts the gateway against the configured sessions and serves operator
//! commands from stdin.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin fix-gateway
//! ```
//!
//! # Environment Variables
//!
//! - `FIX_GATEWAY_CONFIG`: Path to the YAML config (default: gateway.yaml)
//! - `FXCM_USERNAME` / `FXCM_PASSWORD`: Referenced from the sample config
//! - `OTEL_ENABLED`: Enable OpenTelemetry export (default: false)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4318>)
//! - `OTEL_SERVICE_NAME`: Service name (default: fix-gateway)
//! - `RUST_LOG`: Log filter (default: `fix_gateway=info`)

use std::sync::Arc;

use fix_gateway::application::services::{Command, GatewayOrchestrator};
use fix_gateway::infrastructure::config::{GatewayConfig, config_path, load_config};
use fix_gateway::infrastructure::engine::DryRunEngine;
use fix_gateway::infrastructure::health::{HealthServer, HealthServerState};
use fix_gateway::infrastructure::telemetry;
use fix_gateway::init_metrics;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio_util::sync::CancellationToken;

const MENU: &str = "\
Commands:
  1 | positions                     request positions for every account
  2 | subscribe [SYMBOL...]         subscribe market data
  3 | unsubscribe [SYMBOL...]       unsubscribe market data
  4 | order [buy|sell] [SYMBOL] [QTY]  send a market order per account
  ready                             mark discovery complete
  status                            print gateway state
  0 | quit                          stop the gateway";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_dotenv();

    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting FIX gateway");

    if let Err(e) = init_metrics() {
        tracing::warn!(error = %e, "Prometheus recorder not installed");
    }

    let path = config_path();
    let config = match load_config(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %path, error = %e, "Invalid configuration");
            println!("fix-gateway: {e}");
            std::process::exit(1);
        }
    };
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let session_ids: Vec<_> = config.sessions.iter().map(|s| s.session_id()).collect();
    let engine = Arc::new(DryRunEngine::new(config.decorator(), session_ids));
    let gateway = Arc::new(GatewayOrchestrator::new(
        config.gateway_settings(),
        config.decorator(),
        engine,
    ));

    for session in &config.sessions {
        gateway.on_session_created(session.session_id(), session.role);
    }
    for session in &config.sessions {
        if let Err(e) = gateway.on_logon(&session.session_id()) {
            tracing::error!(error = %e, "Logon handling failed");
        }
    }

    // Spawn discovery settle timer
    if let Some(delay) = config.discovery.settle_delay() {
        let settle_gateway = Arc::clone(&gateway);
        let settle_shutdown = shutdown_token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = settle_shutdown.cancelled() => {}
                () = tokio::time::sleep(delay) => {
                    if !settle_gateway.complete_discovery() {
                        tracing::warn!(
                            state = %settle_gateway.discovery_state(),
                            "Discovery did not settle"
                        );
                    }
                }
            }
        });
    }

    // Spawn health server
    if config.health.port == 0 {
        tracing::info!("Health server disabled");
    } else {
        let health_state = Arc::new(HealthServerState::new(
            env!("CARGO_PKG_VERSION").to_string(),
            Arc::clone(&gateway),
        ));
        let health_server =
            HealthServer::new(config.health.port, health_state, shutdown_token.clone());
        tokio::spawn(async move {
            if let Err(e) = health_server.run().await {
                tracing::error!(error = %e, "Health server error");
            }
        });
    }

    // Spawn command loop
    let command_gateway = Arc::clone(&gateway);
    let command_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        run_commands(command_gateway, command_shutdown).await;
    });

    tracing::info!("FIX gateway ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("FIX gateway stopped");
    Ok(())
}

/// Read commands from stdin until quit, EOF, or shutdown.
async fn run_commands(gateway: Arc<GatewayOrchestrator>, shutdown: CancellationToken) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    println!("{MENU}");

    loop {
        let line = tokio::select! {
            () = shutdown.cancelled() => return,
            line = lines.next_line() => line,
        };

        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("Command input closed");
                return;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read command input");
                return;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Ok(Command::Quit) => {
                tracing::info!("Quit requested");
                shutdown.cancel();
                return;
            }
            Ok(command) => execute(&gateway, command),
            Err(e) => {
                println!("{e}");
                println!("{MENU}");
            }
        }
    }
}

/// Run one command against the gateway.
fn execute(gateway: &GatewayOrchestrator, command: Command) {
    let result = match command {
        Command::Quit => return,
        Command::Positions => gateway.query_positions(),
        Command::Subscribe(symbols) => gateway.subscribe_market_data(&symbols),
        Command::Unsubscribe(symbols) => gateway.unsubscribe_market_data(&symbols),
        Command::Order(overrides) => {
            let params = overrides.apply(&gateway.settings().default_order);
            gateway.market_order(Some(params))
        }
        Command::Ready => {
            if gateway.complete_discovery() {
                println!("discovery complete");
            } else {
                println!("discovery is {}", gateway.discovery_state());
            }
            return;
        }
        Command::Status => {
            match serde_json::to_string_pretty(&gateway.snapshot()) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!(error = %e, "Failed to render status"),
            }
            return;
        }
    };

    match result {
        Ok(sent) => println!("{sent} request(s) sent"),
        Err(e) => println!("command failed: {e}"),
    }
}

/// Log the parsed configuration.
fn log_config(config: &GatewayConfig) {
    tracing::info!(
        sessions = config.sessions.len(),
        trading_session_id = %config.trading_session_id,
        token_policy = ?config.market_data.token_policy,
        settle_secs = config.discovery.settle_secs,
        health_port = config.health.port,
        "Configuration loaded"
    );
    for session in &config.sessions {
        tracing::debug!(
            session = %session.session_id(),
            role = %session.effective_role(),
            target_sub_id = %session.target_sub_id,
            "Session configured"
        );
    }
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for SIGTERM, SIGINT, or a quit command.
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => {}
    }

    shutdown_token.cancel();
}
