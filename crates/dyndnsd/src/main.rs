// # dyndnsd - Dynamic DNS Update Daemon
//
// The dyndnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing the runtime and the two Google API clients
// 3. Serving the update endpoint until a shutdown signal arrives
//
// All decision logic lives in dyndns-core; this binary is wiring only.
//
// ## Configuration
//
// All configuration is done via environment variables, read once at
// startup:
//
// - `GCP_PROJECT`: project owning the credential store and managed zones
// - `GCP_ACCESS_TOKEN`: OAuth2 bearer token for the Google APIs
// - `DYNDNS_LISTEN_ADDR`: listen address (default `[::]:8080`)
// - `DYNDNS_PROPAGATION_POLL_MS`: first propagation poll interval
//   (default 500)
// - `DYNDNS_PROPAGATION_TIMEOUT_SECS`: propagation deadline (default 120)
// - `DYNDNS_LOG_LEVEL`: trace|debug|info|warn|error (default info)
//
// ## Example
//
// ```bash
// export GCP_PROJECT=example-project
// export GCP_ACCESS_TOKEN=$(gcloud auth print-access-token)
//
// dyndnsd
// ```

mod server;

use anyhow::Result;
use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use dyndns_core::{Authenticator, PropagationConfig, Reconciler, ServiceConfig};
use dyndns_store_datastore::DatastoreCredentials;
use dyndns_zone_clouddns::CloudDnsZones;

use crate::server::{AppState, router};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum DaemonExitCode {
    CleanShutdown = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DaemonExitCode> for ExitCode {
    fn from(code: DaemonExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    project: String,
    access_token: String,
    listen_addr: String,
    propagation_poll_ms: Option<u64>,
    propagation_timeout_secs: Option<u64>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            project: env::var("GCP_PROJECT")?,
            access_token: env::var("GCP_ACCESS_TOKEN")?,
            listen_addr: env::var("DYNDNS_LISTEN_ADDR").unwrap_or_else(|_| "[::]:8080".to_string()),
            propagation_poll_ms: env::var("DYNDNS_PROPAGATION_POLL_MS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| anyhow::anyhow!("DYNDNS_PROPAGATION_POLL_MS is not a number: {e}"))?,
            propagation_timeout_secs: env::var("DYNDNS_PROPAGATION_TIMEOUT_SECS")
                .ok()
                .map(|s| s.parse())
                .transpose()
                .map_err(|e| {
                    anyhow::anyhow!("DYNDNS_PROPAGATION_TIMEOUT_SECS is not a number: {e}")
                })?,
            log_level: env::var("DYNDNS_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.access_token.is_empty() {
            anyhow::bail!(
                "GCP_ACCESS_TOKEN is required. \
                Set it via: export GCP_ACCESS_TOKEN=$(gcloud auth print-access-token)"
            );
        }

        if self.access_token.len() < 20 {
            anyhow::bail!(
                "GCP_ACCESS_TOKEN appears too short ({} chars). \
                Verify your token is correct.",
                self.access_token.len()
            );
        }

        // Check for obvious placeholder tokens (common mistake)
        let token_lower = self.access_token.to_lowercase();
        if token_lower.contains("your_token")
            || token_lower.contains("replace_me")
            || token_lower.contains("example")
        {
            anyhow::bail!(
                "GCP_ACCESS_TOKEN appears to be a placeholder. \
                Use an actual OAuth2 access token."
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "DYNDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    /// Build the core service configuration, applying defaults
    fn service_config(&self) -> Result<ServiceConfig> {
        let mut propagation = PropagationConfig::default();
        if let Some(poll_ms) = self.propagation_poll_ms {
            propagation.poll_initial_ms = poll_ms;
            propagation.poll_max_ms = propagation.poll_max_ms.max(poll_ms);
        }
        if let Some(timeout_secs) = self.propagation_timeout_secs {
            propagation.timeout_secs = timeout_secs;
        }

        let config = ServiceConfig {
            project: self.project.clone(),
            listen_addr: self.listen_addr.clone(),
            propagation,
        };
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return DaemonExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {e}");
        return DaemonExitCode::ConfigError.into();
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!("Starting dyndnsd daemon");

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {e}");
            return DaemonExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(config).await {
            error!("Daemon error: {e}");
            DaemonExitCode::RuntimeError
        } else {
            DaemonExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> Result<()> {
    let service_config = config.service_config()?;

    let store = Arc::new(DatastoreCredentials::new(
        service_config.project.as_str(),
        config.access_token.as_str(),
    )?);
    let zones = Arc::new(CloudDnsZones::new(
        service_config.project.as_str(),
        config.access_token.as_str(),
    )?);

    let state = AppState {
        authenticator: Arc::new(Authenticator::new(store)),
        reconciler: Arc::new(Reconciler::new(zones, service_config.propagation.clone())),
    };

    let addr: SocketAddr = service_config
        .listen_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid listen address: {e}"))?;

    info!(project = %service_config.project, %addr, "serving update endpoint");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Daemon stopped");
    Ok(())
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
#[cfg(unix)]
async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGTERM handler: {e}");
            return;
        }
    };
    let mut sigint = match signal(SignalKind::interrupt()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to setup SIGINT handler: {e}");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("Received SIGINT, shutting down"),
    }
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to wait for CTRL-C: {e}");
    } else {
        info!("Received CTRL-C, shutting down");
    }
}
