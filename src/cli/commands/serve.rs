//! Serve command implementation
//!
//! Runs the HTTP bridge until a shutdown signal arrives.

use crate::adapters::redcap::RegistryProvider;
use crate::config::load_config_or_defaults;
use crate::server::{self, AppState};
use clap::Args;
use tokio::sync::watch;

/// Arguments for the serve command
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Override the listening port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Skip the start-up registry health check
    #[arg(long)]
    pub skip_health_check: bool,
}

impl ServeArgs {
    /// Execute the serve command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        let mut config = match load_config_or_defaults(config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, config_path = %config_path, "Invalid configuration");
                eprintln!("Error: {e}");
                return Ok(2);
            }
        };

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }

        let registry = match RegistryProvider::from_config(&config.redcap) {
            Ok(registry) => registry,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create registry client");
                eprintln!("Error: {e}");
                return Ok(2);
            }
        };

        if self.skip_health_check {
            tracing::debug!("Registry health check skipped");
        } else if let Err(e) = registry.health_check().await {
            // The registry may come up after the bridge; requests surface the error
            tracing::warn!(error = %e, "Registry not reachable at start-up");
        }

        tracing::info!(
            environment = ?config.environment,
            policy = ?registry.policy(),
            health_field = ?config.fields.health_field,
            alloc_field = ?config.fields.alloc_field,
            forwarding_enabled = config.forwarding.enabled,
            "Starting bridge"
        );

        server::serve(AppState::new(config, registry), shutdown_signal).await?;

        tracing::info!("Bridge stopped");
        Ok(0)
    }
}
