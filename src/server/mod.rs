//! HTTP facade
//!
//! An axum router exposing the core operations behind HTTP Basic auth:
//!
//! | Route | Operation |
//! |-------|-----------|
//! | `GET /hello` | liveness greeting |
//! | `GET /get-redcap-responses?record_id=` | labelled record export |
//! | `POST /create-record` | participant registration |
//! | `GET /randomization-group?record_id=` | allocation lookup |
//! | `POST /redcap-completed-user` | completion forwarding |

pub mod auth;
pub mod error;
pub mod handlers;
pub mod middleware;

use crate::adapters::redcap::RegistryProvider;
use crate::config::BridgeConfig;
use crate::domain::{BridgeError, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Shared state of every handler
#[derive(Clone)]
pub struct AppState {
    /// Configuration built at start-up
    pub config: Arc<BridgeConfig>,
    /// Source of registry project handles
    pub registry: RegistryProvider,
    credentials: Arc<auth::Credentials>,
}

impl AppState {
    /// Build the state from configuration and a registry provider
    pub fn new(config: BridgeConfig, registry: RegistryProvider) -> Self {
        let credentials = Arc::new(auth::Credentials::from_config(&config.server));
        Self {
            config: Arc::new(config),
            registry,
            credentials,
        }
    }
}

/// Build the router with auth, CORS and request id layers
pub fn create_router(state: AppState) -> Router {
    let cors = middleware::cors(&state.config.server.cors_origins);

    Router::new()
        .route("/hello", get(handlers::hello))
        .route("/get-redcap-responses", get(handlers::get_redcap_responses))
        .route("/create-record", post(handlers::create_record_handler))
        .route("/randomization-group", get(handlers::randomization_group))
        .route("/redcap-completed-user", post(handlers::redcap_completed_user))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ))
        .layer(cors)
        .layer(axum::middleware::from_fn(middleware::request_id))
        .with_state(state)
}

/// Serve until `shutdown` flips to `true`
///
/// In-flight requests get `server.shutdown_timeout_secs` to finish.
pub async fn serve(state: AppState, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let address = state.config.server.bind_address();
    let grace = Duration::from_secs(state.config.server.shutdown_timeout_secs);

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| BridgeError::Io(format!("Failed to bind {address}: {e}")))?;

    tracing::info!(
        address = %address,
        policy = ?state.registry.policy(),
        "HTTP server listening"
    );

    let router = create_router(state);
    let mut drain = shutdown.clone();

    let server = axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
            tracing::info!("Shutdown requested, draining in-flight requests");
        })
        .into_future();

    tokio::select! {
        result = server => result.map_err(|e| BridgeError::Io(format!("HTTP server error: {e}")))?,
        _ = async {
            let _ = drain.wait_for(|stop| *stop).await;
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!(grace_secs = grace.as_secs(), "Shutdown grace period elapsed");
        }
    }

    tracing::info!("HTTP server stopped");
    Ok(())
}
