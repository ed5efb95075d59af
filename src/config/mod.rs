//! Configuration management for the bridge.
//!
//! The configuration is one explicit [`BridgeConfig`] value built at start-up
//! and shared by reference with every component.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use redcap_bridge::config::load_config_or_defaults;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_or_defaults("redcap-bridge.toml")?;
//! println!("Registry: {}", config.redcap.base_url);
//! println!("Listening on {}", config.server.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! environment = "production"
//!
//! [server]
//! port = 8001
//! username = "meliora"
//! password = "${API_PASS}"
//!
//! [redcap]
//! base_url = "https://redcap.example.org"
//! api_token = "${API_TOKEN}"
//!
//! [fields]
//! health_field = "health_status"
//! alloc_field = "randomization_group"
//! ```
//!
//! # Environment Variables
//!
//! The deployment names `BASE_URL`, `API_TOKEN`, `API_USER`, `API_PASS`,
//! `HEALTH_FIELD`, `ALLOC_FIELD`, `FORWARD_URL` and `FORWARD_ENABLED` are
//! honoured, as are `BRIDGE_<SECTION>_<KEY>` overrides.

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_defaults, parse_config};
pub use schema::{
    ApplicationConfig, BridgeConfig, ConnectionPolicy, Environment, FieldsConfig,
    ForwardingConfig, LoggingConfig, RedcapConfig, RetryConfig, ServerConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
