//! External system integrations for the bridge.
//!
//! - [`redcap`] - REDCap project access (HTTP API and in-memory)
//! - [`forwarding`] - Downstream status notifications
//!
//! # Design Pattern
//!
//! Adapters isolate external dependencies behind small interfaces so the core
//! operations can be tested against in-memory or mock implementations.
//!
//! ```rust,no_run
//! use redcap_bridge::adapters::redcap::RegistryProvider;
//! use redcap_bridge::config::RedcapConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RedcapConfig {
//!     base_url: "https://redcap.example.org".to_string(),
//!     ..Default::default()
//! };
//!
//! let provider = RegistryProvider::from_config(&config)?;
//! provider.health_check().await?;
//! # Ok(())
//! # }
//! ```

pub mod forwarding;
pub mod redcap;
