// REDCap Bridge - Authenticated HTTP bridge to a REDCap project
// Copyright (c) 2025 REDCap Bridge Contributors
// Licensed under the MIT License

//! # REDCap Bridge
//!
//! An authenticated HTTP bridge between a participant-facing platform and a
//! REDCap project. It turns raw record exports into labelled, per-instrument
//! dictionaries, registers new participants in their site's data access group
//! and reports randomization allocations.
//!
//! ## Overview
//!
//! This library provides:
//! - **Resolving** choice lists, site data access groups and health codes
//! - **Exporting** records flattened into `{label: value}` dicts
//! - **Registering** participants with a coded health status
//! - **Looking up** randomization allocations
//! - **Forwarding** instrument completion notices downstream
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`server`] - HTTP routes, basic authentication and error responses
//! - [`core`] - Operations (resolve, transform, registration, allocation, forward)
//! - [`adapters`] - External integrations (REDCap API, downstream service)
//! - [`domain`] - Core domain types and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use redcap_bridge::adapters::redcap::RegistryProvider;
//! use redcap_bridge::config::load_config_or_defaults;
//! use redcap_bridge::core::transform::export_record_with_labels;
//! use redcap_bridge::domain::RecordId;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config_or_defaults("redcap-bridge.toml")?;
//!     let project = RegistryProvider::from_config(&config.redcap)?.project()?;
//!
//!     let record_id = RecordId::new("EL0042")?;
//!     for instrument in export_record_with_labels(project.as_ref(), &record_id).await? {
//!         println!("{}", serde_json::to_string(&instrument)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Serving
//!
//! ```rust,no_run
//! use redcap_bridge::adapters::redcap::RegistryProvider;
//! use redcap_bridge::config::load_config_or_defaults;
//! use redcap_bridge::server::{serve, AppState};
//! use tokio::sync::watch;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_or_defaults("redcap-bridge.toml")?;
//! let registry = RegistryProvider::from_config(&config.redcap)?;
//! let (_shutdown_tx, shutdown_rx) = watch::channel(false);
//!
//! serve(AppState::new(config, registry), shutdown_rx).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Library code returns [`domain::Result`] with [`domain::BridgeError`]; the
//! server maps each error kind to an HTTP status.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
pub mod server;
