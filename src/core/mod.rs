//! Core operations of the bridge.
//!
//! # Modules
//!
//! - [`resolve`] - Choice lists, site and health code lookups
//! - [`transform`] - Labelled record flattening
//! - [`registration`] - Participant record creation
//! - [`allocation`] - Randomization allocation lookup
//! - [`forward`] - Instrument completion forwarding
//!
//! Every operation takes the registry project as a `&dyn RegistryProject`,
//! fetches what it needs for that one call and keeps no state between calls.
//!
//! # Example
//!
//! ```rust,no_run
//! use redcap_bridge::adapters::redcap::RegistryProvider;
//! use redcap_bridge::config::load_config_or_defaults;
//! use redcap_bridge::core::registration::{create_record, RegistrationRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config_or_defaults("redcap-bridge.toml")?;
//! let provider = RegistryProvider::from_config(&config.redcap)?;
//! let project = provider.project()?;
//!
//! let request = RegistrationRequest {
//!     user_id: "EL0042".to_string(),
//!     health_status: "healthy".to_string(),
//!     country_code: "EL".to_string(),
//! };
//! let registration = create_record(
//!     project.as_ref(),
//!     config.fields.require_health_field()?,
//!     &request,
//! )
//! .await?;
//!
//! println!("Placed in {}", registration.group.unique_group_name);
//! # Ok(())
//! # }
//! ```

pub mod allocation;
pub mod forward;
pub mod registration;
pub mod resolve;
pub mod transform;
