//! Domain models and types for the bridge.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`RecordId`], [`FieldName`])
//! - **Registry schema types** ([`FieldMetadata`], [`DataAccessGroup`], [`EventDescriptor`])
//! - **Record shapes** ([`RecordRow`], [`Allocation`])
//! - **Error types** ([`BridgeError`], [`RegistryError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, BridgeError>`]:
//!
//! ```rust
//! use redcap_bridge::domain::{BridgeError, RecordId, Result};
//!
//! fn parse(raw: &str) -> Result<RecordId> {
//!     RecordId::new(raw).map_err(BridgeError::Validation)
//! }
//! ```

pub mod errors;
pub mod ids;
pub mod metadata;
pub mod record;
pub mod result;

// Re-export commonly used types for convenience
pub use errors::{BridgeError, RegistryError};
pub use ids::{FieldName, RecordId};
pub use metadata::{record_id_field, DataAccessGroup, EventDescriptor, FieldMetadata};
pub use record::{Allocation, RecordRow};
pub use result::Result;
