//! Registry project implementations
//!
//! - [`RedcapProject`] talks to a REDCap instance over its HTTP API
//! - [`InMemoryProject`] keeps everything in process memory

pub mod api;
pub mod memory;
mod r#trait;

pub use api::{api_url, RedcapProject};
pub use memory::InMemoryProject;
pub use r#trait::RegistryProject;
