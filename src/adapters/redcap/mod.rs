//! REDCap registry adapter
//!
//! This module provides the integration with a REDCap project:
//! - Project trait over the API calls the bridge uses
//! - HTTP implementation with retry on transient failures
//! - In-memory implementation for tests and offline runs
//! - Provider applying the configured connection policy

pub mod client;
pub mod models;
pub mod project;

pub use client::RegistryProvider;
pub use models::{
    DateFormat, ImportOptions, ImportResult, OverwriteBehavior, RawOrLabel,
    RecordExportRequest, ReturnContent,
};
pub use project::{api_url, InMemoryProject, RedcapProject, RegistryProject};
