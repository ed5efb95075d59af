//! Registry project trait definition
//!
//! `RegistryProject` abstracts one REDCap project behind the handful of API
//! calls the bridge needs. The HTTP implementation talks to a real instance;
//! the in-memory implementation backs tests and offline runs.

use crate::adapters::redcap::models::{ImportOptions, ImportResult, RecordExportRequest};
use crate::domain::{
    DataAccessGroup, EventDescriptor, FieldMetadata, RecordRow, RegistryError, Result,
};
use async_trait::async_trait;

/// Trait for registry project implementations
///
/// # Example
///
/// ```no_run
/// use redcap_bridge::adapters::redcap::{RecordExportRequest, RedcapProject, RegistryProject};
/// use redcap_bridge::config::RedcapConfig;
///
/// # async fn example() -> redcap_bridge::domain::Result<()> {
/// let project = RedcapProject::new(&RedcapConfig::default())?;
///
/// let metadata = project.export_metadata(&[]).await?;
/// let rows = project
///     .export_records(&RecordExportRequest::for_record("304").labelled())
///     .await?;
/// println!("{} fields, {} rows", metadata.len(), rows.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait RegistryProject: Send + Sync {
    /// Export the data dictionary, optionally restricted to `fields`
    ///
    /// An empty slice exports every field.
    async fn export_metadata(&self, fields: &[String]) -> Result<Vec<FieldMetadata>>;

    /// Export record rows
    async fn export_records(&self, request: &RecordExportRequest) -> Result<Vec<RecordRow>>;

    /// Export the project's data access groups
    async fn export_dags(&self) -> Result<Vec<DataAccessGroup>>;

    /// Export the events of a longitudinal project
    async fn export_events(&self) -> Result<Vec<EventDescriptor>>;

    /// Import record rows
    async fn import_records(
        &self,
        rows: &[RecordRow],
        options: &ImportOptions,
    ) -> Result<ImportResult>;

    /// Whether the project defines events
    async fn is_longitudinal(&self) -> Result<bool>;

    /// Name of the record identifier field (the first field of the dictionary)
    async fn record_id_field(&self) -> Result<String> {
        let metadata = self.export_metadata(&[]).await?;
        crate::domain::record_id_field(&metadata)
            .map(str::to_string)
            .ok_or_else(|| {
                RegistryError::InvalidResponse("project data dictionary is empty".to_string())
                    .into()
            })
    }

    /// API endpoint this project talks to
    fn api_url(&self) -> &str;
}
