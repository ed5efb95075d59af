//! In-memory registry project
//!
//! Holds a data dictionary, groups, events and record rows in process memory.
//! Label exports translate categorical codes through the dictionary the same
//! way REDCap does.

use super::RegistryProject;
use crate::adapters::redcap::models::{
    ImportOptions, ImportResult, RawOrLabel, RecordExportRequest, ReturnContent,
};
use crate::core::resolve::ChoiceMap;
use crate::domain::record::{
    DATA_ACCESS_GROUP_KEY, EVENT_NAME_KEY, REPEAT_INSTANCE_KEY, REPEAT_INSTRUMENT_KEY,
};
use crate::domain::{
    record_id_field, DataAccessGroup, EventDescriptor, FieldMetadata, RecordRow, RegistryError,
    Result,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

const MEMORY_URL: &str = "memory://registry/api/";

/// Registry project backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryProject {
    metadata: Vec<FieldMetadata>,
    groups: Vec<DataAccessGroup>,
    events: Vec<EventDescriptor>,
    rows: Mutex<Vec<RecordRow>>,
    imports: Mutex<Vec<ImportOptions>>,
}

impl InMemoryProject {
    /// Create a project with the given data dictionary
    pub fn new(metadata: Vec<FieldMetadata>) -> Self {
        Self {
            metadata,
            ..Default::default()
        }
    }

    /// Add data access groups
    pub fn with_groups(mut self, groups: Vec<DataAccessGroup>) -> Self {
        self.groups = groups;
        self
    }

    /// Add events; a project with events is longitudinal
    pub fn with_events(mut self, events: Vec<EventDescriptor>) -> Self {
        self.events = events;
        self
    }

    /// Seed record rows
    pub fn with_rows(self, rows: Vec<RecordRow>) -> Self {
        *lock(&self.rows) = rows;
        self
    }

    /// Snapshot of every stored row
    pub fn rows(&self) -> Vec<RecordRow> {
        lock(&self.rows).clone()
    }

    /// Options of every import call, in call order
    pub fn import_calls(&self) -> Vec<ImportOptions> {
        lock(&self.imports).clone()
    }

    fn record_id_field_name(&self) -> Option<&str> {
        record_id_field(&self.metadata)
    }

    /// Code-to-label maps for every categorical field
    fn choice_maps(&self) -> HashMap<&str, ChoiceMap> {
        self.metadata
            .iter()
            .filter(|m| !m.select_choices_or_calculations.trim().is_empty())
            .filter(|m| m.field_type != "calc")
            .map(|m| {
                (
                    m.field_name.as_str(),
                    ChoiceMap::parse(&m.select_choices_or_calculations),
                )
            })
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_structural(field: &str) -> bool {
    matches!(
        field,
        EVENT_NAME_KEY | REPEAT_INSTRUMENT_KEY | REPEAT_INSTANCE_KEY | DATA_ACCESS_GROUP_KEY
    )
}

#[async_trait]
impl RegistryProject for InMemoryProject {
    async fn export_metadata(&self, fields: &[String]) -> Result<Vec<FieldMetadata>> {
        if fields.is_empty() {
            return Ok(self.metadata.clone());
        }
        Ok(self
            .metadata
            .iter()
            .filter(|m| fields.contains(&m.field_name))
            .cloned()
            .collect())
    }

    async fn export_records(&self, request: &RecordExportRequest) -> Result<Vec<RecordRow>> {
        let id_field = self.record_id_field_name().unwrap_or("record_id").to_string();
        let choices = match request.raw_or_label {
            RawOrLabel::Label => self.choice_maps(),
            RawOrLabel::Raw => HashMap::new(),
        };

        let rows = lock(&self.rows);
        let exported = rows
            .iter()
            .filter(|row| {
                request.records.is_empty()
                    || row
                        .get(&id_field)
                        .and_then(value_text)
                        .is_some_and(|id| request.records.contains(&id))
            })
            .map(|row| {
                let mut out = RecordRow::new();
                for (field, value) in row.iter() {
                    let wanted = request.fields.is_empty()
                        || field == &id_field
                        || is_structural(field)
                        || request.fields.contains(field);
                    if !wanted {
                        continue;
                    }
                    let rendered = choices
                        .get(field.as_str())
                        .and_then(|map| value_text(value).and_then(|code| map.label_for(&code)))
                        .map(|label| Value::String(label.to_string()))
                        .unwrap_or_else(|| value.clone());
                    out.insert(field.clone(), rendered);
                }
                out
            })
            .collect();

        Ok(exported)
    }

    async fn export_dags(&self) -> Result<Vec<DataAccessGroup>> {
        Ok(self.groups.clone())
    }

    async fn export_events(&self) -> Result<Vec<EventDescriptor>> {
        Ok(self.events.clone())
    }

    async fn import_records(
        &self,
        rows: &[RecordRow],
        options: &ImportOptions,
    ) -> Result<ImportResult> {
        let id_field = self
            .record_id_field_name()
            .ok_or_else(|| {
                RegistryError::ClientError {
                    status: 400,
                    message: "project has no fields".to_string(),
                }
            })?
            .to_string();

        let mut ids = Vec::new();
        for row in rows {
            let id = row.get(&id_field).and_then(value_text).ok_or_else(|| {
                RegistryError::ClientError {
                    status: 400,
                    message: format!("record is missing '{id_field}'"),
                }
            })?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        lock(&self.rows).extend(rows.iter().cloned());
        lock(&self.imports).push(*options);

        Ok(match options.return_content {
            ReturnContent::Count => ImportResult::Count {
                count: ids.len() as u64,
            },
            ReturnContent::Ids | ReturnContent::AutoIds => ImportResult::Ids(ids),
        })
    }

    async fn is_longitudinal(&self) -> Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn api_url(&self) -> &str {
        MEMORY_URL
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn project() -> InMemoryProject {
        InMemoryProject::new(vec![
            FieldMetadata::new("record_id", "Record ID", ""),
            FieldMetadata::new("health_status", "Health status", "1, Healthy | 2, Patient"),
        ])
        .with_rows(vec![
            RecordRow::new()
                .with("record_id", "EL0001")
                .with("health_status", "2"),
            RecordRow::new()
                .with("record_id", "EL0002")
                .with("health_status", "1"),
        ])
    }

    #[tokio::test]
    async fn test_export_filters_by_record() {
        let rows = project()
            .export_records(&RecordExportRequest::for_record("EL0002"))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("health_status"), Some(&json!("1")));
    }

    #[tokio::test]
    async fn test_label_export_translates_codes() {
        let rows = project()
            .export_records(&RecordExportRequest::for_record("EL0001").labelled())
            .await
            .unwrap();
        assert_eq!(rows[0].get("health_status"), Some(&json!("Patient")));
        assert_eq!(rows[0].get("record_id"), Some(&json!("EL0001")));
    }

    #[tokio::test]
    async fn test_field_projection_keeps_record_id() {
        let rows = project()
            .export_records(
                &RecordExportRequest::for_record("EL0001").with_fields(["health_status"]),
            )
            .await
            .unwrap();
        assert_eq!(rows[0].len(), 2);
    }

    #[tokio::test]
    async fn test_import_returns_ids() {
        let project = project();
        let options = ImportOptions {
            return_content: ReturnContent::Ids,
            ..Default::default()
        };
        let result = project
            .import_records(&[RecordRow::new().with("record_id", "LT0001")], &options)
            .await
            .unwrap();
        assert_eq!(result, ImportResult::Ids(vec!["LT0001".to_string()]));
        assert_eq!(project.rows().len(), 3);
        assert_eq!(project.import_calls(), vec![options]);
    }

    #[tokio::test]
    async fn test_import_requires_record_id() {
        let result = project()
            .import_records(
                &[RecordRow::new().with("health_status", "1")],
                &ImportOptions::default(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_record_id_field_is_first_field() {
        assert_eq!(project().record_id_field().await.unwrap(), "record_id");
        assert!(InMemoryProject::default().record_id_field().await.is_err());
    }

    #[tokio::test]
    async fn test_longitudinal_follows_events() {
        assert!(!project().is_longitudinal().await.unwrap());
        let project = project().with_events(vec![EventDescriptor {
            unique_event_name: "baseline_arm_1".to_string(),
            event_name: "Baseline".to_string(),
            arm_num: json!(1),
        }]);
        assert!(project.is_longitudinal().await.unwrap());
    }
}
