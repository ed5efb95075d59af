//! Randomization allocation lookup

use crate::adapters::redcap::{RecordExportRequest, RegistryProject};
use crate::core::resolve::{choice_map, ChoiceMap};
use crate::domain::record::is_blank;
use crate::domain::{record_id_field, Allocation, BridgeError, RecordId, RecordRow, Result};
use serde_json::Value;

fn is_unset(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        other => is_blank(other),
    }
}

fn as_code(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First row carrying an allocation for `field`
///
/// Rows without a value for the field are skipped; a longitudinal record
/// usually has the allocation in one event only.
pub fn find_allocation(rows: &[RecordRow], field: &str, choices: &ChoiceMap) -> Option<Allocation> {
    rows.iter().find_map(|row| {
        let value = row.get(field).filter(|v| !is_unset(v))?;
        let raw = as_code(value);
        Some(Allocation {
            label: choices.label_for(&raw).map(str::to_string),
            event: row.event_name().map(str::to_string),
            raw,
        })
    })
}

/// Allocation of a record, `None` while it has not been randomized
///
/// # Errors
///
/// - `FieldNotFound` when the project has no `alloc_field`
/// - `Upstream` when the registry fails
pub async fn get_allocation(
    project: &dyn RegistryProject,
    alloc_field: &str,
    record_id: &RecordId,
) -> Result<Option<Allocation>> {
    let metadata = project.export_metadata(&[]).await?;
    if !metadata.iter().any(|m| m.field_name == alloc_field) {
        return Err(BridgeError::FieldNotFound {
            field: alloc_field.to_string(),
        });
    }

    let fields: Vec<&str> = record_id_field(&metadata)
        .into_iter()
        .chain([alloc_field])
        .collect();

    let rows = project
        .export_records(&RecordExportRequest::for_record(record_id.as_str()).with_fields(fields))
        .await?;

    let allocation = find_allocation(&rows, alloc_field, &choice_map(&metadata, alloc_field));

    match &allocation {
        Some(found) => tracing::debug!(
            record_id = %record_id,
            raw = %found.raw,
            label = ?found.label,
            event = ?found.event,
            "Found allocation"
        ),
        None => tracing::debug!(record_id = %record_id, "Record not allocated yet"),
    }

    Ok(allocation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::redcap::InMemoryProject;
    use crate::domain::FieldMetadata;
    use serde_json::json;

    fn project(rows: Vec<RecordRow>) -> InMemoryProject {
        InMemoryProject::new(vec![
            FieldMetadata::new("record_id", "Record ID", ""),
            FieldMetadata::new("randomization", "Group", "1, Control | 2, Intervention"),
        ])
        .with_rows(rows)
    }

    fn record(id: &str) -> RecordId {
        RecordId::new(id).unwrap()
    }

    #[test]
    fn test_first_filled_row_wins() {
        let rows = vec![
            RecordRow::new()
                .with("randomization", "")
                .with("redcap_event_name", "registration_arm_1"),
            RecordRow::new()
                .with("randomization", "2")
                .with("redcap_event_name", "baseline_arm_1"),
            RecordRow::new()
                .with("randomization", "1")
                .with("redcap_event_name", "week_4_arm_1"),
        ];
        let choices = ChoiceMap::parse("1, Control | 2, Intervention");
        let found = find_allocation(&rows, "randomization", &choices).unwrap();
        assert_eq!(found.raw, "2");
        assert_eq!(found.label.as_deref(), Some("Intervention"));
        assert_eq!(found.event.as_deref(), Some("baseline_arm_1"));
    }

    #[test]
    fn test_numeric_code_without_label() {
        let rows = vec![RecordRow::new().with("randomization", 3)];
        let found =
            find_allocation(&rows, "randomization", &ChoiceMap::parse("1, Control")).unwrap();
        assert_eq!(found.raw, "3");
        assert!(found.label.is_none());
        assert!(found.event.is_none());
    }

    #[test]
    fn test_empty_containers_are_unset() {
        let rows = vec![
            RecordRow::new().with("randomization", json!([])),
            RecordRow::new().with("randomization", json!({})),
        ];
        assert!(find_allocation(&rows, "randomization", &ChoiceMap::default()).is_none());
    }

    #[tokio::test]
    async fn test_get_allocation() {
        let project = project(vec![RecordRow::new()
            .with("record_id", "EL0001")
            .with("randomization", "1")
            .with("notes", "ignored")]);
        let found = get_allocation(&project, "randomization", &record("EL0001"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.raw, "1");
        assert_eq!(found.label.as_deref(), Some("Control"));
    }

    #[tokio::test]
    async fn test_not_allocated() {
        let project = project(vec![RecordRow::new()
            .with("record_id", "EL0002")
            .with("randomization", "")]);
        assert!(get_allocation(&project, "randomization", &record("EL0002"))
            .await
            .unwrap()
            .is_none());
        assert!(get_allocation(&project, "randomization", &record("EL0404"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_unknown_field() {
        let err = get_allocation(&project(vec![]), "arm", &record("EL0001"))
            .await
            .unwrap_err();
        assert!(matches!(err, BridgeError::FieldNotFound { .. }));
    }
}
