//! Labelled record flattening
//!
//! A record is exported as one row per instrument instance. Each row becomes
//! one flat object keyed by question label:
//!
//! ```text
//! {"record_id": "304", "redcap_repeat_instrument": "visit", "redcap_repeat_instance": 2, "q1": "Yes"}
//!   → {"Record ID": "304", "Repeat Instrument": "visit", "Repeat Instance": 2, "Question one": "Yes"}
//! ```

use crate::adapters::redcap::{RecordExportRequest, RegistryProject};
use crate::domain::record::{is_blank, REPEAT_INSTANCE_KEY, REPEAT_INSTRUMENT_KEY};
use crate::domain::{record_id_field, FieldMetadata, RecordId, RecordRow, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Key holding the record identifier
pub const RECORD_ID_LABEL: &str = "Record ID";

/// Key holding the repeating instrument name
pub const REPEAT_INSTRUMENT_LABEL: &str = "Repeat Instrument";

/// Key holding the repeat instance number
pub const REPEAT_INSTANCE_LABEL: &str = "Repeat Instance";

/// Instrument name reported for non-repeating rows
pub const MAIN_RECORD: &str = "Main Record";

/// Field name REDCap projects conventionally use for the record identifier
const DEFAULT_RECORD_ID_FIELD: &str = "record_id";

/// One instrument instance keyed by question label
///
/// The three reserved keys come first, then the filled-in fields in export
/// order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlattenedInstrument(Map<String, Value>);

impl FlattenedInstrument {
    /// Value under a key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Keys in output order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of keys, reserved ones included
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; the reserved keys are always present
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Underlying JSON object
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Field name to question label; a later entry replaces an earlier one
pub fn field_labels(metadata: &[FieldMetadata]) -> HashMap<String, String> {
    metadata
        .iter()
        .map(|m| (m.field_name.clone(), m.field_label.clone()))
        .collect()
}

fn is_system_field(field: &str, record_id_field: &str) -> bool {
    field == DEFAULT_RECORD_ID_FIELD
        || field == record_id_field
        || field == REPEAT_INSTRUMENT_KEY
        || field == REPEAT_INSTANCE_KEY
}

/// Flatten exported rows of one record
///
/// Fields with an empty or null value are dropped; `0` and `false` are kept.
/// A field without a label is keyed by its name. Rows keep their order.
pub fn flatten_rows(
    record_id: &RecordId,
    labels: &HashMap<String, String>,
    record_id_field: &str,
    rows: &[RecordRow],
) -> Vec<FlattenedInstrument> {
    rows.iter()
        .map(|row| {
            let mut out = Map::new();
            out.insert(
                RECORD_ID_LABEL.to_string(),
                Value::String(record_id.to_string()),
            );
            out.insert(
                REPEAT_INSTRUMENT_LABEL.to_string(),
                Value::String(row.repeat_instrument().unwrap_or(MAIN_RECORD).to_string()),
            );
            out.insert(REPEAT_INSTANCE_LABEL.to_string(), row.repeat_instance());

            for (field, value) in row.iter() {
                if is_system_field(field, record_id_field) || is_blank(value) {
                    continue;
                }
                let key = labels
                    .get(field)
                    .filter(|label| !label.is_empty())
                    .unwrap_or(field);
                out.insert(key.clone(), value.clone());
            }

            FlattenedInstrument(out)
        })
        .collect()
}

/// Export one record with labelled values and flatten it
///
/// An unknown record gives an empty list.
///
/// # Examples
///
/// ```no_run
/// use redcap_bridge::adapters::redcap::RegistryProvider;
/// use redcap_bridge::config::RedcapConfig;
/// use redcap_bridge::core::transform::export_record_with_labels;
/// use redcap_bridge::domain::RecordId;
///
/// # async fn example() -> redcap_bridge::domain::Result<()> {
/// let provider = RegistryProvider::from_config(&RedcapConfig::default())?;
/// let project = provider.project()?;
/// let record = RecordId::new("304").map_err(redcap_bridge::domain::BridgeError::Validation)?;
///
/// for instrument in export_record_with_labels(project.as_ref(), &record).await? {
///     println!("{}", serde_json::to_string(&instrument)?);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn export_record_with_labels(
    project: &dyn RegistryProject,
    record_id: &RecordId,
) -> Result<Vec<FlattenedInstrument>> {
    let metadata = project.export_metadata(&[]).await?;
    let labels = field_labels(&metadata);
    let id_field = record_id_field(&metadata).unwrap_or(DEFAULT_RECORD_ID_FIELD);

    let rows = project
        .export_records(&RecordExportRequest::for_record(record_id.as_str()).labelled())
        .await?;

    let flattened = flatten_rows(record_id, &labels, id_field, &rows);

    tracing::debug!(
        record_id = %record_id,
        rows = rows.len(),
        instruments = flattened.len(),
        "Flattened record"
    );

    Ok(flattened)
}
