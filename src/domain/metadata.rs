//! Registry schema types
//!
//! Field metadata, data access groups and events as exported by the registry.
//! Unknown keys in the registry's JSON are ignored.

use serde::{Deserialize, Serialize};

/// One entry of the registry's data dictionary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FieldMetadata {
    /// Variable name
    pub field_name: String,

    /// Human-readable label shown on the form
    #[serde(default)]
    pub field_label: String,

    /// `code, label | code, label` for categorical fields, the formula for
    /// calculated fields, empty otherwise
    #[serde(default)]
    pub select_choices_or_calculations: String,

    /// Instrument the field belongs to
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub form_name: String,

    /// Field type (`text`, `radio`, `dropdown`, ...)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub field_type: String,
}

impl FieldMetadata {
    /// Create a metadata entry with a name, label and choice string
    pub fn new(
        field_name: impl Into<String>,
        field_label: impl Into<String>,
        choices: impl Into<String>,
    ) -> Self {
        Self {
            field_name: field_name.into(),
            field_label: field_label.into(),
            select_choices_or_calculations: choices.into(),
            ..Default::default()
        }
    }
}

/// Record identifier field of a data dictionary
///
/// REDCap always lists the record identifier first, whatever it is named.
pub fn record_id_field(metadata: &[FieldMetadata]) -> Option<&str> {
    metadata.first().map(|entry| entry.field_name.as_str())
}

/// A data access group (roughly one recruiting site)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DataAccessGroup {
    /// Internal key, e.g. `greece`
    #[serde(default)]
    pub unique_group_name: String,

    /// Display name, e.g. `Greece`
    #[serde(default)]
    pub data_access_group_name: String,
}

impl DataAccessGroup {
    /// Create a group from its unique and display names
    pub fn new(unique_group_name: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            unique_group_name: unique_group_name.into(),
            data_access_group_name: display_name.into(),
        }
    }
}

/// Event of a longitudinal project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventDescriptor {
    /// Unique event name used in `redcap_event_name`
    pub unique_event_name: String,

    /// Display name
    #[serde(default)]
    pub event_name: String,

    /// Arm number; the registry sends this as a number or a string
    #[serde(default)]
    pub arm_num: serde_json::Value,
}
