//! Instrument completion forwarding
//!
//! REDCap notifies the bridge whenever a participant saves an instrument.
//! Healthy participants move on once they finish the healthy-track
//! questionnaire; everyone else once they finish the symptom assessment. For
//! those two cases the downstream service is told to start the participant's
//! next step.

use crate::adapters::forwarding::ForwardingClient;
use crate::adapters::redcap::{RecordExportRequest, RegistryProject};
use crate::config::ForwardingConfig;
use crate::domain::record::is_blank;
use crate::domain::{record_id_field, BridgeError, RecordId, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Category label of participants on the healthy track
pub const HEALTHY_CATEGORY: &str = "healthy";

/// Completion notice fields the bridge reads; everything else is ignored
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct CompletionNotice {
    /// Participant's record identifier (string or number)
    #[serde(default)]
    pub record_id: Option<Value>,

    /// Instrument that was saved
    #[serde(default)]
    pub instrument: Option<String>,
}

impl CompletionNotice {
    /// Read a notice from a JSON object
    pub fn from_payload(payload: &Map<String, Value>) -> Self {
        Self {
            record_id: payload.get("record_id").cloned(),
            instrument: payload
                .get("instrument")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// Record identifier, or a validation error when missing or blank
    pub fn user_id(&self) -> Result<RecordId> {
        let raw = match &self.record_id {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };
        RecordId::new(raw)
            .map_err(|_| BridgeError::Validation("Missing required field: record_id".to_string()))
    }
}

/// Whether the notice was passed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForwardStatus {
    /// Accepted, nothing sent downstream
    Received,
    /// Sent downstream
    Forwarded,
}

/// Result of handling a completion notice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForwardOutcome {
    /// Whether the notice was forwarded
    pub status: ForwardStatus,

    /// Participant's record identifier
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Participant's health category label, when recorded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Downstream HTTP status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_status_code: Option<u16>,

    /// Downstream reply body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream_body: Option<Value>,
}

fn is_healthy(category: &str) -> bool {
    category.trim().eq_ignore_ascii_case(HEALTHY_CATEGORY)
}

/// Whether completing `instrument` moves a participant of `category` on
pub fn should_forward(
    config: &ForwardingConfig,
    instrument: Option<&str>,
    category: Option<&str>,
) -> bool {
    match (instrument, category) {
        (Some(instrument), Some(category)) if instrument == config.healthy_instrument => {
            is_healthy(category)
        }
        (Some(instrument), Some(category)) if instrument == config.patient_instrument => {
            !is_healthy(category)
        }
        _ => false,
    }
}

/// Health category label of a participant
///
/// `None` when the record has no health status.
///
/// # Errors
///
/// - `FieldNotFound` when the project has no `health_field`
/// - `Upstream` when the registry fails
pub async fn participant_category(
    project: &dyn RegistryProject,
    health_field: &str,
    user_id: &RecordId,
) -> Result<Option<String>> {
    let metadata = project.export_metadata(&[]).await?;
    if !metadata.iter().any(|m| m.field_name == health_field) {
        return Err(BridgeError::FieldNotFound {
            field: health_field.to_string(),
        });
    }

    let fields: Vec<&str> = record_id_field(&metadata)
        .into_iter()
        .chain([health_field])
        .collect();
    let rows = project
        .export_records(
            &RecordExportRequest::for_record(user_id.as_str())
                .with_fields(fields)
                .labelled(),
        )
        .await?;

    Ok(rows.iter().find_map(|row| match row.get(health_field) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(value) if !is_blank(value) && !value.is_string() => Some(value.to_string()),
        _ => None,
    }))
}

/// Handle one completion notice
///
/// # Errors
///
/// - `Validation` when the notice has no record identifier
/// - `FieldNotFound` when the project has no `health_field`
/// - `Configuration` when forwarding is due and enabled but no URL is set
/// - `Forwarding` when the downstream service cannot be reached
/// - `Upstream` when the registry fails
pub async fn forward_completion(
    project: &dyn RegistryProject,
    health_field: &str,
    config: &ForwardingConfig,
    notice: &CompletionNotice,
) -> Result<ForwardOutcome> {
    let user_id = notice.user_id()?;
    let instrument = notice.instrument.as_deref();

    tracing::info!(user_id = %user_id, instrument = ?instrument, "Received completion notice");

    let category = participant_category(project, health_field, &user_id).await?;
    let due = should_forward(config, instrument, category.as_deref());
    let will_forward = due && config.enabled;

    tracing::info!(
        user_id = %user_id,
        category = ?category,
        due = due,
        enabled = config.enabled,
        "Forwarding decision"
    );

    if !will_forward {
        return Ok(ForwardOutcome {
            status: ForwardStatus::Received,
            user_id: user_id.into_inner(),
            category,
            upstream_status_code: None,
            upstream_body: None,
        });
    }

    let url = config.url.as_deref().ok_or_else(|| {
        BridgeError::Configuration(
            "forwarding is enabled but forwarding.url (FORWARD_URL) is not set".to_string(),
        )
    })?;

    let reply = ForwardingClient::new(url, config.timeout_seconds)?
        .notify(&user_id)
        .await?;

    Ok(ForwardOutcome {
        status: ForwardStatus::Forwarded,
        user_id: user_id.into_inner(),
        category,
        upstream_status_code: Some(reply.status_code),
        upstream_body: Some(reply.body),
    })
}
