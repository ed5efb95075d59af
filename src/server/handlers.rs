//! Route handlers

use super::AppState;
use crate::adapters::redcap::ImportResult;
use crate::core::allocation::get_allocation;
use crate::core::forward::{forward_completion, CompletionNotice, ForwardOutcome};
use crate::core::registration::{create_record, RegistrationRequest};
use crate::core::transform::{export_record_with_labels, FlattenedInstrument};
use crate::domain::{BridgeError, RecordId, Result};
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// `?record_id=` query
#[derive(Debug, Deserialize)]
pub struct RecordQuery {
    record_id: Option<String>,
}

impl RecordQuery {
    fn record_id(&self) -> Result<RecordId> {
        RecordId::new(self.record_id.clone().unwrap_or_default()).map_err(|_| {
            BridgeError::Validation("Missing required query parameter: record_id".to_string())
        })
    }
}

/// Response of `POST /create-record`
#[derive(Debug, Serialize)]
pub struct CreateRecordResponse {
    #[serde(rename = "userId")]
    user_id: String,
    status: &'static str,
    data: Value,
}

/// Response of `GET /randomization-group`
#[derive(Debug, Serialize)]
pub struct RandomizationResponse {
    record_id: String,
    raw: Option<String>,
    label: Option<String>,
    event: Option<String>,
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| BridgeError::Validation(rejection.body_text()))
}

/// `GET /hello`
pub async fn hello() -> Json<Value> {
    Json(json!({"message": "Hello, world!"}))
}

/// `GET /get-redcap-responses?record_id=<id>`
pub async fn get_redcap_responses(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<Vec<FlattenedInstrument>>> {
    let record_id = query.record_id()?;
    let project = state.registry.project()?;
    let instruments = export_record_with_labels(project.as_ref(), &record_id).await?;
    Ok(Json(instruments))
}

/// `POST /create-record`
pub async fn create_record_handler(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RegistrationRequest>, JsonRejection>,
) -> Result<Json<CreateRecordResponse>> {
    let request = json_body(payload)?;
    let health_field = state.config.fields.require_health_field()?;
    let project = state.registry.project()?;

    let registration = create_record(project.as_ref(), health_field, &request).await?;

    let data = match registration.imported {
        ImportResult::Ids(ids) => json!({ "imported_ids": ids }),
        ImportResult::Count { count } => json!({ "count": count }),
    };

    Ok(Json(CreateRecordResponse {
        user_id: registration.user_id.into_inner(),
        status: "success",
        data,
    }))
}

/// `GET /randomization-group?record_id=<id>`
pub async fn randomization_group(
    State(state): State<AppState>,
    Query(query): Query<RecordQuery>,
) -> Result<Json<RandomizationResponse>> {
    let record_id = query.record_id()?;
    let alloc_field = state.config.fields.require_alloc_field()?;
    let project = state.registry.project()?;

    let allocation = get_allocation(project.as_ref(), alloc_field, &record_id).await?;

    let (raw, label, event) = match allocation {
        Some(found) => (Some(found.raw), found.label, found.event),
        None => (None, None, None),
    };

    Ok(Json(RandomizationResponse {
        record_id: record_id.into_inner(),
        raw,
        label,
        event,
    }))
}

/// `POST /redcap-completed-user`
pub async fn redcap_completed_user(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<Json<ForwardOutcome>> {
    let payload = json_body(payload)?;
    let notice = CompletionNotice::from_payload(&payload);
    notice.user_id()?;
    let health_field = state.config.fields.require_health_field()?;
    let project = state.registry.project()?;

    let outcome =
        forward_completion(project.as_ref(), health_field, &state.config.forwarding, &notice)
            .await?;
    Ok(Json(outcome))
}
