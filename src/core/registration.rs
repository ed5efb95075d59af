//! Participant registration
//!
//! Creates the registry record of a newly enrolled participant: the record is
//! placed in the data access group of the participant's country, gets the
//! stored code of their health status and is marked as a complete
//! registration form.

use crate::adapters::redcap::{
    DateFormat, ImportOptions, ImportResult, OverwriteBehavior, RegistryProject, ReturnContent,
};
use crate::core::resolve::{resolve_health_code, resolve_site, SiteMatch};
use crate::domain::record::{DATA_ACCESS_GROUP_KEY, EVENT_NAME_KEY};
use crate::domain::{record_id_field, BridgeError, RecordId, RecordRow, RegistryError, Result};
use serde::{Deserialize, Serialize};

/// Completion status field of the registration form
pub const REGISTRATION_COMPLETE_FIELD: &str = "registration_complete";

/// REDCap form status "Complete"
pub const FORM_COMPLETE: &str = "2";

/// Country code used by test accounts
const TEST_PREFIX: &str = "TEST";

/// Prefix test accounts are registered under
const TEST_SITE_PREFIX: &str = "EL";

/// Registration request as sent by the enrolment app
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRequest {
    /// Participant identifier, used as the record identifier
    #[serde(rename = "userId")]
    pub user_id: String,

    /// Health status as a code, a label or a synonym
    pub health_status: String,

    /// Country code prefix (`EL`, `LT`, `ES`, `SE`, `TEST`)
    pub country_code: String,
}

/// A created registry record
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// Record identifier
    pub user_id: RecordId,
    /// Data access group the record was placed in
    pub group: SiteMatch,
    /// Stored health status code
    pub health_code: String,
    /// What the registry reported
    pub imported: ImportResult,
}

/// Options every registration import uses
pub fn registration_import_options() -> ImportOptions {
    ImportOptions {
        overwrite: OverwriteBehavior::Overwrite,
        return_content: ReturnContent::Ids,
        date_format: DateFormat::Ymd,
    }
}

/// Prefix the site lookup uses for a country code
pub fn site_prefix(country_code: &str) -> &str {
    if country_code == TEST_PREFIX {
        TEST_SITE_PREFIX
    } else {
        country_code
    }
}

/// Build the row imported for a registration
pub fn registration_row(
    record_id_field: &str,
    user_id: &RecordId,
    group: &str,
    health_field: &str,
    health_code: &str,
    event: Option<&str>,
) -> RecordRow {
    let mut row = RecordRow::new()
        .with(record_id_field, user_id.as_str())
        .with(DATA_ACCESS_GROUP_KEY, group)
        .with(health_field, health_code)
        .with(REGISTRATION_COMPLETE_FIELD, FORM_COMPLETE);

    if let Some(event) = event {
        row.insert(EVENT_NAME_KEY, event);
    }

    row
}

/// Create the registry record of a participant
///
/// # Errors
///
/// - `Validation` when `userId` is blank
/// - `UnknownPrefix` / `NoMatchingGroup` from the site lookup
/// - `FieldNotFound` / `NoChoiceMatch` from the health code lookup
/// - `Upstream` when the registry fails
pub async fn create_record(
    project: &dyn RegistryProject,
    health_field: &str,
    request: &RegistrationRequest,
) -> Result<Registration> {
    let user_id = RecordId::new(request.user_id.as_str())
        .map_err(|e| BridgeError::Validation(format!("userId: {e}")))?;

    let group = resolve_site(project, site_prefix(&request.country_code)).await?;

    let metadata = project.export_metadata(&[]).await?;
    let health_code = resolve_health_code(&metadata, health_field, &request.health_status)?;
    let id_field = record_id_field(&metadata).ok_or_else(|| {
        RegistryError::InvalidResponse("project data dictionary is empty".to_string())
    })?;

    let event = if project.is_longitudinal().await? {
        let events = project.export_events().await?;
        let first = events.into_iter().next().ok_or_else(|| {
            RegistryError::InvalidResponse("longitudinal project exports no events".to_string())
        })?;
        Some(first.unique_event_name)
    } else {
        None
    };

    let row = registration_row(
        id_field,
        &user_id,
        &group.unique_group_name,
        health_field,
        &health_code,
        event.as_deref(),
    );

    let imported = project
        .import_records(&[row], &registration_import_options())
        .await?;

    tracing::info!(
        user_id = %user_id,
        group = %group.unique_group_name,
        health_code = %health_code,
        event = ?event,
        imported = imported.len(),
        "Registered participant"
    );

    Ok(Registration {
        user_id,
        group,
        health_code,
        imported,
    })
}
