//! Health status value to stored code resolution
//!
//! Callers send the health status as a code (`2`), a label (`Patient`) or one
//! of a few well-known words. The value is matched case-insensitively against
//! the configured field's codes, then its labels, then the synonym table.

use super::choices::ChoiceMap;
use crate::adapters::redcap::RegistryProject;
use crate::domain::{BridgeError, FieldMetadata, Result};

/// Accepted words and the label each one stands for
pub const SYNONYMS: &[(&str, &str)] = &[
    ("healthy", "healthy"),
    ("patient", "patient"),
    ("survivor", "survivor"),
];

/// Resolve `value` to a stored code of `field`
///
/// `metadata` may hold the whole dictionary; only the entry named `field` is
/// used.
///
/// # Errors
///
/// - `FieldNotFound` when `field` is not in `metadata`
/// - `NoChoiceMatch` when nothing matches; the message carries the raw choice
///   definition
///
/// # Examples
///
/// ```
/// use redcap_bridge::core::resolve::resolve_health_code;
/// use redcap_bridge::domain::FieldMetadata;
///
/// let metadata = vec![FieldMetadata::new("health", "Health", "1, Healthy|2, Patient")];
/// assert_eq!(resolve_health_code(&metadata, "health", "patient").unwrap(), "2");
/// ```
pub fn resolve_health_code(
    metadata: &[FieldMetadata],
    field: &str,
    value: &str,
) -> Result<String> {
    let entry = metadata
        .iter()
        .find(|m| m.field_name == field)
        .ok_or_else(|| BridgeError::FieldNotFound {
            field: field.to_string(),
        })?;

    let choices = ChoiceMap::parse(&entry.select_choices_or_calculations);
    let needle = value.trim().to_lowercase();

    if let Some(code) = choices.code_for_code(&needle) {
        return Ok(code.to_string());
    }
    if let Some(code) = choices.code_for_label(&needle) {
        return Ok(code.to_string());
    }
    if let Some(code) = SYNONYMS
        .iter()
        .find(|(word, _)| *word == needle)
        .and_then(|(_, label)| choices.code_for_label(label))
    {
        return Ok(code.to_string());
    }

    Err(BridgeError::NoChoiceMatch {
        field: field.to_string(),
        value: value.to_string(),
        choices: entry.select_choices_or_calculations.clone(),
    })
}

/// Resolve a health status value against the project's dictionary
pub async fn resolve_health(
    project: &dyn RegistryProject,
    field: &str,
    value: &str,
) -> Result<String> {
    let metadata = project.export_metadata(&[]).await?;
    let code = resolve_health_code(&metadata, field, value)?;

    tracing::debug!(field = field, value = value, code = %code, "Resolved health code");

    Ok(code)
}
