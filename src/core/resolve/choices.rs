//! Categorical choice lists
//!
//! REDCap stores the options of radio, dropdown and checkbox fields as one
//! string: `1, Healthy | 2, Patient | 3, Survivor`. Only the first comma of an
//! entry separates code from label, so labels may contain commas. Entries
//! without a comma are ignored.

use crate::adapters::redcap::RegistryProject;
use crate::domain::{FieldMetadata, Result};
use serde_json::{Map, Value};

/// Parsed code/label pairs of one field
///
/// When a code (or a label) appears more than once the last occurrence wins.
///
/// # Examples
///
/// ```
/// use redcap_bridge::core::resolve::ChoiceMap;
///
/// let choices = ChoiceMap::parse("1, Healthy | 2, Patient, stage II");
/// assert_eq!(choices.label_for("2"), Some("Patient, stage II"));
/// assert_eq!(choices.code_for_label("HEALTHY"), Some("1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceMap {
    /// Every well-formed entry, in definition order
    entries: Vec<(String, String)>,
}

impl ChoiceMap {
    /// Parse a `code, label | code, label` definition
    pub fn parse(choices: &str) -> Self {
        let entries = choices
            .split('|')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .filter_map(|part| part.split_once(','))
            .map(|(code, label)| (code.trim().to_string(), label.trim().to_string()))
            .collect();

        Self { entries }
    }

    /// Label of an exact code
    pub fn label_for(&self, code: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(c, _)| c == code)
            .map(|(_, label)| label.as_str())
    }

    /// Stored code whose case-insensitive form equals `value`
    pub fn code_for_code(&self, value: &str) -> Option<&str> {
        let needle = value.trim().to_lowercase();
        self.entries
            .iter()
            .rev()
            .find(|(code, _)| code.to_lowercase() == needle)
            .map(|(code, _)| code.as_str())
    }

    /// Stored code whose label equals `value`, ignoring case
    pub fn code_for_label(&self, value: &str) -> Option<&str> {
        let needle = value.trim().to_lowercase();
        self.entries
            .iter()
            .rev()
            .find(|(_, label)| label.to_lowercase() == needle)
            .map(|(code, _)| code.as_str())
    }

    /// Distinct `(code, label)` pairs in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        let mut seen: Vec<&str> = Vec::new();
        self.entries
            .iter()
            .filter_map(move |(code, _)| {
                if seen.contains(&code.as_str()) {
                    None
                } else {
                    seen.push(code.as_str());
                    Some(code.as_str())
                }
            })
            .filter_map(move |code| self.label_for(code).map(|label| (code, label)))
    }

    /// Number of distinct codes
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether the definition had no usable entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `{code: label}` object
    pub fn to_json(&self) -> Map<String, Value> {
        self.iter()
            .map(|(code, label)| (code.to_string(), Value::String(label.to_string())))
            .collect()
    }
}

/// Choice map of `field` from a data dictionary
///
/// An absent field yields an empty map.
pub fn choice_map(metadata: &[FieldMetadata], field: &str) -> ChoiceMap {
    metadata
        .iter()
        .find(|entry| entry.field_name == field)
        .map(|entry| ChoiceMap::parse(&entry.select_choices_or_calculations))
        .unwrap_or_default()
}

/// Fetch the choice map of `field` from the registry
///
/// The whole dictionary is requested: REDCap rejects a `fields` filter that
/// names an unknown variable, while an absent field must give an empty map.
pub async fn fetch_choice_map(project: &dyn RegistryProject, field: &str) -> Result<ChoiceMap> {
    let metadata = project.export_metadata(&[]).await?;
    Ok(choice_map(&metadata, field))
}
