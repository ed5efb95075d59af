//! Domain identifier types with validation
//!
//! Newtype wrappers for registry identifiers. Each type rejects blank input so
//! that an empty query parameter never reaches the registry as a wildcard
//! export.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Registry record identifier
///
/// In this deployment the record identifier doubles as the user identifier
/// (e.g. `EL0042`), so the same type is used for both.
///
/// # Examples
///
/// ```
/// use redcap_bridge::domain::ids::RecordId;
/// use std::str::FromStr;
///
/// let record_id = RecordId::from_str("EL0042").unwrap();
/// assert_eq!(record_id.as_str(), "EL0042");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new RecordId, trimming surrounding whitespace
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err("Record ID cannot be empty".to_string());
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Returns the record ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Registry field (variable) name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldName(String);

impl FieldName {
    /// Creates a new FieldName
    ///
    /// REDCap variable names are lower-case letters, digits and underscores;
    /// anything else is rejected so a typo in configuration fails at start-up.
    pub fn new(name: impl Into<String>) -> Result<Self, String> {
        let name = name.into();
        if name.is_empty() {
            return Err("Field name cannot be empty".to_string());
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(format!(
                "Invalid field name '{name}': only lower-case letters, digits and '_' are allowed"
            ));
        }
        Ok(Self(name))
    }

    /// Returns the field name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FieldName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
