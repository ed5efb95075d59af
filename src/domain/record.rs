//! Record rows and the shapes derived from them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved key naming the repeating instrument of a row
pub const REPEAT_INSTRUMENT_KEY: &str = "redcap_repeat_instrument";

/// Reserved key holding the repeat instance number of a row
pub const REPEAT_INSTANCE_KEY: &str = "redcap_repeat_instance";

/// Key holding the unique event name in longitudinal projects
pub const EVENT_NAME_KEY: &str = "redcap_event_name";

/// Key holding the data access group of a record on import
pub const DATA_ACCESS_GROUP_KEY: &str = "redcap_data_access_group";

/// One exported (or to-be-imported) row of a record
///
/// A record with repeating instruments is exported as several rows, one for
/// the main instrument set and one per repeat instance.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordRow(Map<String, Value>);

impl RecordRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Set a field, returning the row for chaining
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Set a field
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(field.into(), value.into());
    }

    /// Value of a field, if present
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Iterate over `(field, value)` pairs in export order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Name of the repeating instrument, `None` for the main instrument set
    ///
    /// The registry omits the key for projects without repeating instruments
    /// and sends an empty string for main rows of projects that have them.
    pub fn repeat_instrument(&self) -> Option<&str> {
        match self.0.get(REPEAT_INSTRUMENT_KEY) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.as_str()),
            _ => None,
        }
    }

    /// Repeat instance number, `Value::Null` when the row is not repeating
    ///
    /// Numeric strings are converted to numbers so that `"2"` and `2` are
    /// reported the same way.
    pub fn repeat_instance(&self) -> Value {
        match self.0.get(REPEAT_INSTANCE_KEY) {
            None | Some(Value::Null) => Value::Null,
            Some(Value::String(s)) if s.trim().is_empty() => Value::Null,
            Some(Value::String(s)) => match s.trim().parse::<u64>() {
                Ok(n) => Value::from(n),
                Err(_) => Value::String(s.clone()),
            },
            Some(other) => other.clone(),
        }
    }

    /// Unique event name, for longitudinal projects
    pub fn event_name(&self) -> Option<&str> {
        self.0
            .get(EVENT_NAME_KEY)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Number of fields in the row
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the row has no fields
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RecordRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Whether a value counts as "not filled in"
///
/// Only the empty string and null qualify; `0` and `false` are real answers.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Allocation (randomization) outcome of a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Stored code
    pub raw: String,

    /// Label of the code, when the choice list has one
    pub label: Option<String>,

    /// Event the allocation was recorded in
    pub event: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_repeat_instrument_absent_or_empty() {
        let row = RecordRow::new().with("record_id", "1");
        assert_eq!(row.repeat_instrument(), None);

        let row = RecordRow::new().with(REPEAT_INSTRUMENT_KEY, "");
        assert_eq!(row.repeat_instrument(), None);

        let row = RecordRow::new().with(REPEAT_INSTRUMENT_KEY, "daily_diary");
        assert_eq!(row.repeat_instrument(), Some("daily_diary"));
    }

    #[test]
    fn test_repeat_instance_normalization() {
        assert_eq!(RecordRow::new().repeat_instance(), Value::Null);
        assert_eq!(
            RecordRow::new().with(REPEAT_INSTANCE_KEY, "").repeat_instance(),
            Value::Null
        );
        assert_eq!(
            RecordRow::new().with(REPEAT_INSTANCE_KEY, "2").repeat_instance(),
            json!(2)
        );
        assert_eq!(
            RecordRow::new().with(REPEAT_INSTANCE_KEY, 3).repeat_instance(),
            json!(3)
        );
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(&json!("")));
        assert!(is_blank(&Value::Null));
        assert!(!is_blank(&json!(0)));
        assert!(!is_blank(&json!(false)));
        assert!(!is_blank(&json!("x")));
    }

    #[test]
    fn test_row_preserves_order() {
        let row: RecordRow =
            serde_json::from_str(r#"{"record_id": "1", "zeta": "z", "alpha": "a"}"#).unwrap();
        let keys: Vec<&String> = row.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["record_id", "zeta", "alpha"]);
    }
}
