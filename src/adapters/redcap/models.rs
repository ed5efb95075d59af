//! REDCap API request and response models

use serde::{Deserialize, Serialize};

/// Whether values (or headers) are exported as stored codes or as labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RawOrLabel {
    /// Stored codes
    #[default]
    Raw,
    /// Human-readable labels
    Label,
}

impl RawOrLabel {
    /// API parameter value
    pub fn as_str(&self) -> &'static str {
        match self {
            RawOrLabel::Raw => "raw",
            RawOrLabel::Label => "label",
        }
    }
}

/// Parameters of a record export
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordExportRequest {
    /// Record identifiers to export (empty = all records)
    pub records: Vec<String>,

    /// Fields to export (empty = all fields)
    pub fields: Vec<String>,

    /// Value rendering
    pub raw_or_label: RawOrLabel,

    /// Header rendering
    pub raw_or_label_headers: RawOrLabel,
}

impl RecordExportRequest {
    /// Export every field of a single record
    pub fn for_record(record_id: impl Into<String>) -> Self {
        Self {
            records: vec![record_id.into()],
            ..Default::default()
        }
    }

    /// Restrict the export to the given fields
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Render values and headers as labels
    pub fn labelled(mut self) -> Self {
        self.raw_or_label = RawOrLabel::Label;
        self.raw_or_label_headers = RawOrLabel::Label;
        self
    }
}

/// How imported blank values treat existing data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OverwriteBehavior {
    /// Blank values are ignored
    #[default]
    Normal,
    /// Blank values overwrite existing data
    Overwrite,
}

impl OverwriteBehavior {
    /// API parameter value
    pub fn as_str(&self) -> &'static str {
        match self {
            OverwriteBehavior::Normal => "normal",
            OverwriteBehavior::Overwrite => "overwrite",
        }
    }
}

/// What an import call returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReturnContent {
    /// Number of records imported
    #[default]
    Count,
    /// Identifiers of the imported records
    Ids,
    /// `new_id,old_id` pairs when auto-numbering
    AutoIds,
}

impl ReturnContent {
    /// API parameter value
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnContent::Count => "count",
            ReturnContent::Ids => "ids",
            ReturnContent::AutoIds => "auto_ids",
        }
    }
}

/// Date format of imported date values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DateFormat {
    /// Year-month-day
    #[default]
    Ymd,
    /// Month-day-year
    Mdy,
    /// Day-month-year
    Dmy,
}

impl DateFormat {
    /// API parameter value
    pub fn as_str(&self) -> &'static str {
        match self {
            DateFormat::Ymd => "YMD",
            DateFormat::Mdy => "MDY",
            DateFormat::Dmy => "DMY",
        }
    }
}

/// Options of a record import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImportOptions {
    /// Blank value handling
    pub overwrite: OverwriteBehavior,
    /// Response shape
    pub return_content: ReturnContent,
    /// Date format of the payload
    pub date_format: DateFormat,
}

/// Result of a record import
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImportResult {
    /// Imported record identifiers (`ids` / `auto_ids`)
    Ids(Vec<String>),
    /// Number of imported records (`count`)
    Count {
        /// Imported record count
        count: u64,
    },
}

impl ImportResult {
    /// Number of records the registry reported as imported
    pub fn len(&self) -> usize {
        match self {
            ImportResult::Ids(ids) => ids.len(),
            ImportResult::Count { count } => *count as usize,
        }
    }

    /// Whether nothing was imported
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
