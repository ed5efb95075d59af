//! Domain error types
//!
//! This module defines the error hierarchy for the bridge. Resolver errors carry
//! the offending input and the candidates that were considered so an operator
//! can diagnose a failed lookup from the message alone. Third-party client
//! errors are converted to strings at the adapter boundary.

use thiserror::Error;

/// Main bridge error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Country code is not in the site table
    #[error("Unknown prefix '{prefix}'")]
    UnknownPrefix { prefix: String },

    /// No data access group matched the site key under any strategy
    #[error("No matching DAG for site '{site}'. Exported DAGs: {groups}")]
    NoMatchingGroup { site: String, groups: String },

    /// Configured field is absent from the registry schema
    #[error("Field '{field}' not found. Make sure the Variable Name is exactly '{field}'.")]
    FieldNotFound { field: String },

    /// Value matches no known code, label or synonym
    #[error("Value '{value}' does not match any choice for '{field}'. Choices are: {choices}")]
    NoChoiceMatch {
        field: String,
        value: String,
        choices: String,
    },

    /// Registry call failed or timed out
    #[error("Registry unavailable: {0}")]
    Upstream(#[from] RegistryError),

    /// Basic-auth credentials missing or wrong
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Malformed request input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Downstream forwarding failed
    #[error("Forwarding error: {0}")]
    Forwarding(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl BridgeError {
    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::Configuration(_) => "configuration",
            BridgeError::UnknownPrefix { .. } => "unknown_prefix",
            BridgeError::NoMatchingGroup { .. } => "no_matching_group",
            BridgeError::FieldNotFound { .. } => "field_not_found",
            BridgeError::NoChoiceMatch { .. } => "no_choice_match",
            BridgeError::Upstream(_) => "upstream_unavailable",
            BridgeError::AuthenticationFailed(_) => "authentication_failed",
            BridgeError::Validation(_) => "validation",
            BridgeError::Forwarding(_) => "forwarding",
            BridgeError::Serialization(_) => "serialization",
            BridgeError::Io(_) => "io",
        }
    }
}

/// Registry-specific errors
///
/// Errors that occur when talking to the REDCap API. These errors don't
/// expose the HTTP client's types.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Failed to connect to the registry
    #[error("Failed to connect to registry: {0}")]
    ConnectionFailed(String),

    /// Request timed out
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// API token rejected
    #[error("Registry rejected the API token: {0}")]
    Unauthorized(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid response from registry: {0}")]
    InvalidResponse(String),
}

impl RegistryError {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RegistryError::ConnectionFailed(_)
                | RegistryError::Timeout(_)
                | RegistryError::ServerError { .. }
        )
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for BridgeError {
    fn from(err: std::io::Error) -> Self {
        BridgeError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for BridgeError {
    fn from(err: toml::de::Error) -> Self {
        BridgeError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_display() {
        let err = BridgeError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_unknown_prefix_message_names_prefix() {
        let err = BridgeError::UnknownPrefix {
            prefix: "XX".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown prefix 'XX'");
        assert_eq!(err.kind(), "unknown_prefix");
    }

    #[test]
    fn test_no_choice_match_message_includes_choices() {
        let err = BridgeError::NoChoiceMatch {
            field: "health_status".to_string(),
            value: "unwell".to_string(),
            choices: "1, Healthy|2, Patient".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'unwell'"));
        assert!(msg.contains("1, Healthy|2, Patient"));
    }

    #[test]
    fn test_registry_error_conversion() {
        let registry_err = RegistryError::ConnectionFailed("Network error".to_string());
        let err: BridgeError = registry_err.into();
        assert!(matches!(err, BridgeError::Upstream(_)));
        assert_eq!(err.kind(), "upstream_unavailable");
    }

    #[test]
    fn test_registry_error_transient() {
        assert!(RegistryError::Timeout("30s".to_string()).is_transient());
        assert!(RegistryError::ServerError {
            status: 503,
            message: "busy".to_string()
        }
        .is_transient());
        assert!(!RegistryError::Unauthorized("bad token".to_string()).is_transient());
        assert!(!RegistryError::ClientError {
            status: 400,
            message: "bad".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: BridgeError = io_err.into();
        assert!(matches!(err, BridgeError::Io(_)));
    }

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: BridgeError = json_err.into();
        assert!(matches!(err, BridgeError::Serialization(_)));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_err = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let err: BridgeError = toml_err.into();
        assert!(matches!(err, BridgeError::Configuration(_)));
        assert!(err.to_string().contains("TOML parse error"));
    }
}
