//! Configuration schema types
//!
//! This module defines the configuration structure for the bridge. Every
//! section has defaults so the service can run from environment variables
//! alone.

use crate::config::{secret_string, SecretString};
use crate::domain::FieldName;
use serde::{Deserialize, Serialize};

/// Basic-auth password shipped as a default; refused in production
pub const DEFAULT_API_PASSWORD: &str = "changeme";

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main bridge configuration
///
/// This is the root configuration structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Registry connection
    #[serde(default)]
    pub redcap: RedcapConfig,

    /// Names of the project fields the bridge reads and writes
    #[serde(default)]
    pub fields: FieldsConfig,

    /// Downstream status forwarding
    #[serde(default)]
    pub forwarding: ForwardingConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.server.validate(&self.environment)?;
        self.redcap.validate(&self.environment)?;
        self.fields.validate()?;
        self.forwarding.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind
    #[serde(default = "default_port")]
    pub port: u16,

    /// Basic-auth username required on every route
    #[serde(default = "default_api_user")]
    pub username: String,

    /// Basic-auth password required on every route
    #[serde(default = "default_api_password")]
    pub password: SecretString,

    /// Origins allowed by CORS (credentials are allowed for these origins)
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Seconds to wait for in-flight requests on shutdown
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

impl ServerConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.port == 0 {
            return Err("server.port must be > 0".to_string());
        }

        if self.username.is_empty() {
            return Err("server.username cannot be empty".to_string());
        }

        if self.password.expose_secret().is_empty() {
            return Err("server.password cannot be empty".to_string());
        }

        if *environment == Environment::Production
            && self.password.expose_secret().as_ref() == DEFAULT_API_PASSWORD
        {
            return Err(
                "The default basic-auth password cannot be used in production environments. \
                Set server.password (or API_PASS / BRIDGE_SERVER_PASSWORD)."
                    .to_string(),
            );
        }

        for origin in &self.cors_origins {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(format!(
                    "Invalid CORS origin '{origin}': must start with http:// or https://"
                ));
            }
        }

        Ok(())
    }

    /// `host:port` string to bind the listener to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            username: default_api_user(),
            password: default_api_password(),
            cors_origins: default_cors_origins(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

/// How the registry HTTP client is reused across requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionPolicy {
    /// One client (and connection pool) for the lifetime of the process
    #[default]
    Shared,
    /// A fresh client for every inbound request
    PerRequest,
}

/// Retry configuration for transient registry failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (1 = no retry)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Registry (REDCap) connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedcapConfig {
    /// Base URL of the REDCap instance; `/api/` is appended when missing
    #[serde(default)]
    pub base_url: String,

    /// Project API token
    #[serde(default = "default_empty_secret")]
    pub api_token: SecretString,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// TLS certificate verification enabled
    ///
    /// Disabling verification is refused in production.
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Client reuse policy
    #[serde(default)]
    pub connection_policy: ConnectionPolicy,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl RedcapConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        use secrecy::ExposeSecret;

        if self.base_url.is_empty() {
            return Err("redcap.base_url cannot be empty".to_string());
        }

        let parsed = url::Url::parse(&self.base_url).map_err(|e| {
            format!(
                "redcap.base_url '{}' must be an http:// or https:// URL: {e}",
                self.base_url
            )
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err("redcap.base_url must start with http:// or https://".to_string());
        }

        if self.api_token.expose_secret().is_empty() {
            return Err("redcap.api_token cannot be empty".to_string());
        }

        if self.timeout_seconds == 0 {
            return Err("redcap.timeout_seconds must be > 0".to_string());
        }

        if self.retry.max_retries == 0 {
            return Err("redcap.retry.max_retries must be >= 1".to_string());
        }

        if *environment == Environment::Production && !self.tls_verify {
            return Err(
                "TLS certificate verification cannot be disabled in production environments."
                    .to_string(),
            );
        }

        Ok(())
    }
}

impl Default for RedcapConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: default_empty_secret(),
            timeout_seconds: default_timeout_seconds(),
            tls_verify: true,
            connection_policy: ConnectionPolicy::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Project field names
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FieldsConfig {
    /// Categorical field holding the participant's health status
    #[serde(default)]
    pub health_field: Option<String>,

    /// Field holding the randomization allocation
    #[serde(default)]
    pub alloc_field: Option<String>,
}

impl FieldsConfig {
    fn validate(&self) -> Result<(), String> {
        for (key, value) in [
            ("fields.health_field", &self.health_field),
            ("fields.alloc_field", &self.alloc_field),
        ] {
            if let Some(name) = value {
                FieldName::new(name.as_str()).map_err(|e| format!("{key}: {e}"))?;
            }
        }
        Ok(())
    }

    /// Health field, or a configuration error naming the missing setting
    pub fn require_health_field(&self) -> crate::domain::Result<&str> {
        self.health_field.as_deref().ok_or_else(|| {
            crate::domain::BridgeError::Configuration(
                "fields.health_field (HEALTH_FIELD) is not set".to_string(),
            )
        })
    }

    /// Allocation field, or a configuration error naming the missing setting
    pub fn require_alloc_field(&self) -> crate::domain::Result<&str> {
        self.alloc_field.as_deref().ok_or_else(|| {
            crate::domain::BridgeError::Configuration(
                "fields.alloc_field (ALLOC_FIELD) is not set".to_string(),
            )
        })
    }
}

/// Downstream status forwarding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingConfig {
    /// Send requests downstream (otherwise notifications are only logged)
    #[serde(default)]
    pub enabled: bool,

    /// Base URL of the downstream service
    #[serde(default)]
    pub url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_forward_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Instrument whose completion triggers forwarding for healthy participants
    #[serde(default = "default_healthy_instrument")]
    pub healthy_instrument: String,

    /// Instrument whose completion triggers forwarding for everyone else
    #[serde(default = "default_patient_instrument")]
    pub patient_instrument: String,
}

impl ForwardingConfig {
    fn validate(&self) -> Result<(), String> {
        if let Some(url) = &self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("forwarding.url must start with http:// or https://".to_string());
            }
        }
        if self.timeout_seconds == 0 {
            return Err("forwarding.timeout_seconds must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for ForwardingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            url: None,
            timeout_seconds: default_forward_timeout_seconds(),
            healthy_instrument: default_healthy_instrument(),
            patient_instrument: default_patient_instrument(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }

        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".to_string());
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8001
}

fn default_api_user() -> String {
    "admin".to_string()
}

fn default_api_password() -> SecretString {
    secret_string(DEFAULT_API_PASSWORD.to_string())
}

fn default_empty_secret() -> SecretString {
    secret_string(String::new())
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:8001".to_string()]
}

fn default_shutdown_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_forward_timeout_seconds() -> u64 {
    15
}

fn default_healthy_instrument() -> String {
    "functionality_appreciation_scale_fas".to_string()
}

fn default_patient_instrument() -> String {
    "edmonton_symptom_assessment_system_revised_esasr".to_string()
}

fn default_local_path() -> String {
    "/var/log/redcap-bridge".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
