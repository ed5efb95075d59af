//! Integration tests for configuration loading and validation
//!
//! Tests that touch process environment variables hold `ENV_MUTEX`.

use redcap_bridge::config::{load_config, load_config_or_defaults, ConnectionPolicy, Environment};
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

const ENV_VARS: &[&str] = &[
    "BASE_URL",
    "API_TOKEN",
    "API_USER",
    "API_PASS",
    "HEALTH_FIELD",
    "ALLOC_FIELD",
    "FORWARD_URL",
    "FORWARD_ENABLED",
    "BRIDGE_SERVER_PORT",
    "BRIDGE_ENVIRONMENT",
    "BRIDGE_REDCAP_TLS_VERIFY",
    "BRIDGE_TEST_TOKEN",
];

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
environment = "staging"

[application]
log_level = "debug"

[server]
host = "127.0.0.1"
port = 9994
username = "meliora"
password = "s3cret"
cors_origins = ["http://localhost:8001"]
shutdown_timeout_secs = 5

[redcap]
base_url = "https://redcap.example.org"
api_token = "ABCDEF"
timeout_seconds = 45
connection_policy = "per_request"

[redcap.retry]
max_retries = 5
initial_delay_ms = 200

[fields]
health_field = "health_status"
alloc_field = "randomization_group"

[forwarding]
enabled = true
url = "https://downstream.example.org"
timeout_seconds = 3

[logging]
local_enabled = false
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();

    assert_eq!(config.environment, Environment::Staging);
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.server.bind_address(), "127.0.0.1:9994");
    assert_eq!(config.server.shutdown_timeout_secs, 5);
    assert_eq!(config.redcap.timeout_seconds, 45);
    assert_eq!(config.redcap.connection_policy, ConnectionPolicy::PerRequest);
    assert_eq!(config.redcap.retry.max_retries, 5);
    assert_eq!(config.redcap.retry.initial_delay_ms, 200);
    assert_eq!(config.fields.alloc_field.as_deref(), Some("randomization_group"));
    assert!(config.forwarding.enabled);
    assert_eq!(config.forwarding.timeout_seconds, 3);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_env_substitution_in_file() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("BRIDGE_TEST_TOKEN", "from-env");

    let file = write_config(
        r#"
[redcap]
base_url = "https://redcap.example.org"
api_token = "${BRIDGE_TEST_TOKEN}"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.redcap.api_token.expose_secret().as_ref(), "from-env");

    cleanup_env_vars();
}

#[test]
fn test_missing_substitution_variable() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[redcap]
base_url = "https://redcap.example.org"
api_token = "${BRIDGE_TEST_TOKEN}"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("BRIDGE_TEST_TOKEN"));
}

#[test]
fn test_deployment_environment_without_file() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("BASE_URL", "https://redcap.example.org");
    std::env::set_var("API_TOKEN", "TOKEN");
    std::env::set_var("API_USER", "svc");
    std::env::set_var("API_PASS", "pw");
    std::env::set_var("HEALTH_FIELD", "health_status");
    std::env::set_var("FORWARD_ENABLED", "true");
    std::env::set_var("FORWARD_URL", "https://downstream.example.org");

    let config = load_config_or_defaults("/nonexistent/redcap-bridge.toml").unwrap();

    assert_eq!(config.redcap.base_url, "https://redcap.example.org");
    assert_eq!(config.server.username, "svc");
    assert_eq!(config.server.password.expose_secret().as_ref(), "pw");
    assert_eq!(config.fields.health_field.as_deref(), Some("health_status"));
    assert!(config.fields.alloc_field.is_none());
    assert!(config.forwarding.enabled);

    cleanup_env_vars();
}

#[test]
fn test_environment_overrides_file() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();
    std::env::set_var("BRIDGE_SERVER_PORT", "9100");
    std::env::set_var("API_TOKEN", "env-token");

    let file = write_config(
        r#"
[server]
port = 8001

[redcap]
base_url = "https://redcap.example.org"
api_token = "file-token"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.server.port, 9100);
    assert_eq!(config.redcap.api_token.expose_secret().as_ref(), "env-token");

    cleanup_env_vars();
}

#[test]
fn test_production_refuses_default_password() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
environment = "production"

[redcap]
base_url = "https://redcap.example.org"
api_token = "ABCDEF"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("default basic-auth password"));
}

#[test]
fn test_production_refuses_disabled_tls_verification() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
environment = "production"

[server]
password = "a-real-password"

[redcap]
base_url = "https://redcap.example.org"
api_token = "ABCDEF"
tls_verify = false
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TLS"));
}

#[test]
fn test_missing_registry_url_is_invalid() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config("[fields]\nhealth_field = \"health_status\"\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("redcap.base_url"));
}

#[test]
fn test_invalid_field_name_rejected() {
    let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
    cleanup_env_vars();

    let file = write_config(
        r#"
[redcap]
base_url = "https://redcap.example.org"
api_token = "ABCDEF"

[fields]
health_field = "Health Status"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("fields.health_field"));
}
