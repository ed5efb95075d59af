//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Settings are resolved in this order, later sources winning:
//! 1. Built-in defaults
//! 2. The TOML file (with `${VAR}` substitution)
//! 3. Deployment environment names (`BASE_URL`, `API_TOKEN`, `API_USER`, ...)
//! 4. `BRIDGE_<SECTION>_<KEY>` overrides

use super::schema::{BridgeConfig, ConnectionPolicy, Environment};
use super::secret::secret_string;
use crate::domain::errors::BridgeError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into BridgeConfig
/// 4. Applies environment variable overrides
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a referenced
/// environment variable is not set, or validation fails.
///
/// # Examples
///
/// ```no_run
/// use redcap_bridge::config::loader::load_config;
///
/// let config = load_config("redcap-bridge.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<BridgeConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(BridgeError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        BridgeError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let config = parse_config(&contents)?;
    finish(config)
}

/// Loads configuration from a TOML file when it exists, from defaults otherwise
///
/// Environment overrides and validation are applied in both cases, so a
/// container can be configured through environment variables alone.
pub fn load_config_or_defaults(path: impl AsRef<Path>) -> Result<BridgeConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(
        path = %path.display(),
        "Configuration file not found, using defaults and environment"
    );
    finish(BridgeConfig::default())
}

/// Parses TOML text (after `${VAR}` substitution) without overrides or validation
pub fn parse_config(contents: &str) -> Result<BridgeConfig> {
    let contents = substitute_env_vars(contents)?;
    toml::from_str(&contents)
        .map_err(|e| BridgeError::Configuration(format!("Failed to parse TOML: {e}")))
}

fn finish(mut config: BridgeConfig) -> Result<BridgeConfig> {
    apply_overrides(&mut config, |key| std::env::var(key).ok());

    config.validate().map_err(|e| {
        BridgeError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("environment variable pattern is valid")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut result = String::new();
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(BridgeError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Applies environment overrides read through `lookup`
///
/// Deployment names are applied first so the namespaced `BRIDGE_*` variables
/// win when both are set.
pub(crate) fn apply_overrides<F>(config: &mut BridgeConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    // Deployment environment names
    if let Some(val) = lookup("BASE_URL") {
        config.redcap.base_url = val;
    }
    if let Some(val) = lookup("API_TOKEN") {
        config.redcap.api_token = secret_string(val);
    }
    if let Some(val) = lookup("API_USER") {
        config.server.username = val;
    }
    if let Some(val) = lookup("API_PASS") {
        config.server.password = secret_string(val);
    }
    if let Some(val) = lookup("HEALTH_FIELD") {
        config.fields.health_field = Some(val);
    }
    if let Some(val) = lookup("ALLOC_FIELD") {
        config.fields.alloc_field = Some(val);
    }
    if let Some(val) = lookup("FORWARD_URL") {
        config.forwarding.url = Some(val);
    }
    if let Some(val) = lookup("FORWARD_ENABLED") {
        config.forwarding.enabled = parse_bool(&val).unwrap_or(false);
    }

    // Application overrides
    if let Some(val) = lookup("BRIDGE_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Some(val) = lookup("BRIDGE_ENVIRONMENT") {
        match val.to_lowercase().as_str() {
            "development" => config.environment = Environment::Development,
            "staging" => config.environment = Environment::Staging,
            "production" => config.environment = Environment::Production,
            other => tracing::warn!(value = %other, "Ignoring unknown environment"),
        }
    }

    // Server overrides
    if let Some(val) = lookup("BRIDGE_SERVER_HOST") {
        config.server.host = val;
    }
    if let Some(port) = lookup("BRIDGE_SERVER_PORT").and_then(|v| v.parse().ok()) {
        config.server.port = port;
    }
    if let Some(val) = lookup("BRIDGE_SERVER_USERNAME") {
        config.server.username = val;
    }
    if let Some(val) = lookup("BRIDGE_SERVER_PASSWORD") {
        config.server.password = secret_string(val);
    }
    if let Some(val) = lookup("BRIDGE_SERVER_CORS_ORIGINS") {
        config.server.cors_origins = val
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
    }

    // Registry overrides
    if let Some(val) = lookup("BRIDGE_REDCAP_BASE_URL") {
        config.redcap.base_url = val;
    }
    if let Some(val) = lookup("BRIDGE_REDCAP_API_TOKEN") {
        config.redcap.api_token = secret_string(val);
    }
    if let Some(timeout) = lookup("BRIDGE_REDCAP_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
        config.redcap.timeout_seconds = timeout;
    }
    if let Some(verify) = lookup("BRIDGE_REDCAP_TLS_VERIFY").and_then(|v| parse_bool(&v)) {
        config.redcap.tls_verify = verify;
    }
    if let Some(val) = lookup("BRIDGE_REDCAP_CONNECTION_POLICY") {
        match val.to_lowercase().as_str() {
            "shared" => config.redcap.connection_policy = ConnectionPolicy::Shared,
            "per_request" => config.redcap.connection_policy = ConnectionPolicy::PerRequest,
            other => tracing::warn!(value = %other, "Ignoring unknown connection policy"),
        }
    }

    // Field overrides
    if let Some(val) = lookup("BRIDGE_FIELDS_HEALTH_FIELD") {
        config.fields.health_field = Some(val);
    }
    if let Some(val) = lookup("BRIDGE_FIELDS_ALLOC_FIELD") {
        config.fields.alloc_field = Some(val);
    }

    // Forwarding overrides
    if let Some(enabled) = lookup("BRIDGE_FORWARDING_ENABLED").and_then(|v| parse_bool(&v)) {
        config.forwarding.enabled = enabled;
    }
    if let Some(val) = lookup("BRIDGE_FORWARDING_URL") {
        config.forwarding.url = Some(val);
    }

    // Logging overrides
    if let Some(enabled) = lookup("BRIDGE_LOGGING_LOCAL_ENABLED").and_then(|v| parse_bool(&v)) {
        config.logging.local_enabled = enabled;
    }
    if let Some(val) = lookup("BRIDGE_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_substitute_env_vars() {
        std::env::set_var("BRIDGE_LOADER_TEST_TOKEN", "abc123");
        let input = "api_token = \"${BRIDGE_LOADER_TEST_TOKEN}\"";
        let result = substitute_env_vars(input).unwrap();
        assert_eq!(result, "api_token = \"abc123\"\n");
        std::env::remove_var("BRIDGE_LOADER_TEST_TOKEN");
    }

    #[test]
    fn test_substitute_env_vars_missing() {
        std::env::remove_var("BRIDGE_LOADER_MISSING_VAR");
        let input = "api_token = \"${BRIDGE_LOADER_MISSING_VAR}\"";
        let err = substitute_env_vars(input).unwrap_err();
        assert!(err.to_string().contains("BRIDGE_LOADER_MISSING_VAR"));
    }

    #[test]
    fn test_substitute_skips_comments() {
        let input = "# api_token = \"${BRIDGE_LOADER_COMMENTED_VAR}\"";
        assert!(substitute_env_vars(input).is_ok());
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("nonexistent-bridge.toml");
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_config_sections() {
        let config = parse_config(
            r#"
environment = "staging"

[server]
port = 9994
username = "meliora"
password = "s3cret"
cors_origins = ["http://localhost:8001", "http://195.251.31.231:9994"]

[redcap]
base_url = "https://redcap.example.org"
api_token = "ABCDEF"
connection_policy = "per_request"

[fields]
health_field = "health_status"
alloc_field = "randomization_group"

[forwarding]
enabled = true
url = "https://downstream.example.org/api"
"#,
        )
        .unwrap();

        assert_eq!(config.environment, Environment::Staging);
        assert_eq!(config.server.port, 9994);
        assert_eq!(config.server.username, "meliora");
        assert_eq!(config.server.password.expose_secret().as_ref(), "s3cret");
        assert_eq!(config.server.cors_origins.len(), 2);
        assert_eq!(config.redcap.connection_policy, ConnectionPolicy::PerRequest);
        assert_eq!(config.fields.health_field.as_deref(), Some("health_status"));
        assert!(config.forwarding.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deployment_names_applied() {
        let mut config = BridgeConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("BASE_URL", "https://redcap.example.org"),
                ("API_TOKEN", "TOKEN"),
                ("API_USER", "svc"),
                ("API_PASS", "pw"),
                ("HEALTH_FIELD", "health_status"),
                ("ALLOC_FIELD", "allocation"),
                ("FORWARD_URL", "https://downstream.example.org"),
                ("FORWARD_ENABLED", "1"),
            ]),
        );

        assert_eq!(config.redcap.base_url, "https://redcap.example.org");
        assert_eq!(config.redcap.api_token.expose_secret().as_ref(), "TOKEN");
        assert_eq!(config.server.username, "svc");
        assert_eq!(config.server.password.expose_secret().as_ref(), "pw");
        assert_eq!(config.fields.health_field.as_deref(), Some("health_status"));
        assert_eq!(config.fields.alloc_field.as_deref(), Some("allocation"));
        assert_eq!(
            config.forwarding.url.as_deref(),
            Some("https://downstream.example.org")
        );
        assert!(config.forwarding.enabled);
    }

    #[test]
    fn test_forward_enabled_only_for_truthy_values() {
        let mut config = BridgeConfig::default();
        apply_overrides(&mut config, lookup_from(&[("FORWARD_ENABLED", "0")]));
        assert!(!config.forwarding.enabled);

        apply_overrides(&mut config, lookup_from(&[("FORWARD_ENABLED", "maybe")]));
        assert!(!config.forwarding.enabled);
    }

    #[test]
    fn test_namespaced_overrides_win() {
        let mut config = BridgeConfig::default();
        apply_overrides(
            &mut config,
            lookup_from(&[
                ("BASE_URL", "https://legacy.example.org"),
                ("BRIDGE_REDCAP_BASE_URL", "https://redcap.example.org"),
                ("BRIDGE_SERVER_PORT", "9994"),
                ("BRIDGE_ENVIRONMENT", "Production"),
                ("BRIDGE_REDCAP_CONNECTION_POLICY", "per_request"),
                ("BRIDGE_SERVER_CORS_ORIGINS", "http://a.example, http://b.example"),
            ]),
        );

        assert_eq!(config.redcap.base_url, "https://redcap.example.org");
        assert_eq!(config.server.port, 9994);
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.redcap.connection_policy, ConnectionPolicy::PerRequest);
        assert_eq!(
            config.server.cors_origins,
            vec!["http://a.example", "http://b.example"]
        );
    }

    #[test]
    fn test_invalid_numeric_override_ignored() {
        let mut config = BridgeConfig::default();
        apply_overrides(&mut config, lookup_from(&[("BRIDGE_SERVER_PORT", "eighty")]));
        assert_eq!(config.server.port, 8001);
    }

    #[test]
    fn test_load_config_from_file() {
        let toml_content = r#"
[redcap]
base_url = "https://redcap.example.org"
api_token = "ABCDEF"
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert!(config.redcap.base_url.starts_with("https://"));
    }
}
