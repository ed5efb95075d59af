//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "redcap-bridge.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing REDCap Bridge configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Create a .env file with your credentials:");
                println!("     - Set API_TOKEN to the REDCap project API token");
                println!("     - Set API_USER and API_PASS for basic authentication");
                println!("  3. Validate configuration: redcap-bridge validate-config");
                println!("  4. Start the bridge: redcap-bridge serve");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {}", e);
                Ok(5)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# REDCap Bridge Configuration File

environment = "development"

[application]
log_level = "info"

[server]
host = "0.0.0.0"
port = 8001
username = "${API_USER}"
password = "${API_PASS}"
cors_origins = ["http://localhost:3000"]

[redcap]
base_url = "https://redcap.example.org"
api_token = "${API_TOKEN}"

[fields]
health_field = "health_status"
alloc_field = "randomization_group"

[forwarding]
enabled = false

[logging]
local_enabled = false
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# REDCap Bridge Configuration File
#
# Every value has a default, and the deployment environment names
# (BASE_URL, API_TOKEN, API_USER, API_PASS, HEALTH_FIELD, ALLOC_FIELD,
# FORWARD_URL, FORWARD_ENABLED) override the file. BRIDGE_<SECTION>_<KEY>
# variables override both.

# ============================================================================
# Environment
# ============================================================================
# development | staging | production
# Production refuses the default basic-auth password and tls_verify = false.
environment = "development"

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# HTTP Server
# ============================================================================
[server]
host = "0.0.0.0"
port = 8001

# Basic-auth credentials required on every route
username = "${API_USER}"
password = "${API_PASS}"

# Origins allowed to call the bridge from a browser (credentials allowed)
cors_origins = [
    "http://localhost:3000",
    "https://app.example.org",
]

# Seconds to wait for in-flight requests on shutdown
shutdown_timeout_secs = 30

# ============================================================================
# REDCap Project
# ============================================================================
[redcap]
# Base URL of the REDCap installation; "/api/" is appended when missing
base_url = "https://redcap.example.org"

# Project API token
api_token = "${API_TOKEN}"

# Request timeout in seconds
timeout_seconds = 30

# TLS certificate verification
tls_verify = true

# shared: one connection pool for the process
# per_request: a fresh client for every inbound request
connection_policy = "shared"

# Retries of transient registry failures (timeouts, 5xx)
[redcap.retry]
max_retries = 3
initial_delay_ms = 1000
max_delay_ms = 30000
backoff_multiplier = 2.0

# ============================================================================
# Project Fields
# ============================================================================
[fields]
# Categorical field holding the participant's health status
health_field = "health_status"

# Field holding the randomization allocation
alloc_field = "randomization_group"

# ============================================================================
# Completion Forwarding
# ============================================================================
[forwarding]
# When false, completion notices are only logged
enabled = false

# Downstream service; GET {url}/users/{userId}/status/today
# url = "${FORWARD_URL}"

timeout_seconds = 10

# Completing this instrument moves healthy participants on
healthy_instrument = "functionality_appreciation_scale_fas"

# Completing this instrument moves everyone else on
patient_instrument = "edmonton_symptom_assessment_system_revised_esasr"

# ============================================================================
# Logging
# ============================================================================
[logging]
# Enable JSON file logging in addition to the console
local_enabled = false

# Log directory
local_path = "/var/log/redcap-bridge"

# Log rotation (daily, hourly or never)
local_rotation = "daily"
"#
        .to_string()
    }
}
