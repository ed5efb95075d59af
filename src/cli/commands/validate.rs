//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the bridge configuration file.

use crate::adapters::redcap::RegistryProvider;
use crate::config::load_config;
use clap::Args;
use secrecy::ExposeSecret;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also check that the registry accepts the API token
    #[arg(long)]
    pub check_registry: bool,
}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as part of loading
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration validation failed");
                println!("   Error: {e}");
                println!();
                return Ok(2);
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Environment: {:?}", config.environment);
        println!("  Log Level: {}", config.application.log_level);
        println!("  Listen: {}", config.server.bind_address());
        println!("  Basic-auth user: {}", config.server.username);
        println!("  CORS Origins: {:?}", config.server.cors_origins);
        println!("  Registry: {}", display_or_unset(&config.redcap.base_url));
        println!(
            "  API Token: {}",
            if config.redcap.api_token.expose_secret().is_empty() {
                "(unset)"
            } else {
                "***"
            }
        );
        println!("  Connection Policy: {:?}", config.redcap.connection_policy);
        println!("  Max Retries: {}", config.redcap.retry.max_retries);
        println!(
            "  Health Field: {}",
            config.fields.health_field.as_deref().unwrap_or("(unset)")
        );
        println!(
            "  Allocation Field: {}",
            config.fields.alloc_field.as_deref().unwrap_or("(unset)")
        );
        println!("  Forwarding Enabled: {}", config.forwarding.enabled);
        println!(
            "  Forwarding URL: {}",
            config.forwarding.url.as_deref().unwrap_or("(unset)")
        );
        println!();

        if self.check_registry {
            let provider = RegistryProvider::from_config(&config.redcap)?;
            match provider.health_check().await {
                Ok(()) => println!("✅ Registry reachable"),
                Err(e) => {
                    println!("❌ Registry check failed");
                    println!("   Error: {e}");
                    return Ok(5);
                }
            }
        }

        Ok(0)
    }
}

fn display_or_unset(value: &str) -> &str {
    if value.is_empty() {
        "(unset)"
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_missing_file_is_configuration_error() {
        let args = ValidateArgs {
            check_registry: false,
        };
        let code = args.execute("/nonexistent/redcap-bridge.toml").await.unwrap();
        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[redcap]
base_url = "https://redcap.example.org"
api_token = "ABCDEF"

[fields]
health_field = "health_status"
"#
        )
        .unwrap();

        let args = ValidateArgs {
            check_registry: false,
        };
        let code = args.execute(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(code, 0);
    }
}
