//! REDCap API implementation
//!
//! Every REDCap call is a form-encoded `POST` to `<base>/api/` carrying the
//! project token, a `content` selector and `format=json`. Errors come back as
//! `{"error": "..."}` with a 4xx status.

use super::RegistryProject;
use crate::adapters::redcap::models::{
    ImportOptions, ImportResult, RecordExportRequest,
};
use crate::config::{RedcapConfig, RetryConfig, SecretString};
use crate::domain::{
    BridgeError, DataAccessGroup, EventDescriptor, FieldMetadata, RecordRow, RegistryError,
    Result,
};
use async_trait::async_trait;
use reqwest::{Client, ClientBuilder, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};

type FormParams = Vec<(String, String)>;

/// Normalize a configured base URL to the API endpoint
///
/// `https://redcap.example.org` and `https://redcap.example.org/api` both
/// become `https://redcap.example.org/api/`.
pub fn api_url(base_url: &str) -> String {
    let trimmed = base_url.trim().trim_end_matches('/');
    if trimmed.ends_with("/api") {
        format!("{trimmed}/")
    } else {
        format!("{trimmed}/api/")
    }
}

/// REDCap project reached over HTTP
///
/// # Example
///
/// ```no_run
/// use redcap_bridge::adapters::redcap::{RedcapProject, RegistryProject};
/// use redcap_bridge::config::RedcapConfig;
///
/// # async fn example() -> redcap_bridge::domain::Result<()> {
/// let project = RedcapProject::new(&RedcapConfig::default())?;
/// let groups = project.export_dags().await?;
/// # Ok(())
/// # }
/// ```
pub struct RedcapProject {
    /// Normalized API endpoint
    api_url: String,

    /// HTTP client (owns the connection pool)
    client: Client,

    /// Project API token
    token: SecretString,

    /// Retry policy for transient failures
    retry: RetryConfig,
}

impl RedcapProject {
    /// Create a project handle from configuration
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the HTTP client cannot be built.
    pub fn new(config: &RedcapConfig) -> Result<Self> {
        let mut client_builder = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(config.timeout_seconds.min(30)));

        if !config.tls_verify {
            client_builder = client_builder.danger_accept_invalid_certs(true);
        }

        let client = client_builder.build().map_err(|e| {
            BridgeError::Configuration(format!("Failed to build registry HTTP client: {e}"))
        })?;

        Ok(Self {
            api_url: api_url(&config.base_url),
            client,
            token: config.api_token.clone(),
            retry: config.retry.clone(),
        })
    }

    /// Parameters shared by every call
    fn base_params(&self, content: &str) -> FormParams {
        vec![
            (
                "token".to_string(),
                self.token.expose_secret().as_ref().to_string(),
            ),
            ("content".to_string(), content.to_string()),
            ("format".to_string(), "json".to_string()),
            ("returnFormat".to_string(), "json".to_string()),
        ]
    }

    /// Retry a call with exponential backoff while the error is transient
    async fn retry_request<F, T, Fut>(&self, operation: F) -> std::result::Result<T, RegistryError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = std::result::Result<T, RegistryError>>,
    {
        let max_retries = self.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) => {
                    attempt += 1;
                    if attempt >= max_retries || !e.is_transient() {
                        return Err(e);
                    }

                    let delay_ms = (self.retry.initial_delay_ms as f64
                        * self.retry.backoff_multiplier.powi(attempt as i32 - 1))
                        as u64;
                    let delay_ms = delay_ms.min(self.retry.max_delay_ms);

                    tracing::warn!(
                        attempt = attempt,
                        max_retries = max_retries,
                        delay_ms = delay_ms,
                        error = %e,
                        "Retrying registry request after error"
                    );

                    tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                }
            }
        }
    }

    /// Send one form POST and decode the JSON body
    async fn post_once<T: DeserializeOwned>(
        &self,
        params: &FormParams,
    ) -> std::result::Result<T, RegistryError> {
        let resp = self
            .client
            .post(&self.api_url)
            .form(params)
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, error_message(&body)));
        }

        resp.json::<T>()
            .await
            .map_err(|e| RegistryError::InvalidResponse(e.to_string()))
    }

    /// Issue a call for `content`, retrying transient failures
    async fn call<T: DeserializeOwned>(&self, content: &str, params: FormParams) -> Result<T> {
        let started = Instant::now();
        let result = self.retry_request(|| self.post_once(&params)).await;

        match &result {
            Ok(_) => tracing::debug!(
                content = content,
                duration_ms = started.elapsed().as_millis() as u64,
                "Registry call completed"
            ),
            Err(e) => tracing::error!(
                content = content,
                duration_ms = started.elapsed().as_millis() as u64,
                error = %e,
                "Registry call failed"
            ),
        }

        Ok(result?)
    }
}

/// Map a transport failure to a registry error
fn classify_transport_error(err: reqwest::Error) -> RegistryError {
    if err.is_timeout() {
        RegistryError::Timeout(err.to_string())
    } else {
        RegistryError::ConnectionFailed(err.to_string())
    }
}

/// Map a non-success status to a registry error
fn classify_status(status: StatusCode, message: String) -> RegistryError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RegistryError::Unauthorized(message),
        s if s.is_server_error() => RegistryError::ServerError {
            status: s.as_u16(),
            message,
        },
        s => RegistryError::ClientError {
            status: s.as_u16(),
            message,
        },
    }
}

/// Extract REDCap's `{"error": ...}` message, falling back to the raw body
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

/// Append `name[i]=value` pairs
fn push_indexed(params: &mut FormParams, name: &str, values: &[String]) {
    for (i, value) in values.iter().enumerate() {
        params.push((format!("{name}[{i}]"), value.clone()));
    }
}

/// Project info reports `is_longitudinal` as `0`/`1`, `"0"`/`"1"` or a bool
fn flag_is_set(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_u64().is_some_and(|n| n != 0),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    }
}

#[async_trait]
impl RegistryProject for RedcapProject {
    async fn export_metadata(&self, fields: &[String]) -> Result<Vec<FieldMetadata>> {
        let mut params = self.base_params("metadata");
        push_indexed(&mut params, "fields", fields);
        self.call("metadata", params).await
    }

    async fn export_records(&self, request: &RecordExportRequest) -> Result<Vec<RecordRow>> {
        let mut params = self.base_params("record");
        params.push(("type".to_string(), "flat".to_string()));
        push_indexed(&mut params, "records", &request.records);
        push_indexed(&mut params, "fields", &request.fields);
        params.push((
            "rawOrLabel".to_string(),
            request.raw_or_label.as_str().to_string(),
        ));
        params.push((
            "rawOrLabelHeaders".to_string(),
            request.raw_or_label_headers.as_str().to_string(),
        ));
        self.call("record", params).await
    }

    async fn export_dags(&self) -> Result<Vec<DataAccessGroup>> {
        self.call("dag", self.base_params("dag")).await
    }

    async fn export_events(&self) -> Result<Vec<EventDescriptor>> {
        self.call("event", self.base_params("event")).await
    }

    async fn import_records(
        &self,
        rows: &[RecordRow],
        options: &ImportOptions,
    ) -> Result<ImportResult> {
        let mut params = self.base_params("record");
        params.push(("type".to_string(), "flat".to_string()));
        params.push((
            "overwriteBehavior".to_string(),
            options.overwrite.as_str().to_string(),
        ));
        params.push((
            "returnContent".to_string(),
            options.return_content.as_str().to_string(),
        ));
        params.push((
            "dateFormat".to_string(),
            options.date_format.as_str().to_string(),
        ));
        params.push(("forceAutoNumber".to_string(), "false".to_string()));
        params.push(("data".to_string(), serde_json::to_string(rows)?));
        self.call("record", params).await
    }

    async fn is_longitudinal(&self) -> Result<bool> {
        let info: Value = self.call("project", self.base_params("project")).await?;
        Ok(flag_is_set(info.get("is_longitudinal")))
    }

    fn api_url(&self) -> &str {
        &self.api_url
    }
}
