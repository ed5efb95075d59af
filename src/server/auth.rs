//! HTTP Basic authentication
//!
//! Every route requires the single configured username/password pair.
//! Credentials are compared through their SHA-256 digests so the comparison
//! time does not depend on where the first differing byte is.

use super::AppState;
use crate::config::{SecretString, ServerConfig};
use crate::domain::BridgeError;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose, Engine as _};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

/// Accepted credentials
pub struct Credentials {
    username: String,
    password: SecretString,
}

impl Credentials {
    /// Credentials from the server configuration
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            username: config.username.clone(),
            password: config.password.clone(),
        }
    }

    /// Whether a username/password pair matches
    ///
    /// Both parts are always compared.
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let user_ok = digest_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = digest_eq(
            password.as_bytes(),
            self.password.expose_secret().as_bytes(),
        );
        user_ok & pass_ok
    }
}

fn digest_eq(a: &[u8], b: &[u8]) -> bool {
    let a = Sha256::digest(a);
    let b = Sha256::digest(b);
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Decode `Authorization: Basic <base64(user:pass)>`
pub fn parse_basic(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, encoded) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = general_purpose::STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

/// Reject requests without valid credentials
pub async fn require_basic_auth(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some((username, password)) = parse_basic(request.headers()) else {
        return BridgeError::AuthenticationFailed("Missing basic credentials".to_string())
            .into_response();
    };

    if !state.credentials.verify(&username, &password) {
        return BridgeError::AuthenticationFailed("Incorrect username or password".to_string())
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;
    use axum::http::HeaderValue;

    fn credentials() -> Credentials {
        Credentials::from_config(&ServerConfig {
            username: "admin".to_string(),
            password: secret_string("s3cret".to_string()),
            ..Default::default()
        })
    }

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_verify() {
        let creds = credentials();
        assert!(creds.verify("admin", "s3cret"));
        assert!(!creds.verify("admin", "s3cre"));
        assert!(!creds.verify("Admin", "s3cret"));
        assert!(!creds.verify("", ""));
    }

    #[test]
    fn test_parse_basic() {
        // admin:s3cret
        let parsed = parse_basic(&headers("Basic YWRtaW46czNjcmV0")).unwrap();
        assert_eq!(parsed, ("admin".to_string(), "s3cret".to_string()));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let encoded = general_purpose::STANDARD.encode("admin:a:b");
        let parsed = parse_basic(&headers(&format!("basic {encoded}"))).unwrap();
        assert_eq!(parsed.1, "a:b");
    }

    #[test]
    fn test_parse_basic_rejects_other_schemes() {
        assert!(parse_basic(&headers("Bearer abc")).is_none());
        assert!(parse_basic(&headers("Basic !!!")).is_none());
        assert!(parse_basic(&HeaderMap::new()).is_none());
    }
}
