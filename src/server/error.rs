//! HTTP rendering of bridge errors
//!
//! Every failure leaves the API as `{"status": "error", "kind": ..., "message": ...}`
//! with a status code chosen by error kind.

use crate::domain::BridgeError;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Realm announced on authentication failures
pub const BASIC_REALM: &str = "Basic";

/// Status code of an error kind
pub fn status_for(err: &BridgeError) -> StatusCode {
    match err {
        BridgeError::AuthenticationFailed(_) => StatusCode::UNAUTHORIZED,
        BridgeError::Validation(_)
        | BridgeError::UnknownPrefix { .. }
        | BridgeError::NoMatchingGroup { .. }
        | BridgeError::NoChoiceMatch { .. } => StatusCode::BAD_REQUEST,
        BridgeError::FieldNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        BridgeError::Upstream(_) | BridgeError::Forwarding(_) => StatusCode::BAD_GATEWAY,
        BridgeError::Configuration(_) | BridgeError::Serialization(_) | BridgeError::Io(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let status = status_for(&self);

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), error = %self, "Request failed");
        } else {
            tracing::warn!(kind = self.kind(), error = %self, "Request rejected");
        }

        let body = Json(json!({
            "status": "error",
            "kind": self.kind(),
            "message": self.to_string(),
        }));

        let mut response = (status, body).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(BASIC_REALM),
            );
        }
        response
    }
}
