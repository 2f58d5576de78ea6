//! Response handling and transformation.
//!
//! # Responsibilities
//! - Map gateway-level failures to well-formed JSON responses
//! - Deduplicate CORS headers on successful backend responses
//!
//! # Design Decisions
//! - Authentication failures always produce the same 401 body
//! - Only forwarding failures produce a 5xx
//! - Dedupe keeps the first value; values are never merged

use axum::http::header::{
    HeaderName, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, VARY,
};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Headers reduced to their first value on 2xx responses.
pub const DEDUPED_HEADERS: [HeaderName; 3] =
    [ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_ALLOW_CREDENTIALS, VARY];

/// Failures the gateway answers itself.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("no route for path")]
    NoRoute,

    #[error("upstream request failed: {0}")]
    Forwarding(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::Unauthorized => StatusCode::UNAUTHORIZED,
            GatewayError::NoRoute => StatusCode::NOT_FOUND,
            GatewayError::Forwarding(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Details stay in the logs.
        let (error, message) = match self {
            GatewayError::Unauthorized => ("Unauthorized", "Authentication required"),
            GatewayError::NoRoute => ("Not Found", "No route for path"),
            GatewayError::Forwarding(_) => ("Gateway Error", "Upstream request failed"),
        };
        (
            self.status(),
            Json(json!({ "error": error, "message": message })),
        )
            .into_response()
    }
}

/// Keep only the first value of each deduped header on 2xx responses.
pub fn normalize_headers(status: StatusCode, headers: &mut HeaderMap) {
    if !status.is_success() {
        return;
    }
    for name in &DEDUPED_HEADERS {
        let mut values = headers.get_all(name).iter();
        let first = match (values.next(), values.next()) {
            (Some(first), Some(_)) => first.clone(),
            _ => continue,
        };
        tracing::debug!(header = %name, "Dropping duplicate response header values");
        headers.insert(name.clone(), first);
    }
}

/// Response mapper applied to forwarded responses.
pub async fn normalize_response(mut response: Response) -> Response {
    let status = response.status();
    normalize_headers(status, response.headers_mut());
    response
}
