//! Authentication gate.
//!
//! Transport-agnostic decision over `(method, path, headers)`:
//!
//! ```text
//! Start ── public endpoint ──────────────▶ Bypassed (anonymous context)
//!   │
//!   ├─ no bearer header, no cookie ──────▶ Rejected(NoToken)
//!   ├─ unreadable auth/cookie header ────▶ Rejected(Internal)
//!   ├─ codec failure ────────────────────▶ Rejected(InvalidToken(reason))
//!   └─ codec success ────────────────────▶ Authenticated(claims)
//! ```
//!
//! Every rejection maps to the same 401 response; the reason is for logs only.

use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::{HeaderMap, Method};
use thiserror::Error;

use crate::security::identity::IdentityContext;
use crate::security::public::EndpointClassifier;
use crate::security::token::{TokenCodec, TokenError};

/// Why a request was refused.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthRejection {
    #[error("no authentication token found")]
    NoToken,

    #[error("invalid authentication token: {0}")]
    InvalidToken(TokenError),

    #[error("token processing error: {0}")]
    Internal(String),
}

impl AuthRejection {
    /// Short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthRejection::NoToken => "no_token",
            AuthRejection::InvalidToken(e) => e.as_str(),
            AuthRejection::Internal(_) => "internal",
        }
    }
}

/// Combines endpoint classification, token extraction and verification.
#[derive(Debug, Clone)]
pub struct AuthGate {
    classifier: EndpointClassifier,
    codec: TokenCodec,
    cookie_name: String,
}

impl AuthGate {
    pub fn new(classifier: EndpointClassifier, codec: TokenCodec, cookie_name: impl Into<String>) -> Self {
        Self {
            classifier,
            codec,
            cookie_name: cookie_name.into(),
        }
    }

    /// Decide the identity of a single request.
    pub fn authenticate(
        &self,
        method: &Method,
        path: &str,
        headers: &HeaderMap,
    ) -> Result<IdentityContext, AuthRejection> {
        if self.classifier.is_public_request(method, path) {
            return Ok(IdentityContext::anonymous());
        }

        let token = self.extract_token(headers)?.ok_or(AuthRejection::NoToken)?;

        self.codec
            .decode(token)
            .map(IdentityContext::authenticated)
            .map_err(AuthRejection::InvalidToken)
    }

    /// Bearer header first, then the access-token cookie.
    fn extract_token<'h>(&self, headers: &'h HeaderMap) -> Result<Option<&'h str>, AuthRejection> {
        if let Some(value) = headers.get(AUTHORIZATION) {
            let value = value
                .to_str()
                .map_err(|_| AuthRejection::Internal("unreadable authorization header".into()))?;
            if let Some((scheme, token)) = value.split_once(' ') {
                let token = token.trim();
                if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
                    return Ok(Some(token));
                }
            }
        }

        for value in headers.get_all(COOKIE) {
            let value = value
                .to_str()
                .map_err(|_| AuthRejection::Internal("unreadable cookie header".into()))?;
            for pair in value.split(';') {
                let Some((name, token)) = pair.split_once('=') else {
                    continue;
                };
                if name.trim() != self.cookie_name {
                    continue;
                }
                let token = token.trim().trim_matches('"');
                if !token.is_empty() {
                    return Ok(Some(token));
                }
            }
        }

        Ok(None)
    }

    pub fn classifier(&self) -> &EndpointClassifier {
        &self.classifier
    }
}
