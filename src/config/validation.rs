//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that every route target is a usable base URI
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Pattern overlap is checked when the route table is compiled

use std::collections::HashSet;
use std::net::SocketAddr;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use thiserror::Error;

use crate::config::schema::{GatewayConfig, RouteConfig};

/// Minimum HMAC secret length in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),

    #[error("auth.algorithm '{0}' is not supported")]
    Algorithm(String),

    #[error("auth.secret must be at least 32 bytes for HMAC algorithms")]
    SecretTooShort,

    #[error("auth.public_key_path is required for {0}")]
    MissingPublicKey(String),

    #[error("auth.cookie_name '{0}' is not a valid cookie name")]
    CookieName(String),

    #[error("at least one route must be configured")]
    NoRoutes,

    #[error("route name must not be empty")]
    EmptyRouteName,

    #[error("route '{0}' is defined more than once")]
    DuplicateRoute(String),

    #[error("route '{0}' has no patterns")]
    NoPatterns(String),

    #[error("route '{route}' pattern '{pattern}' must start with '/'")]
    Pattern { route: String, pattern: String },

    #[error("route '{route}' target '{target}' is invalid: {reason}")]
    Target {
        route: String,
        target: String,
        reason: String,
    },

    #[error("public endpoint prefix '{0}' must start with '/'")]
    PublicPrefix(String),

    #[error("timeouts.{0} must be greater than zero")]
    Timeout(&'static str),

    #[error("observability.log_format '{0}' must be 'pretty' or 'json'")]
    LogFormat(String),

    #[error("observability.metrics_address '{0}' is not a socket address")]
    MetricsAddress(String),
}

/// Validate a deserialized configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    validate_auth(config, &mut errors);

    if config.routes.is_empty() {
        errors.push(ValidationError::NoRoutes);
    }
    let mut seen = HashSet::new();
    for route in &config.routes {
        if route.name.trim().is_empty() {
            errors.push(ValidationError::EmptyRouteName);
        } else if !seen.insert(route.name.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.name.clone()));
        }
        validate_route(route, &mut errors);
    }

    for rule in &config.public_endpoints {
        if !rule.prefix.starts_with('/') {
            errors.push(ValidationError::PublicPrefix(rule.prefix.clone()));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Timeout("connect_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Timeout("request_secs"));
    }

    let obs = &config.observability;
    if obs.log_format != "pretty" && obs.log_format != "json" {
        errors.push(ValidationError::LogFormat(obs.log_format.clone()));
    }
    if obs.metrics_enabled && obs.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(obs.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_auth(config: &GatewayConfig, errors: &mut Vec<ValidationError>) {
    let auth = &config.auth;
    match Algorithm::from_str(&auth.algorithm) {
        Ok(Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512) => {
            if auth.secret.len() < MIN_SECRET_LEN {
                errors.push(ValidationError::SecretTooShort);
            }
        }
        Ok(_) => {
            if auth.public_key_path.as_deref().map_or(true, str::is_empty) {
                errors.push(ValidationError::MissingPublicKey(auth.algorithm.clone()));
            }
        }
        Err(_) => errors.push(ValidationError::Algorithm(auth.algorithm.clone())),
    }

    if !is_cookie_token(&auth.cookie_name) {
        errors.push(ValidationError::CookieName(auth.cookie_name.clone()));
    }
}

fn validate_route(route: &RouteConfig, errors: &mut Vec<ValidationError>) {
    if route.patterns.is_empty() {
        errors.push(ValidationError::NoPatterns(route.name.clone()));
    }
    for pattern in &route.patterns {
        if !pattern.starts_with('/') {
            errors.push(ValidationError::Pattern {
                route: route.name.clone(),
                pattern: pattern.clone(),
            });
        }
    }

    let target_error = |reason: &str| ValidationError::Target {
        route: route.name.clone(),
        target: route.target.clone(),
        reason: reason.to_string(),
    };
    match url::Url::parse(&route.target) {
        Ok(url) => {
            if url.scheme() != "http" {
                errors.push(target_error("only http targets are supported"));
            } else if url.host_str().is_none() {
                errors.push(target_error("missing host"));
            } else if url.query().is_some() || url.fragment().is_some() {
                errors.push(target_error("query and fragment are not allowed"));
            }
        }
        Err(e) => errors.push(target_error(&e.to_string())),
    }
}

/// RFC 6265 cookie-name (an RFC 7230 token).
fn is_cookie_token(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
