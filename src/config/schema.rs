//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Token verification settings.
    pub auth: AuthConfig,

    /// Endpoints reachable without a token. Empty means the built-in set.
    pub public_endpoints: Vec<PublicEndpointConfig>,

    /// Route definitions mapping paths to backend services.
    pub routes: Vec<RouteConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request limits.
    pub security: SecurityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Token verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT algorithm name (HS256, RS256, ES256, ...).
    pub algorithm: String,

    /// Shared secret for HMAC algorithms.
    /// Falls back to the `GATEWAY_JWT_SECRET` environment variable when empty.
    pub secret: String,

    /// PEM public key for asymmetric algorithms.
    pub public_key_path: Option<String>,

    /// Cookie consulted when no bearer header is present.
    pub cookie_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            algorithm: "HS256".to_string(),
            secret: String::new(),
            public_key_path: None,
            cookie_name: "access_token".to_string(),
        }
    }
}

/// A public endpoint rule.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PublicEndpointConfig {
    /// Path prefix, matched at segment boundaries.
    pub prefix: String,

    /// Segment that must appear somewhere after the prefix (e.g. "exists").
    #[serde(default)]
    pub segment: Option<String>,

    /// Methods the rule applies to. Empty = all methods.
    #[serde(default)]
    pub methods: Vec<String>,
}

/// Route configuration mapping path patterns to a backend service.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Service identifier for logging/metrics.
    pub name: String,

    /// Path patterns (`/api/users/**`, `/api/v*`, `/health`).
    pub patterns: Vec<String>,

    /// Base URI requests are forwarded to (e.g., "http://127.0.0.1:8081").
    pub target: String,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}
