//! Public endpoint classification.
//!
//! # Responsibilities
//! - Decide whether a request may skip token validation
//!
//! # Design Decisions
//! - Prefixes match at segment boundaries: `/api/auth/login` does not cover
//!   `/api/auth/loginx`, a prefix ending in `/` covers anything below it
//! - A `segment` rule additionally requires a whole path segment after the
//!   prefix, so `/api/users/` + `exists` covers `/api/users/42/exists` but
//!   not `/api/users/42` or `/api/users/existsx`
//! - Paths with `.`, `..` or empty segments are never public
//! - Rules are independent; evaluation order does not change the result

use axum::http::Method;
use percent_encoding::percent_decode_str;

use crate::config::PublicEndpointConfig;

/// One public-endpoint predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicRule {
    prefix: String,
    segment: Option<String>,
    methods: Vec<Method>,
}

impl PublicRule {
    /// Rule matching everything at or below `prefix`.
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            segment: None,
            methods: Vec::new(),
        }
    }

    /// Require `segment` to appear as a whole segment after the prefix.
    pub fn with_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = Some(segment.into());
        self
    }

    /// Restrict the rule to the given methods.
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    fn matches_path(&self, path: &str) -> bool {
        let Some(rest) = path.strip_prefix(self.prefix.as_str()) else {
            return false;
        };
        let at_boundary = rest.is_empty() || self.prefix.ends_with('/') || rest.starts_with('/');
        if !at_boundary {
            return false;
        }
        match &self.segment {
            Some(segment) => rest.split('/').any(|s| s == segment),
            None => true,
        }
    }

    fn matches_method(&self, method: &Method) -> bool {
        self.methods.is_empty() || self.methods.contains(method)
    }
}

impl From<&PublicEndpointConfig> for PublicRule {
    fn from(config: &PublicEndpointConfig) -> Self {
        let methods = config
            .methods
            .iter()
            .filter_map(|m| match Method::from_bytes(m.to_ascii_uppercase().as_bytes()) {
                Ok(method) => Some(method),
                Err(_) => {
                    tracing::warn!(method = %m, prefix = %config.prefix, "Ignoring invalid method in public endpoint rule");
                    None
                }
            })
            .collect();
        Self {
            prefix: config.prefix.clone(),
            segment: config.segment.clone(),
            methods,
        }
    }
}

/// Immutable set of public-endpoint rules.
#[derive(Debug, Clone)]
pub struct EndpointClassifier {
    rules: Vec<PublicRule>,
}

impl EndpointClassifier {
    pub fn new(rules: Vec<PublicRule>) -> Self {
        Self { rules }
    }

    /// Classifier from configuration; an empty list selects [`Self::default_rules`].
    pub fn from_config(configs: &[PublicEndpointConfig]) -> Self {
        if configs.is_empty() {
            return Self::new(Self::default_rules());
        }
        Self::new(configs.iter().map(PublicRule::from).collect())
    }

    /// Login, registration and token refresh.
    pub fn default_rules() -> Vec<PublicRule> {
        vec![
            PublicRule::prefix("/api/auth/login"),
            PublicRule::prefix("/api/auth/register"),
            PublicRule::prefix("/api/auth/refresh"),
        ]
    }

    /// True when a rule without method restrictions matches `path`.
    pub fn is_public(&self, path: &str) -> bool {
        is_normalized(path)
            && self
                .rules
                .iter()
                .any(|rule| rule.methods.is_empty() && rule.matches_path(path))
    }

    /// True when the request may proceed without a token.
    pub fn is_public_request(&self, method: &Method, path: &str) -> bool {
        is_normalized(path)
            && self
                .rules
                .iter()
                .any(|rule| rule.matches_method(method) && rule.matches_path(path))
    }

    pub fn rules(&self) -> &[PublicRule] {
        &self.rules
    }
}

impl Default for EndpointClassifier {
    fn default() -> Self {
        Self::new(Self::default_rules())
    }
}

/// Rejects dot segments and empty inner segments (`//`), judged after
/// percent-decoding. Encoded separators (`%2f`, `%5c`) are rejected too.
fn is_normalized(path: &str) -> bool {
    let Some(rest) = path.strip_prefix('/') else {
        return false;
    };
    let segments: Vec<&str> = rest.split('/').collect();
    let last = segments.len() - 1;
    segments.iter().enumerate().all(|(i, raw)| {
        let segment = percent_decode_str(raw).decode_utf8_lossy();
        segment != "."
            && segment != ".."
            && !segment.contains(['/', '\\'])
            && (!segment.is_empty() || i == last)
    })
}
