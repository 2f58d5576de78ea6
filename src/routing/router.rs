//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes
//! - Look up the single backend service for a path
//! - Return matched target or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) pattern scan (acceptable for typical route counts)
//! - Longest literal prefix wins; equal literals across services are
//!   rejected at construction so lookups never have to break ties

use std::collections::HashMap;

use thiserror::Error;

use crate::config::RouteConfig;
use crate::routing::matcher::PathPattern;

/// Routing failures. Only `NoRoute` can happen while serving.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("no route for path '{0}'")]
    NoRoute(String),

    #[error("route '{route}' pattern '{pattern}' is invalid: {reason}")]
    InvalidPattern {
        route: String,
        pattern: String,
        reason: String,
    },

    #[error("patterns '{first_pattern}' ({first}) and '{second_pattern}' ({second}) are equally specific")]
    Conflict {
        first: String,
        first_pattern: String,
        second: String,
        second_pattern: String,
    },
}

/// Where a matched request is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTarget {
    pub service_name: String,
    /// Base URI without a trailing slash.
    pub target_base_uri: String,
}

impl RouteTarget {
    /// `target_base_uri + path [+ "?" + query]`.
    pub fn upstream_uri(&self, path_and_query: &str) -> String {
        format!("{}{}", self.target_base_uri, path_and_query)
    }
}

/// A compiled route.
#[derive(Debug, Clone)]
pub struct Route {
    target: RouteTarget,
    patterns: Vec<PathPattern>,
}

impl Route {
    pub fn name(&self) -> &str {
        &self.target.service_name
    }

    pub fn patterns(&self) -> &[PathPattern] {
        &self.patterns
    }

    pub fn target(&self) -> &RouteTarget {
        &self.target
    }
}

/// Immutable path → service table.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile routes, failing on invalid patterns and ambiguous overlaps.
    pub fn new(configs: &[RouteConfig]) -> Result<Self, RouteError> {
        let mut routes = Vec::with_capacity(configs.len());
        // literal -> (route name, raw pattern)
        let mut literals: HashMap<String, (String, String)> = HashMap::new();

        for config in configs {
            let mut patterns = Vec::with_capacity(config.patterns.len());
            for raw in &config.patterns {
                let pattern = PathPattern::parse(raw).map_err(|e| RouteError::InvalidPattern {
                    route: config.name.clone(),
                    pattern: raw.clone(),
                    reason: e.to_string(),
                })?;

                match literals.get(pattern.literal()) {
                    Some((owner, owner_pattern)) if owner != &config.name => {
                        return Err(RouteError::Conflict {
                            first: owner.clone(),
                            first_pattern: owner_pattern.clone(),
                            second: config.name.clone(),
                            second_pattern: raw.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        literals.insert(
                            pattern.literal().to_string(),
                            (config.name.clone(), raw.clone()),
                        );
                    }
                }
                patterns.push(pattern);
            }

            routes.push(Route {
                target: RouteTarget {
                    service_name: config.name.clone(),
                    target_base_uri: config.target.trim_end_matches('/').to_string(),
                },
                patterns,
            });
        }

        Ok(Self { routes })
    }

    /// Find the most specific route for `path`.
    pub fn resolve(&self, path: &str) -> Result<&RouteTarget, RouteError> {
        self.routes
            .iter()
            .flat_map(|route| route.patterns.iter().map(move |p| (route, p)))
            .filter(|(_, pattern)| pattern.matches(path))
            .max_by_key(|(_, pattern)| pattern.literal_len())
            .map(|(route, _)| &route.target)
            .ok_or_else(|| RouteError::NoRoute(path.to_string()))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str, patterns: &[&str], target: &str) -> RouteConfig {
        RouteConfig {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            target: target.into(),
        }
    }

    fn table() -> RouteTable {
        RouteTable::new(&[
            route(
                "user-service",
                &["/api/users/**", "/api/auth/**", "/api/roles/**", "/api/permissions/**"],
                "http://localhost:8081",
            ),
            route(
                "survey-service",
                &["/api/surveys/**", "/api/questions/**", "/api/options/**"],
                "http://localhost:8082/",
            ),
            route(
                "organization-service",
                &["/api/organizations/**", "/api/departments/**", "/api/teams/**"],
                "http://localhost:8083",
            ),
            route("user-bulk", &["/api/users/bulk/**"], "http://localhost:8091"),
        ])
        .unwrap()
    }

    #[test]
    fn test_resolves_service() {
        let t = table();
        assert_eq!(t.resolve("/api/surveys/42").unwrap().service_name, "survey-service");
        assert_eq!(t.resolve("/api/auth/login").unwrap().service_name, "user-service");
        assert_eq!(t.resolve("/api/teams").unwrap().service_name, "organization-service");
    }

    #[test]
    fn test_longest_prefix_wins() {
        let t = table();
        assert_eq!(t.resolve("/api/users/bulk/123").unwrap().service_name, "user-bulk");
        assert_eq!(t.resolve("/api/users/bulk").unwrap().service_name, "user-bulk");
        assert_eq!(t.resolve("/api/users/123").unwrap().service_name, "user-service");
        assert_eq!(t.resolve("/api/users/bulky").unwrap().service_name, "user-service");
    }

    #[test]
    fn test_longest_prefix_independent_of_order() {
        let t = RouteTable::new(&[
            route("user-bulk", &["/api/users/bulk/**"], "http://localhost:8091"),
            route("user-service", &["/api/users/**"], "http://localhost:8081"),
        ])
        .unwrap();
        assert_eq!(t.resolve("/api/users/bulk/123").unwrap().service_name, "user-bulk");
    }

    #[test]
    fn test_no_route() {
        let t = table();
        assert_eq!(
            t.resolve("/api/unknown/path"),
            Err(RouteError::NoRoute("/api/unknown/path".into()))
        );
        assert!(t.resolve("/").is_err());
    }

    #[test]
    fn test_upstream_uri_concatenation() {
        let t = table();
        let target = t.resolve("/api/surveys/42").unwrap();
        assert_eq!(target.target_base_uri, "http://localhost:8082");
        assert_eq!(
            target.upstream_uri("/api/surveys/42?page=2"),
            "http://localhost:8082/api/surveys/42?page=2"
        );
    }

    #[test]
    fn test_tie_fails_at_construction() {
        let err = RouteTable::new(&[
            route("a", &["/api/shared/**"], "http://localhost:1"),
            route("b", &["/api/shared*"], "http://localhost:2"),
        ])
        .unwrap_err();
        assert!(matches!(err, RouteError::Conflict { .. }));
    }

    #[test]
    fn test_same_route_duplicate_literal_allowed() {
        let t = RouteTable::new(&[route(
            "a",
            &["/api/things/**", "/api/things"],
            "http://localhost:1",
        )])
        .unwrap();
        assert_eq!(t.resolve("/api/things").unwrap().service_name, "a");
    }

    #[test]
    fn test_invalid_pattern() {
        let err = RouteTable::new(&[route("a", &["/api/*/x"], "http://localhost:1")]).unwrap_err();
        assert!(matches!(err, RouteError::InvalidPattern { .. }));
    }
}
