//! Path pattern matching.
//!
//! # Pattern Forms
//! - `/api/users/**` matches `/api/users` and every path below it
//! - `/api/v*` matches any path starting with the literal `/api/v`
//! - `/health` matches exactly `/health`
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - No regex to guarantee O(n) matching
//! - Specificity is the length of the literal part before any wildcard

use std::fmt;

/// How the literal part of a pattern is compared against a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    /// `literal` or anything below `literal/`.
    Subtree,
    /// Anything starting with `literal`.
    Prefix,
    /// Exactly `literal`.
    Exact,
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: String,
    literal: String,
    kind: PatternKind,
}

/// Reasons a pattern cannot be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    MissingLeadingSlash,
    InnerWildcard,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::MissingLeadingSlash => write!(f, "pattern must start with '/'"),
            PatternError::InnerWildcard => write!(f, "wildcards are only allowed at the end"),
        }
    }
}

impl PathPattern {
    /// Compile a pattern string.
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        if !raw.starts_with('/') {
            return Err(PatternError::MissingLeadingSlash);
        }

        let (literal, kind) = if let Some(base) = raw.strip_suffix("/**") {
            (base, PatternKind::Subtree)
        } else if let Some(base) = raw.strip_suffix('*') {
            (base, PatternKind::Prefix)
        } else {
            (raw, PatternKind::Exact)
        };

        if literal.contains('*') {
            return Err(PatternError::InnerWildcard);
        }

        Ok(Self {
            raw: raw.to_string(),
            literal: literal.to_string(),
            kind,
        })
    }

    /// Returns true if `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self.kind {
            PatternKind::Exact => path == self.literal,
            PatternKind::Prefix => path.starts_with(&self.literal),
            PatternKind::Subtree => match path.strip_prefix(self.literal.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/') || self.literal.is_empty(),
                None => false,
            },
        }
    }

    /// Length of the literal part; longer is more specific.
    pub fn literal_len(&self) -> usize {
        self.literal.len()
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subtree_pattern() {
        let p = PathPattern::parse("/api/users/**").unwrap();
        assert_eq!(p.kind(), PatternKind::Subtree);
        assert_eq!(p.literal(), "/api/users");
        assert!(p.matches("/api/users"));
        assert!(p.matches("/api/users/"));
        assert!(p.matches("/api/users/42/profile"));
        assert!(!p.matches("/api/usersx"));
        assert!(!p.matches("/api/user"));
        assert!(!p.matches("/API/users/42"));
    }

    #[test]
    fn test_root_subtree_matches_everything() {
        let p = PathPattern::parse("/**").unwrap();
        assert_eq!(p.literal_len(), 0);
        assert!(p.matches("/"));
        assert!(p.matches("/anything/at/all"));
    }

    #[test]
    fn test_prefix_pattern() {
        let p = PathPattern::parse("/api/v*").unwrap();
        assert_eq!(p.kind(), PatternKind::Prefix);
        assert!(p.matches("/api/v1/things"));
        assert!(p.matches("/api/v"));
        assert!(!p.matches("/api/x"));
    }

    #[test]
    fn test_exact_pattern() {
        let p = PathPattern::parse("/health").unwrap();
        assert!(p.matches("/health"));
        assert!(!p.matches("/health/live"));
        assert!(!p.matches("/healthz"));
    }

    #[test]
    fn test_invalid_patterns() {
        assert_eq!(
            PathPattern::parse("api/users/**"),
            Err(PatternError::MissingLeadingSlash)
        );
        assert_eq!(
            PathPattern::parse("/api/*/users"),
            Err(PatternError::InnerWildcard)
        );
    }
}
