//! Verified identity types.

use uuid::Uuid;

/// Claims decoded from a token that passed signature and expiry checks.
///
/// Optional claims are normalized at decode time: absent identifiers are
/// `None`, absent lists are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Login/display name of the principal. May be empty.
    pub subject: String,
    pub user_id: Option<Uuid>,
    pub organization_id: Option<Uuid>,
    pub department_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    /// Granted authorities in token order, without duplicates.
    pub authorities: Vec<String>,
    /// Roles in token order, without duplicates.
    pub roles: Vec<String>,
    /// Expiry (seconds since epoch).
    pub expires_at: i64,
    /// Issued-at (seconds since epoch), when present.
    pub issued_at: Option<i64>,
}

/// Per-request trust record produced by the authentication gate.
///
/// Attached to the request as an extension and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityContext {
    authenticated: bool,
    claims: Option<Claims>,
}

impl IdentityContext {
    /// Context for a request that bypassed authentication.
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            claims: None,
        }
    }

    /// Context for a request carrying a verified token.
    pub fn authenticated(claims: Claims) -> Self {
        Self {
            authenticated: true,
            claims: Some(claims),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }
}
