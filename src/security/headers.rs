//! Header manipulation for forwarded requests.
//!
//! # Responsibilities
//! - Strip caller-supplied trusted identity headers
//! - Project verified claims into trusted identity headers
//! - Strip hop-by-hop headers
//! - Add X-Forwarded-For, X-Forwarded-Proto, X-Forwarded-Host
//!
//! # Design Decisions
//! - Reserved names are removed on every request, authenticated or not
//! - Absent claims project as empty values, never as missing headers
//! - Projection cannot fail: control characters in claim values are dropped

use std::net::IpAddr;

use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::HeaderMap;

use crate::security::identity::IdentityContext;

pub const X_USER_ID: HeaderName = HeaderName::from_static("x-user-id");
pub const X_USERNAME: HeaderName = HeaderName::from_static("x-username");
pub const X_USER_NAME: HeaderName = HeaderName::from_static("x-user-name");
pub const X_ORGANIZATION_ID: HeaderName = HeaderName::from_static("x-organization-id");
pub const X_DEPARTMENT_ID: HeaderName = HeaderName::from_static("x-department-id");
pub const X_TEAM_ID: HeaderName = HeaderName::from_static("x-team-id");
pub const X_AUTHORITIES: HeaderName = HeaderName::from_static("x-authorities");
pub const X_USER_AUTHORITIES: HeaderName = HeaderName::from_static("x-user-authorities");
pub const X_ROLES: HeaderName = HeaderName::from_static("x-roles");
pub const X_AUTHENTICATED: HeaderName = HeaderName::from_static("x-authenticated");

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_HOST: HeaderName = HeaderName::from_static("x-forwarded-host");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");

/// Headers downstream services trust without re-verification.
pub const TRUSTED_HEADERS: [HeaderName; 10] = [
    X_USER_ID,
    X_USERNAME,
    X_USER_NAME,
    X_ORGANIZATION_ID,
    X_DEPARTMENT_ID,
    X_TEAM_ID,
    X_AUTHORITIES,
    X_USER_AUTHORITIES,
    X_ROLES,
    X_AUTHENTICATED,
];

/// Hop-by-hop headers that must never be forwarded.
const HOP_BY_HOP_HEADERS: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove reserved names, then set identity headers when authenticated.
pub fn project(identity: &IdentityContext, headers: &mut HeaderMap) {
    for name in &TRUSTED_HEADERS {
        headers.remove(name);
    }

    let Some(claims) = identity.claims().filter(|_| identity.is_authenticated()) else {
        return;
    };

    let uuid_value = |id: Option<uuid::Uuid>| {
        id.map(|id| HeaderValue::from_str(&id.to_string()).unwrap_or_else(|_| empty()))
            .unwrap_or_else(empty)
    };
    let subject = sanitized(&claims.subject);
    let authorities = sanitized(&claims.authorities.join(","));

    headers.insert(X_USER_ID, uuid_value(claims.user_id));
    headers.insert(X_USERNAME, subject.clone());
    headers.insert(X_USER_NAME, subject);
    headers.insert(X_ORGANIZATION_ID, uuid_value(claims.organization_id));
    headers.insert(X_DEPARTMENT_ID, uuid_value(claims.department_id));
    headers.insert(X_TEAM_ID, uuid_value(claims.team_id));
    headers.insert(X_AUTHORITIES, authorities.clone());
    headers.insert(X_USER_AUTHORITIES, authorities);
    headers.insert(X_ROLES, sanitized(&claims.roles.join(",")));
    headers.insert(X_AUTHENTICATED, HeaderValue::from_static("true"));
}

fn empty() -> HeaderValue {
    HeaderValue::from_static("")
}

fn sanitized(value: &str) -> HeaderValue {
    let clean: String = value.chars().filter(|c| !c.is_control()).collect();
    HeaderValue::from_bytes(clean.trim().as_bytes()).unwrap_or_else(|_| empty())
}

/// Check if a header is a hop-by-hop header that should not be forwarded.
pub fn is_hop_by_hop_header(name: &HeaderName) -> bool {
    HOP_BY_HOP_HEADERS.contains(name)
}

/// Remove hop-by-hop headers, including any named by `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed.iter().chain(HOP_BY_HOP_HEADERS.iter()) {
        headers.remove(name);
    }
}

/// Record the original client and host for the backend.
///
/// The client address is appended to any existing X-Forwarded-For chain.
pub fn add_forwarded_headers(headers: &mut HeaderMap, client_ip: Option<IpAddr>) {
    if let Some(host) = headers.get(header::HOST).cloned() {
        headers.insert(X_FORWARDED_HOST, host);
    }
    headers.insert(X_FORWARDED_PROTO, HeaderValue::from_static("http"));

    if let Some(ip) = client_ip {
        let chain = match headers.get(&X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(existing) if !existing.trim().is_empty() => format!("{}, {}", existing, ip),
            _ => ip.to_string(),
        };
        if let Ok(value) = HeaderValue::from_str(&chain) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }
}
