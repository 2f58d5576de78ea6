//! Request identification and upstream request construction.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4) as early as possible
//! - Propagate the request ID to the backend and back to the caller
//! - Build the outbound request for a resolved route
//!
//! # Design Decisions
//! - An incoming X-Request-ID is kept, otherwise a fresh one is generated
//! - Method, path, query and body are forwarded unmodified
//! - Body is streamed, never buffered

use std::net::IpAddr;

use axum::body::Body;
use axum::http::header::{self, HeaderName};
use axum::http::request::Parts;
use axum::http::{Request, Uri};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::routing::RouteTarget;
use crate::security::headers::{add_forwarded_headers, project, strip_hop_by_hop};
use crate::security::identity::IdentityContext;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Layer assigning a UUID request ID to requests without one.
pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

/// Layer copying the request ID onto the response.
pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}

/// Access to the request ID assigned by [`set_request_id_layer`].
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
    }
}

/// Build the request sent to `target` from the caller's request parts.
///
/// Headers are the caller's minus hop-by-hop headers, minus `Host` (set by
/// the client from the target URI), minus reserved identity headers, plus the
/// projected identity and forwarding headers.
pub fn build_upstream_request(
    mut parts: Parts,
    body: Body,
    target: &RouteTarget,
    identity: &IdentityContext,
    client_ip: Option<IpAddr>,
) -> Result<Request<Body>, axum::http::Error> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    let uri: Uri = target.upstream_uri(path_and_query).parse()?;

    let mut headers = std::mem::take(&mut parts.headers);
    strip_hop_by_hop(&mut headers);
    add_forwarded_headers(&mut headers, client_ip);
    headers.remove(header::HOST);
    project(identity, &mut headers);

    let mut request = Request::new(body);
    *request.method_mut() = parts.method;
    *request.uri_mut() = uri;
    *request.headers_mut() = headers;
    Ok(request)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::headers::{X_AUTHENTICATED, X_FORWARDED_FOR, X_USER_ID};
    use axum::http::{HeaderValue, Method};

    fn target() -> RouteTarget {
        RouteTarget {
            service_name: "survey-service".into(),
            target_base_uri: "http://127.0.0.1:8082".into(),
        }
    }

    fn parts(uri: &str) -> Parts {
        let (parts, _) = Request::builder()
            .method(Method::PUT)
            .uri(uri)
            .header(header::HOST, "gateway.local")
            .header(header::CONNECTION, "keep-alive")
            .header(X_USER_ID, "spoofed")
            .header(X_REQUEST_ID, "req-1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn test_builds_upstream_uri_with_query() {
        let request = build_upstream_request(
            parts("/api/surveys/42?expand=questions&page=2"),
            Body::empty(),
            &target(),
            &IdentityContext::anonymous(),
            None,
        )
        .unwrap();

        assert_eq!(request.method(), Method::PUT);
        assert_eq!(
            request.uri().to_string(),
            "http://127.0.0.1:8082/api/surveys/42?expand=questions&page=2"
        );
    }

    #[test]
    fn test_rewrites_headers() {
        let request = build_upstream_request(
            parts("/api/surveys/42"),
            Body::empty(),
            &target(),
            &IdentityContext::anonymous(),
            Some("10.1.2.3".parse().unwrap()),
        )
        .unwrap();

        let h = request.headers();
        assert!(h.get(header::HOST).is_none());
        assert!(h.get(header::CONNECTION).is_none());
        assert!(h.get(X_USER_ID).is_none());
        assert!(h.get(X_AUTHENTICATED).is_none());
        assert_eq!(h[X_REQUEST_ID], "req-1");
        assert_eq!(h[X_FORWARDED_FOR], "10.1.2.3");
        assert_eq!(h[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_request_id_ext() {
        let mut request = Request::new(());
        assert_eq!(request.request_id(), "unknown");
        request
            .headers_mut()
            .insert(X_REQUEST_ID, HeaderValue::from_static("abc"));
        assert_eq!(request.request_id(), "abc");
    }
}
