//! Authentication Middleware.
//! Adapts the transport-agnostic [`AuthGate`] to axum.

use std::time::Instant;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::request::RequestIdExt;
use crate::http::response::GatewayError;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::routing::RouteTarget;

/// Run the gate; on success attach the [`IdentityContext`] to the request.
///
/// [`AuthGate`]: crate::security::AuthGate
/// [`IdentityContext`]: crate::security::IdentityContext
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();
    let decision = state
        .gate
        .authenticate(req.method(), req.uri().path(), req.headers());

    match decision {
        Ok(identity) => {
            let outcome = if identity.is_authenticated() {
                "authenticated"
            } else {
                "bypassed"
            };
            tracing::debug!(
                request_id = %req.request_id(),
                path = %req.uri().path(),
                outcome,
                "Authentication decided"
            );
            metrics::record_auth(outcome);
            req.extensions_mut().insert(identity);
            next.run(req).await
        }
        Err(rejection) => {
            tracing::warn!(
                request_id = %req.request_id(),
                path = %req.uri().path(),
                reason = rejection.as_str(),
                error = %rejection,
                "Rejected unauthenticated request"
            );
            metrics::record_auth(rejection.as_str());
            let service = req
                .extensions()
                .get::<RouteTarget>()
                .map_or("none", |target| target.service_name.as_str());
            metrics::record_request(req.method().as_str(), 401, service, start_time);
            GatewayError::Unauthorized.into_response()
        }
    }
}
