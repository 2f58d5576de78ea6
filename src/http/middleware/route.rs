//! Route Resolution Middleware.
//! Resolves the backend service before any authentication work.

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

/// Attach the matched [`RouteTarget`] or answer 404.
///
/// [`RouteTarget`]: crate::routing::RouteTarget
pub async fn resolve_route(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let start_time = Instant::now();

    match state.routes.resolve(req.uri().path()) {
        Ok(target) => {
            req.extensions_mut().insert(target.clone());
            next.run(req).await
        }
        Err(e) => {
            tracing::warn!(
                request_id = %req.request_id(),
                error = %e,
                "No route matched"
            );
            metrics::record_request(req.method().as_str(), 404, "none", start_time);
            GatewayError::NoRoute.into_response()
        }
    }
}
