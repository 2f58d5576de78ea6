//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Compile routes, public rules and the token codec from configuration
//! - Create Axum Router with the catch-all proxy handler
//! - Wire up middleware (tracing, request ID, limits, routing, auth)
//! - Forward requests to backend services
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::config::{ConfigError, GatewayConfig};
use crate::http::middleware::{authenticate, resolve_route};
use crate::http::request::{
    build_upstream_request, propagate_request_id_layer, set_request_id_layer, RequestIdExt,
};
use crate::http::response::{normalize_response, GatewayError};
use crate::observability::metrics;
use crate::routing::{RouteError, RouteTable, RouteTarget};
use crate::security::headers::strip_hop_by_hop;
use crate::security::{AuthGate, EndpointClassifier, IdentityContext, TokenCodec};

/// Startup failures. Nothing after startup is fatal.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Route table error: {0}")]
    Routes(#[from] RouteError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub gate: Arc<AuthGate>,
    pub client: Client<HttpConnector, Body>,
    /// Upper bound on waiting for a backend's response head.
    pub request_timeout: Duration,
}

/// HTTP server for the edge gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GatewayConfig) -> Result<Self, StartupError> {
        let routes = Arc::new(RouteTable::new(&config.routes)?);
        let codec = TokenCodec::from_config(&config.auth)?;
        let classifier = EndpointClassifier::from_config(&config.public_endpoints);
        let gate = Arc::new(AuthGate::new(classifier, codec, config.auth.cookie_name.clone()));

        tracing::info!(
            routes = routes.len(),
            public_rules = gate.classifier().rules().len(),
            algorithm = %config.auth.algorithm,
            "Gateway configuration compiled"
        );

        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(config.timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let state = AppState {
            routes,
            gate,
            client,
            request_timeout: Duration::from_secs(config.timeouts.request_secs),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(proxy_handler))
            .route("/", any(proxy_handler))
            .layer(middleware::map_response(normalize_response))
            .layer(middleware::from_fn_with_state(state.clone(), authenticate))
            .layer(middleware::from_fn_with_state(state.clone(), resolve_route))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The fully layered router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Forwards a routed, authenticated request to its backend service.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();

    let (mut parts, body) = request.into_parts();

    let target = match parts.extensions.remove::<RouteTarget>() {
        Some(target) => target,
        None => match state.routes.resolve(parts.uri.path()) {
            Ok(target) => target.clone(),
            Err(_) => return GatewayError::NoRoute.into_response(),
        },
    };
    // Missing identity means the gate did not run: forward with identity headers stripped.
    let identity = parts
        .extensions
        .remove::<IdentityContext>()
        .unwrap_or_else(IdentityContext::anonymous);
    let client_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %parts.uri.path(),
        service = %target.service_name,
        authenticated = identity.is_authenticated(),
        "Forwarding request"
    );

    let upstream = match build_upstream_request(parts, body, &target, &identity, client_ip) {
        Ok(req) => req,
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Failed to build upstream request");
            metrics::record_request(&method, 500, &target.service_name, start_time);
            return GatewayError::Forwarding(e.to_string()).into_response();
        }
    };

    let outcome = tokio::time::timeout(state.request_timeout, state.client.request(upstream))
        .await
        .map_err(|_| format!("no response within {:?}", state.request_timeout))
        .and_then(|result| result.map_err(|e| e.to_string()));

    match outcome {
        Ok(response) => {
            let status = response.status();
            metrics::record_request(&method, status.as_u16(), &target.service_name, start_time);

            let (mut parts, body) = response.into_parts();
            strip_hop_by_hop(&mut parts.headers);
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                service = %target.service_name,
                error = %e,
                "Upstream error"
            );
            metrics::record_request(&method, 500, &target.service_name, start_time);
            GatewayError::Forwarding(e).into_response()
        }
    }
}
