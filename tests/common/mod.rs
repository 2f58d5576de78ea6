//! Shared utilities for gateway integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::State,
    http::{HeaderMap, HeaderValue, Method, Uri},
    response::{IntoResponse, Response},
    Json, Router,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use edge_gateway::config::schema::PublicEndpointConfig;
use edge_gateway::config::RouteConfig;
use edge_gateway::{GatewayConfig, HttpServer, Shutdown};

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";

pub const USER_ID: &str = "0b7c9a52-3f7e-4d8a-9a6e-2f1c5d4b3a21";
pub const ORG_ID: &str = "5e2d1c4b-8a7f-4e6d-b5c4-3a2b1c0d9e8f";

/// Counts requests that reached a mock backend.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Start a backend that reflects each request as JSON.
///
/// Paths ending in `/dup-headers` answer with duplicated CORS and Vary headers.
pub async fn start_echo_backend() -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = Router::new().fallback(echo).with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

async fn echo(State(hits): State<Hits>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    hits.0.fetch_add(1, Ordering::SeqCst);

    let mut reflected: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (name, value) in &headers {
        reflected
            .entry(name.as_str().to_string())
            .or_default()
            .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
    }

    let body = Json(json!({
        "method": method.as_str(),
        "path": uri.path(),
        "query": uri.query(),
        "headers": reflected,
    }));

    let mut response = body.into_response();
    if uri.path().ends_with("/dup-headers") {
        let h = response.headers_mut();
        h.append("vary", HeaderValue::from_static("Origin"));
        h.append("vary", HeaderValue::from_static("Accept-Encoding"));
        h.append("access-control-allow-origin", HeaderValue::from_static("https://app.example"));
        h.append("access-control-allow-origin", HeaderValue::from_static("*"));
        h.append("access-control-allow-credentials", HeaderValue::from_static("true"));
        h.append("access-control-allow-credentials", HeaderValue::from_static("false"));
    }
    response
}

/// Start a backend that waits `delay` before answering.
pub async fn start_slow_backend(delay: Duration) -> (SocketAddr, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .fallback(move |State(hits): State<Hits>| async move {
            hits.0.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            "late"
        })
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, hits)
}

/// Send `target` verbatim as the request line, bypassing client-side path
/// normalization. Returns the raw response text.
pub async fn raw_get(addr: SocketAddr, target: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        target, addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    String::from_utf8_lossy(&response).into_owned()
}

/// An address nothing is listening on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// Gateway config with the three standard services on the given backends.
pub fn gateway_config(user: SocketAddr, survey: SocketAddr, organization: SocketAddr) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.auth.secret = SECRET.to_string();
    config.routes = vec![
        route(
            "user-service",
            &["/api/users/**", "/api/auth/**", "/api/roles/**", "/api/permissions/**"],
            user,
        ),
        route(
            "survey-service",
            &["/api/surveys/**", "/api/questions/**", "/api/options/**"],
            survey,
        ),
        route(
            "organization-service",
            &["/api/organizations/**", "/api/departments/**", "/api/teams/**"],
            organization,
        ),
    ];
    config
}

fn route(name: &str, patterns: &[&str], addr: SocketAddr) -> RouteConfig {
    RouteConfig {
        name: name.to_string(),
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        target: format!("http://{}", addr),
    }
}

pub fn public_rule(prefix: &str, segment: Option<&str>) -> PublicEndpointConfig {
    PublicEndpointConfig {
        prefix: prefix.to_string(),
        segment: segment.map(str::to_string),
        methods: Vec::new(),
    }
}

/// Start a gateway on an ephemeral port. Keep the returned `Shutdown` alive.
pub async fn start_gateway(config: GatewayConfig) -> (SocketAddr, Shutdown) {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, receiver).await.unwrap();
    });
    (addr, shutdown)
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// Sign `claims` with the shared test secret (HS256).
pub fn mint(claims: Value) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

/// A valid token for the standard test user.
pub fn user_token() -> String {
    mint(json!({
        "sub": "u1",
        "userId": USER_ID,
        "organizationId": ORG_ID,
        "authorities": ["SURVEY_READ", "SURVEY_WRITE"],
        "roles": ["ADMIN"],
        "iat": now(),
        "exp": now() + 3600,
    }))
}

/// First value of `name` in an echoed request.
pub fn echoed_header<'a>(echo: &'a Value, name: &str) -> Option<&'a str> {
    echo["headers"][name][0].as_str()
}
