//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → middleware/route.rs (resolve backend service or 404)
//!     → middleware/auth.rs (authentication gate or 401)
//!     → server.rs proxy handler (project identity, forward)
//!     → response.rs (dedupe CORS headers)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{normalize_headers, GatewayError};
pub use server::{AppState, HttpServer, StartupError};
