//! Request middleware, outermost first: route resolution, then authentication.

pub mod auth;
pub mod route;

pub use auth::authenticate;
pub use route::resolve_route;
