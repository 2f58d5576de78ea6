//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → public.rs (is this endpoint reachable without a token?)
//!     → gate.rs (extract bearer/cookie token, verify, build IdentityContext)
//!         → token.rs (signature + expiry + claim decoding)
//!     → headers.rs (strip spoofed identity headers, project verified claims)
//!     → Pass to forwarding
//! ```
//!
//! # Design Decisions
//! - Fail closed: any doubt about the token means 401
//! - One generic 401 body; failure reasons only reach the logs
//! - No trust in client input: reserved identity headers are always stripped

pub mod gate;
pub mod headers;
pub mod identity;
pub mod public;
pub mod token;

pub use gate::{AuthGate, AuthRejection};
pub use identity::{Claims, IdentityContext};
pub use public::{EndpointClassifier, PublicRule};
pub use token::{TokenCodec, TokenError};
