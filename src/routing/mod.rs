//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate path patterns)
//!     → Return: RouteTarget or NoRoute
//!
//! Route Compilation (at startup):
//!     RouteConfig[]
//!     → Compile patterns
//!     → Reject equally specific patterns owned by different services
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - Most specific match wins (longest literal prefix)

pub mod matcher;
pub mod router;

pub use matcher::{PathPattern, PatternKind};
pub use router::{Route, RouteError, RouteTable, RouteTarget};
