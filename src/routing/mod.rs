//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path, headers)
//!     → router.rs (location lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched Location or NoMatch
//!
//! Location Compilation (at startup and on reload):
//!     LocationConfig[]
//!     → Compile greeting directives into RouteConfig
//!     → Sort by specificity
//!     → Freeze as immutable Router
//! ```
//!
//! # Design Decisions
//! - Locations compiled at load time, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same location

pub mod matcher;
pub mod router;

pub use router::{Location, Router};
