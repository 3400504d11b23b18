//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, directive compilation)
//!     → ServerConfig (validated, immutable)
//!     → locations compiled into the routing table
//!
//! On file change:
//!     watcher.rs detects change
//!     → loader.rs loads new config
//!     → validation.rs validates
//!     → atomic swap of the compiled locations
//!     → visit counters survive (keyed by location name)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Locations never inherit directives from one another

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{load_config, parse_config};
pub use schema::{
    GreetingConfig, LimitsConfig, ListenerConfig, LocationConfig, LogFormat, ObservabilityConfig,
    ServerConfig, TimeoutConfig,
};
