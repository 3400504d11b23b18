//! Greeting content server library.
//!
//! A location-scoped greeting handler registered into a small HTTP content
//! pipeline, plus the server, configuration and observability around it.

pub mod config;
pub mod greeting;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod pipeline;
pub mod routing;

pub use config::schema::ServerConfig;
pub use greeting::GreetingModule;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
