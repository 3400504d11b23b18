//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the catch-all content handler
//! - Wire up middleware (tracing, request ID, timeout, limits)
//! - Match each request to a location and run the content phase
//! - Swap in recompiled locations on configuration reload
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::{limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ServerConfig;
use crate::greeting::{ConfigError, CounterScope, GreetingModule};
use crate::http::request::{make_request_span, propagate_request_id_layer, request_id, set_request_id_layer};
use crate::observability::metrics;
use crate::pipeline::{io::special_response, Pipeline, RequestBody, RequestContext};
use crate::routing::Router as LocationRouter;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Compiled locations, replaced wholesale on reload.
    pub locations: Arc<ArcSwap<LocationRouter>>,
    pub pipeline: Pipeline,
}

/// HTTP server hosting the greeting module.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    state: AppState,
    module: Arc<GreetingModule>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if a location's directives do not compile.
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        let module = Arc::new(GreetingModule::new(config.greeting.counter_scope));
        Self::with_module(config, module)
    }

    /// Create a server around an existing greeting module.
    pub fn with_module(config: ServerConfig, module: Arc<GreetingModule>) -> Result<Self, ConfigError> {
        let locations = LocationRouter::from_config(&config.locations)?;
        let pipeline = module.clone().register(Pipeline::builder()).build();

        let state = AppState {
            locations: Arc::new(ArcSwap::from_pointee(locations)),
            pipeline,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
            module,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(content_handler))
            .route("/{*path}", any(content_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(RequestBodyLimitLayer::new(config.limits.max_body_size))
            .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configs received on `config_updates` replace the served locations;
    /// listener, timeout and counter scope changes need a restart.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ServerConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            locations = self.state.locations.load().len(),
            counter_scope = ?self.config.greeting.counter_scope,
            "HTTP server starting"
        );

        let locations = self.state.locations.clone();
        let running_scope = self.module.counters().scope();
        let reloader = tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                apply_reload(&locations, running_scope, &new_config);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// The greeting module serving this server's locations.
    pub fn module(&self) -> &Arc<GreetingModule> {
        &self.module
    }
}

/// Swap in the locations of a reloaded config.
///
/// Returns `false` when the new locations do not compile; the current ones
/// stay in place.
fn apply_reload(locations: &ArcSwap<LocationRouter>, running_scope: CounterScope, new_config: &ServerConfig) -> bool {
    if let Some(requested) = ignored_scope_change(running_scope, new_config) {
        tracing::warn!(
            running = ?running_scope,
            requested = ?requested,
            "counter_scope cannot change on reload; restart to apply it"
        );
    }

    match LocationRouter::from_config(&new_config.locations) {
        Ok(router) => {
            let count = router.len();
            locations.store(Arc::new(router));
            tracing::info!(locations = count, "Locations reloaded");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Reloaded config rejected, keeping current locations");
            false
        }
    }
}

/// The counter scope a reloaded config asks for, if it differs from the running one.
fn ignored_scope_change(running_scope: CounterScope, new_config: &ServerConfig) -> Option<CounterScope> {
    let requested = new_config.greeting.counter_scope;
    (requested != running_scope).then_some(requested)
}

/// Catch-all handler: match a location, then run the content phase.
async fn content_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();
    let method = parts.method.clone();

    let Some(location) = state.locations.load().match_request(&parts) else {
        tracing::debug!(
            request_id = %request_id(&parts.headers),
            path = %parts.uri.path(),
            "No location matched"
        );
        metrics::record_request(method.as_str(), 404, "none", start);
        return special_response(StatusCode::NOT_FOUND);
    };

    let ctx = RequestContext::new(
        method.clone(),
        parts.uri.path(),
        location.clone(),
        Box::new(RequestBody::new(body)),
    );
    let response = state.pipeline.run(ctx).await;

    let status = response.status();
    if status.is_server_error() {
        tracing::warn!(
            request_id = %request_id(&parts.headers),
            location = %location.name,
            status = %status,
            "Request failed"
        );
    }
    metrics::record_request(method.as_str(), status.as_u16(), &location.name, start);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LocationConfig;

    fn config(scope: CounterScope, directives: &[&str]) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.greeting.counter_scope = scope;
        config.locations.push(LocationConfig {
            name: "hello".into(),
            host: None,
            path_prefix: "/hello".into(),
            directives: directives.iter().map(|d| d.to_string()).collect(),
        });
        config
    }

    #[test]
    fn test_scope_change_detected_on_reload() {
        let same = config(CounterScope::PerRoute, &["greeting_name jo-qzy"]);
        assert_eq!(ignored_scope_change(CounterScope::PerRoute, &same), None);

        let changed = config(CounterScope::Shared, &["greeting_name jo-qzy"]);
        assert_eq!(
            ignored_scope_change(CounterScope::PerRoute, &changed),
            Some(CounterScope::Shared)
        );
    }

    #[test]
    fn test_reload_swaps_locations_but_not_scope() {
        let locations = ArcSwap::from_pointee(LocationRouter::default());

        let changed = config(CounterScope::Shared, &["greeting_name jo-qzy"]);
        assert!(apply_reload(&locations, CounterScope::PerRoute, &changed));
        assert_eq!(locations.load().len(), 1);

        let broken = config(CounterScope::PerRoute, &["enable_counter maybe"]);
        assert!(!apply_reload(&locations, CounterScope::PerRoute, &broken));
        assert_eq!(locations.load().len(), 1);
    }
}
