//! Location lookup.
//!
//! # Responsibilities
//! - Compile location configs (matchers + greeting directives)
//! - Look up the location for a request
//! - Return matched location or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Longest path prefix wins; at equal length a host-bound location wins
//! - Explicit `None` rather than a silent default

use std::sync::Arc;

use axum::http::request::Parts;

use crate::config::LocationConfig;
use crate::greeting::{ConfigError, RouteConfig};
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher};

/// A configured location with its compiled greeting config.
#[derive(Debug)]
pub struct Location {
    /// Location identifier for logging, metrics and visit counters.
    pub name: String,
    pub host: Option<String>,
    pub path_prefix: String,
    conf: Arc<RouteConfig>,
    matcher: AndMatcher,
}

impl Location {
    pub fn new(
        name: impl Into<String>,
        host: Option<String>,
        path_prefix: impl Into<String>,
        conf: RouteConfig,
    ) -> Self {
        let path_prefix = path_prefix.into();

        let mut matchers: Vec<Box<dyn Matcher>> = vec![Box::new(PathPrefixMatcher::new(path_prefix.clone()))];
        if let Some(host) = &host {
            matchers.push(Box::new(HostMatcher::new(host.clone())));
        }

        Self {
            name: name.into(),
            host,
            path_prefix,
            conf: Arc::new(conf),
            matcher: AndMatcher::new(matchers),
        }
    }

    /// Compile a location from its config entry.
    pub fn from_config(config: &LocationConfig) -> Result<Self, ConfigError> {
        let conf = RouteConfig::compile(config.directives.as_slice())?;
        if !conf.is_serving() {
            tracing::warn!(
                location = %config.name,
                "greeting_name is not set; requests to this location will fall through"
            );
        }

        Ok(Self::new(
            config.name.clone(),
            config.host.clone(),
            config.path_prefix.clone(),
            conf,
        ))
    }

    /// Greeting config for this location.
    pub fn conf(&self) -> &RouteConfig {
        &self.conf
    }

    pub fn matches(&self, req: &Parts) -> bool {
        self.matcher.matches(req)
    }

    fn rank(&self) -> (usize, bool) {
        (self.path_prefix.len(), self.host.is_some())
    }
}

/// Compiled, immutable set of locations.
#[derive(Debug, Default)]
pub struct Router {
    locations: Vec<Arc<Location>>,
}

impl Router {
    pub fn new(locations: Vec<Location>) -> Self {
        let mut locations: Vec<Arc<Location>> = locations.into_iter().map(Arc::new).collect();
        // Most specific first, so the first match is the best match.
        locations.sort_by(|a, b| b.rank().cmp(&a.rank()));
        Self { locations }
    }

    /// Compile every configured location.
    pub fn from_config(configs: &[LocationConfig]) -> Result<Self, ConfigError> {
        let locations = configs
            .iter()
            .map(Location::from_config)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(locations))
    }

    pub fn match_request(&self, req: &Parts) -> Option<Arc<Location>> {
        self.locations.iter().find(|l| l.matches(req)).cloned()
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }
}
