//! Location matching logic.
//!
//! # Responsibilities
//! - Match host header (exact match, case-insensitive, port ignored)
//! - Match path prefix (case-sensitive)
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - Host matching is case-insensitive
//! - Path matching is case-sensitive
//! - Empty condition = always matches (wildcard)
//! - No regex to guarantee O(n) matching

use axum::http::{header, request::Parts};

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Parts) -> bool;
}

/// Matches the Host header.
#[derive(Debug, Clone)]
pub struct HostMatcher {
    expected_host: String,
}

impl HostMatcher {
    /// Create a new host matcher.
    /// The host is normalized to lowercase for case-insensitive matching.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            expected_host: host.into().to_lowercase(),
        }
    }
}

impl Matcher for HostMatcher {
    fn matches(&self, req: &Parts) -> bool {
        let host = req
            .headers
            .get(header::HOST)
            .and_then(|h| h.to_str().ok())
            .or_else(|| req.uri.host());

        host.map(strip_port)
            .map(|h| h.eq_ignore_ascii_case(&self.expected_host))
            .unwrap_or(false)
    }
}

/// Host without its port. Bracketed IPv6 literals keep their brackets.
fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        return match host.find(']') {
            Some(end) => &host[..=end],
            None => host,
        };
    }
    host.split(':').next().unwrap_or(host)
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Parts) -> bool {
        req.uri.path().starts_with(&self.prefix)
    }
}

/// Combines multiple matchers with AND semantics.
#[derive(Debug)]
pub struct AndMatcher {
    matchers: Vec<Box<dyn Matcher>>,
}

impl AndMatcher {
    pub fn new(matchers: Vec<Box<dyn Matcher>>) -> Self {
        Self { matchers }
    }
}

impl Matcher for AndMatcher {
    fn matches(&self, req: &Parts) -> bool {
        self.matchers.iter().all(|m| m.matches(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(builder: axum::http::request::Builder) -> Parts {
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_host_matcher() {
        let matcher = HostMatcher::new("example.com");

        assert!(matcher.matches(&parts(Request::builder().header("Host", "example.com"))));
        // Case insensitive, port ignored
        assert!(matcher.matches(&parts(Request::builder().header("Host", "EXAMPLE.COM:8080"))));
        assert!(!matcher.matches(&parts(Request::builder().header("Host", "other.com"))));
        assert!(!matcher.matches(&parts(Request::builder())));
    }

    #[test]
    fn test_host_matcher_ipv6() {
        let matcher = HostMatcher::new("[::1]");

        assert!(matcher.matches(&parts(Request::builder().header("Host", "[::1]:8080"))));
        assert!(matcher.matches(&parts(Request::builder().header("Host", "[::1]"))));
        assert!(!matcher.matches(&parts(Request::builder().header("Host", "[::2]:8080"))));
        assert!(!HostMatcher::new("[").matches(&parts(Request::builder().header("Host", "[::1]:8080"))));
        assert_eq!(strip_port("[fe80::1]:443"), "[fe80::1]");
        assert_eq!(strip_port("example.com:80"), "example.com");
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/hello");

        assert!(matcher.matches(&parts(Request::builder().uri("http://example.com/hello/there"))));
        assert!(!matcher.matches(&parts(Request::builder().uri("http://example.com/images"))));
        assert!(!matcher.matches(&parts(Request::builder().uri("/Hello"))));
    }

    #[test]
    fn test_and_matcher() {
        let matcher = AndMatcher::new(vec![
            Box::new(HostMatcher::new("example.com")),
            Box::new(PathPrefixMatcher::new("/hello")),
        ]);

        assert!(matcher.matches(&parts(
            Request::builder().uri("/hello").header("Host", "example.com")
        )));
        assert!(!matcher.matches(&parts(
            Request::builder().uri("/hello").header("Host", "other.com")
        )));
    }
}
