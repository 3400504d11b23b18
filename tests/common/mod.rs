//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use hello_server::config::{LocationConfig, ServerConfig};
use hello_server::greeting::GreetingModule;
use hello_server::http::HttpServer;
use hello_server::lifecycle::Shutdown;

/// A server running on a loopback port for the duration of a test.
pub struct TestServer {
    pub addr: SocketAddr,
    pub module: Arc<GreetingModule>,
    pub config_updates: mpsc::UnboundedSender<ServerConfig>,
    shutdown: Shutdown,
}

#[allow(dead_code)]
impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Push a new config through the reload channel and give it time to land.
    pub async fn reload(&self, config: ServerConfig) {
        self.config_updates.send(config).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.trigger();
    }
}

/// A location config from directive lines.
#[allow(dead_code)]
pub fn location(name: &str, path_prefix: &str, directives: &[&str]) -> LocationConfig {
    LocationConfig {
        name: name.into(),
        host: None,
        path_prefix: path_prefix.into(),
        directives: directives.iter().map(|d| d.to_string()).collect(),
    }
}

/// A config serving the given locations.
pub fn config_with(locations: Vec<LocationConfig>) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.locations = locations;
    config
}

/// Start a server with `config` on an ephemeral port.
pub async fn start_server(config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let module = Arc::new(GreetingModule::new(config.greeting.counter_scope));
    let server = HttpServer::with_module(config, module.clone()).unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let (config_updates, updates_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let _ = server.run(listener, updates_rx, server_shutdown).await;
    });

    // Wait for server to start
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestServer {
        addr,
        module,
        config_updates,
        shutdown,
    }
}

/// The Content-Length header as a number.
#[allow(dead_code)]
pub fn content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}
