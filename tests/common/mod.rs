//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tokio::sync::mpsc;

use xp_router::config::RouterConfig;
use xp_router::http::HttpServer;
use xp_router::lifecycle::Shutdown;
use xp_router::routing::RoutingTable;

/// Routing document used by most integration tests.
pub const SERVICES_YAML: &str = r#"
- service-name: svc-a
  service-cohorts:
    - cohort-name: "00"
      client-ids: [100]
  service-experiments:
    - experiment-name: checkout
      treatments:
        - treatment-name: t1
          treatment-route:
            target-pattern: "/route/{{ client_id }}"
          assigned-cohorts: ["00"]
    - default-experiment: true
      treatments:
        - treatment-name: t0
          treatment-route:
            target-pattern: "/default"
          default-treatment: true
"#;

/// A router running on an ephemeral port.
pub struct TestRouter {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub updates: mpsc::UnboundedSender<RoutingTable>,
}

impl TestRouter {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Start the HTTP server serving the given routing document.
pub async fn start_router(yaml: &str) -> TestRouter {
    let table = RoutingTable::from_yaml(yaml).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let mut config = RouterConfig::default();
    config.listener.bind_address = addr.to_string();
    config.routing.watch = false;

    let shutdown = Shutdown::new();
    let (updates, rx) = mpsc::unbounded_channel();
    let server = HttpServer::new(config, table);
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx, shutdown_rx).await.unwrap();
    });

    TestRouter {
        addr,
        shutdown,
        updates,
    }
}
