//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Resolve and render treatment routes per request
//! - Swap in routing tables received from the reload channel
//! - Stop on the shutdown broadcast

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{Path, RawQuery, State},
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RouterConfig;
use crate::http::request::{self, InvalidClientId, UuidRequestId, X_REQUEST_ID};
use crate::observability::metrics::{self, Outcome};
use crate::routing::{ClientId, ResolveError, RouteRenderer, RoutingStore, RoutingTable};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routing: Arc<RoutingStore>,
    pub renderer: Arc<RouteRenderer>,
}

/// Body of a successful resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRoute {
    pub service: String,
    pub treatment: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cohort: Option<String>,
    pub client_id: Option<ClientId>,
    pub target: String,
}

/// HTTP server for treatment resolution.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
    routing: Arc<RoutingStore>,
}

impl HttpServer {
    /// Create a new HTTP server serving `table`.
    pub fn new(config: RouterConfig, table: RoutingTable) -> Self {
        let routing = Arc::new(RoutingStore::new(table));
        let state = AppState {
            routing: routing.clone(),
            renderer: Arc::new(RouteRenderer::new()),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            routing,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/services/{service}", get(resolve_handler))
            .route("/health", get(health_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::new(X_REQUEST_ID, UuidRequestId))
                    .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                        let request_id = request
                            .headers()
                            .get(X_REQUEST_ID)
                            .and_then(|v| v.to_str().ok())
                            .unwrap_or("unknown");
                        tracing::info_span!(
                            "request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id,
                        )
                    }))
                    .layer(PropagateRequestIdLayer::new(X_REQUEST_ID))
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// The Axum router, for driving requests without a listener.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Store holding the active routing table.
    pub fn routing(&self) -> Arc<RoutingStore> {
        self.routing.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Tables received on `routing_updates` replace the active one.
    pub async fn run(
        self,
        listener: TcpListener,
        mut routing_updates: mpsc::UnboundedReceiver<RoutingTable>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let store = self.routing.clone();
        let updates = tokio::spawn(async move {
            while let Some(table) = routing_updates.recv().await {
                store.replace(table);
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        updates.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// `GET /services/{service}?client-id=<id>&...`
async fn resolve_handler(
    State(state): State<AppState>,
    Path(service): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    let start = Instant::now();
    let pairs = request::query_pairs(query.as_deref());
    let table = state.routing.snapshot();
    let known = table.contains_service(&service).then_some(service.as_str());

    let client_id = match request::client_id(&pairs) {
        Ok(id) => id,
        Err(InvalidClientId(value)) => {
            tracing::debug!(service = %service, client_id = %value, "Invalid client id");
            metrics::record_resolution(known, Outcome::BadRequest, start);
            return (
                StatusCode::BAD_REQUEST,
                format!("client-id must be a non-negative integer, got '{}'", value),
            )
                .into_response();
        }
    };

    let resolution = match table.resolve_treatment(&service, client_id) {
        Ok(resolution) => resolution,
        Err(ResolveError::NotFound(_)) => {
            tracing::debug!(service = %service, "Unknown service");
            metrics::record_resolution(None, Outcome::NotFound, start);
            return (StatusCode::NOT_FOUND, "Not Found").into_response();
        }
        Err(e) => {
            tracing::error!(service = %service, client_id = ?client_id, error = %e, "Resolution failed");
            metrics::record_resolution(known, Outcome::Error, start);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Routing configuration error").into_response();
        }
    };

    let target = match state.renderer.render(resolution.route, client_id, &pairs) {
        Ok(target) => target,
        Err(e) => {
            tracing::error!(
                service = %service,
                treatment = %resolution.treatment,
                error = %e,
                "Failed to render target pattern"
            );
            metrics::record_resolution(known, Outcome::Error, start);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Routing configuration error").into_response();
        }
    };

    let outcome = if resolution.is_default() {
        Outcome::Default
    } else {
        Outcome::Treatment
    };
    metrics::record_resolution(known, outcome, start);
    tracing::info!(
        service = %service,
        client_id = ?client_id,
        treatment = %resolution.treatment,
        target = %target,
        "Resolved treatment route"
    );

    Json(ResolvedRoute {
        service: resolution.service.to_string(),
        treatment: resolution.treatment.to_string(),
        cohort: resolution.cohort.map(ToString::to_string),
        client_id,
        target,
    })
    .into_response()
}

async fn health_handler() -> &'static str {
    "ok"
}
