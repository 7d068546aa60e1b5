//! Axum-based HTTP server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use vetting_utils::spans;
use vetting_verification::VerificationService;

use crate::error::RpcError;
use crate::handlers;
use crate::metrics::RpcMetrics;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VerificationService>,
    /// `None` when metrics are disabled; `/metrics` then answers 404.
    pub metrics: Option<Arc<RpcMetrics>>,
}

impl AppState {
    pub fn new(service: Arc<VerificationService>) -> Self {
        Self {
            service,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<RpcMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// Build the full router: the verification API under `/api/verification`
/// plus `/health` and `/metrics`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/submit", post(handlers::submit))
        .route("/status", get(handlers::own_status))
        .route("/status/:user_id", get(handlers::status))
        .route("/history/:user_id", get(handlers::history))
        .route("/requests", get(handlers::list_requests))
        .route("/requests/:id", get(handlers::get_request))
        .route("/requests/:id/review", post(handlers::review));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .nest("/api/verification", api)
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                spans::http_request_span(req.method().as_str(), req.uri().path())
            }),
        )
        .layer(cors)
        .with_state(state)
}

pub struct RpcServer {
    addr: SocketAddr,
    state: AppState,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("failed to bind {}: {e}", self.addr)))?;
        info!(addr = %self.addr, "verification API listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))
    }
}
