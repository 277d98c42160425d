// Axum request handlers — relay endpoint and health probe.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::health::HealthReport;
use crate::relay::{HeadersPayload, RelayError, RelayRequest, SegmentRelay};

pub const RELAY_PATH: &str = "/ts-proxy";
pub const HEALTH_PATH: &str = "/health";

pub struct RelayServer {
    addr: SocketAddr,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl RelayServer {
    /// Bind `addr` (port 0 picks a free one) and serve in the background.
    pub async fn start(addr: SocketAddr, relay: Arc<SegmentRelay>) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        let app = router(relay);

        let task = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
            if let Err(e) = served {
                warn!("relay server stopped with error: {}", e);
            }
        });

        info!("relay server listening on {}", addr);
        Ok(Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Relay URL for a target segment and a JSON headers payload.
    pub fn relay_url(&self, target: &str, headers_json: &str) -> String {
        format!(
            "http://127.0.0.1:{}{}?url={}&headers={}",
            self.port(),
            RELAY_PATH,
            urlencoding::encode(target),
            urlencoding::encode(headers_json)
        )
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port(), path)
    }

    /// Stop accepting connections and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            warn!("relay server task failed: {}", e);
        }
    }
}

pub fn router(relay: Arc<SegmentRelay>) -> Router {
    Router::new()
        .route(RELAY_PATH, get(relay_query_handler).post(relay_body_handler))
        .route(HEALTH_PATH, get(health_handler))
        .with_state(relay)
}

#[derive(Debug, Default, Deserialize)]
struct RelayQuery {
    url: Option<String>,
    headers: Option<String>,
}

/// GET /ts-proxy?url=...&headers=... — headers arrive as a JSON string.
async fn relay_query_handler(
    State(relay): State<Arc<SegmentRelay>>,
    query: Result<Query<RelayQuery>, QueryRejection>,
) -> Response {
    if relay.is_disabled() {
        return RelayError::Disabled.into_response();
    }
    let query = match query {
        Ok(Query(query)) => query,
        Err(rejection) => {
            debug!("relay query rejected: {}", rejection.body_text());
            return RelayError::InvalidRequest("Invalid query string".to_string())
                .into_response();
        }
    };
    let request = RelayRequest {
        target_url: query.url.unwrap_or_default(),
        headers: query
            .headers
            .map(HeadersPayload::Raw)
            .unwrap_or_default(),
    };
    relay.relay(request).await
}

/// POST /ts-proxy — `{ "url": ..., "headers": {...} | "..." }`.
async fn relay_body_handler(
    State(relay): State<Arc<SegmentRelay>>,
    body: Result<Json<RelayRequest>, JsonRejection>,
) -> Response {
    if relay.is_disabled() {
        return RelayError::Disabled.into_response();
    }
    match body {
        Ok(Json(request)) => relay.relay(request).await,
        Err(rejection) => {
            debug!("relay body rejected: {}", rejection.body_text());
            RelayError::InvalidRequest("Invalid request body".to_string()).into_response()
        }
    }
}

/// GET /health — liveness and memory snapshot.
async fn health_handler() -> Json<HealthReport> {
    Json(HealthReport::capture())
}
