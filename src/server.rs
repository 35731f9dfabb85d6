//! Thin HTTP transport in front of the event and alert paths.
//!
//! - `PUT|POST /v1/process/events`: a JSON array of events, handed to the
//!   ingress gate.
//! - `PUT|POST /v1/process/alerts`: a JSON array of already-decided alert
//!   records, handed to the notification manager.
//! - `GET /v1/health`: liveness.

use crate::core::{Event, Message};
use crate::events::IngressGate;
use async_channel::Sender;
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{error, info, warn};

#[derive(Clone)]
pub struct ServerState {
    pub gate: Arc<IngressGate>,
    pub alerts_tx: Sender<Vec<Message>>,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/v1/process/events", put(process_events).post(process_events))
        .route("/v1/process/alerts", put(process_alerts).post(process_alerts))
        .route("/v1/health", get(|| async { "OK" }))
        .with_state(state)
}

async fn process_events(
    State(state): State<ServerState>,
    Json(events): Json<Vec<Event>>,
) -> StatusCode {
    if state.gate.admit(events).await.is_accepted() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn process_alerts(
    State(state): State<ServerState>,
    Json(alerts): Json<Vec<Message>>,
) -> StatusCode {
    metrics::counter!("alert_batches_received_total").increment(1);
    match state.alerts_tx.send(alerts).await {
        Ok(()) => StatusCode::OK,
        Err(_) => {
            warn!("Notification pipeline is closed, alert batch dropped");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// The HTTP transport, bound but not yet serving.
pub struct HttpServer {
    listener: TcpListener,
    router: Router,
    shutdown_rx: watch::Receiver<bool>,
}

impl HttpServer {
    pub fn new(listener: TcpListener, state: ServerState, shutdown_rx: watch::Receiver<bool>) -> Self {
        Self {
            listener,
            router: router(state),
            shutdown_rx,
        }
    }

    /// Returns a future that serves requests until shutdown is signalled.
    pub fn run(self) -> impl Future<Output = ()> {
        let Self {
            listener,
            router,
            mut shutdown_rx,
        } = self;
        async move {
            if let Ok(addr) = listener.local_addr() {
                info!(%addr, "HTTP transport listening");
            }
            let shutdown = async move {
                let _ = shutdown_rx.changed().await;
                info!("HTTP transport received shutdown signal.");
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("HTTP transport error: {}", e);
            }
        }
    }
}
