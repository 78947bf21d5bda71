//! Control and ingest HTTP API
//!
//! The front door external code drives the pipeline through: message batches
//! are POSTed to `/messages`, the speaking toggle maps to
//! `/speech/enable` and `/speech/disable`, and `/health` reports liveness.
//! An ingest response is sent once the pipeline fires the event's completion
//! signal, so the originator holds its resources exactly as long as the
//! event is in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::pipeline::{CompletionSink, PipelineController, SequenceToken};

/// How long an ingest request waits for its completion signal
const COMPLETION_WAIT: Duration = Duration::from_secs(30);

/// Assigns sequence tokens and routes completion signals back to waiting
/// ingest requests
pub struct IngestTracker {
    next: AtomicU64,
    pending: std::sync::Mutex<HashMap<SequenceToken, oneshot::Sender<()>>>,
}

impl IngestTracker {
    /// Create an empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
            pending: std::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Allocate a token and the channel its completion will arrive on
    fn register(&self) -> (SequenceToken, oneshot::Receiver<()>) {
        let token = self.next.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(token, tx);
        }
        (token, rx)
    }

    /// Drop a registration whose event never entered the queue
    fn forget(&self, token: SequenceToken) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&token);
        }
    }
}

impl Default for IngestTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionSink for IngestTracker {
    fn complete(&self, token: SequenceToken) {
        let sender = self
            .pending
            .lock()
            .ok()
            .and_then(|mut pending| pending.remove(&token));
        match sender {
            Some(tx) => {
                let _ = tx.send(());
            }
            None => {
                // Waiter gave up; the event was still fully handled
                tracing::debug!(sequence = token, "completion for abandoned ingest request");
            }
        }
    }
}

/// Shared API state
struct ApiState {
    controller: Arc<PipelineController>,
    ingest: Arc<IngestTracker>,
}

/// Control/ingest API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server over the pipeline controller
    #[must_use]
    pub fn new(
        controller: Arc<PipelineController>,
        ingest: Arc<IngestTracker>,
        port: u16,
    ) -> Self {
        Self {
            state: Arc::new(ApiState { controller, ingest }),
            port,
        }
    }

    fn router(state: Arc<ApiState>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/speech", get(speech_status))
            .route("/speech/enable", post(speech_enable))
            .route("/speech/disable", post(speech_disable))
            .route("/messages", post(ingest_messages))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind and serve until the process exits
    ///
    /// # Errors
    ///
    /// Returns error if the port cannot be bound
    pub async fn serve(self) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", self.port)).await?;
        tracing::info!(port = self.port, "API server listening");
        axum::serve(listener, Self::router(self.state)).await?;
        Ok(())
    }

    /// Serve on a background task, logging a fatal bind/serve error
    pub fn spawn(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.serve().await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    }
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    speech: String,
}

/// Speech state response
#[derive(Serialize)]
struct SpeechResponse {
    state: String,
    ready: bool,
}

/// Ingest response
#[derive(Serialize)]
struct IngestResponse {
    sequence: SequenceToken,
    status: &'static str,
}

/// Liveness probe
async fn health(State(state): State<Arc<ApiState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        speech: state.controller.engine_state().await.to_string(),
    })
}

/// Current speech engine state
async fn speech_status(State(state): State<Arc<ApiState>>) -> Json<SpeechResponse> {
    let engine_state = state.controller.engine_state().await;
    Json(SpeechResponse {
        state: engine_state.to_string(),
        ready: engine_state == crate::speech::EngineState::Ready,
    })
}

/// Turn speaking on; initialization completes in the background
async fn speech_enable(State(state): State<Arc<ApiState>>) -> (StatusCode, Json<SpeechResponse>) {
    state.controller.enable().await;
    let engine_state = state.controller.engine_state().await;
    (
        StatusCode::ACCEPTED,
        Json(SpeechResponse {
            state: engine_state.to_string(),
            ready: engine_state == crate::speech::EngineState::Ready,
        }),
    )
}

/// Turn speaking off
async fn speech_disable(State(state): State<Arc<ApiState>>) -> Json<SpeechResponse> {
    state.controller.disable().await;
    let engine_state = state.controller.engine_state().await;
    Json(SpeechResponse {
        state: engine_state.to_string(),
        ready: false,
    })
}

/// Accept one message batch payload
async fn ingest_messages(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> (StatusCode, Json<IngestResponse>) {
    let (sequence, completed) = state.ingest.register();

    if let Err(e) = state.controller.on_arrival_event(body.to_vec(), sequence) {
        state.ingest.forget(sequence);
        tracing::warn!(sequence, error = %e, "ingest rejected");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(IngestResponse {
                sequence,
                status: "rejected",
            }),
        );
    }

    match tokio::time::timeout(COMPLETION_WAIT, completed).await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(IngestResponse {
                sequence,
                status: "processed",
            }),
        ),
        Ok(Err(_)) | Err(_) => {
            // Still queued; the completion signal will fire eventually
            state.ingest.forget(sequence);
            (
                StatusCode::ACCEPTED,
                Json(IngestResponse {
                    sequence,
                    status: "accepted",
                }),
            )
        }
    }
}
