mod app_error;
mod handlers;

use anyhow::{Context, Result};
use axum::{
    Router,
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use tracing::info;

pub use handlers::RecordView;

use crate::{
    config::ServerSettings,
    producer::Producer,
    server::handlers::{get_records, post_produce, post_transform},
    sink::InMemorySink,
};

/// Shared application state.
struct AppState {
    producer: Producer,
    sink: Arc<InMemorySink>,
}

/// Shows the server is running and what it offers.
async fn welcome() -> impl IntoResponse {
    "Sales pipeline up: POST /produce to fill the stream, POST /transform to run a Firehose batch."
}

/// Creates a new server backed by a fresh in-memory sink. Used for testing, too.
pub fn make_server(settings: &ServerSettings) -> Router {
    let sink = Arc::new(
        InMemorySink::new()
            .with_shards(settings.sink_shards)
            .with_latency(settings.sink_latency),
    );
    let producer = Producer::new(sink.clone(), &settings.producer);
    let shared_state = Arc::new(AppState { producer, sink });
    Router::new()
        .route("/transform", post(post_transform))
        .route("/produce", post(post_produce))
        .route("/records", get(get_records))
        .route("/", get(welcome))
        .with_state(shared_state)
}

/// Starts the server on the configured port.
pub async fn serve(settings: &ServerSettings) -> Result<()> {
    let app = make_server(settings);
    let port = settings.port;

    info!("Listening on http://localhost:{port}");
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .with_context(|| format!("Failed to bind to port {port}"))?;

    axum::serve(listener, app)
        .await
        .with_context(|| "Failed to start server")
}
