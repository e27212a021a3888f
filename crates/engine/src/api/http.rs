//! HTTP routes.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use futures_util::{future, stream, Stream, StreamExt};
use serde::Serialize;
use serde_json::json;

use storypulse_protocol::{ChatCompletion, ChatCompletionChunk, ChatRequest};

use crate::app::App;
use crate::infrastructure::ports::DispatchError;
use crate::infrastructure::reframe::{ReframeEvent, Reframer};
use crate::infrastructure::upstream::DispatchRequest;

/// Interval between `: ping` keep-alive comments on streaming responses.
const HEARTBEAT_SECS: u64 = 15;

/// Create all HTTP routes.
pub fn routes() -> Router<Arc<App>> {
    Router::new()
        .route("/", get(health))
        .route("/api/health", get(health))
        .route("/api/chat", post(chat))
        .route("/api/chat/stream", post(chat_stream))
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    ok: bool,
    upstream: String,
    mode: &'static str,
}

/// Read-only probe reporting the configured upstream address and the
/// detected API flavor.
async fn health(State(app): State<Arc<App>>) -> Json<HealthStatus> {
    Json(HealthStatus {
        ok: true,
        upstream: app.config.upstream_url.clone(),
        mode: app.config.flavor.as_str(),
    })
}

async fn chat(
    State(app): State<Arc<App>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatCompletion>, ApiError> {
    let dispatch = DispatchRequest::prepare(request, &app.adapter, &app.config.default_model);
    let model = dispatch.model.clone();

    let reply = app.upstream.dispatch(&dispatch).await?;

    let finish_reason = reply.finish_reason;
    Ok(Json(ChatCompletion::new(
        &model,
        reply.into_message(),
        finish_reason,
    )))
}

async fn chat_stream(
    State(app): State<Arc<App>>,
    Json(request): Json<ChatRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let dispatch = DispatchRequest::prepare(request, &app.adapter, &app.config.default_model);
    let model = dispatch.model.clone();

    let upstream = app.upstream.dispatch_stream(&dispatch).await?;
    let flavor = app.config.flavor;

    // A trailing `None` sentinel lets the reframer flush a final line that
    // never received its newline before the upstream closed.
    let frames = upstream
        .bytes_stream()
        .map(Some)
        .chain(stream::once(future::ready(None)))
        .scan(Reframer::new(flavor), move |reframer, item| {
            let events = match item {
                Some(Ok(chunk)) => reframer.push(chunk.as_ref()),
                Some(Err(error)) => {
                    tracing::warn!(error = %error, "upstream stream error, closing");
                    Vec::new()
                }
                None => reframer.finish(),
            };
            let frames: Vec<Result<Event, Infallible>> = events
                .into_iter()
                .map(|event| Ok(sse_frame(&model, event)))
                .collect();
            future::ready(Some(stream::iter(frames)))
        })
        .flatten();

    // The keep-alive timer lives inside the Sse response, so client
    // disconnect, upstream end, and upstream error all release it when
    // the response stream drops.
    Ok(Sse::new(frames).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(HEARTBEAT_SECS))
            .text("ping"),
    ))
}

fn sse_frame(model: &str, event: ReframeEvent) -> Event {
    match event {
        ReframeEvent::Delta(content) => chunk_frame(&ChatCompletionChunk::delta(model, content)),
        ReframeEvent::Stop => chunk_frame(&ChatCompletionChunk::stop(model)),
        ReframeEvent::Done => Event::default().data("[DONE]"),
    }
}

fn chunk_frame(chunk: &ChatCompletionChunk) -> Event {
    match serde_json::to_string(chunk) {
        Ok(payload) => Event::default().data(payload),
        Err(_) => Event::default().comment("chunk serialization failed"),
    }
}

/// Error response carrying the upstream's status code and, when present,
/// its error payload for diagnostics.
#[derive(Debug)]
pub enum ApiError {
    Dispatch(DispatchError),
}

impl From<DispatchError> for ApiError {
    fn from(error: DispatchError) -> Self {
        ApiError::Dispatch(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::Dispatch(error) => {
                let status = StatusCode::from_u16(error.status_code())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                let mut body = json!({"error": error.to_string()});
                if let Some(upstream) = error.upstream_body() {
                    body["upstream"] = upstream.clone();
                }
                tracing::error!(status = status.as_u16(), error = %error, "dispatch failed");
                (status, Json(body)).into_response()
            }
        }
    }
}
