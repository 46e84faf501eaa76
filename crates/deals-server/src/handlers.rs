//! HTTP/SSE Handlers

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use deals_core::stream::RETRY_HINT;
use deals_core::{GameSearchResult, NeverDisconnected, SearchEvent};

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    /// Free-text game query
    pub q: String,
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        sources: state
            .finder
            .sources()
            .into_iter()
            .map(ToString::to_string)
            .collect(),
    })
}

/// Single-shot search: one concurrent fan-out round, merged and price-sorted.
///
/// Never fails because of one misbehaving source - those degrade to fewer
/// results.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<Vec<GameSearchResult>> {
    Json(state.finder.search(&params.q).await)
}

/// Incremental search over server-sent events.
///
/// One `update` event per source that found something, then a terminal `end`
/// event with elapsed time. A client disconnect drops the stream between
/// adapter calls, which cancels the remaining sources.
pub async fn stream_search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let events = state
        .finder
        .stream(params.q, Arc::new(NeverDisconnected))
        .map(|event| Ok(sse_event(&event)));
    Sse::new(events).keep_alive(KeepAlive::default())
}

fn sse_event(event: &SearchEvent) -> Event {
    let (name, data) = encode_event(event);
    Event::default().event(name).retry(RETRY_HINT).data(data)
}

/// Wire name and JSON data for one stream event.
fn encode_event(event: &SearchEvent) -> (&'static str, String) {
    let (name, payload) = match event {
        SearchEvent::Update { results } => ("update", serde_json::to_string(results)),
        SearchEvent::End { elapsed_ms } => (
            "end",
            serde_json::to_string(&serde_json::json!({ "elapsed_ms": elapsed_ms })),
        ),
    };
    match payload {
        Ok(data) => (name, data),
        Err(err) => {
            tracing::error!(%err, "failed to serialize sse payload");
            (name, "{}".into())
        }
    }
}
