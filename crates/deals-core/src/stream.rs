//! Deal-Finder Stream
//!
//! Walks every registered adapter once, sequentially, emitting an `update`
//! event as soon as a source answers with results and one terminal `end`
//! event after the last adapter. Sequential iteration (unlike the concurrent
//! single-shot fan-out) is what lets the consumer see results before the
//! slowest source finishes; the single pass bounds total latency by the
//! slowest adapter instead of polling forever.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, Stream};
use serde::Serialize;

use crate::model::GameSearchResult;
use crate::search::{search_all, SearchService};

/// Client-side retry hint attached to every emitted event.
pub const RETRY_HINT: Duration = Duration::from_secs(5);

/// Consumer-disconnection probe, consulted before each adapter call.
///
/// This is the stream's only cancellation mechanism, checked at adapter
/// granularity. The server maps it onto the transport's disconnect signal;
/// tests script it directly.
pub trait ConnectionProbe: Send + Sync {
    fn is_disconnected(&self) -> bool;
}

/// Probe for transports whose disconnects cancel the stream by dropping it.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverDisconnected;

impl ConnectionProbe for NeverDisconnected {
    fn is_disconnected(&self) -> bool {
        false
    }
}

/// Incremental event delivered to the streaming consumer.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum SearchEvent {
    /// One source answered with at least one result
    Update { results: Vec<GameSearchResult> },

    /// All sources have been tried once
    End { elapsed_ms: u64 },
}

/// Drives full search rounds across all registered adapters.
#[derive(Clone)]
pub struct DealFinder {
    services: Arc<Vec<SearchService>>,
}

impl DealFinder {
    pub fn new(services: Vec<SearchService>) -> Self {
        Self {
            services: Arc::new(services),
        }
    }

    /// Registered marketplace identifiers, in iteration order.
    pub fn sources(&self) -> Vec<&str> {
        self.services.iter().map(SearchService::source).collect()
    }

    /// Single-shot search: one concurrent fan-out round, merged and sorted by
    /// ascending native price.
    pub async fn search(&self, query: &str) -> Vec<GameSearchResult> {
        search_all(&self.services, query).await
    }

    /// Incremental search: one sequential pass over all adapters.
    ///
    /// Emits an [`SearchEvent::Update`] for every adapter that returns a
    /// non-empty batch, then exactly one [`SearchEvent::End`] with elapsed
    /// wall-clock time. If the probe reports a disconnect, the stream stops
    /// before the next adapter without a terminal event - the consumer is
    /// gone.
    pub fn stream(
        &self,
        query: String,
        probe: Arc<dyn ConnectionProbe>,
    ) -> impl Stream<Item = SearchEvent> + use<> {
        let services = Arc::clone(&self.services);
        let started = Instant::now();
        // state: index of the next adapter to try; None once terminal
        stream::unfold(Some(0_usize), move |state| {
            let services = Arc::clone(&services);
            let probe = Arc::clone(&probe);
            let query = query.clone();
            async move {
                let mut next = state?;
                while next < services.len() {
                    if probe.is_disconnected() {
                        tracing::info!("client disconnected, aborting search stream");
                        return None;
                    }
                    let results = services[next].search(&query).await;
                    next += 1;
                    if !results.is_empty() {
                        return Some((SearchEvent::Update { results }, Some(next)));
                    }
                }
                let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                Some((SearchEvent::End { elapsed_ms }, None))
            }
        })
    }
}
