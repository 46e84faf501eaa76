//! Source Adapters & Search Orchestration
//!
//! Every marketplace is the same generic [`SearchService`] with four injected
//! strategies: a transport client, an extractor locating the item list inside
//! the raw payload, an availability predicate and a result factory. The
//! orchestration discipline is catch-per-source, log-don't-throw, degrade-to-
//! empty: one misbehaving marketplace never aborts or taints the aggregate.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::Value;

use crate::currency::CurrencyExchangeService;
use crate::error::{Result, SearchError};
use crate::model::{GameSearchResult, BYN, RUB, USD};

/// Per-call deadline for one marketplace round trip.
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Raw response from an external transport client.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    /// Source-specific payload, opaque to the orchestrator
    pub payload: Value,
    pub status: u16,
}

/// External transport client for one marketplace.
///
/// Per-source parameters (category ids, app ids, tokens) are baked into the
/// implementing struct at construction. The only contract: structured data
/// back, or a transport error.
#[async_trait]
pub trait SearchClient: Send + Sync {
    async fn search(&self, query: &str) -> Result<ApiResponse>;
}

/// Pure mapping from one raw record to a normalized result.
///
/// Must not fail: missing optional fields default to empty string/vec/`None`.
/// When the record carries a price, `prices[0]` is the best available native
/// price.
pub trait ResultFactory: Send + Sync {
    fn create(&self, raw: &Value) -> GameSearchResult;
}

/// Locates the list of raw records inside a source-specific payload tree.
pub type ItemsExtractor = fn(&Value) -> Option<&Vec<Value>>;

/// Availability/category predicate; receives the raw record and the query
/// (some sources can only be filtered by text match).
pub type ItemPredicate = Box<dyn Fn(&Value, &str) -> bool + Send + Sync>;

/// One marketplace adapter plus its defensive orchestration.
pub struct SearchService {
    source: String,
    client: Arc<dyn SearchClient>,
    items: ItemsExtractor,
    predicate: Option<ItemPredicate>,
    factory: Arc<dyn ResultFactory>,
    converter: Arc<CurrencyExchangeService>,
    timeout: Duration,
}

impl SearchService {
    pub fn new(
        source: impl Into<String>,
        client: Arc<dyn SearchClient>,
        items: ItemsExtractor,
        predicate: Option<ItemPredicate>,
        factory: Arc<dyn ResultFactory>,
        converter: Arc<CurrencyExchangeService>,
    ) -> Self {
        Self {
            source: source.into(),
            client,
            items,
            predicate,
            factory,
            converter,
            timeout: SEARCH_TIMEOUT,
        }
    }

    /// Override the per-call deadline (tests use a short one).
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Marketplace identifier this adapter was registered under.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Execute this adapter's query defensively.
    ///
    /// Transport errors, malformed payloads and timeouts are logged with the
    /// source identity and degrade to an empty vec - they never propagate.
    /// Successful results come back with the conversion chain appended.
    pub async fn search(&self, query: &str) -> Vec<GameSearchResult> {
        tracing::info!(source = %self.source, query, "searching");
        let results = match tokio::time::timeout(self.timeout, self.do_search(query)).await {
            Ok(Ok(results)) => results,
            Ok(Err(err)) => {
                tracing::warn!(source = %self.source, %err, "search failed");
                return vec![];
            }
            Err(_) => {
                let err = SearchError::Timeout(self.timeout);
                tracing::warn!(source = %self.source, %err, "search failed");
                return vec![];
            }
        };
        let mut priced = Vec::with_capacity(results.len());
        for result in results {
            priced.push(self.with_converted_prices(result).await);
        }
        priced
    }

    async fn do_search(&self, query: &str) -> Result<Vec<GameSearchResult>> {
        let response = self.client.search(query).await?;
        let items = (self.items)(&response.payload).ok_or_else(|| {
            SearchError::MalformedPayload(format!("{}: no item list in payload", self.source))
        })?;
        Ok(items
            .iter()
            .filter(|item| self.predicate.as_ref().is_none_or(|keep| keep(item, query)))
            .map(|item| self.factory.create(item))
            .collect())
    }

    /// Append derived conversions after the native price.
    ///
    /// BYN gets the USD display price; RUB chains RUB->BYN->USD because the
    /// provider publishes rates against the base currency only. Unavailable
    /// rates leave the native price standing alone.
    async fn with_converted_prices(&self, mut result: GameSearchResult) -> GameSearchResult {
        let Some(native) = result.prices.first().cloned() else {
            return result;
        };
        if native.currency == BYN {
            if let Some(usd) = self.converter.convert(&native, USD).await {
                result.prices.push(usd);
            }
        } else if native.currency == RUB {
            if let Some(byn) = self.converter.convert(&native, BYN).await {
                result.prices.push(byn.clone());
                if let Some(usd) = self.converter.convert(&byn, USD).await {
                    result.prices.push(usd);
                }
            }
        }
        result
    }
}

/// One fan-out round: query every adapter concurrently, merge and sort by
/// ascending native price (a missing price sorts as 0, i.e. first). The sort
/// is stable, so equal keys keep adapter-registration order.
pub async fn search_all(services: &[SearchService], query: &str) -> Vec<GameSearchResult> {
    let rounds = services.iter().map(|service| service.search(query));
    let mut results: Vec<GameSearchResult> =
        join_all(rounds).await.into_iter().flatten().collect();
    results.sort_by_key(GameSearchResult::sort_price);
    results
}
