//! Wildberries (by.wildberries.ru) marketplace
//!
//! Search is two-step: the exact-match endpoint resolves the query to a shard
//! key and a pre-built query fragment, which then selects the catalog page.

use std::sync::Arc;

use async_trait::async_trait;
use deals_core::{
    ApiResponse, CurrencyExchangeService, GameSearchResult, ItemPredicate, Price, Result,
    ResultFactory, SearchClient, SearchError, SearchService,
};
use serde_json::Value;

use crate::http::JsonHttpClient;

pub const SOURCE: &str = "wildberries";

const BASE_SEARCH_URL: &str = "https://wbxsearch-by.wildberries.ru";
const BASE_CATALOG_URL: &str = "https://wbxcatalog-sng.wildberries.ru";
const SEARCH_PATH: &str = "/exactmatch/common";
const ITEM_URL: &str = "https://by.wildberries.ru/catalog";
const IMAGE_URL: &str = "https://images.wbstatic.net/big/new";

pub struct WildberriesClient {
    search: JsonHttpClient,
    catalog: JsonHttpClient,
}

impl WildberriesClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            search: JsonHttpClient::new(http.clone(), BASE_SEARCH_URL),
            catalog: JsonHttpClient::new(http, BASE_CATALOG_URL),
        }
    }
}

#[async_trait]
impl SearchClient for WildberriesClient {
    async fn search(&self, query: &str) -> Result<ApiResponse> {
        let shard = self.search.get(SEARCH_PATH, &[("query", query)]).await?;
        let shard_key = shard.payload["shardKey"].as_str().ok_or_else(|| {
            SearchError::MalformedPayload("wildberries: shard lookup had no shardKey".into())
        })?;
        let query_fragment = shard.payload["query"].as_str().ok_or_else(|| {
            SearchError::MalformedPayload("wildberries: shard lookup had no query".into())
        })?;
        let path = format!("/{shard_key}/catalog?{query_fragment}");
        self.catalog
            .get(&path, &[("locale", "by"), ("lang", "ru"), ("curr", "byn")])
            .await
    }
}

fn items(payload: &Value) -> Option<&Vec<Value>> {
    payload["data"]["products"].as_array()
}

/// Keep only products from the board-game subject category.
pub fn board_game_predicate(subject_id: i64) -> ItemPredicate {
    Box::new(move |item, _query| item["subjectId"].as_i64() == Some(subject_id))
}

pub struct WildberriesResultFactory;

impl ResultFactory for WildberriesResultFactory {
    fn create(&self, raw: &Value) -> GameSearchResult {
        let id = raw["id"].as_i64();
        GameSearchResult {
            description: String::new(),
            images: id
                .map(|id| {
                    let id = id.to_string();
                    let prefix = if id.len() >= 4 { &id[..4] } else { &id[..] };
                    vec![format!("{IMAGE_URL}/{prefix}0000/{id}-1.jpg")]
                })
                .unwrap_or_default(),
            location: None,
            owner: None,
            prices: raw["salePriceU"].as_i64().map(Price::byn).into_iter().collect(),
            source: SOURCE.into(),
            subject: format!(
                "{} / {}",
                raw["brand"].as_str().unwrap_or_default(),
                raw["name"].as_str().unwrap_or_default()
            ),
            url: id
                .map(|id| format!("{ITEM_URL}/{id}/detail.aspx"))
                .unwrap_or_default(),
        }
    }
}

pub fn service(
    http: reqwest::Client,
    subject_id: i64,
    converter: Arc<CurrencyExchangeService>,
) -> SearchService {
    SearchService::new(
        SOURCE,
        Arc::new(WildberriesClient::new(http)),
        items,
        Some(board_game_predicate(subject_id)),
        Arc::new(WildberriesResultFactory),
        converter,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn predicate_keeps_only_configured_subject() {
        let keep = board_game_predicate(1347);
        assert!(keep(&json!({"subjectId": 1347}), "monopoly"));
        assert!(!keep(&json!({"subjectId": 8}), "monopoly"));
        assert!(!keep(&json!({"name": "no subject"}), "monopoly"));
    }

    #[test]
    fn builds_result_with_derived_urls() {
        let raw = json!({
            "id": 12345678,
            "brand": "Hasbro",
            "name": "Monopoly",
            "salePriceU": 9900,
            "subjectId": 1347
        });

        let result = WildberriesResultFactory.create(&raw);

        assert_eq!(result.subject, "Hasbro / Monopoly");
        assert_eq!(result.prices, vec![Price::byn(9900)]);
        assert_eq!(result.url, "https://by.wildberries.ru/catalog/12345678/detail.aspx");
        assert_eq!(
            result.images,
            vec!["https://images.wbstatic.net/big/new/12340000/12345678-1.jpg"]
        );
    }

    #[test]
    fn items_live_under_data_products() {
        let payload = json!({"data": {"products": [{"id": 1}]}});
        assert_eq!(items(&payload).unwrap().len(), 1);
        assert!(items(&json!({"data": {}})).is_none());
    }
}
