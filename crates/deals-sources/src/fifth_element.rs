//! 5element.by electronics shop (multisearch.io backend)

use std::sync::Arc;

use async_trait::async_trait;
use deals_core::{
    ApiResponse, CurrencyExchangeService, GameSearchResult, ItemPredicate, Price, Result,
    ResultFactory, SearchClient, SearchService,
};
use serde_json::Value;

use crate::http::JsonHttpClient;

pub const SOURCE: &str = "5element";

const BASE_SEARCH_URL: &str = "https://api.multisearch.io";
const BASE_URL: &str = "https://5element.by";

pub struct FifthElementClient {
    http: JsonHttpClient,
    search_app_id: String,
}

impl FifthElementClient {
    pub fn new(http: reqwest::Client, search_app_id: impl Into<String>) -> Self {
        Self {
            http: JsonHttpClient::new(http, BASE_SEARCH_URL),
            search_app_id: search_app_id.into(),
        }
    }
}

#[async_trait]
impl SearchClient for FifthElementClient {
    async fn search(&self, query: &str) -> Result<ApiResponse> {
        self.http
            .get(
                "",
                &[
                    ("query", query),
                    ("id", &self.search_app_id),
                    ("lang", "ru"),
                    ("autocomplete", "true"),
                ],
            )
            .await
    }
}

fn items(payload: &Value) -> Option<&Vec<Value>> {
    payload["results"]["items"].as_array()
}

/// Keep in-stock items from the configured board-game categories.
///
/// The shop files board games under several category ids, hence the set.
pub fn board_game_predicate(category_ids: Vec<String>) -> ItemPredicate {
    Box::new(move |item, _query| {
        if item["is_presence"].as_bool() != Some(true) {
            return false;
        }
        let category = &item["params_data"]["category_id"];
        let category = match category {
            Value::String(id) => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return false,
        };
        category_ids.contains(&category)
    })
}

pub struct FifthElementResultFactory;

impl ResultFactory for FifthElementResultFactory {
    fn create(&self, raw: &Value) -> GameSearchResult {
        GameSearchResult {
            description: String::new(),
            images: raw["picture"]
                .as_str()
                .map(|url| vec![url.to_string()])
                .unwrap_or_default(),
            location: None,
            owner: None,
            prices: raw["price"]
                .as_i64()
                .filter(|&major| major > 0)
                .map(|major| Price::byn(major * 100))
                .into_iter()
                .collect(),
            source: SOURCE.into(),
            subject: raw["name"].as_str().unwrap_or_default().into(),
            url: raw["url"]
                .as_str()
                .map(|url| format!("{BASE_URL}{url}"))
                .unwrap_or_default(),
        }
    }
}

pub fn service(
    http: reqwest::Client,
    search_app_id: &str,
    category_ids: Vec<String>,
    converter: Arc<CurrencyExchangeService>,
) -> SearchService {
    SearchService::new(
        SOURCE,
        Arc::new(FifthElementClient::new(http, search_app_id)),
        items,
        Some(board_game_predicate(category_ids)),
        Arc::new(FifthElementResultFactory),
        converter,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn predicate_requires_presence_and_known_category() {
        let keep = board_game_predicate(vec!["791".into(), "792".into()]);

        assert!(keep(
            &json!({"is_presence": true, "params_data": {"category_id": 791}}),
            "monopoly"
        ));
        assert!(keep(
            &json!({"is_presence": true, "params_data": {"category_id": "792"}}),
            "monopoly"
        ));
        assert!(!keep(
            &json!({"is_presence": false, "params_data": {"category_id": 791}}),
            "monopoly"
        ));
        assert!(!keep(
            &json!({"is_presence": true, "params_data": {"category_id": 5}}),
            "monopoly"
        ));
    }

    #[test]
    fn builds_result_with_major_unit_price_scaled() {
        let raw = json!({
            "name": "Monopoly",
            "price": 60,
            "picture": "https://img.5element.by/monopoly.jpg",
            "url": "/catalog/monopoly",
            "is_presence": true
        });

        let result = FifthElementResultFactory.create(&raw);

        assert_eq!(result.prices, vec![Price::byn(6000)]);
        assert_eq!(result.url, "https://5element.by/catalog/monopoly");
    }
}
