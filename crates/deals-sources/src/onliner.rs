//! Onliner (catalog.onliner.by)

use std::sync::Arc;

use async_trait::async_trait;
use deals_core::{
    ApiResponse, CurrencyExchangeService, GameSearchResult, ItemPredicate, Price, Result,
    ResultFactory, SearchClient, SearchService,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::http::JsonHttpClient;

pub const SOURCE: &str = "onliner";

const BASE_URL: &str = "https://catalog.onliner.by/sdapi";
const SEARCH_PATH: &str = "/catalog.api/search/products";

pub struct OnlinerClient {
    http: JsonHttpClient,
}

impl OnlinerClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http: JsonHttpClient::new(http, BASE_URL),
        }
    }
}

#[async_trait]
impl SearchClient for OnlinerClient {
    async fn search(&self, query: &str) -> Result<ApiResponse> {
        self.http.get(SEARCH_PATH, &[("query", query)]).await
    }
}

fn items(payload: &Value) -> Option<&Vec<Value>> {
    payload["products"].as_array()
}

/// The catalog mixes all product kinds; keep priced board games only.
pub fn board_game_predicate() -> ItemPredicate {
    Box::new(|item, _query| {
        item["schema"]["key"].as_str() == Some("boardgame") && !item["prices"].is_null()
    })
}

pub struct OnlinerResultFactory;

impl ResultFactory for OnlinerResultFactory {
    fn create(&self, raw: &Value) -> GameSearchResult {
        GameSearchResult {
            description: raw["description"].as_str().unwrap_or_default().into(),
            images: raw["images"]["header"]
                .as_str()
                .map(|url| vec![format!("https:{url}")])
                .unwrap_or_default(),
            location: None,
            owner: None,
            prices: extract_price(raw).into_iter().collect(),
            source: SOURCE.into(),
            subject: raw["name"].as_str().unwrap_or_default().into(),
            url: raw["html_url"].as_str().unwrap_or_default().into(),
        }
    }
}

/// `prices.price_min.amount` is a decimal string of major units.
fn extract_price(raw: &Value) -> Option<Price> {
    let amount = raw["prices"]["price_min"]["amount"].as_str()?;
    let major: Decimal = amount.parse().ok()?;
    let minor = (major * Decimal::from(100)).round().to_i64()?;
    Some(Price::byn(minor))
}

pub fn service(http: reqwest::Client, converter: Arc<CurrencyExchangeService>) -> SearchService {
    SearchService::new(
        SOURCE,
        Arc::new(OnlinerClient::new(http)),
        items,
        Some(board_game_predicate()),
        Arc::new(OnlinerResultFactory),
        converter,
    )
}
