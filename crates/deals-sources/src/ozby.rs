//! Oz.by book & game shop

use std::sync::Arc;

use async_trait::async_trait;
use deals_core::{
    ApiResponse, CurrencyExchangeService, GameSearchResult, Price, Result, ResultFactory,
    SearchClient, SearchService,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::http::JsonHttpClient;

pub const SOURCE: &str = "ozby";

const BASE_URL: &str = "https://api.oz.by";
const SEARCH_PATH: &str = "/v4/search";
const GAME_URL: &str = "https://oz.by/boardgames/more";

pub struct OzByClient {
    http: JsonHttpClient,
    category: String,
}

impl OzByClient {
    pub fn new(http: reqwest::Client, category: impl Into<String>) -> Self {
        Self {
            http: JsonHttpClient::new(http, BASE_URL),
            category: category.into(),
        }
    }
}

#[async_trait]
impl SearchClient for OzByClient {
    async fn search(&self, query: &str) -> Result<ApiResponse> {
        // category and in-stock constraints are encoded in the query itself
        self.http
            .get(
                SEARCH_PATH,
                &[
                    ("fieldsets[goods]", "listing"),
                    ("filter[id_catalog]", &self.category),
                    ("filter[availability]", "1"),
                    ("filter[q]", query),
                ],
            )
            .await
    }
}

fn items(payload: &Value) -> Option<&Vec<Value>> {
    payload["data"].as_array()
}

pub struct OzByResultFactory;

impl ResultFactory for OzByResultFactory {
    fn create(&self, raw: &Value) -> GameSearchResult {
        let attributes = &raw["attributes"];
        GameSearchResult {
            description: attributes["small_desc"].as_str().unwrap_or_default().into(),
            images: attributes["main_image"]["200"]
                .as_str()
                .map(|url| vec![url.to_string()])
                .unwrap_or_default(),
            location: None,
            owner: None,
            prices: extract_price(attributes).into_iter().collect(),
            source: SOURCE.into(),
            subject: attributes["title"].as_str().unwrap_or_default().into(),
            url: raw["id"]
                .as_i64()
                .map(|id| format!("{GAME_URL}{id}.html"))
                .unwrap_or_default(),
        }
    }
}

/// `cost.decimal` is in major units; scale to minor units exactly.
fn extract_price(attributes: &Value) -> Option<Price> {
    let cost = &attributes["cost"]["decimal"];
    let major = match cost {
        Value::Number(n) => Decimal::from_f64_retain(n.as_f64()?)?,
        _ => return None,
    };
    let minor = (major * Decimal::from(100)).round().to_i64()?;
    (minor > 0).then(|| Price::byn(minor))
}

pub fn service(
    http: reqwest::Client,
    category: &str,
    converter: Arc<CurrencyExchangeService>,
) -> SearchService {
    SearchService::new(
        SOURCE,
        Arc::new(OzByClient::new(http, category)),
        items,
        None,
        Arc::new(OzByResultFactory),
        converter,
    )
}
