//! Kufar (kufar.by) classifieds

use std::sync::Arc;

use async_trait::async_trait;
use deals_core::{
    ApiResponse, CurrencyExchangeService, GameLocation, GameOwner, GameSearchResult, Price,
    Result, ResultFactory, SearchClient, SearchService,
};
use serde_json::Value;

use crate::http::JsonHttpClient;
use crate::BELARUS;

pub const SOURCE: &str = "kufar";

const BASE_URL: &str = "https://cre-api.kufar.by";
const SEARCH_PATH: &str = "/ads-search/v1/engine/v1/search/rendered-paginated";
const IMAGE_URL: &str = "https://yams.kufar.by/api/v1/kufar-ads/images";
const USER_URL: &str = "https://www.kufar.by/user";
const PAGE_SIZE: &str = "10";

pub struct KufarClient {
    http: JsonHttpClient,
    category: String,
}

impl KufarClient {
    pub fn new(http: reqwest::Client, category: impl Into<String>) -> Self {
        Self {
            http: JsonHttpClient::new(http, BASE_URL),
            category: category.into(),
        }
    }
}

#[async_trait]
impl SearchClient for KufarClient {
    async fn search(&self, query: &str) -> Result<ApiResponse> {
        self.http
            .get(
                SEARCH_PATH,
                &[("query", query), ("cat", &self.category), ("size", PAGE_SIZE)],
            )
            .await
    }
}

fn items(payload: &Value) -> Option<&Vec<Value>> {
    payload["ads"].as_array()
}

pub struct KufarResultFactory;

impl ResultFactory for KufarResultFactory {
    fn create(&self, raw: &Value) -> GameSearchResult {
        GameSearchResult {
            description: String::new(),
            images: extract_images(raw),
            location: Some(extract_location(raw)),
            owner: Some(extract_owner(raw)),
            prices: raw["price_byn"]
                .as_i64()
                .map(Price::byn)
                .into_iter()
                .collect(),
            source: SOURCE.into(),
            subject: raw["subject"].as_str().unwrap_or_default().into(),
            url: raw["ad_link"].as_str().unwrap_or_default().into(),
        }
    }
}

fn extract_images(raw: &Value) -> Vec<String> {
    let Some(images) = raw["images"].as_array() else {
        return vec![];
    };
    images
        .iter()
        .filter(|img| img["yams_storage"].as_bool() == Some(true))
        .filter_map(|img| img["id"].as_str())
        // ids are untrusted; get() skips short ids and non-ASCII prefixes
        .filter_map(|id| {
            id.get(..2)
                .map(|prefix| format!("{IMAGE_URL}/{prefix}/{id}.jpg?rule=gallery"))
        })
        .collect()
}

fn ad_parameter<'a>(raw: &'a Value, key: &str) -> Option<&'a str> {
    raw["ad_parameters"]
        .as_array()?
        .iter()
        .find(|param| param["pu"].as_str() == Some(key))?["vl"]
        .as_str()
}

fn extract_location(raw: &Value) -> GameLocation {
    GameLocation {
        area: ad_parameter(raw, "ar").unwrap_or_default().into(),
        city: ad_parameter(raw, "rgn").unwrap_or_default().into(),
        country: BELARUS.into(),
    }
}

fn extract_owner(raw: &Value) -> GameOwner {
    let name = raw["account_parameters"]
        .as_array()
        .map(|params| {
            params
                .iter()
                .filter_map(|param| param["v"].as_str())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .unwrap_or_default();
    let id = match &raw["account_id"] {
        Value::String(id) => id.clone(),
        Value::Number(id) => id.to_string(),
        _ => String::new(),
    };
    let url = format!("{USER_URL}/{id}");
    GameOwner {
        id,
        name,
        url: Some(url),
    }
}

/// Kufar strategy set: the search URL already constrains the category, so no
/// extra predicate is applied.
pub fn service(
    http: reqwest::Client,
    category: &str,
    converter: Arc<CurrencyExchangeService>,
) -> SearchService {
    SearchService::new(
        SOURCE,
        Arc::new(KufarClient::new(http, category)),
        items,
        None,
        Arc::new(KufarResultFactory),
        converter,
    )
}
