//! Ozon.ru marketplace
//!
//! The composer API gates on browser-like headers and answers with a page
//! description whose `widgetStates` map holds each widget's payload as a JSON
//! *string*. The client finds the search-results widget and decodes that
//! inner document, so the rest of the pipeline sees plain items.

use std::sync::Arc;

use async_trait::async_trait;
use deals_core::{
    ApiResponse, CurrencyExchangeService, GameSearchResult, Price, Result, ResultFactory,
    SearchClient, SearchError, SearchService,
};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::http::JsonHttpClient;

pub const SOURCE: &str = "ozon";

const BASE_URL: &str = "https://www.ozon.ru";
const SEARCH_PATH: &str = "/api/composer-api.bx/page/json/v2";
const ITEM_URL: &str = "https://ozon.ru";
const SEARCH_WIDGET: &str = "searchResultsV2";

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/89.0.4389.82 Safari/537.36";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,\
     image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.9";

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(header::ACCEPT, HeaderValue::from_static(ACCEPT));
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9,ru;q=0.8"),
    );
    headers.insert(HeaderName::from_static("dnt"), HeaderValue::from_static("1"));
    headers.insert(
        HeaderName::from_static("purpose"),
        HeaderValue::from_static("prefetch"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("none"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-user"),
        HeaderValue::from_static("?1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers
}

pub struct OzonClient {
    http: JsonHttpClient,
    category: String,
}

impl OzonClient {
    pub fn new(http: reqwest::Client, category: impl Into<String>) -> Self {
        Self {
            http: JsonHttpClient::new(http, BASE_URL).with_headers(browser_headers()),
            category: category.into(),
        }
    }
}

#[async_trait]
impl SearchClient for OzonClient {
    async fn search(&self, query: &str) -> Result<ApiResponse> {
        // the category page URL, query string included, rides inside the
        // `url` parameter
        let path = format!("{SEARCH_PATH}?url=/category/{}?text={query}", self.category);
        let response = self.http.get(&path, &[]).await?;
        let payload = decode_search_widget(&response.payload)?;
        Ok(ApiResponse {
            payload,
            status: response.status,
        })
    }
}

/// Pull the search-results widget out of `widgetStates` and decode its
/// JSON-in-string payload. The widget key carries a versioned suffix, so it
/// is matched by substring.
fn decode_search_widget(payload: &Value) -> Result<Value> {
    let states = payload["widgetStates"].as_object().ok_or_else(|| {
        SearchError::MalformedPayload("ozon: no widgetStates in payload".into())
    })?;
    let widget = states
        .iter()
        .find(|(key, _)| key.contains(SEARCH_WIDGET))
        .and_then(|(_, value)| value.as_str())
        .ok_or_else(|| {
            SearchError::MalformedPayload("ozon: no searchResultsV2 widget".into())
        })?;
    Ok(serde_json::from_str(widget)?)
}

fn items(payload: &Value) -> Option<&Vec<Value>> {
    payload["items"].as_array()
}

pub struct OzonResultFactory;

impl ResultFactory for OzonResultFactory {
    fn create(&self, raw: &Value) -> GameSearchResult {
        GameSearchResult {
            description: String::new(),
            images: raw["tileImage"]["images"]
                .as_array()
                .map(|images| {
                    images
                        .iter()
                        .filter_map(Value::as_str)
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            location: None,
            owner: None,
            prices: extract_price(raw).into_iter().collect(),
            source: SOURCE.into(),
            subject: extract_subject(raw),
            url: raw["action"]["link"]
                .as_str()
                .filter(|link| !link.is_empty())
                .map(|link| format!("{ITEM_URL}{link}"))
                .unwrap_or_default(),
        }
    }
}

fn main_state<'a>(raw: &'a Value, id: &str) -> Option<&'a Value> {
    raw["mainState"]
        .as_array()?
        .iter()
        .find(|state| state["id"].as_str() == Some(id))
}

fn extract_subject(raw: &Value) -> String {
    main_state(raw, "name")
        .and_then(|state| state["atom"]["textAtom"]["text"].as_str())
        .map(unescape_html)
        .unwrap_or_default()
}

/// Price text like `"169,90 ₽"`: first token, comma decimal, major units.
fn extract_price(raw: &Value) -> Option<Price> {
    let text = main_state(raw, "atom")?["atom"]["price"]["price"].as_str()?;
    let major: Decimal = text.split_whitespace().next()?.replace(',', ".").parse().ok()?;
    let minor = (major * Decimal::from(100)).round().to_i64()?;
    (minor > 0).then(|| Price::byn(minor))
}

/// Widget text arrives HTML-escaped; only the named entities the feed
/// actually emits are handled.
fn unescape_html(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

pub fn service(
    http: reqwest::Client,
    category: &str,
    converter: Arc<CurrencyExchangeService>,
) -> SearchService {
    SearchService::new(
        SOURCE,
        Arc::new(OzonClient::new(http, category)),
        items,
        None,
        Arc::new(OzonResultFactory),
        converter,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_json_in_string_search_widget() {
        let payload = json!({
            "widgetStates": {
                "breadCrumbs-123": "{}",
                "searchResultsV2-252189-default-1": r#"{"items": [{"id": 1}, {"id": 2}]}"#
            }
        });

        let decoded = decode_search_widget(&payload).unwrap();
        assert_eq!(items(&decoded).unwrap().len(), 2);
    }

    #[test]
    fn missing_widget_is_a_malformed_payload() {
        let err = decode_search_widget(&json!({"widgetStates": {"breadCrumbs-123": "{}"}}))
            .unwrap_err();
        assert!(matches!(err, SearchError::MalformedPayload(_)));

        let err = decode_search_widget(&json!({"layout": []})).unwrap_err();
        assert!(matches!(err, SearchError::MalformedPayload(_)));
    }

    #[test]
    fn corrupt_widget_payload_is_a_json_error() {
        let payload = json!({
            "widgetStates": {"searchResultsV2-1": "{not json"}
        });
        assert!(matches!(
            decode_search_widget(&payload).unwrap_err(),
            SearchError::Json(_)
        ));
    }

    #[test]
    fn builds_result_from_widget_item() {
        let raw = json!({
            "action": {"link": "/product/monopoly-123/"},
            "tileImage": {"images": ["https://cdn.ozon.ru/monopoly.jpg"]},
            "mainState": [
                {"id": "atom", "atom": {"price": {"price": "169,90 ₽"}}},
                {"id": "name", "atom": {"textAtom": {"text": "Игра &quot;Монополия&quot;"}}}
            ]
        });

        let result = OzonResultFactory.create(&raw);

        assert_eq!(result.subject, "Игра \"Монополия\"");
        assert_eq!(result.prices, vec![Price::byn(16_990)]);
        assert_eq!(result.url, "https://ozon.ru/product/monopoly-123/");
        assert_eq!(result.images, vec!["https://cdn.ozon.ru/monopoly.jpg"]);
    }

    #[test]
    fn empty_link_and_missing_price_degrade_gracefully() {
        let result = OzonResultFactory.create(&json!({
            "action": {"link": ""},
            "mainState": [{"id": "name", "atom": {"textAtom": {"text": "Chess"}}}]
        }));

        assert_eq!(result.subject, "Chess");
        assert_eq!(result.url, "");
        assert!(result.prices.is_empty());
    }
}
