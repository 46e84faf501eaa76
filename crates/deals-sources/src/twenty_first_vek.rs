//! 21vek.by electronics shop

use std::sync::Arc;

use async_trait::async_trait;
use deals_core::{
    ApiResponse, CurrencyExchangeService, GameSearchResult, ItemPredicate, Price, Result,
    ResultFactory, SearchClient, SearchService,
};
use serde_json::Value;

use crate::http::JsonHttpClient;

pub const SOURCE: &str = "21vek";

const BASE_SEARCH_URL: &str = "https://search.21vek.by/api/v1.0";
const SEARCH_PATH: &str = "/search/suggest";
const BASE_URL: &str = "https://21vek.by";

const OUT_OF_STOCK: &str = "нет на складе";

pub struct TwentyFirstVekClient {
    http: JsonHttpClient,
}

impl TwentyFirstVekClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http: JsonHttpClient::new(http, BASE_SEARCH_URL),
        }
    }
}

#[async_trait]
impl SearchClient for TwentyFirstVekClient {
    async fn search(&self, query: &str) -> Result<ApiResponse> {
        self.http.get(SEARCH_PATH, &[("q", query)]).await
    }
}

fn items(payload: &Value) -> Option<&Vec<Value>> {
    payload["items"].as_array()
}

/// Suggest results mix categories and sold-out items; keep in-stock board
/// games only.
pub fn board_game_predicate() -> ItemPredicate {
    Box::new(|item, _query| {
        item["type"].as_str() == Some("product")
            && item["price"].as_str().is_some_and(|price| price != OUT_OF_STOCK)
            && item["url"].as_str().is_some_and(|url| url.contains("board_games"))
    })
}

pub struct TwentyFirstVekResultFactory;

impl ResultFactory for TwentyFirstVekResultFactory {
    fn create(&self, raw: &Value) -> GameSearchResult {
        GameSearchResult {
            description: raw["highlighted"].as_str().unwrap_or_default().into(),
            images: raw["picture"]
                .as_str()
                .map(|url| vec![url.replace("preview_s", "preview_b")])
                .unwrap_or_default(),
            location: None,
            owner: None,
            prices: raw["price"]
                .as_str()
                .and_then(parse_comma_decimal_price)
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

/// Parse `"60,00 р."` into 6000 minor units: the comma-decimal digits *are*
/// the minor-unit value once the separator is removed.
fn parse_comma_decimal_price(text: &str) -> Option<Price> {
    let digits = text.split_whitespace().next()?.replace(',', "");
    digits.parse().ok().map(Price::byn)
}

pub fn service(http: reqwest::Client, converter: Arc<CurrencyExchangeService>) -> SearchService {
    SearchService::new(
        SOURCE,
        Arc::new(TwentyFirstVekClient::new(http)),
        items,
        Some(board_game_predicate()),
        Arc::new(TwentyFirstVekResultFactory),
        converter,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn comma_decimal_price_parses_to_exact_minor_units() {
        assert_eq!(parse_comma_decimal_price("60,00 р."), Some(Price::byn(6000)));
        assert_eq!(parse_comma_decimal_price("9,90 р."), Some(Price::byn(990)));
        assert_eq!(parse_comma_decimal_price(OUT_OF_STOCK), None);
    }

    #[test]
    fn predicate_keeps_in_stock_board_games() {
        let keep = board_game_predicate();
        let product = |price: &str, url: &str| {
            json!({"type": "product", "price": price, "url": url})
        };

        assert!(keep(&product("60,00 р.", "/boardgames/board_games/monopoly"), "monopoly"));
        assert!(!keep(&product(OUT_OF_STOCK, "/boardgames/board_games/monopoly"), "monopoly"));
        assert!(!keep(&product("60,00 р.", "/home/kettles/k1"), "monopoly"));
        assert!(!keep(&json!({"type": "category", "url": "/board_games"}), "monopoly"));
    }

    #[test]
    fn builds_result_with_bigger_preview_image() {
        let raw = json!({
            "type": "product",
            "name": "Monopoly",
            "highlighted": "<b>Monopoly</b>",
            "price": "60,00 р.",
            "picture": "https://static.21vek.by/preview_s/monopoly.jpg",
            "url": "/boardgames/board_games/monopoly"
        });

        let result = TwentyFirstVekResultFactory.create(&raw);

        assert_eq!(result.prices, vec![Price::byn(6000)]);
        assert_eq!(result.url, "https://21vek.by/boardgames/board_games/monopoly");
        assert_eq!(
            result.images,
            vec!["https://static.21vek.by/preview_b/monopoly.jpg"]
        );
    }
}
