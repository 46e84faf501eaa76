//! VKontakte community wall (second-hand board-game group)
//!
//! The wall API has no server-side search: the client fetches the latest
//! posts and the predicate does a case-insensitive text match against the
//! query. Posts carry no price, so results stay unconverted.

use std::sync::Arc;

use async_trait::async_trait;
use deals_core::{
    ApiResponse, CurrencyExchangeService, GameOwner, GameSearchResult, ItemPredicate, Result,
    ResultFactory, SearchClient, SearchService,
};
use serde_json::Value;

use crate::http::JsonHttpClient;
use crate::VkontakteConfig;

pub const SOURCE: &str = "vkontakte";

const BASE_URL: &str = "https://api.vk.com/method";
const SITE_URL: &str = "https://vk.com";

pub struct VkontakteClient {
    http: JsonHttpClient,
    config: VkontakteConfig,
}

impl VkontakteClient {
    pub fn new(http: reqwest::Client, config: VkontakteConfig) -> Self {
        Self {
            http: JsonHttpClient::new(http, BASE_URL),
            config,
        }
    }
}

#[async_trait]
impl SearchClient for VkontakteClient {
    async fn search(&self, _query: &str) -> Result<ApiResponse> {
        let owner_id = format!("-{}", self.config.group_id);
        let limit = self.config.limit.to_string();
        self.http
            .get(
                "/wall.get",
                &[
                    ("owner_id", owner_id.as_str()),
                    ("v", &self.config.api_version),
                    ("count", &limit),
                    ("access_token", &self.config.access_token),
                ],
            )
            .await
    }
}

fn items(payload: &Value) -> Option<&Vec<Value>> {
    payload["response"]["items"].as_array()
}

/// Wall posts are unstructured; match the query against the post text.
pub fn text_match_predicate() -> ItemPredicate {
    Box::new(|item, query| {
        item["text"]
            .as_str()
            .is_some_and(|text| text.to_lowercase().contains(&query.to_lowercase()))
    })
}

pub struct VkontakteResultFactory {
    group_name: String,
}

impl VkontakteResultFactory {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
        }
    }
}

impl ResultFactory for VkontakteResultFactory {
    fn create(&self, raw: &Value) -> GameSearchResult {
        GameSearchResult {
            description: raw["text"].as_str().unwrap_or_default().into(),
            images: extract_images(raw),
            location: None,
            owner: extract_owner(raw),
            prices: vec![],
            source: SOURCE.into(),
            subject: format!("{} wall post", self.group_name),
            url: extract_url(&self.group_name, raw),
        }
    }
}

fn extract_url(group_name: &str, raw: &Value) -> String {
    match (raw["owner_id"].as_i64(), raw["id"].as_i64()) {
        (Some(owner_id), Some(post_id)) => {
            format!("{SITE_URL}/{group_name}?w=wall{owner_id}_{post_id}")
        }
        _ => String::new(),
    }
}

fn extract_images(raw: &Value) -> Vec<String> {
    let Some(attachments) = raw["attachments"].as_array() else {
        return vec![];
    };
    attachments
        .iter()
        .filter(|attachment| attachment["type"].as_str() == Some("photo"))
        .filter_map(|attachment| attachment["photo"]["sizes"].as_array())
        .flatten()
        .filter(|size| size["type"].as_str() == Some("z"))
        .filter_map(|size| size["url"].as_str())
        .map(ToString::to_string)
        .collect()
}

fn extract_owner(raw: &Value) -> Option<GameOwner> {
    let signer_id = raw["signer_id"].as_i64()?;
    Some(GameOwner {
        id: signer_id.to_string(),
        name: String::new(),
        url: Some(format!("{SITE_URL}/id{signer_id}")),
    })
}

pub fn service(
    http: reqwest::Client,
    config: VkontakteConfig,
    converter: Arc<CurrencyExchangeService>,
) -> SearchService {
    let group_name = config.group_name.clone();
    SearchService::new(
        SOURCE,
        Arc::new(VkontakteClient::new(http, config)),
        items,
        Some(text_match_predicate()),
        Arc::new(VkontakteResultFactory::new(group_name)),
        converter,
    )
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn text_match_is_case_insensitive() {
        let keep = text_match_predicate();
        assert!(keep(&json!({"text": "Продам МОНОПОЛИЮ, как новая"}), "монополию"));
        assert!(keep(&json!({"text": "selling Monopoly deluxe"}), "monopoly"));
        assert!(!keep(&json!({"text": "chess set"}), "monopoly"));
        assert!(!keep(&json!({"id": 1}), "monopoly"));
    }

    #[test]
    fn builds_result_from_wall_post() {
        let raw = json!({
            "id": 777,
            "owner_id": -123456,
            "signer_id": 42,
            "text": "selling monopoly",
            "attachments": [
                {"type": "photo", "photo": {"sizes": [
                    {"type": "m", "url": "https://img.vk.com/m.jpg"},
                    {"type": "z", "url": "https://img.vk.com/z.jpg"}
                ]}},
                {"type": "link"}
            ]
        });

        let result = VkontakteResultFactory::new("boardgamegroup").create(&raw);

        assert_eq!(result.description, "selling monopoly");
        assert!(result.prices.is_empty());
        assert_eq!(result.url, "https://vk.com/boardgamegroup?w=wall-123456_777");
        assert_eq!(result.images, vec!["https://img.vk.com/z.jpg"]);
        assert_eq!(result.owner.unwrap().url.unwrap(), "https://vk.com/id42");
    }
}
