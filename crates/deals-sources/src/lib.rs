//! # deals-sources
//!
//! Concrete marketplace strategy sets for the deal aggregator: each module
//! supplies the transport client, the payload items path, the availability
//! predicate and the result factory for one source, collapsed onto the
//! generic `SearchService` from `deals-core`. Also home to the national-bank
//! exchange-rate provider.

use std::sync::Arc;

use deals_core::{CurrencyExchangeService, SearchService};

pub mod fifth_element;
pub mod http;
pub mod kufar;
pub mod onliner;
pub mod ozby;
pub mod ozon;
pub mod rates;
pub mod twenty_first_vek;
pub mod vkontakte;
pub mod wildberries;

pub use http::JsonHttpClient;
pub use rates::exchange_service;

/// Country every local classifieds listing belongs to.
pub const BELARUS: &str = "Belarus";

/// Credentials and scope for the VKontakte wall source.
#[derive(Clone, Debug)]
pub struct VkontakteConfig {
    pub access_token: String,
    pub api_version: String,
    pub group_id: String,
    pub group_name: String,
    pub limit: u32,
}

/// Per-source parameters. Category ids differ per marketplace because every
/// site encodes "board game" differently.
#[derive(Clone, Debug)]
pub struct SourcesConfig {
    pub kufar_category: String,
    pub wildberries_subject_id: i64,
    pub ozby_category: String,
    pub ozon_category: String,
    pub fifth_element_app_id: String,
    pub fifth_element_categories: Vec<String>,

    /// Wall search needs an access token; the source is skipped when absent.
    pub vkontakte: Option<VkontakteConfig>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            kufar_category: "1038".into(),
            wildberries_subject_id: 1347,
            ozby_category: "1109".into(),
            ozon_category: "nastolnye-igry-13507".into(),
            fifth_element_app_id: "12064".into(),
            fifth_element_categories: vec!["791".into()],
            vkontakte: None,
        }
    }
}

/// Build every configured source adapter, in the order the deal-finder
/// iterates them.
pub fn build_services(
    http: &reqwest::Client,
    config: &SourcesConfig,
    converter: &Arc<CurrencyExchangeService>,
) -> Vec<SearchService> {
    let mut services = vec![
        kufar::service(http.clone(), &config.kufar_category, converter.clone()),
        wildberries::service(http.clone(), config.wildberries_subject_id, converter.clone()),
        ozby::service(http.clone(), &config.ozby_category, converter.clone()),
        onliner::service(http.clone(), converter.clone()),
        twenty_first_vek::service(http.clone(), converter.clone()),
        fifth_element::service(
            http.clone(),
            &config.fifth_element_app_id,
            config.fifth_element_categories.clone(),
            converter.clone(),
        ),
        ozon::service(http.clone(), &config.ozon_category, converter.clone()),
    ];
    if let Some(vk) = &config.vkontakte {
        services.push(vkontakte::service(http.clone(), vk.clone(), converter.clone()));
    } else {
        tracing::info!("vkontakte access token not configured, source disabled");
    }
    services
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_order_is_stable_and_vk_is_optional() {
        let http = reqwest::Client::new();
        let converter = Arc::new(exchange_service(http.clone()));

        let services = build_services(&http, &SourcesConfig::default(), &converter);
        let sources: Vec<&str> = services.iter().map(SearchService::source).collect();
        assert_eq!(
            sources,
            ["kufar", "wildberries", "ozby", "onliner", "21vek", "5element", "ozon"]
        );

        let with_vk = SourcesConfig {
            vkontakte: Some(VkontakteConfig {
                access_token: "token".into(),
                api_version: "5.131".into(),
                group_id: "123".into(),
                group_name: "boardgames".into(),
                limit: 50,
            }),
            ..SourcesConfig::default()
        };
        let services = build_services(&http, &with_vk, &converter);
        assert_eq!(services.last().unwrap().source(), "vkontakte");
    }
}
