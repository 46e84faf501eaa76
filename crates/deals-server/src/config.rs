//! Server Configuration
//!
//! Everything comes from the environment (optionally via `.env`); defaults
//! cover the common local setup. VKontakte credentials are optional - the
//! source is simply not registered without them.

use deals_sources::{SourcesConfig, VkontakteConfig};

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub sources: SourcesConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = SourcesConfig::default();
        let sources = SourcesConfig {
            kufar_category: var_or("KUFAR_CATEGORY", &defaults.kufar_category),
            wildberries_subject_id: std::env::var("WILDBERRIES_SUBJECT_ID")
                .ok()
                .and_then(|id| id.parse().ok())
                .unwrap_or(defaults.wildberries_subject_id),
            ozby_category: var_or("OZBY_CATEGORY", &defaults.ozby_category),
            ozon_category: var_or("OZON_CATEGORY", &defaults.ozon_category),
            fifth_element_app_id: var_or("FIFTH_ELEMENT_APP_ID", &defaults.fifth_element_app_id),
            fifth_element_categories: std::env::var("FIFTH_ELEMENT_CATEGORIES")
                .map(|ids| ids.split(',').map(|id| id.trim().to_string()).collect())
                .unwrap_or(defaults.fifth_element_categories),
            vkontakte: vkontakte_from_env(),
        };
        Self {
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            sources,
        }
    }
}

fn vkontakte_from_env() -> Option<VkontakteConfig> {
    let access_token = std::env::var("VK_ACCESS_TOKEN").ok()?;
    let group_id = std::env::var("VK_GROUP_ID").ok()?;
    Some(VkontakteConfig {
        access_token,
        group_id,
        group_name: var_or("VK_GROUP_NAME", "baraholkanastolokrb"),
        api_version: var_or("VK_API_VERSION", "5.131"),
        limit: std::env::var("VK_WALL_LIMIT")
            .ok()
            .and_then(|limit| limit.parse().ok())
            .unwrap_or(100),
    })
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_environment() {
        let config = AppConfig::from_env();
        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(!config.sources.kufar_category.is_empty());
        // no VK credentials in the test environment
        assert!(config.sources.vkontakte.is_none());
    }
}
