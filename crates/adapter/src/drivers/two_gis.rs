use anyhow::{Context, Result};
use async_trait::async_trait;
use domain::ExternalReview;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::traits::ReviewPlatform;

pub const PLATFORM_CODE: &str = "2gis";
const DEFAULT_BASE_URL: &str = "https://public-api.reviews.2gis.com/2.0";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_max_pages() -> u32 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct TwoGisConfig {
    pub branch_id: String,
    pub api_key: String,
    /// 该门店评价挂载到的目录元素
    pub element_id: i64,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
}

#[derive(Deserialize)]
struct ReviewsResponse {
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    reviews: Vec<ApiReview>,
}

#[derive(Deserialize, Default)]
struct Meta {
    total_count: Option<u64>,
}

#[derive(Deserialize)]
struct ApiReview {
    id: serde_json::Value,
    rating: Option<i64>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    user: Option<ApiUser>,
}

#[derive(Deserialize)]
struct ApiUser {
    name: Option<String>,
}

struct Page {
    reviews: Vec<ExternalReview>,
    received: usize,
    total: Option<u64>,
}

fn parse_page(body: &str, element_id: i64) -> Result<Page> {
    let resp: ReviewsResponse =
        serde_json::from_str(body).context("Unexpected 2GIS reviews payload")?;
    let received = resp.reviews.len();

    let reviews = resp
        .reviews
        .into_iter()
        .filter_map(|r| {
            let external_id = match r.id {
                serde_json::Value::String(s) => s,
                serde_json::Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some(ExternalReview {
                platform: PLATFORM_CODE.to_string(),
                external_id,
                element_id,
                author_name: r.user.and_then(|u| u.name).filter(|n| !n.trim().is_empty()),
                // 缺少评分时保留 0，交给校验拒绝
                rating: r.rating.unwrap_or(0),
                text: r.text.unwrap_or_default(),
            })
        })
        .collect();

    Ok(Page {
        reviews,
        received,
        total: resp.meta.total_count,
    })
}

pub struct TwoGisPlatform {
    config: TwoGisConfig,
    http: reqwest::Client,
}

impl TwoGisPlatform {
    pub fn new(config: TwoGisConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { config, http })
    }

    async fn fetch_page(&self, offset: u32) -> Result<Page> {
        let url = format!(
            "{}/branches/{}/reviews",
            self.config.base_url.trim_end_matches('/'),
            self.config.branch_id
        );
        let body = self
            .http
            .get(&url)
            .query(&[
                ("limit", self.config.page_size.to_string()),
                ("offset", offset.to_string()),
                ("key", self.config.api_key.clone()),
                ("locale", "ru_RU".to_string()),
                ("sort_by", "date_created".to_string()),
            ])
            .send()
            .await
            .with_context(|| format!("2GIS request failed: {}", url))?
            .error_for_status()
            .context("2GIS returned an error status")?
            .text()
            .await?;
        parse_page(&body, self.config.element_id)
    }
}

#[async_trait]
impl ReviewPlatform for TwoGisPlatform {
    fn code(&self) -> &str {
        PLATFORM_CODE
    }

    async fn fetch_reviews(&self) -> Result<Vec<ExternalReview>> {
        let mut all = Vec::new();
        let mut offset = 0u32;

        for _ in 0..self.config.max_pages.max(1) {
            let page = self.fetch_page(offset).await?;
            debug!(
                branch = %self.config.branch_id,
                offset,
                received = page.received,
                "fetched 2GIS page"
            );
            all.extend(page.reviews);
            offset += page.received as u32;

            let exhausted = page.received == 0
                || page.received < self.config.page_size as usize
                || page.total.is_some_and(|t| u64::from(offset) >= t);
            if exhausted {
                break;
            }
        }

        info!(branch = %self.config.branch_id, count = all.len(), "2GIS reviews fetched");
        Ok(all)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_reviews_payload() {
        let body = r#"{
            "meta": {"code": 200, "total_count": 3},
            "reviews": [
                {"id": "101", "rating": 5, "text": "Отличный магазин, всем советую", "user": {"name": "Олег"}},
                {"id": 102, "rating": 2, "text": "Долго ждал доставку", "user": {"name": "  "}},
                {"id": null, "rating": 4, "text": "skipped"},
                {"id": "104", "text": "no rating here"}
            ]
        }"#;
        let page = parse_page(body, 42).unwrap();
        assert_eq!(page.received, 4);
        assert_eq!(page.total, Some(3));
        assert_eq!(page.reviews.len(), 3);

        let first = &page.reviews[0];
        assert_eq!(first.platform, "2gis");
        assert_eq!(first.external_id, "101");
        assert_eq!(first.element_id, 42);
        assert_eq!(first.author_name.as_deref(), Some("Олег"));

        assert_eq!(page.reviews[1].external_id, "102");
        assert!(page.reviews[1].author_name.is_none());
        assert_eq!(page.reviews[2].rating, 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_page("<html>", 1).is_err());
    }

    #[test]
    fn config_defaults() {
        let cfg: TwoGisConfig =
            serde_json::from_str(r#"{"branch_id": "70000001", "api_key": "k", "element_id": 5}"#)
                .unwrap();
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.page_size, 50);
        assert_eq!(cfg.max_pages, 10);
    }
}
