use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const ANONYMOUS_NAME: &str = "Anonymous";

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// 富文本的标记格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextFormat {
    #[default]
    Text,
    Html,
}

/// 评价正文与商家回复共用的 `{text, format}` 结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub text: String,
    #[serde(default)]
    pub format: TextFormat,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: TextFormat::Text,
        }
    }

    /// 入库时的列格式
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{\"text\":\"\"}"))
    }

    /// 兼容结构化格式以及旧数据中的纯字符串
    pub fn from_stored(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_else(|_| Self::plain(raw))
    }
}

impl fmt::Display for RichText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

/// 外部评价服务的 platform + id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOrigin {
    pub platform: String,
    pub external_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub title: String,
    pub product_id: Option<i64>,
    pub offer_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub rating: i64,
    pub review_text: RichText,
    pub contact_details: Option<String>,
    pub store_response: Option<RichText>,
    pub active: bool,
    pub origin: Option<ExternalOrigin>,
    pub file_ids: Vec<i64>,
    pub created_at: NaiveDateTime,
}

/// 文件存储返回的已持久化文件引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    pub id: i64,
    pub src: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
}

/// 跨商品列表行附带的目录摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductInfo {
    pub id: i64,
    pub name: String,
    pub images: Vec<String>,
    pub url: Option<String>,
    pub active: bool,
}

/// 评价列表中的一行，已整理为展示格式
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewItem {
    pub id: i64,
    #[serde(rename = "formattedDate")]
    pub formatted_date: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    pub rating: f64,
    pub files: Vec<FileRef>,
    #[serde(rename = "reviewText")]
    pub review_text: String,
    #[serde(rename = "storeResponse")]
    pub store_response: Option<String>,
    #[serde(rename = "productInfo", skip_serializing_if = "Option::is_none")]
    pub product_info: Option<ProductInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewPage {
    pub items: Vec<ReviewItem>,
    #[serde(rename = "totalCount")]
    pub total_count: i64,
    pub page: u32,
    #[serde(rename = "pageSize")]
    pub page_size: u32,
}

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 页码从 1 开始
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// 外部平台返回的评价，尚未转换为 `Review`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalReview {
    pub platform: String,
    pub external_id: String,
    /// 平台评价挂载到的目录元素
    pub element_id: i64,
    pub author_name: Option<String>,
    pub rating: i64,
    pub text: String,
}
