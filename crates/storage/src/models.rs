use chrono::NaiveDateTime;
use domain::{ExternalOrigin, FileRef, Review, RichText, SortDirection, SortField};
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlReview {
    pub id: i64,
    pub title: String,
    pub product_id: Option<i64>,
    pub offer_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_name: String,
    pub rating: i64,
    pub review_text: String,
    pub contact_details: Option<String>,
    pub store_response: Option<String>,
    pub active: bool,
    pub external_platform: Option<String>,
    pub external_id: Option<String>,
    pub created_at: NaiveDateTime,
}

impl From<SqlReview> for Review {
    fn from(sql: SqlReview) -> Self {
        let origin = match (sql.external_platform, sql.external_id) {
            (Some(platform), Some(external_id)) => Some(ExternalOrigin {
                platform,
                external_id,
            }),
            _ => None,
        };
        Review {
            id: sql.id,
            title: sql.title,
            // 旧表单用 0 表示“无商品”
            product_id: sql.product_id.filter(|id| *id != 0),
            offer_id: sql.offer_id,
            user_id: sql.user_id,
            user_name: sql.user_name,
            rating: sql.rating,
            review_text: RichText::from_stored(&sql.review_text),
            contact_details: sql.contact_details,
            store_response: sql
                .store_response
                .filter(|s| !s.is_empty())
                .map(|s| RichText::from_stored(&s)),
            active: sql.active,
            origin,
            file_ids: Vec::new(),
            created_at: sql.created_at,
        }
    }
}

/// `Db::insert_review` 写入的行
#[derive(Debug, Clone)]
pub struct NewReview {
    pub collection_id: i64,
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
    pub external_platform: Option<String>,
    pub external_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// 已发布评价列表的过滤、排序与分页窗口
#[derive(Debug, Clone, Copy)]
pub struct ReviewQuery {
    pub product_id: Option<i64>,
    pub sort_field: SortField,
    pub direction: SortDirection,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Clone)]
pub struct NewFile {
    pub subdir: String,
    pub file_name: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct StoredFile {
    pub id: i64,
    pub subdir: String,
    pub file_name: String,
    pub original_name: String,
    pub content_type: String,
    pub size: i64,
    pub created_at: NaiveDateTime,
}

impl StoredFile {
    /// 相对上传根目录的路径
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.subdir, self.file_name)
    }
}

/// 关联到所属评价的文件
#[derive(Debug, Clone, FromRow)]
pub struct ReviewFile {
    pub review_id: i64,
    pub file_id: i64,
    pub subdir: String,
    pub file_name: String,
    pub content_type: String,
}

impl ReviewFile {
    pub fn to_file_ref(&self, public_prefix: &str) -> FileRef {
        FileRef {
            id: self.file_id,
            src: format!(
                "{}/{}/{}",
                public_prefix.trim_end_matches('/'),
                self.subdir,
                self.file_name
            ),
            content_type: self.content_type.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct CatalogProduct {
    pub id: i64,
    pub collection_id: i64,
    pub name: String,
    pub code: Option<String>,
    pub preview_picture: Option<String>,
    pub detail_picture: Option<String>,
    pub url: Option<String>,
    pub active: bool,
}
