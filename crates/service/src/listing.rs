use std::collections::{BTreeSet, HashMap};

use domain::{
    FileRef, Locale, Pagination, ReviewItem, ReviewPage, SortOption, ANONYMOUS_NAME,
};
use storage::{Db, ReviewQuery};

use crate::catalog::CatalogLookup;
use crate::error::Result;

/// 分页评价列表，附带文件；跨商品时附带目录数据
#[derive(Clone)]
pub struct ListingComposer {
    db: Db,
    catalog: CatalogLookup,
    locale: Locale,
    public_prefix: String,
}

impl ListingComposer {
    pub fn new(db: Db, catalog: CatalogLookup, locale: Locale, public_prefix: impl Into<String>) -> Self {
        Self {
            db,
            catalog,
            locale,
            public_prefix: public_prefix.into(),
        }
    }

    /// `product_id` 为 `None`（或 0）时列出所有商品，
    /// 并给引用了商品的行附上 `productInfo`
    pub async fn list(
        &self,
        product_id: Option<i64>,
        sort: &SortOption,
        page: Pagination,
    ) -> Result<ReviewPage> {
        let product_id = product_id.filter(|id| *id != 0);
        let query = ReviewQuery {
            product_id,
            sort_field: sort.sort_field,
            direction: sort.direction,
            limit: page.limit(),
            offset: page.offset(),
        };

        let reviews = self.db.list_active_reviews(&query).await?;
        let total_count = self.db.count_active_reviews(product_id).await?;

        let ids: Vec<i64> = reviews.iter().map(|r| r.id).collect();
        let mut files = self.files_by_review(&ids).await?;

        let products = if product_id.is_none() {
            let referenced: BTreeSet<i64> = reviews.iter().filter_map(|r| r.product_id).collect();
            if referenced.is_empty() {
                HashMap::new()
            } else {
                let referenced: Vec<i64> = referenced.into_iter().collect();
                self.catalog.products(&referenced).await?
            }
        } else {
            HashMap::new()
        };

        let items = reviews
            .into_iter()
            .map(|r| {
                let product_info = match (product_id, r.product_id) {
                    (None, Some(pid)) => products.get(&pid).cloned(),
                    _ => None,
                };
                ReviewItem {
                    id: r.id,
                    formatted_date: self.locale.format_date(&r.created_at),
                    user_name: self.display_name(r.user_name),
                    rating: r.rating as f64,
                    files: files.remove(&r.id).unwrap_or_default(),
                    review_text: r.review_text.text,
                    store_response: r.store_response.map(|s| s.text),
                    product_info,
                }
            })
            .collect();

        tracing::debug!(?product_id, sort = sort.code, page = page.page, total_count, "listed reviews");

        Ok(ReviewPage {
            items,
            total_count,
            page: page.page,
            page_size: page.page_size,
        })
    }

    /// 存储的匿名默认名按列表语言展示
    fn display_name(&self, user_name: String) -> String {
        if user_name == ANONYMOUS_NAME {
            self.locale.anonymous_name().to_string()
        } else {
            user_name
        }
    }

    async fn files_by_review(&self, review_ids: &[i64]) -> Result<HashMap<i64, Vec<FileRef>>> {
        let rows = self.db.files_for_reviews(review_ids).await?;
        let mut grouped: HashMap<i64, Vec<FileRef>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.review_id)
                .or_default()
                .push(row.to_file_ref(&self.public_prefix));
        }
        Ok(grouped)
    }

    /// 某商品的已发布评价数，商品缺省或为 0 时统计全部
    pub async fn count(&self, product_id: Option<i64>) -> Result<i64> {
        Ok(self
            .db
            .count_active_reviews(product_id.filter(|id| *id != 0))
            .await?)
    }

    /// 商品已发布评价中的最新图片
    pub async fn product_files(&self, product_id: i64, limit: u32) -> Result<Vec<FileRef>> {
        let rows = self.db.product_files(product_id, i64::from(limit)).await?;
        Ok(rows
            .iter()
            .map(|r| r.to_file_ref(&self.public_prefix))
            .collect())
    }

    /// 匿名用户不可能有评价记录
    pub async fn has_reviewed(&self, user_id: Option<i64>, product_id: i64) -> Result<bool> {
        match user_id {
            Some(uid) => Ok(self.db.user_has_active_review(uid, product_id).await?),
            None => Ok(false),
        }
    }
}
