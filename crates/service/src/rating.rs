use domain::{Locale, RatingSummary};
use storage::Db;

use crate::error::Result;

/// 单个商品已发布评价的评分，最多查询一次
///
/// 只在一次聚合调用内有效；写入后必须重新创建，
/// 不会跨请求保留。
pub struct RatingScope<'a> {
    db: &'a Db,
    product_id: i64,
    ratings: Option<Vec<i64>>,
}

impl<'a> RatingScope<'a> {
    pub fn new(db: &'a Db, product_id: i64) -> Self {
        Self {
            db,
            product_id,
            ratings: None,
        }
    }

    pub async fn ratings(&mut self) -> Result<&[i64]> {
        if self.ratings.is_none() {
            let fetched = self.db.active_ratings(self.product_id).await?;
            tracing::debug!(
                product_id = self.product_id,
                count = fetched.len(),
                "loaded ratings"
            );
            self.ratings = Some(fetched);
        }
        Ok(self.ratings.as_deref().unwrap_or_default())
    }
}

#[derive(Clone)]
pub struct RatingAggregator {
    db: Db,
    locale: Locale,
}

impl RatingAggregator {
    pub fn new(db: Db, locale: Locale) -> Self {
        Self { db, locale }
    }

    /// 未知商品返回全零的汇总
    pub async fn summarize(&self, product_id: i64) -> Result<RatingSummary> {
        let mut scope = RatingScope::new(&self.db, product_id);
        let ratings = scope.ratings().await?;
        let formatted = self.locale.count_reviews(ratings.len() as i64);
        Ok(RatingSummary::from_ratings(ratings, formatted))
    }
}
