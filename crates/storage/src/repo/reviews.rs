use crate::{
    models::{NewReview, ReviewQuery, SqlReview},
    Db,
};
use domain::{Review, RichText, SortDirection, SortField};
use sqlx::{QueryBuilder, Sqlite};

const REVIEW_COLUMNS: &str = r#"
    id, title, product_id, offer_id, user_id, user_name, rating,
    review_text, contact_details, store_response, active,
    external_platform, external_id, created_at
"#;

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Id => "id",
        SortField::CreatedAt => "created_at",
        SortField::Rating => "rating",
    }
}

fn sort_keyword(direction: SortDirection) -> &'static str {
    match direction {
        SortDirection::Asc => "ASC",
        SortDirection::Desc => "DESC",
    }
}

impl Db {
    /// 在同一个事务中写入评价及其文件关联
    ///
    /// 若已存在相同 `(external_platform, external_id)` 的导入评价，
    /// 返回 `None`
    pub async fn insert_review(
        &self,
        r: &NewReview,
        file_ids: &[i64],
    ) -> anyhow::Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let id: Option<i64> = sqlx::query_scalar(
            r#"
            INSERT INTO reviews (
                collection_id, title, product_id, offer_id, user_id, user_name,
                rating, review_text, contact_details, store_response, active,
                external_platform, external_id, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(external_platform, external_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(r.collection_id)
        .bind(&r.title)
        .bind(r.product_id)
        .bind(r.offer_id)
        .bind(r.user_id)
        .bind(&r.user_name)
        .bind(r.rating)
        .bind(r.review_text.to_json())
        .bind(&r.contact_details)
        .bind(r.store_response.as_ref().map(RichText::to_json))
        .bind(r.active)
        .bind(&r.external_platform)
        .bind(&r.external_id)
        .bind(r.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(id) = id else {
            tx.rollback().await?;
            return Ok(None);
        };

        for (position, file_id) in file_ids.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO review_files (review_id, file_id, position)
                VALUES (?, ?, ?)
                "#,
            )
            .bind(id)
            .bind(file_id)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(Some(id))
    }

    pub async fn get_review(&self, id: i64) -> anyhow::Result<Option<Review>> {
        let row = sqlx::query_as::<_, SqlReview>(&format!(
            "SELECT {} FROM reviews WHERE id = ?",
            REVIEW_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let file_ids: Vec<i64> = sqlx::query_scalar(
            "SELECT file_id FROM review_files WHERE review_id = ? ORDER BY position ASC",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut review: Review = row.into();
        review.file_ids = file_ids;
        Ok(Some(review))
    }

    /// 一页已发布评价。`product_id = None` 时跨所有商品
    pub async fn list_active_reviews(&self, q: &ReviewQuery) -> anyhow::Result<Vec<Review>> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM reviews WHERE active = TRUE",
            REVIEW_COLUMNS
        ));
        if let Some(product_id) = q.product_id {
            qb.push(" AND product_id = ").push_bind(product_id);
        }

        let column = sort_column(q.sort_field);
        let keyword = sort_keyword(q.direction);
        qb.push(format_args!(" ORDER BY {} {}", column, keyword));
        if column != "id" {
            qb.push(format_args!(", id {}", keyword));
        }
        qb.push(" LIMIT ")
            .push_bind(q.limit)
            .push(" OFFSET ")
            .push_bind(q.offset);

        let rows = qb
            .build_query_as::<SqlReview>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// 某商品的已发布评价数，`product_id` 为 `None` 时统计全部
    pub async fn count_active_reviews(&self, product_id: Option<i64>) -> anyhow::Result<i64> {
        let count: i64 = match product_id {
            Some(pid) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM reviews WHERE active = TRUE AND product_id = ?",
                )
                .bind(pid)
                .fetch_one(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM reviews WHERE active = TRUE")
                    .fetch_one(&self.pool)
                    .await?
            }
        };
        Ok(count)
    }

    pub async fn active_ratings(&self, product_id: i64) -> anyhow::Result<Vec<i64>> {
        let ratings = sqlx::query_scalar(
            "SELECT rating FROM reviews WHERE active = TRUE AND product_id = ?",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(ratings)
    }

    pub async fn external_review_exists(
        &self,
        platform: &str,
        external_id: &str,
    ) -> anyhow::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM reviews WHERE external_platform = ? AND external_id = ? LIMIT 1",
        )
        .bind(platform)
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    pub async fn user_has_active_review(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> anyhow::Result<bool> {
        let found: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT id FROM reviews
            WHERE active = TRUE AND user_id = ? AND product_id = ?
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    /// id 不存在时返回 `false`
    pub async fn set_review_active(&self, id: i64, active: bool) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE reviews SET active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn set_store_response(&self, id: i64, response: &RichText) -> anyhow::Result<bool> {
        let res = sqlx::query("UPDATE reviews SET store_response = ? WHERE id = ?")
            .bind(response.to_json())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
