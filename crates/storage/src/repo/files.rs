use crate::{
    models::{NewFile, ReviewFile, StoredFile},
    Db,
};
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite};

impl Db {
    pub async fn insert_file(&self, f: &NewFile) -> anyhow::Result<StoredFile> {
        let now = Utc::now().naive_utc();
        let stored = sqlx::query_as::<_, StoredFile>(
            r#"
            INSERT INTO files (subdir, file_name, original_name, content_type, size, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id, subdir, file_name, original_name, content_type, size, created_at
            "#,
        )
        .bind(&f.subdir)
        .bind(&f.file_name)
        .bind(&f.original_name)
        .bind(&f.content_type)
        .bind(f.size)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;
        Ok(stored)
    }

    /// 删除文件行以及指向它的评价关联
    pub async fn delete_file(&self, id: i64) -> anyhow::Result<Option<StoredFile>> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query_as::<_, StoredFile>(
            r#"
            SELECT id, subdir, file_name, original_name, content_type, size, created_at
            FROM files WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            sqlx::query("DELETE FROM review_files WHERE file_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM files WHERE id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(existing)
    }

    /// 按附件顺序返回指定评价的文件。没有文件的评价
    /// 不产生任何行。
    pub async fn files_for_reviews(&self, review_ids: &[i64]) -> anyhow::Result<Vec<ReviewFile>> {
        if review_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT rf.review_id, f.id AS file_id, f.subdir, f.file_name, f.content_type
            FROM review_files rf
            INNER JOIN files f ON f.id = rf.file_id
            WHERE rf.review_id IN (
            "#,
        );
        let mut sep = qb.separated(", ");
        for id in review_ids {
            sep.push_bind(*id);
        }
        sep.push_unseparated(") ORDER BY rf.review_id ASC, rf.position ASC");

        let rows = qb
            .build_query_as::<ReviewFile>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// 某商品已发布评价中最新的附件
    pub async fn product_files(&self, product_id: i64, limit: i64) -> anyhow::Result<Vec<ReviewFile>> {
        let rows = sqlx::query_as::<_, ReviewFile>(
            r#"
            SELECT rf.review_id, f.id AS file_id, f.subdir, f.file_name, f.content_type
            FROM reviews r
            INNER JOIN review_files rf ON rf.review_id = r.id
            INNER JOIN files f ON f.id = rf.file_id
            WHERE r.active = TRUE AND r.product_id = ?
            ORDER BY r.id DESC, rf.position ASC
            LIMIT ?
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
