use sqlx::{migrate::MigrateDatabase, sqlite::SqlitePoolOptions, Pool, Sqlite};
use std::{fs, path::Path};
mod models;
mod repo;

pub use models::{CatalogProduct, NewFile, NewReview, ReviewFile, ReviewQuery, StoredFile};

#[derive(Clone)]
pub struct Db {
    pub(crate) pool: Pool<Sqlite>,
}

impl Db {
    pub async fn new(db_url: &str) -> anyhow::Result<Self> {
        let in_memory = db_url.contains(":memory:");
        if db_url.starts_with("sqlite://") && !in_memory {
            let path_str = db_url.trim_start_matches("sqlite://");
            let path = Path::new(path_str);
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
        }
        if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
            Sqlite::create_database(db_url).await?;
        }
        // :memory: 的每个连接都是独立的空库，只能用单连接
        let max_connections = if in_memory { 1 } else { 8 };
        let mut options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            options = options.idle_timeout(None).max_lifetime(None);
        }
        let pool = options
            .connect(db_url)
            .await?;
        if !in_memory {
            sqlx::query("PRAGMA journal_mode = WAL;")
                .execute(&pool)
                .await?;
            sqlx::query("PRAGMA synchronous = NORMAL;")
                .execute(&pool)
                .await?;
        }
        sqlx::migrate!("../../migrations").run(&pool).await?;
        tracing::debug!(url = db_url, "content store ready");
        Ok(Self { pool })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use domain::RichText;

    pub async fn memory_db() -> Db {
        Db::new("sqlite::memory:").await.unwrap()
    }

    pub fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, day)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    pub fn new_review(product_id: Option<i64>, rating: i64) -> NewReview {
        NewReview {
            collection_id: 1,
            title: "Review".into(),
            product_id,
            offer_id: None,
            user_id: None,
            user_name: "Anonymous".into(),
            rating,
            review_text: RichText::plain("Solid and well made"),
            contact_details: None,
            store_response: None,
            active: false,
            external_platform: None,
            external_id: None,
            created_at: at(1),
        }
    }

    /// 插入一条已审核通过的评价
    pub async fn seed_active(db: &Db, product_id: Option<i64>, rating: i64) -> i64 {
        let id = db
            .insert_review(&new_review(product_id, rating), &[])
            .await
            .unwrap()
            .unwrap();
        db.set_review_active(id, true).await.unwrap();
        id
    }
}
