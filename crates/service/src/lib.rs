mod catalog;
mod creator;
mod error;
mod listing;
mod rating;
mod upload;

pub use catalog::CatalogLookup;
pub use creator::ReviewCreator;
pub use error::{Result, ReviewsError};
pub use listing::ListingComposer;
pub use rating::{RatingAggregator, RatingScope};
pub use upload::{FileStore, FileUploader, LocalFileStore, PreparedFile, RawUpload};

use serde::Deserialize;

/// 启动时解析的内容库集合 id
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Collections {
    pub reviews_id: Option<i64>,
    pub catalog_id: Option<i64>,
    pub offers_id: Option<i64>,
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDateTime;
    use domain::RichText;
    use storage::{CatalogProduct, Db, NewReview};

    pub async fn memory_db() -> Db {
        Db::new("sqlite::memory:").await.unwrap()
    }

    pub fn review_at(product_id: Option<i64>, rating: i64, created_at: NaiveDateTime) -> NewReview {
        NewReview {
            collection_id: 1,
            title: "Review".into(),
            product_id,
            offer_id: None,
            user_id: None,
            user_name: "Ivan".into(),
            rating,
            review_text: RichText::plain("Works exactly as described"),
            contact_details: None,
            store_response: None,
            active: false,
            external_platform: None,
            external_id: None,
            created_at,
        }
    }

    pub fn at_march_5() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    pub async fn seed(db: &Db, product_id: Option<i64>, rating: i64, active: bool) -> i64 {
        let id = db
            .insert_review(&review_at(product_id, rating, at_march_5()), &[])
            .await
            .unwrap()
            .unwrap();
        if active {
            db.set_review_active(id, true).await.unwrap();
        }
        id
    }

    pub fn product(id: i64, collection_id: i64) -> CatalogProduct {
        CatalogProduct {
            id,
            collection_id,
            name: format!("Product {}", id),
            code: Some(format!("product-{}", id)),
            preview_picture: Some(format!("/upload/catalog/{}-preview.jpg", id)),
            detail_picture: Some(format!("/upload/catalog/{}-detail.jpg", id)),
            url: Some(format!("/catalog/product-{}/", id)),
            active: true,
        }
    }
}
