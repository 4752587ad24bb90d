use chrono::Utc;
use domain::{CreateResult, Locale, ReviewInput, RichText, ValidReview, ANONYMOUS_NAME};
use storage::{Db, NewReview};
use tracing::{info, warn};

use crate::catalog::CatalogLookup;
use crate::error::{Result, ReviewsError};
use crate::upload::{FileUploader, RawUpload};
use crate::Collections;

/// 校验、上传附件并写入新评价，新评价一律待审核
#[derive(Clone)]
pub struct ReviewCreator {
    db: Db,
    uploader: FileUploader,
    catalog: CatalogLookup,
    offers: CatalogLookup,
    collections: Collections,
    locale: Locale,
}

impl ReviewCreator {
    pub fn new(db: Db, uploader: FileUploader, collections: Collections, locale: Locale) -> Self {
        let catalog = CatalogLookup::new(db.clone(), collections.catalog_id);
        let offers = CatalogLookup::new(db.clone(), collections.offers_id);
        Self {
            db,
            uploader,
            catalog,
            offers,
            collections,
            locale,
        }
    }

    /// 字段错误以 `CreateResult::Rejected` 返回；配置缺失、
    /// 商品不存在、文件与存储失败以 `Err` 返回
    pub async fn create(&self, input: ReviewInput, files: Vec<RawUpload>) -> Result<CreateResult> {
        if input.active == Some(true) {
            warn!("ignoring caller-supplied active flag on new review");
        }

        let valid = match input.validate() {
            Ok(v) => v,
            Err(errors) => return Ok(CreateResult::Rejected { errors }),
        };

        let collection_id = self.collections.reviews_id.ok_or_else(|| {
            tracing::error!("reviews collection id is not configured");
            ReviewsError::Configuration("reviews collection id is not set".into())
        })?;

        // 未配置目录时无从校验商品
        if self.catalog.is_configured() && !self.catalog.exists(valid.product_id).await? {
            return Err(ReviewsError::NotFound(format!(
                "product {}",
                valid.product_id
            )));
        }

        if let Some(offer_id) = valid.offer_id {
            if self.offers.is_configured() && !self.offers.exists(offer_id).await? {
                return Err(ReviewsError::NotFound(format!("offer {}", offer_id)));
            }
        }

        let file_refs = self.uploader.upload(files).await?;
        let file_ids: Vec<i64> = file_refs.iter().map(|f| f.id).collect();

        let record = self.build_record(collection_id, &valid);
        let inserted = match self.db.insert_review(&record, &file_ids).await {
            Ok(id) => id,
            Err(e) => {
                self.uploader.discard(&file_refs).await;
                return Err(e.into());
            }
        };

        match inserted {
            Some(review_id) => {
                info!(
                    review_id,
                    product_id = valid.product_id,
                    files = file_ids.len(),
                    "review created, pending moderation"
                );
                Ok(CreateResult::Created { review_id })
            }
            None => {
                self.uploader.discard(&file_refs).await;
                // 只有带外部来源的行才会冲突
                let (platform, external_id) = valid
                    .origin
                    .map(|o| (o.platform, o.external_id))
                    .unwrap_or_default();
                Err(ReviewsError::Duplicate {
                    platform,
                    external_id,
                })
            }
        }
    }

    fn build_record(&self, collection_id: i64, valid: &ValidReview) -> NewReview {
        let user_name = valid
            .user_name
            .clone()
            .unwrap_or_else(|| ANONYMOUS_NAME.to_string());
        let (external_platform, external_id) = match &valid.origin {
            Some(o) => (Some(o.platform.clone()), Some(o.external_id.clone())),
            None => (None, None),
        };

        NewReview {
            collection_id,
            title: self.locale.review_title(Some(valid.product_id), &user_name),
            product_id: Some(valid.product_id),
            offer_id: valid.offer_id,
            user_id: valid.user_id,
            user_name,
            rating: valid.rating,
            review_text: RichText::plain(valid.text.clone()),
            contact_details: valid.contact_details.clone(),
            store_response: None,
            active: false,
            external_platform,
            external_id,
            created_at: Utc::now().naive_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_db, product};
    use crate::upload::tests::{raw, FakeStore};
    use domain::ExternalOrigin;
    use std::sync::Arc;

    fn collections() -> Collections {
        Collections {
            reviews_id: Some(1),
            catalog_id: None,
            offers_id: None,
        }
    }

    fn creator(db: Db, store: Arc<FakeStore>, collections: Collections) -> ReviewCreator {
        ReviewCreator::new(
            db,
            FileUploader::new(store, "reviews"),
            collections,
            Locale::En,
        )
    }

    fn input(rating: i64) -> ReviewInput {
        ReviewInput {
            rating: Some(rating),
            review: Some("Great product, fast delivery".into()),
            element_id: Some(42),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn out_of_range_rating_is_rejected_not_stored() {
        let db = memory_db().await;
        let c = creator(db.clone(), Arc::new(FakeStore::default()), collections());

        let result = c.create(input(6), vec![]).await.unwrap();
        match result {
            CreateResult::Rejected { errors } => assert_eq!(errors[0].field, "rating"),
            other => panic!("expected rejection, got {:?}", other),
        }
        assert_eq!(db.count_active_reviews(None).await.unwrap(), 0);
        assert!(db.get_review(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn new_reviews_are_pending_even_when_caller_says_active() {
        let db = memory_db().await;
        let c = creator(db.clone(), Arc::new(FakeStore::default()), collections());

        let mut i = input(5);
        i.active = Some(true);
        let id = c.create(i, vec![]).await.unwrap().review_id().unwrap();

        let stored = db.get_review(id).await.unwrap().unwrap();
        assert!(!stored.active);
        assert_eq!(stored.rating, 5);
        assert_eq!(stored.user_name, "Anonymous");
        assert_eq!(stored.user_id, None);
        assert_eq!(stored.title, "Review of product 42");
    }

    #[tokio::test]
    async fn anonymous_default_is_stored_unlocalized() {
        let db = memory_db().await;
        let c = ReviewCreator::new(
            db.clone(),
            FileUploader::new(Arc::new(FakeStore::default()), "reviews"),
            collections(),
            Locale::Ru,
        );
        let id = c.create(input(5), vec![]).await.unwrap().review_id().unwrap();
        let stored = db.get_review(id).await.unwrap().unwrap();
        assert_eq!(stored.user_name, ANONYMOUS_NAME);
        assert_eq!(stored.title, "Отзыв на товар - 42");
    }

    #[tokio::test]
    async fn authenticated_user_and_files_are_recorded() {
        let db = memory_db().await;
        let store = Arc::new(FakeStore::default());
        let c = creator(db.clone(), store.clone(), collections());

        let mut i = input(4);
        i.user_id = Some(77);
        i.user_name = Some("Maria".into());
        i.contact_details = Some("maria@example.com".into());
        // FakeStore 分配的 id 是 1 和 2，先在内容库里准备对应的行
        for name in ["a.png", "b.png"] {
            db.insert_file(&storage::NewFile {
                subdir: "reviews/000".into(),
                file_name: name.into(),
                original_name: name.into(),
                content_type: "image/png".into(),
                size: 3,
            })
            .await
            .unwrap();
        }
        let id = c
            .create(i, vec![raw("a.png"), raw("b.png")])
            .await
            .unwrap()
            .review_id()
            .unwrap();

        let stored = db.get_review(id).await.unwrap().unwrap();
        assert_eq!(stored.user_id, Some(77));
        assert_eq!(stored.user_name, "Maria");
        assert_eq!(stored.contact_details.as_deref(), Some("maria@example.com"));
        assert_eq!(stored.file_ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn failed_upload_writes_no_review() {
        let db = memory_db().await;
        let store = Arc::new(FakeStore {
            fail_on: Some("b.png".into()),
            ..Default::default()
        });
        let c = creator(db.clone(), store.clone(), collections());

        let err = c
            .create(input(5), vec![raw("a.png"), raw("b.png")])
            .await
            .unwrap_err();
        assert!(matches!(err, ReviewsError::Io(_)));
        assert!(db.get_review(1).await.unwrap().is_none());
        assert_eq!(*store.deleted.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn missing_reviews_collection_is_a_configuration_error() {
        let c = creator(
            memory_db().await,
            Arc::new(FakeStore::default()),
            Collections::default(),
        );
        let err = c.create(input(5), vec![]).await.unwrap_err();
        assert!(matches!(err, ReviewsError::Configuration(_)));
    }

    #[tokio::test]
    async fn unknown_product_fails_when_catalog_is_configured() {
        let db = memory_db().await;
        db.upsert_product(&product(42, 9)).await.unwrap();
        let mut cols = collections();
        cols.catalog_id = Some(9);
        let c = creator(db, Arc::new(FakeStore::default()), cols);

        assert!(c.create(input(5), vec![]).await.unwrap().is_success());

        let mut other = input(5);
        other.element_id = Some(43);
        let err = c.create(other, vec![]).await.unwrap_err();
        assert!(matches!(err, ReviewsError::NotFound(_)));
    }

    #[tokio::test]
    async fn offer_is_checked_against_the_offers_collection() {
        let db = memory_db().await;
        db.upsert_product(&product(501, 12)).await.unwrap();
        let mut cols = collections();
        cols.offers_id = Some(12);
        let c = creator(db.clone(), Arc::new(FakeStore::default()), cols);

        let mut known = input(4);
        known.offer_id = Some(501);
        let id = c.create(known, vec![]).await.unwrap().review_id().unwrap();
        assert_eq!(db.get_review(id).await.unwrap().unwrap().offer_id, Some(501));

        let mut unknown = input(4);
        unknown.offer_id = Some(502);
        let err = c.create(unknown, vec![]).await.unwrap_err();
        assert!(matches!(err, ReviewsError::NotFound(m) if m == "offer 502"));

        // 未配置 offers 集合时不做校验，直接保存
        let unchecked = creator(db.clone(), Arc::new(FakeStore::default()), collections());
        let mut any = input(4);
        any.offer_id = Some(999);
        assert!(unchecked.create(any, vec![]).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn duplicate_import_is_reported_and_files_discarded() {
        let db = memory_db().await;
        let store = Arc::new(FakeStore::default());
        let c = creator(db.clone(), store.clone(), collections());

        let mut i = input(5);
        i.origin = Some(ExternalOrigin {
            platform: "2gis".into(),
            external_id: "r-1".into(),
        });
        assert!(c.create(i.clone(), vec![]).await.unwrap().is_success());

        let err = c.create(i, vec![]).await.unwrap_err();
        match err {
            ReviewsError::Duplicate {
                platform,
                external_id,
            } => {
                assert_eq!(platform, "2gis");
                assert_eq!(external_id, "r-1");
            }
            other => panic!("expected duplicate, got {:?}", other),
        }
        assert_eq!(db.count_active_reviews(None).await.unwrap(), 0);
    }
}
