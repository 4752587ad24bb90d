use std::collections::HashMap;

use domain::ProductInfo;
use storage::{CatalogProduct, Db};

use crate::error::{Result, ReviewsError};

/// 从已配置的目录集合读取商品摘要
#[derive(Clone)]
pub struct CatalogLookup {
    db: Db,
    catalog_id: Option<i64>,
}

impl CatalogLookup {
    pub fn new(db: Db, catalog_id: Option<i64>) -> Self {
        Self { db, catalog_id }
    }

    pub fn is_configured(&self) -> bool {
        self.catalog_id.is_some()
    }

    fn collection_id(&self) -> Result<i64> {
        self.catalog_id.ok_or_else(|| {
            tracing::error!("catalog collection id is not configured");
            ReviewsError::Configuration("catalog collection id is not set".into())
        })
    }

    /// 所有 id 只查一次。目录中不存在的 id
    /// 不会出现在结果里。
    pub async fn products(&self, ids: &[i64]) -> Result<HashMap<i64, ProductInfo>> {
        let collection_id = self.collection_id()?;
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = self.db.products_by_ids(collection_id, ids).await?;
        Ok(rows.into_iter().map(|p| (p.id, to_info(p))).collect())
    }

    pub async fn exists(&self, id: i64) -> Result<bool> {
        Ok(self.products(&[id]).await?.contains_key(&id))
    }
}

fn to_info(p: CatalogProduct) -> ProductInfo {
    let images = [p.preview_picture, p.detail_picture]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    ProductInfo {
        id: p.id,
        name: p.name,
        images,
        url: p.url,
        active: p.active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{memory_db, product};

    #[tokio::test]
    async fn missing_catalog_id_is_a_configuration_error() {
        let lookup = CatalogLookup::new(memory_db().await, None);
        let err = lookup.products(&[1]).await.unwrap_err();
        assert!(matches!(err, ReviewsError::Configuration(_)));
    }

    #[tokio::test]
    async fn maps_rows_to_summaries() {
        let db = memory_db().await;
        db.upsert_product(&product(5, 3)).await.unwrap();
        let mut bare = product(6, 3);
        bare.preview_picture = None;
        bare.detail_picture = Some(String::new());
        db.upsert_product(&bare).await.unwrap();

        let lookup = CatalogLookup::new(db, Some(3));
        let found = lookup.products(&[5, 6, 7]).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[&5].images.len(), 2);
        assert_eq!(found[&5].url.as_deref(), Some("/catalog/product-5/"));
        assert!(found[&6].images.is_empty());

        assert!(lookup.exists(5).await.unwrap());
        assert!(!lookup.exists(7).await.unwrap());
    }
}
