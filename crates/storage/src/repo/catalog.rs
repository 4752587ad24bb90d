use crate::{models::CatalogProduct, Db};
use sqlx::{QueryBuilder, Sqlite};

impl Db {
    /// 在单个目录集合内批量查询商品
    pub async fn products_by_ids(
        &self,
        collection_id: i64,
        ids: &[i64],
    ) -> anyhow::Result<Vec<CatalogProduct>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            r#"
            SELECT id, collection_id, name, code, preview_picture, detail_picture, url, active
            FROM catalog_products
            WHERE collection_id =
            "#,
        );
        qb.push_bind(collection_id).push(" AND id IN (");
        let mut sep = qb.separated(", ");
        for id in ids {
            sep.push_bind(*id);
        }
        sep.push_unseparated(")");

        let rows = qb
            .build_query_as::<CatalogProduct>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn upsert_product(&self, p: &CatalogProduct) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO catalog_products (
                id, collection_id, name, code, preview_picture, detail_picture, url, active
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                collection_id = excluded.collection_id,
                name = excluded.name,
                code = excluded.code,
                preview_picture = excluded.preview_picture,
                detail_picture = excluded.detail_picture,
                url = excluded.url,
                active = excluded.active
            "#,
        )
        .bind(p.id)
        .bind(p.collection_id)
        .bind(&p.name)
        .bind(&p.code)
        .bind(&p.preview_picture)
        .bind(&p.detail_picture)
        .bind(&p.url)
        .bind(p.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::memory_db;
    use crate::CatalogProduct;

    fn product(id: i64, collection_id: i64) -> CatalogProduct {
        CatalogProduct {
            id,
            collection_id,
            name: format!("Product {}", id),
            code: None,
            preview_picture: Some(format!("/img/{}.jpg", id)),
            detail_picture: None,
            url: Some(format!("/catalog/{}/", id)),
            active: true,
        }
    }

    #[tokio::test]
    async fn lookup_is_scoped_to_collection() {
        let db = memory_db().await;
        db.upsert_product(&product(1, 10)).await.unwrap();
        db.upsert_product(&product(2, 10)).await.unwrap();
        db.upsert_product(&product(3, 20)).await.unwrap();

        let mut found = db.products_by_ids(10, &[1, 2, 3, 4]).await.unwrap();
        found.sort_by_key(|p| p.id);
        assert_eq!(found.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(db.products_by_ids(10, &[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn upsert_replaces_existing_product() {
        let db = memory_db().await;
        db.upsert_product(&product(1, 10)).await.unwrap();
        let mut renamed = product(1, 10);
        renamed.name = "Renamed".into();
        renamed.active = false;
        db.upsert_product(&renamed).await.unwrap();

        let found = db.products_by_ids(10, &[1]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Renamed");
        assert!(!found[0].active);
    }
}
