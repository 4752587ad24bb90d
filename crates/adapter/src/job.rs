use std::sync::Arc;

use domain::{CreateResult, ExternalOrigin, ExternalReview, ReviewInput};
use futures::future::join_all;
use serde::Serialize;
use service::{ReviewCreator, ReviewsError};
use storage::Db;
use tracing::{info, warn};

use crate::traits::ReviewPlatform;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImportFailure {
    pub platform: String,
    #[serde(rename = "externalId")]
    pub external_id: Option<String>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub failures: Vec<ImportFailure>,
}

/// 从所有已配置平台拉取评价写入内容库
#[derive(Clone)]
pub struct ImportJob {
    db: Db,
    creator: ReviewCreator,
    platforms: Vec<Arc<dyn ReviewPlatform>>,
}

impl ImportJob {
    pub fn new(db: Db, creator: ReviewCreator, platforms: Vec<Arc<dyn ReviewPlatform>>) -> Self {
        Self {
            db,
            creator,
            platforms,
        }
    }

    /// 对同一批外部数据重复运行不会产生新记录。
    /// 单个平台或单条评价失败只记录下来，批次继续执行。
    pub async fn run(&self) -> ImportReport {
        let mut report = ImportReport::default();

        let fetched = join_all(self.platforms.iter().map(|p| async move {
            (p.code().to_string(), p.fetch_reviews().await)
        }))
        .await;

        for (platform, result) in fetched {
            match result {
                Ok(reviews) => {
                    for review in reviews {
                        self.import_one(review, &mut report).await;
                    }
                }
                Err(e) => {
                    warn!(platform = %platform, "platform fetch failed: {:#}", e);
                    report.failures.push(ImportFailure {
                        platform,
                        external_id: None,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }

        info!(
            imported = report.imported,
            skipped = report.skipped,
            failed = report.failures.len(),
            "review import finished"
        );
        report
    }

    async fn import_one(&self, review: ExternalReview, report: &mut ImportReport) {
        let platform = review.platform.clone();
        let external_id = review.external_id.clone();
        let fail = |reason: String| ImportFailure {
            platform: platform.clone(),
            external_id: Some(external_id.clone()),
            reason,
        };

        // 预检查只是省事，真正防重的是唯一索引
        match self.db.external_review_exists(&platform, &external_id).await {
            Ok(true) => {
                report.skipped += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                warn!(platform = %platform, external_id = %external_id, "dedup check failed: {:#}", e);
                report.failures.push(fail(format!("{:#}", e)));
                return;
            }
        }

        match self.creator.create(to_input(review), Vec::new()).await {
            Ok(CreateResult::Created { .. }) => report.imported += 1,
            Ok(CreateResult::Rejected { errors }) => {
                let reason = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                warn!(platform = %platform, external_id = %external_id, "rejected: {}", reason);
                report.failures.push(fail(reason));
            }
            Err(ReviewsError::Duplicate { .. }) => report.skipped += 1,
            Err(e) => {
                warn!(platform = %platform, external_id = %external_id, "import failed: {}", e);
                report.failures.push(fail(e.to_string()));
            }
        }
    }
}

fn to_input(r: ExternalReview) -> ReviewInput {
    ReviewInput {
        rating: Some(r.rating),
        review: Some(r.text),
        contact_details: None,
        user_name: r.author_name,
        element_id: Some(r.element_id),
        offer_id: None,
        active: None,
        user_id: None,
        origin: Some(ExternalOrigin {
            platform: r.platform,
            external_id: r.external_id,
        }),
    }
}
