use anyhow::Result;
use async_trait::async_trait;
use domain::ExternalReview;

/// 可导入评价的第三方服务
#[async_trait]
pub trait ReviewPlatform: Send + Sync {
    /// 平台代码，随每条导入评价一起存储
    fn code(&self) -> &str;

    async fn fetch_reviews(&self) -> Result<Vec<ExternalReview>>;
}
