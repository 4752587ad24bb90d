use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReviewsError {
    /// 必需的集合 id 未配置
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 文件持久化失败
    #[error("IO failure: {0}")]
    Io(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// 相同 platform/external id 的导入评价已存在
    #[error("Review {external_id} from {platform} is already imported")]
    Duplicate {
        platform: String,
        external_id: String,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ReviewsError>;
