mod drivers;
mod job;
mod traits;

pub use drivers::two_gis::{TwoGisConfig, TwoGisPlatform};
pub use job::{ImportFailure, ImportJob, ImportReport};
pub use traits::ReviewPlatform;

use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

/// 配置文件中的一个外部评价来源
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind")]
pub enum PlatformConfig {
    #[serde(rename = "2gis")]
    TwoGis(TwoGisConfig),
}

pub fn build_platforms(configs: &[PlatformConfig]) -> anyhow::Result<Vec<Arc<dyn ReviewPlatform>>> {
    configs
        .iter()
        .map(|c| -> anyhow::Result<Arc<dyn ReviewPlatform>> {
            match c {
                PlatformConfig::TwoGis(cfg) => {
                    info!(branch = %cfg.branch_id, "Registering 2GIS review source");
                    Ok(Arc::new(TwoGisPlatform::new(cfg.clone())?))
                }
            }
        })
        .collect()
}
