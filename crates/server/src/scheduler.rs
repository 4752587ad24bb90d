use std::time::Duration;

use adapter::ImportJob;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// 每隔 `every` 执行一次导入，直到 `shutdown` 触发。
/// 单次运行超时会顺延下一次 tick，不会补跑。
pub async fn run_imports(
    job: ImportJob,
    every: Duration,
    run_on_startup: bool,
    shutdown: CancellationToken,
) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    if !run_on_startup {
        // 第一个 tick 会立即返回
        ticker.tick().await;
    }

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("import scheduler stopped");
                return;
            }
            _ = ticker.tick() => {
                let report = job.run().await;
                info!(
                    imported = report.imported,
                    skipped = report.skipped,
                    failed = report.failures.len(),
                    "scheduled import done"
                );
            }
        }
    }
}
