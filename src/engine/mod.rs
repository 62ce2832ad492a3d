// ==========================================
// 表更新系统 - 引擎层
// ==========================================
// 职责: 批次编排 / 逐行对账 / 数据库快照
// 红线: 引擎只经 TableStore 访问数据, 所有局部失败必须写入错误日志
// ==========================================

pub mod orchestrator;
pub mod reconciler;
pub mod snapshot;

// 重导出核心引擎
pub use orchestrator::{find_latest_job_folder, BatchOrchestrator, BatchSummary};
pub use reconciler::{FileResult, Reconciler};
