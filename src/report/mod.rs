// ==========================================
// 表更新系统 - 报告层
// ==========================================
// 职责: 结构化错误记录的持久化
// 红线: 错误日志是局部失败唯一的对外记录，必须先落盘再继续
// ==========================================

pub mod error_sink;

// 重导出核心类型
pub use error_sink::{ErrorLog, ErrorRecord, ErrorSink, ERROR_LOG_FILENAME};
