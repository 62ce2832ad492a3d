// ==========================================
// 表更新系统 - 领域模型层
// ==========================================
// 职责: 定义语义类型、作业类型、单元格值与行级结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod types;

// 重导出核心类型
pub use types::{CellValue, FileSummary, OperationKind, RowOutcome, SemanticType};
