// ==========================================
// 表更新系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: CSV 批量表更新与对账工具 (先快照, 只改副本)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 类型与值语义
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 编排与对账
pub mod engine;

// 导入层 - 解析与校验
pub mod importer;

// 配置层 - 外部配置
pub mod config;

// 报告层 - 错误日志落盘
pub mod report;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{CellValue, FileSummary, OperationKind, RowOutcome, SemanticType};

// 引擎
pub use engine::{find_latest_job_folder, BatchOrchestrator, BatchSummary, FileResult, Reconciler};

// 导入层
pub use importer::{JobFile, UpdateError, UpdateResult};

// 配置
pub use config::{FilterCriteria, Settings};

// 报告
pub use report::{ErrorLog, ErrorRecord, ErrorSink, ERROR_LOG_FILENAME};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "表更新系统";
