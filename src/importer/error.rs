// ==========================================
// 表更新系统 - 更新流程错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级: 行级错误(继续处理) / 文件级错误(跳过文件) / 批次级错误(终止)
// ==========================================

use crate::repository::error::StoreError;
use thiserror::Error;

/// 更新流程错误类型
#[derive(Error, Debug)]
pub enum UpdateError {
    // ===== 文件级错误（跳过该文件，批次继续）=====
    #[error("文件名格式不合法: {filename}（期望: <table>_(append|update)_<数字>.csv）")]
    FilenameFormat { filename: String },

    #[error("表 {table} 缺少过滤条件配置（update 作业必须配置非空 filter_fields）")]
    MissingFilterCriteria { table: String },

    #[error("CSV 表头校验失败 (table: {table}): 未知列 {unknown_columns:?}")]
    SchemaValidation {
        table: String,
        unknown_columns: Vec<String>,
    },

    #[error("CSV 类型转换失败 (行 {row}, 列 {column}): 无法将 {value:?} 解析为 {target}")]
    Coercion {
        row: usize,
        column: String,
        value: String,
        target: String,
    },

    #[error("CSV 读取失败: {0}")]
    CsvRead(String),

    // ===== 行级错误（跳过该行，文件继续）=====
    #[error("行 {row}: 未找到可用的过滤条件")]
    NoFilterCondition { row: usize },

    #[error("行 {row}: 过滤条件匹配到 {match_count} 条记录，拒绝更新")]
    MultipleMatchConflict { row: usize, match_count: i64 },

    // ===== 批次级错误（终止整个批次）=====
    #[error("源数据库不存在: {path}")]
    SourceNotFound { path: String },

    #[error("作业文件夹不存在: {path}")]
    JobFolderNotFound { path: String },

    #[error("作业文件夹命名不合法: {name}（期望: YYMMDD_update）")]
    JobFolderNameInvalid { name: String },

    // ===== 数据库错误 =====
    #[error("数据库访问失败: {0}")]
    Store(#[from] StoreError),

    // ===== 通用错误 =====
    #[error("文件读取失败: {0}")]
    FileReadError(String),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for UpdateError {
    fn from(err: std::io::Error) -> Self {
        UpdateError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for UpdateError {
    fn from(err: csv::Error) -> Self {
        UpdateError::CsvRead(err.to_string())
    }
}

/// Result 类型别名
pub type UpdateResult<T> = Result<T, UpdateError>;
