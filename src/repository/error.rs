// ==========================================
// 表更新系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum StoreError {
    // ===== 连接错误 =====
    #[error("数据库连接失败: {path}: {message}")]
    Connection { path: String, message: String },

    // ===== 结构读取错误 =====
    #[error("读取表结构失败: table={table}: {message}")]
    SchemaLookup { table: String, message: String },

    // ===== 查询/写入错误 =====
    #[error("数据库查询失败: {0}")]
    Query(String),
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Query(err.to_string())
    }
}

/// Result 类型别名
pub type StoreResult<T> = Result<T, StoreError>;
