// ==========================================
// 表更新系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod error;
pub mod schema_catalog;
pub mod table_store;

// 重导出核心仓储
pub use error::{StoreError, StoreResult};
pub use schema_catalog::{read_table_schema, ColumnDef, SchemaCatalog, TableSchema};
pub use table_store::TableStore;
