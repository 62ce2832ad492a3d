// ==========================================
// 表更新系统 - 表结构目录
// ==========================================
// 职责: 从存储读取"列名 → 声明类型"映射（保留表定义列序）
// 约束: 不做缓存，每次调用反映存储的当前状态
//       （作业之间表结构可能变化）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{StoreError, StoreResult};
use rusqlite::Connection;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// 单列定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    /// 声明类型（统一转为大写，便于语义类型派生）
    pub declared_type: String,
}

/// 表结构: 按表定义顺序排列的列集合
#[derive(Debug, Clone, Default)]
pub struct TableSchema {
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    /// 按表定义顺序迭代列
    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    /// 按列名查找声明类型（大小写敏感，与存储中列名一致）
    pub fn declared_type(&self, column: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| c.declared_type.as_str())
    }

    /// 列名全集（小写），用于大小写不敏感的表头校验
    pub fn lowercase_names(&self) -> HashSet<String> {
        self.columns.iter().map(|c| c.name.to_lowercase()).collect()
    }

    /// 列名全集（原始大小写）
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

// ==========================================
// SchemaCatalog - 表结构目录
// ==========================================
pub struct SchemaCatalog {
    db_path: PathBuf,
}

impl SchemaCatalog {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    /// 读取指定表的结构
    ///
    /// # 返回
    /// - Ok(TableSchema): 按表定义顺序的列定义
    /// - Err(StoreError::SchemaLookup): 表不存在
    /// - Err(StoreError::Connection): 存储不可达
    ///
    /// 说明: 每次调用独立开/关一个连接。按调用频率看这里存在
    /// 复用连接的优化空间，但正确性要求是"反映当前状态"，暂不缓存。
    pub fn get_schema(&self, table: &str) -> StoreResult<TableSchema> {
        let conn =
            open_sqlite_connection(&self.db_path).map_err(|e| StoreError::Connection {
                path: self.db_path.display().to_string(),
                message: e.to_string(),
            })?;

        read_table_schema(&conn, table)
    }
}

/// 基于已有连接读取表结构（PRAGMA table_info，保留 cid 顺序）
pub fn read_table_schema(conn: &Connection, table: &str) -> StoreResult<TableSchema> {
    let sql = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
    let mut stmt = conn.prepare(&sql).map_err(|e| StoreError::SchemaLookup {
        table: table.to_string(),
        message: e.to_string(),
    })?;

    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnDef {
                name: row.get::<_, String>(1)?,
                declared_type: row.get::<_, String>(2)?.to_uppercase(),
            })
        })
        .map_err(|e| StoreError::SchemaLookup {
            table: table.to_string(),
            message: e.to_string(),
        })?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| StoreError::SchemaLookup {
            table: table.to_string(),
            message: e.to_string(),
        })?;

    // PRAGMA table_info 对不存在的表返回空集，统一视为查找失败
    if columns.is_empty() {
        return Err(StoreError::SchemaLookup {
            table: table.to_string(),
            message: "表不存在".to_string(),
        });
    }

    Ok(TableSchema::new(columns))
}
