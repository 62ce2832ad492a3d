// ==========================================
// 表更新系统 - 行级数据访问
// ==========================================
// 职责: 动态列集的计数 / 插入 / 更新
// 约束: 列名与表名一律转义引用; 参数经 params_from_iter 绑定
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::CellValue;
use crate::repository::error::{StoreError, StoreResult};
use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::path::Path;

impl ToSql for CellValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            // Missing 不应到达写入路径; 若到达，与 Null 同样落 NULL
            CellValue::Missing | CellValue::Null => Ok(ToSqlOutput::Owned(Value::Null)),
            CellValue::Text(s) => Ok(ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes()))),
            CellValue::Integer(i) => Ok(ToSqlOutput::Owned(Value::Integer(*i))),
            CellValue::Float(f) => Ok(ToSqlOutput::Owned(Value::Real(*f))),
            CellValue::Bool(b) => Ok(ToSqlOutput::Owned(Value::Integer(*b as i64))),
        }
    }
}

/// 转义 SQL 标识符（表名/列名）
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// ==========================================
// TableStore - 行级存储访问
// ==========================================
// 每个文件处理流程持有一个作用域连接，结束（含出错）即关闭
pub struct TableStore {
    conn: Connection,
}

impl TableStore {
    /// 打开存储连接
    pub fn open<P: AsRef<Path>>(db_path: P) -> StoreResult<Self> {
        let conn = open_sqlite_connection(db_path.as_ref()).map_err(|e| StoreError::Connection {
            path: db_path.as_ref().display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { conn })
    }

    /// 从已有连接构造（测试用）
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// 统计满足过滤条件（全部 AND 等值匹配）的现有行数
    pub fn count_matching(&self, table: &str, filters: &[(String, CellValue)]) -> StoreResult<i64> {
        let where_clause = filters
            .iter()
            .map(|(col, _)| format!("{} = ?", quote_ident(col)))
            .collect::<Vec<_>>()
            .join(" AND ");

        let sql = format!(
            "SELECT COUNT(*) FROM {} WHERE {}",
            quote_ident(table),
            where_clause
        );

        let count = self.conn.query_row(
            &sql,
            params_from_iter(filters.iter().map(|(_, v)| v)),
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }

    /// 插入一行（只写入给定列; 空列集由调用方拦截）
    pub fn insert_row(&self, table: &str, columns: &[(String, CellValue)]) -> StoreResult<()> {
        let column_list = columns
            .iter()
            .map(|(col, _)| quote_ident(col))
            .collect::<Vec<_>>()
            .join(",");
        let placeholders = vec!["?"; columns.len()].join(",");

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            column_list,
            placeholders
        );

        self.conn
            .execute(&sql, params_from_iter(columns.iter().map(|(_, v)| v)))?;
        Ok(())
    }

    /// 更新匹配过滤条件的行（SET 列表 + WHERE 条件，参数顺序: SET 先, WHERE 后）
    pub fn update_row(
        &self,
        table: &str,
        sets: &[(String, CellValue)],
        filters: &[(String, CellValue)],
    ) -> StoreResult<()> {
        let set_clause = sets
            .iter()
            .map(|(col, _)| format!("{} = ?", quote_ident(col)))
            .collect::<Vec<_>>()
            .join(",");
        let where_clause = filters
            .iter()
            .map(|(col, _)| format!("{} = ?", quote_ident(col)))
            .collect::<Vec<_>>()
            .join(" AND ");

        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            quote_ident(table),
            set_clause,
            where_clause
        );

        let params: Vec<&CellValue> = sets
            .iter()
            .map(|(_, v)| v)
            .chain(filters.iter().map(|(_, v)| v))
            .collect();

        self.conn.execute(&sql, params_from_iter(params))?;
        Ok(())
    }
}
