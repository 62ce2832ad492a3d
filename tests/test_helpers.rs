// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 搭建作业根目录（基准数据库 + 配置 + 作业文件夹）
// ==========================================

use rusqlite::Connection;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 测试用作业环境
///
/// 目录布局与生产一致:
/// ```text
/// <base>/
///   tax_database.sqlite
///   config.json
///   update_criteria.json
///   250627_update/
///     <作业 CSV 文件>
/// ```
pub struct TestEnv {
    pub base: TempDir,
    pub database: PathBuf,
    pub job_folder: PathBuf,
}

impl TestEnv {
    /// 本批次写入的数据库副本路径
    pub fn snapshot_path(&self) -> PathBuf {
        self.job_folder.join("tax_database_250627.sqlite")
    }

    /// 往作业文件夹写一个 CSV 文件
    pub fn write_csv(&self, filename: &str, content: &str) {
        fs::write(self.job_folder.join(filename), content).unwrap();
    }

    /// 打开基准数据库
    pub fn open_source(&self) -> Connection {
        Connection::open(&self.database).unwrap()
    }

    /// 打开本批次的数据库副本
    pub fn open_snapshot(&self) -> Connection {
        Connection::open(self.snapshot_path()).unwrap()
    }
}

/// 搭建标准测试环境: detail / widgets 两张表 + detail 的过滤条件配置
pub fn setup_env() -> TestEnv {
    let base = TempDir::new().unwrap();
    let database = base.path().join("tax_database.sqlite");

    let conn = Connection::open(&database).unwrap();
    init_schema(&conn);
    drop(conn);

    fs::write(
        base.path().join("config.json"),
        format!(r#"{{ "database_path": "{}" }}"#, database.display()),
    )
    .unwrap();
    fs::write(
        base.path().join("update_criteria.json"),
        r#"{ "detail": { "filter_fields": ["geocode", "tax_type"] } }"#,
    )
    .unwrap();

    let job_folder = base.path().join("250627_update");
    fs::create_dir(&job_folder).unwrap();

    TestEnv {
        base,
        database,
        job_folder,
    }
}

/// 初始化测试表结构
fn init_schema(conn: &Connection) {
    conn.execute_batch(
        r#"
        CREATE TABLE detail (
            geocode VARCHAR(12),
            tax_type CHAR(2),
            description TEXT,
            tax_rate DECIMAL(10,6),
            tier INTEGER,
            taxable BOOLEAN,
            effective DATE
        );
        CREATE TABLE widgets (
            sku VARCHAR(20),
            label TEXT
        );
        "#,
    )
    .unwrap();
}

/// 往基准库 detail 表插一行
pub fn seed_detail_row(
    conn: &Connection,
    geocode: &str,
    tax_type: &str,
    description: &str,
    tax_rate: f64,
) {
    conn.execute(
        "INSERT INTO detail (geocode, tax_type, description, tax_rate) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![geocode, tax_type, description, tax_rate],
    )
    .unwrap();
}

/// 某表的当前行数
pub fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))
        .unwrap()
}

/// 读取作业文件夹内的错误日志
pub fn read_error_log(job_folder: &Path) -> table_updater::ErrorLog {
    table_updater::ErrorSink::new(job_folder).load()
}
