// ==========================================
// 表更新系统 - 错误日志落盘
// ==========================================
// 契约: 每个作业文件夹一份 errors.json，逐条"读-改-写"
//       （加载 → 追加 → 重算 total_errors → 刷新 timestamp → 持久化）
// 约束: 仅在单线程顺序处理下安全; 并发写入者下该契约不成立
// ==========================================

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// 错误日志文件名（作业文件夹内）
pub const ERROR_LOG_FILENAME: &str = "errors.json";

/// 单条错误记录
///
/// 除固定字段外按需携带上下文；未填的上下文字段不序列化。
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorRecord {
    pub file: String,
    /// 1 基数据行号（文件级错误无行号）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_values: Option<serde_json::Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub match_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_columns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_columns: Option<Vec<String>>,
}

impl ErrorRecord {
    pub fn new(file: &str, error: impl Into<String>) -> Self {
        Self {
            file: file.to_string(),
            error: error.into(),
            ..Default::default()
        }
    }

    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }
}

/// 错误日志文档
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorLog {
    pub timestamp: String,
    pub total_errors: usize,
    pub errors: Vec<ErrorRecord>,
}

impl ErrorLog {
    fn empty() -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            total_errors: 0,
            errors: Vec::new(),
        }
    }
}

// ==========================================
// ErrorSink - 按作业文件夹累积错误
// ==========================================
pub struct ErrorSink {
    log_path: PathBuf,
}

impl ErrorSink {
    pub fn new<P: AsRef<Path>>(job_folder: P) -> Self {
        Self {
            log_path: job_folder.as_ref().join(ERROR_LOG_FILENAME),
        }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// 追加一条错误记录并立即持久化
    ///
    /// 文档缺失或损坏时重新初始化（不丢弃新记录）。
    /// 落盘失败只告警不升级: 错误记录管道本身不能再让处理中断。
    pub fn record(&self, record: ErrorRecord) {
        let mut log = self.load();

        log.errors.push(record);
        log.total_errors = log.errors.len();
        log.timestamp = Local::now().to_rfc3339();

        match serde_json::to_string_pretty(&log) {
            Ok(serialized) => {
                if let Err(e) = fs::write(&self.log_path, serialized) {
                    warn!(path = %self.log_path.display(), error = %e, "错误日志写入失败");
                }
            }
            Err(e) => warn!(error = %e, "错误日志序列化失败"),
        }
    }

    /// 读取当前错误日志（缺失/损坏 → 空文档）
    pub fn load(&self) -> ErrorLog {
        match fs::read_to_string(&self.log_path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|_| ErrorLog::empty()),
            Err(_) => ErrorLog::empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_record_appends_and_recounts() {
        let dir = tempdir().unwrap();
        let sink = ErrorSink::new(dir.path());

        sink.record(ErrorRecord::new("a.csv", "第一条"));
        sink.record(ErrorRecord::new("b.csv", "第二条").with_row(7).with_table("detail"));

        let log = sink.load();
        assert_eq!(log.total_errors, 2);
        assert_eq!(log.errors.len(), 2);
        assert_eq!(log.errors[0].file, "a.csv");
        assert_eq!(log.errors[1].row, Some(7));
        assert_eq!(log.errors[1].table.as_deref(), Some("detail"));
    }

    #[test]
    fn test_every_record_is_durably_written() {
        let dir = tempdir().unwrap();
        let sink = ErrorSink::new(dir.path());

        sink.record(ErrorRecord::new("a.csv", "x"));
        // 直接读文件: 每条错误之后文档都必须是最新的
        let raw = fs::read_to_string(sink.log_path()).unwrap();
        let log: ErrorLog = serde_json::from_str(&raw).unwrap();
        assert_eq!(log.total_errors, 1);
    }

    #[test]
    fn test_corrupt_document_is_reinitialized() {
        let dir = tempdir().unwrap();
        let sink = ErrorSink::new(dir.path());
        fs::write(sink.log_path(), "{ broken").unwrap();

        sink.record(ErrorRecord::new("a.csv", "x"));
        let log = sink.load();
        assert_eq!(log.total_errors, 1);
    }

    #[test]
    fn test_absent_context_fields_are_not_serialized() {
        let dir = tempdir().unwrap();
        let sink = ErrorSink::new(dir.path());
        sink.record(ErrorRecord::new("a.csv", "x"));

        let raw = fs::read_to_string(sink.log_path()).unwrap();
        assert!(!raw.contains("match_count"));
        assert!(!raw.contains("\"row\""));
    }
}
