// ==========================================
// 表更新系统 - 作业文件名解析
// ==========================================
// 命名契约: ^(.+)_(append|update)_(\d+)\.csv$（两端锚定，关键字大小写敏感）
// 表名捕获位于关键字之前，允许自身包含下划线
// ==========================================

use crate::domain::OperationKind;
use crate::importer::error::{UpdateError, UpdateResult};
use regex::Regex;
use std::sync::OnceLock;

/// 作业文件命名正则（进程内编译一次）
fn filename_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(.+)_(append|update)_(\d+)\.csv$").expect("文件名正则字面量非法")
    })
}

/// 已解析的作业文件标识
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFile {
    pub filename: String,
    pub table: String,
    pub operation: OperationKind,
    pub sequence: String,
}

impl JobFile {
    /// 从文件名提取 (表名, 作业类型, 序号)
    ///
    /// 纯函数，无副作用。不匹配命名契约的文件名返回
    /// `UpdateError::FilenameFormat`，由调用方跳过该文件。
    pub fn parse(filename: &str) -> UpdateResult<Self> {
        let captures = filename_pattern().captures(filename).ok_or_else(|| {
            UpdateError::FilenameFormat {
                filename: filename.to_string(),
            }
        })?;

        let table = captures[1].to_string();
        let operation =
            OperationKind::parse(&captures[2]).ok_or_else(|| UpdateError::FilenameFormat {
                filename: filename.to_string(),
            })?;
        let sequence = captures[3].to_string();

        Ok(Self {
            filename: filename.to_string(),
            table,
            operation,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_append_filename() {
        let job = JobFile::parse("detail_append_001.csv").unwrap();
        assert_eq!(job.table, "detail");
        assert_eq!(job.operation, OperationKind::Append);
        assert_eq!(job.sequence, "001");
    }

    #[test]
    fn test_table_name_may_contain_underscores() {
        let job = JobFile::parse("tax_auth_master_update_12.csv").unwrap();
        assert_eq!(job.table, "tax_auth_master");
        assert_eq!(job.operation, OperationKind::Update);
        assert_eq!(job.sequence, "12");
    }

    #[test]
    fn test_greedy_table_capture_keeps_trailing_keyword_like_segment() {
        // 贪婪捕获: 表名本身以 update 结尾时取最长前缀
        let job = JobFile::parse("rate_update_update_3.csv").unwrap();
        assert_eq!(job.table, "rate_update");
        assert_eq!(job.operation, OperationKind::Update);
    }

    #[test]
    fn test_invalid_names_are_rejected() {
        assert!(matches!(
            JobFile::parse("sales.csv"),
            Err(UpdateError::FilenameFormat { .. })
        ));
        assert!(JobFile::parse("detail_merge_001.csv").is_err());
        assert!(JobFile::parse("detail_APPEND_001.csv").is_err());
        assert!(JobFile::parse("detail_append_001.csv.bak").is_err());
        assert!(JobFile::parse("detail_append_.csv").is_err());
        assert!(JobFile::parse("_append_001.csv").is_err());
    }
}
