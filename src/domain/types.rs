// ==========================================
// 表更新系统 - 领域类型定义
// ==========================================
// 职责: 语义类型 / 作业类型 / 单元格值 / 行级结果
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 语义类型 (Semantic Type)
// ==========================================
// 由目标表声明类型派生的解析类别
// 文本保真原则: 代码类字段(带前导零)必须按文本读取
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemanticType {
    Text,     // VARCHAR / CHAR / TEXT
    Integer,  // INT / BIGINT / SMALLINT / TINYINT
    Float,    // DOUBLE / REAL / FLOAT / DECIMAL / NUMERIC
    Boolean,  // BOOL / BOOLEAN
    Temporal, // DATE / TIME / TIMESTAMP
}

impl SemanticType {
    /// 由声明类型字符串派生语义类型（子串匹配，大小写不敏感）
    ///
    /// 未识别的声明类型一律按 Text 处理，保证映射是全函数。
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.to_uppercase();

        if upper.contains("VARCHAR") || upper.contains("CHAR") || upper.contains("TEXT") {
            SemanticType::Text
        } else if upper.contains("INT") {
            // INTEGER / BIGINT / SMALLINT / TINYINT 均含 INT
            SemanticType::Integer
        } else if upper.contains("DOUBLE")
            || upper.contains("REAL")
            || upper.contains("FLOAT")
            || upper.contains("DECIMAL")
            || upper.contains("NUMERIC")
        {
            SemanticType::Float
        } else if upper.contains("BOOL") {
            SemanticType::Boolean
        } else if upper.contains("DATE") || upper.contains("TIME") || upper.contains("TIMESTAMP") {
            SemanticType::Temporal
        } else {
            SemanticType::Text
        }
    }
}

impl fmt::Display for SemanticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SemanticType::Text => write!(f, "TEXT"),
            SemanticType::Integer => write!(f, "INTEGER"),
            SemanticType::Float => write!(f, "FLOAT"),
            SemanticType::Boolean => write!(f, "BOOLEAN"),
            SemanticType::Temporal => write!(f, "TEMPORAL"),
        }
    }
}

// ==========================================
// 作业类型 (Operation Kind)
// ==========================================
// append: 无条件插入; update: 按过滤字段匹配后更新/插入/冲突
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Append,
    Update,
}

impl OperationKind {
    /// 解析文件名中的作业关键字（大小写敏感）
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "append" => Some(OperationKind::Append),
            "update" => Some(OperationKind::Update),
            _ => None,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Append => write!(f, "append"),
            OperationKind::Update => write!(f, "update"),
        }
    }
}

// ==========================================
// 单元格值 (Cell Value)
// ==========================================
// CSV 原始字符串经 ParsePlan 强制转换后的统一表示
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// 数值/布尔列的空单元格: 不参与写入（INSERT 列表与 SET 列表均省略）
    Missing,
    /// 文本/时间列的空白单元格: 以 NULL 落库（不是空字符串字面量）
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// 是否参与写入（INSERT 列列表 / UPDATE SET 列表）
    pub fn is_present(&self) -> bool {
        !matches!(self, CellValue::Missing)
    }

    /// 是否可用作过滤条件
    ///
    /// 约束: 过滤条件仅接受"存在且非空且(若为文本)去空白后非空"的值。
    pub fn is_usable_filter(&self) -> bool {
        match self {
            CellValue::Missing | CellValue::Null => false,
            CellValue::Text(s) => !s.trim().is_empty(),
            _ => true,
        }
    }

    /// 转为 JSON 值（错误上下文记录用）
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            CellValue::Missing | CellValue::Null => serde_json::Value::Null,
            CellValue::Text(s) => serde_json::Value::String(s.clone()),
            CellValue::Integer(i) => serde_json::Value::from(*i),
            CellValue::Float(f) => serde_json::Value::from(*f),
            CellValue::Bool(b) => serde_json::Value::Bool(*b),
        }
    }
}

// ==========================================
// 行级结果 (Row Outcome)
// ==========================================
// 进入引擎的每一行恰好产生一个结果（互斥且完备）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// 0 条匹配（或 append 作业）: 作为新记录插入
    Inserted,
    /// 恰好 1 条匹配: 原地更新
    Updated,
    /// 2+ 条匹配: 冲突，不做任何变更
    Conflict,
    /// 无可用过滤条件: 跳过并记录错误
    SkippedNoFilter,
}

// ==========================================
// 文件处理汇总 (File Summary)
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileSummary {
    pub total_rows: usize,
    pub inserted: usize,
    pub updated: usize,
    pub conflicts: usize,
    pub no_filter: usize,
}

impl FileSummary {
    /// 记录一行的处理结果
    pub fn record(&mut self, outcome: RowOutcome) {
        self.total_rows += 1;
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Conflict => self.conflicts += 1,
            RowOutcome::SkippedNoFilter => self.no_filter += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_type_from_declared() {
        assert_eq!(SemanticType::from_declared("VARCHAR(20)"), SemanticType::Text);
        assert_eq!(SemanticType::from_declared("char(2)"), SemanticType::Text);
        assert_eq!(SemanticType::from_declared("TEXT"), SemanticType::Text);
        assert_eq!(SemanticType::from_declared("INTEGER"), SemanticType::Integer);
        assert_eq!(SemanticType::from_declared("BIGINT"), SemanticType::Integer);
        assert_eq!(SemanticType::from_declared("SMALLINT"), SemanticType::Integer);
        assert_eq!(SemanticType::from_declared("DOUBLE"), SemanticType::Float);
        assert_eq!(SemanticType::from_declared("DECIMAL(10,4)"), SemanticType::Float);
        assert_eq!(SemanticType::from_declared("NUMERIC"), SemanticType::Float);
        assert_eq!(SemanticType::from_declared("BOOLEAN"), SemanticType::Boolean);
        assert_eq!(SemanticType::from_declared("DATE"), SemanticType::Temporal);
        assert_eq!(SemanticType::from_declared("TIMESTAMP"), SemanticType::Temporal);
        // 未识别类型回落为 Text
        assert_eq!(SemanticType::from_declared("BLOB"), SemanticType::Text);
    }

    #[test]
    fn test_operation_kind_parse_is_case_sensitive() {
        assert_eq!(OperationKind::parse("append"), Some(OperationKind::Append));
        assert_eq!(OperationKind::parse("update"), Some(OperationKind::Update));
        assert_eq!(OperationKind::parse("APPEND"), None);
        assert_eq!(OperationKind::parse("merge"), None);
    }

    #[test]
    fn test_cell_value_filter_usability() {
        assert!(!CellValue::Missing.is_usable_filter());
        assert!(!CellValue::Null.is_usable_filter());
        assert!(!CellValue::Text("   ".to_string()).is_usable_filter());
        assert!(CellValue::Text("X1".to_string()).is_usable_filter());
        assert!(CellValue::Integer(0).is_usable_filter());
        assert!(CellValue::Float(0.0).is_usable_filter());
    }

    #[test]
    fn test_file_summary_counts_are_exhaustive() {
        let mut summary = FileSummary::default();
        summary.record(RowOutcome::Inserted);
        summary.record(RowOutcome::Updated);
        summary.record(RowOutcome::Updated);
        summary.record(RowOutcome::Conflict);
        summary.record(RowOutcome::SkippedNoFilter);

        assert_eq!(summary.total_rows, 5);
        assert_eq!(
            summary.inserted + summary.updated + summary.conflicts + summary.no_filter,
            summary.total_rows
        );
    }
}
