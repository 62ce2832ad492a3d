// ==========================================
// 表更新系统 - 类型解析计划
// ==========================================
// 职责: 由 CSV 表头 + 目标表结构产出"列 → 解析类别"计划
// 保证: 纯函数、确定性、永不失败（未知列按 Text 读取，
//       结构不匹配交给表头校验器处理，不做静默强转）
// ==========================================

use crate::domain::{CellValue, SemanticType};
use crate::repository::TableSchema;

/// 解析计划: 与 CSV 表头逐列对齐的解析类别
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsePlan {
    types: Vec<SemanticType>,
}

impl ParsePlan {
    /// 为 CSV 表头构建解析计划
    ///
    /// 列名按存储中的大小写精确匹配；不在表结构中的列按 Text 读取。
    /// 文本保真: VARCHAR/CHAR 列绝不做数值自动分型，避免地理/类目
    /// 编码丢失前导零。
    pub fn build(csv_header: &[String], schema: &TableSchema) -> Self {
        let types = csv_header
            .iter()
            .map(|col| match schema.declared_type(col) {
                Some(declared) => SemanticType::from_declared(declared),
                None => SemanticType::Text,
            })
            .collect();
        Self { types }
    }

    /// 全文本降级计划（类型转换失败后的兜底读取）
    pub fn all_text(column_count: usize) -> Self {
        Self {
            types: vec![SemanticType::Text; column_count],
        }
    }

    /// 第 idx 列的解析类别
    pub fn type_at(&self, idx: usize) -> SemanticType {
        self.types.get(idx).copied().unwrap_or(SemanticType::Text)
    }

    pub fn types(&self) -> &[SemanticType] {
        &self.types
    }
}

/// 按解析类别强制转换单元格原始字符串
///
/// # 空白语义
/// - 文本/时间列的空白单元格 → Null（落库为 NULL，不是空字符串）
/// - 数值/布尔列的空白单元格 → Missing（完全不参与写入）
///
/// # 返回
/// - Err(()): 非空值无法按目标类别表示（文件级降级的触发条件，
///   具体错误上下文由调用方补充）
pub fn coerce_cell(raw: &str, target: SemanticType) -> Result<CellValue, ()> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return Ok(match target {
            SemanticType::Text | SemanticType::Temporal => CellValue::Null,
            SemanticType::Integer | SemanticType::Float | SemanticType::Boolean => {
                CellValue::Missing
            }
        });
    }

    match target {
        // 文本与时间均保留原始字符串（时间列在写入前另行规范化）
        SemanticType::Text | SemanticType::Temporal => Ok(CellValue::Text(raw.to_string())),
        SemanticType::Integer => trimmed
            .parse::<i64>()
            .map(CellValue::Integer)
            .map_err(|_| ()),
        SemanticType::Float => trimmed.parse::<f64>().map(CellValue::Float).map_err(|_| ()),
        SemanticType::Boolean => match trimmed.to_uppercase().as_str() {
            "1" | "Y" | "TRUE" => Ok(CellValue::Bool(true)),
            "0" | "N" | "FALSE" => Ok(CellValue::Bool(false)),
            _ => Err(()),
        },
    }
}
