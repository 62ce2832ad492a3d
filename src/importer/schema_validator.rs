// ==========================================
// 表更新系统 - 表头校验器
// ==========================================
// 职责: 确认 CSV 表头是目标表列集的子集（大小写不敏感）
// 规则: 表里多出的列不算错误; CSV 里多出的列导致整个文件跳过
// ==========================================

use crate::repository::TableSchema;

/// 表头校验结果
#[derive(Debug, Clone)]
pub struct SchemaCheck {
    pub ok: bool,
    /// CSV 中存在但表中不存在的列（小写形式，排序稳定）
    pub unknown_columns: Vec<String>,
    /// 诊断上下文: CSV 列全集（小写）
    pub csv_columns: Vec<String>,
    /// 诊断上下文: 表列全集（小写）
    pub table_columns: Vec<String>,
}

/// 校验 CSV 表头与目标表结构
///
/// 大小写不敏感的集合差: CSV 有而表没有的列即"未知列"。
/// 校验失败时调用方必须整体跳过该文件，不做部分处理。
pub fn validate(csv_header: &[String], schema: &TableSchema) -> SchemaCheck {
    let table_set = schema.lowercase_names();

    let csv_columns: Vec<String> = csv_header
        .iter()
        .map(|c| c.trim().to_lowercase())
        .collect();

    let mut unknown_columns: Vec<String> = csv_columns
        .iter()
        .filter(|c| !table_set.contains(*c))
        .cloned()
        .collect();
    unknown_columns.sort();
    unknown_columns.dedup();

    let mut table_columns: Vec<String> = table_set.into_iter().collect();
    table_columns.sort();

    SchemaCheck {
        ok: unknown_columns.is_empty(),
        unknown_columns,
        csv_columns,
        table_columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::ColumnDef;

    fn schema(cols: &[&str]) -> TableSchema {
        TableSchema::new(
            cols.iter()
                .map(|c| ColumnDef {
                    name: c.to_string(),
                    declared_type: "TEXT".to_string(),
                })
                .collect(),
        )
    }

    fn header(cols: &[&str]) -> Vec<String> {
        cols.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_subset_header_passes() {
        let check = validate(&header(&["geocode", "tax_rate"]), &schema(&["geocode", "tax_rate", "tier"]));
        assert!(check.ok);
        assert!(check.unknown_columns.is_empty());
    }

    #[test]
    fn test_comparison_is_case_insensitive() {
        let check = validate(&header(&["GeoCode", " TAX_RATE "]), &schema(&["geocode", "tax_rate"]));
        assert!(check.ok);
    }

    #[test]
    fn test_unknown_column_fails_with_diagnostics() {
        let check = validate(
            &header(&["geocode", "bogus_field"]),
            &schema(&["geocode", "tax_rate"]),
        );
        assert!(!check.ok);
        assert_eq!(check.unknown_columns, vec!["bogus_field".to_string()]);
        assert_eq!(check.csv_columns, vec!["geocode".to_string(), "bogus_field".to_string()]);
        assert_eq!(check.table_columns, vec!["geocode".to_string(), "tax_rate".to_string()]);
    }

    #[test]
    fn test_table_extra_columns_are_never_an_error() {
        let check = validate(&header(&["tier"]), &schema(&["geocode", "tax_rate", "tier"]));
        assert!(check.ok);
    }
}
