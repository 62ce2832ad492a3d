// ==========================================
// 表更新系统 - CSV 读取器
// ==========================================
// 职责: 表头读取 / 分块流式读取 / 类型转换预检
// 约束: 分块只为限制峰值内存，不得影响任何行级结果
//       与错误记录中的 1 基行号（行号全局连续编号）
// ==========================================

use crate::importer::error::{UpdateError, UpdateResult};
use crate::importer::type_plan::{coerce_cell, ParsePlan};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

/// 默认分块大小（行）
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// 一行原始数据（未经类型转换）
#[derive(Debug, Clone)]
pub struct RawRow {
    /// 1 基数据行号（不含表头，跨块连续）
    pub row_number: usize,
    /// 与表头逐列对齐的原始字符串（短行补空、长行截断）
    pub values: Vec<String>,
}

/// 读取 CSV 表头（逐列去首尾空白）
pub fn read_header<P: AsRef<Path>>(path: P) -> UpdateResult<Vec<String>> {
    let file = File::open(path.as_ref())?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true) // 允许行长度不一致
        .from_reader(file);

    let header = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    Ok(header)
}

// ==========================================
// ChunkedCsvReader - 分块流式读取
// ==========================================
pub struct ChunkedCsvReader {
    reader: csv::Reader<File>,
    header_len: usize,
    chunk_size: usize,
    next_row_number: usize,
}

impl ChunkedCsvReader {
    /// 打开 CSV 文件准备分块读取
    pub fn open<P: AsRef<Path>>(path: P, chunk_size: usize) -> UpdateResult<Self> {
        let file = File::open(path.as_ref())?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let header_len = reader.headers()?.len();

        Ok(Self {
            reader,
            header_len,
            chunk_size: chunk_size.max(1),
            next_row_number: 1,
        })
    }

    /// 读取下一块
    ///
    /// # 返回
    /// - Ok(Some(rows)): 至多 chunk_size 行
    /// - Ok(None): 文件读完
    pub fn next_chunk(&mut self) -> UpdateResult<Option<Vec<RawRow>>> {
        let mut chunk = Vec::with_capacity(self.chunk_size);

        for record in self.reader.records().take(self.chunk_size) {
            let record = record?;
            let mut values: Vec<String> =
                record.iter().take(self.header_len).map(|v| v.to_string()).collect();
            values.resize(self.header_len, String::new());

            chunk.push(RawRow {
                row_number: self.next_row_number,
                values,
            });
            self.next_row_number += 1;
        }

        if chunk.is_empty() {
            Ok(None)
        } else {
            Ok(Some(chunk))
        }
    }
}

/// 类型转换预检: 全文件按解析计划试转换一遍
///
/// 任何一个非空单元格无法按计划表示，即返回该处的 Coercion 错误，
/// 由调用方降级为全文本读取并记录一条文件级错误。预检是独立的一遍
/// 扫描，保证降级覆盖整个文件（而不是处理到一半才失败）。
pub fn preflight_coercion<P: AsRef<Path>>(
    path: P,
    header: &[String],
    plan: &ParsePlan,
) -> UpdateResult<()> {
    let mut reader = ChunkedCsvReader::open(path, DEFAULT_CHUNK_SIZE)?;

    while let Some(chunk) = reader.next_chunk()? {
        for row in chunk {
            for (idx, raw) in row.values.iter().enumerate() {
                if coerce_cell(raw, plan.type_at(idx)).is_err() {
                    return Err(UpdateError::Coercion {
                        row: row.row_number,
                        column: header.get(idx).cloned().unwrap_or_default(),
                        value: raw.clone(),
                        target: plan.type_at(idx).to_string(),
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SemanticType;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_header_trims_columns() {
        let file = write_csv(" geocode , tax_rate\nG001,0.05\n");
        let header = read_header(file.path()).unwrap();
        assert_eq!(header, vec!["geocode".to_string(), "tax_rate".to_string()]);
    }

    #[test]
    fn test_row_numbers_are_global_across_chunks() {
        let file = write_csv("a\n1\n2\n3\n4\n5\n");
        let mut reader = ChunkedCsvReader::open(file.path(), 2).unwrap();

        let mut seen = Vec::new();
        while let Some(chunk) = reader.next_chunk().unwrap() {
            assert!(chunk.len() <= 2);
            for row in chunk {
                seen.push(row.row_number);
            }
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_short_rows_are_padded_to_header_length() {
        let file = write_csv("a,b,c\n1,2\n");
        let mut reader = ChunkedCsvReader::open(file.path(), 10).unwrap();
        let chunk = reader.next_chunk().unwrap().unwrap();
        assert_eq!(chunk[0].values, vec!["1".to_string(), "2".to_string(), String::new()]);
    }

    #[test]
    fn test_preflight_reports_first_bad_cell() {
        let file = write_csv("tier,geocode\n1,G001\nxx,G002\n");
        let header = vec!["tier".to_string(), "geocode".to_string()];
        let plan = ParsePlan::all_text(2);
        // 全文本计划: 任何值都合法
        preflight_coercion(file.path(), &header, &plan).unwrap();

        // tier 按 Integer 解析时，第 2 行失败
        let typed = plan_with(&[SemanticType::Integer, SemanticType::Text]);
        let err = preflight_coercion(file.path(), &header, &typed).unwrap_err();
        match err {
            UpdateError::Coercion { row, column, value, .. } => {
                assert_eq!(row, 2);
                assert_eq!(column, "tier");
                assert_eq!(value, "xx");
            }
            other => panic!("意外错误: {other:?}"),
        }
    }

    fn plan_with(types: &[SemanticType]) -> ParsePlan {
        // 通过公开构建器间接构造: 用一个只含目标类型列的 schema
        use crate::repository::{ColumnDef, TableSchema};
        let names = ["tier", "geocode"];
        let declared = types
            .iter()
            .map(|t| match t {
                SemanticType::Integer => "INTEGER",
                SemanticType::Float => "DOUBLE",
                SemanticType::Boolean => "BOOLEAN",
                SemanticType::Temporal => "DATE",
                SemanticType::Text => "TEXT",
            })
            .collect::<Vec<_>>();
        let schema = TableSchema::new(
            names
                .iter()
                .zip(declared.iter())
                .map(|(n, d)| ColumnDef {
                    name: n.to_string(),
                    declared_type: d.to_string(),
                })
                .collect(),
        );
        ParsePlan::build(
            &names.iter().map(|n| n.to_string()).collect::<Vec<_>>(),
            &schema,
        )
    }
}
