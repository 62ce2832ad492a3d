// ==========================================
// 表更新系统 - 对账引擎
// ==========================================
// 状态机（仅在表头校验通过后进入）:
// - append: 逐行强制转换 → 时间列规范化 → 无条件插入
// - update: 逐行构造过滤谓词 → 计数 →
//     0 条匹配 = 插入 / 恰 1 条 = 原地更新 / 2+ 条 = 冲突不动
// 约束: 行内严格顺序处理; 分块大小不得影响任何行级结果
// ==========================================

use crate::config::FilterCriteria;
use crate::domain::{CellValue, FileSummary, OperationKind, RowOutcome, SemanticType};
use crate::importer::csv_reader::{
    preflight_coercion, read_header, ChunkedCsvReader, RawRow, DEFAULT_CHUNK_SIZE,
};
use crate::importer::date_normalizer;
use crate::importer::error::{UpdateError, UpdateResult};
use crate::importer::job_file::JobFile;
use crate::importer::schema_validator;
use crate::importer::type_plan::{coerce_cell, ParsePlan};
use crate::report::{ErrorRecord, ErrorSink};
use crate::repository::{SchemaCatalog, TableStore};
use std::path::Path;
use tracing::{debug, info, warn};

/// 单文件处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileResult {
    /// 全部行处理完成
    Completed(FileSummary),
    /// 前置校验未通过，文件整体跳过（未做任何行处理）
    Skipped,
    /// 处理中途存储失败，文件放弃（此前的行可能已落库）
    Aborted,
}

// ==========================================
// Reconciler - 逐行对账引擎
// ==========================================
pub struct Reconciler<'a> {
    criteria: &'a FilterCriteria,
    chunk_size: usize,
    dry_run: bool,
}

impl<'a> Reconciler<'a> {
    pub fn new(criteria: &'a FilterCriteria, dry_run: bool) -> Self {
        Self {
            criteria,
            chunk_size: DEFAULT_CHUNK_SIZE,
            dry_run,
        }
    }

    /// 覆盖分块大小（测试分块不变性用）
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// 处理一个作业文件
    ///
    /// 所有可恢复错误（文件级/行级）先写入错误日志再返回/继续，
    /// 错误日志是局部失败唯一的对外记录。
    pub fn process_file(
        &self,
        csv_path: &Path,
        job: &JobFile,
        db_path: &Path,
        sink: &ErrorSink,
    ) -> FileResult {
        // === 步骤 1: update 作业的过滤条件前置检查（不开任何存储连接）===
        let filter_fields: Option<Vec<String>> = match job.operation {
            OperationKind::Update => match self.criteria.filter_fields(&job.table) {
                Some(fields) => Some(fields.to_vec()),
                None => {
                    let err = UpdateError::MissingFilterCriteria {
                        table: job.table.clone(),
                    };
                    warn!(file = %job.filename, table = %job.table, "跳过: 缺少过滤条件配置");
                    sink.record(
                        ErrorRecord::new(&job.filename, err.to_string()).with_table(&job.table),
                    );
                    return FileResult::Skipped;
                }
            },
            OperationKind::Append => None,
        };

        // === 步骤 2: 读取目标表结构（每次都反映存储当前状态）===
        let catalog = SchemaCatalog::new(db_path);
        let schema = match catalog.get_schema(&job.table) {
            Ok(schema) => schema,
            Err(e) => {
                warn!(file = %job.filename, table = %job.table, error = %e, "跳过: 表结构读取失败");
                sink.record(
                    ErrorRecord::new(&job.filename, format!("表结构读取失败: {}", e))
                        .with_table(&job.table),
                );
                return FileResult::Skipped;
            }
        };

        // === 步骤 3: 表头读取与校验 ===
        let header = match read_header(csv_path) {
            Ok(header) => header,
            Err(e) => {
                warn!(file = %job.filename, error = %e, "跳过: CSV 表头读取失败");
                sink.record(
                    ErrorRecord::new(&job.filename, format!("CSV 表头读取失败: {}", e))
                        .with_table(&job.table),
                );
                return FileResult::Skipped;
            }
        };

        let check = schema_validator::validate(&header, &schema);
        if !check.ok {
            let err = UpdateError::SchemaValidation {
                table: job.table.clone(),
                unknown_columns: check.unknown_columns.clone(),
            };
            warn!(
                file = %job.filename,
                table = %job.table,
                unknown = ?check.unknown_columns,
                "跳过: CSV 表头校验失败"
            );
            let mut record =
                ErrorRecord::new(&job.filename, err.to_string()).with_table(&job.table);
            record.unknown_columns = Some(check.unknown_columns);
            record.csv_columns = Some(check.csv_columns);
            record.table_columns = Some(check.table_columns);
            sink.record(record);
            return FileResult::Skipped;
        }

        // === 步骤 4: 解析计划 + 类型转换预检（失败则全文本降级）===
        let mut plan = ParsePlan::build(&header, &schema);
        // 时间列集合由表结构决定, 与当前解析计划无关:
        // 全文本降级后时间列规范化依然生效
        let temporal_columns: Vec<bool> = (0..header.len())
            .map(|idx| plan.type_at(idx) == SemanticType::Temporal)
            .collect();
        if let Err(e) = preflight_coercion(csv_path, &header, &plan) {
            warn!(file = %job.filename, error = %e, "类型转换预检失败，降级为全文本读取");
            sink.record(
                ErrorRecord::new(
                    &job.filename,
                    format!("CSV 类型转换失败，降级为全文本读取: {}", e),
                )
                .with_table(&job.table),
            );
            plan = ParsePlan::all_text(header.len());
        }

        // === 步骤 5: 逐块逐行处理 ===
        match self.process_rows(
            csv_path,
            job,
            db_path,
            &header,
            &plan,
            &temporal_columns,
            filter_fields.as_deref(),
            sink,
        ) {
            Ok(summary) => {
                info!(
                    file = %job.filename,
                    table = %job.table,
                    dry_run = self.dry_run,
                    total = summary.total_rows,
                    inserted = summary.inserted,
                    updated = summary.updated,
                    conflicts = summary.conflicts,
                    no_filter = summary.no_filter,
                    "文件处理完成"
                );
                FileResult::Completed(summary)
            }
            Err(e) => {
                warn!(file = %job.filename, error = %e, "文件处理中途失败，放弃该文件");
                sink.record(
                    ErrorRecord::new(&job.filename, format!("处理失败: {}", e))
                        .with_table(&job.table),
                );
                FileResult::Aborted
            }
        }
    }

    /// 行处理主循环（存储错误向上传播 → 文件级放弃）
    #[allow(clippy::too_many_arguments)]
    fn process_rows(
        &self,
        csv_path: &Path,
        job: &JobFile,
        db_path: &Path,
        header: &[String],
        plan: &ParsePlan,
        temporal_columns: &[bool],
        filter_fields: Option<&[String]>,
        sink: &ErrorSink,
    ) -> UpdateResult<FileSummary> {
        let store = TableStore::open(db_path)?;
        let mut reader = ChunkedCsvReader::open(csv_path, self.chunk_size)?;
        let mut summary = FileSummary::default();
        let mut chunk_index = 0usize;

        while let Some(chunk) = reader.next_chunk()? {
            chunk_index += 1;
            debug!(file = %job.filename, chunk = chunk_index, rows = chunk.len(), "处理分块");

            for row in &chunk {
                let cells = self.coerce_row(header, plan, temporal_columns, row);

                let outcome = match job.operation {
                    OperationKind::Append => {
                        self.insert_row(&store, &job.table, &cells)?;
                        RowOutcome::Inserted
                    }
                    OperationKind::Update => {
                        // 前置检查保证 update 作业必有过滤字段
                        let fields = filter_fields.unwrap_or(&[]);
                        self.reconcile_row(&store, job, header, fields, row, &cells, sink)?
                    }
                };
                summary.record(outcome);
            }
        }

        Ok(summary)
    }

    /// 把一行原始字符串按计划转换为列值（时间列写入前规范化）
    ///
    /// temporal_columns 来自表结构而非当前解析计划:
    /// 文件降级为全文本后, 时间列的规范化职责不随之消失。
    fn coerce_row(
        &self,
        header: &[String],
        plan: &ParsePlan,
        temporal_columns: &[bool],
        row: &RawRow,
    ) -> Vec<(String, CellValue)> {
        header
            .iter()
            .zip(row.values.iter())
            .enumerate()
            .map(|(idx, (col, raw))| {
                let target = plan.type_at(idx);
                // 预检已保证当前计划下全部可转换; 兜底按原文本处理
                let mut value =
                    coerce_cell(raw, target).unwrap_or_else(|_| CellValue::Text(raw.clone()));

                if temporal_columns.get(idx).copied().unwrap_or(false) {
                    if let CellValue::Text(s) = &value {
                        value = CellValue::Text(date_normalizer::normalize(s));
                    }
                }
                (col.clone(), value)
            })
            .collect()
    }

    /// update 作业的单行状态机
    fn reconcile_row(
        &self,
        store: &TableStore,
        job: &JobFile,
        header: &[String],
        filter_fields: &[String],
        row: &RawRow,
        cells: &[(String, CellValue)],
        sink: &ErrorSink,
    ) -> UpdateResult<RowOutcome> {
        // 过滤谓词: 配置字段中"在行内存在且非空且非空白"的子集，全部 AND
        let filters: Vec<(String, CellValue)> = filter_fields
            .iter()
            .filter_map(|field| {
                header
                    .iter()
                    .position(|col| col == field)
                    .map(|idx| (field.clone(), cells[idx].1.clone()))
            })
            .filter(|(_, value)| value.is_usable_filter())
            .collect();

        if filters.is_empty() {
            // 零个可用过滤字段绝不等于全表匹配: 跳过该行并记录
            let err = UpdateError::NoFilterCondition {
                row: row.row_number,
            };
            let mut record = ErrorRecord::new(&job.filename, err.to_string())
                .with_row(row.row_number)
                .with_table(&job.table);
            record.filter_fields = Some(filter_fields.to_vec());
            sink.record(record);
            return Ok(RowOutcome::SkippedNoFilter);
        }

        let match_count = store.count_matching(&job.table, &filters)?;

        match match_count {
            0 => {
                // 无匹配 → 视作新记录插入（与 append 同一路径）
                self.insert_row(store, &job.table, cells)?;
                Ok(RowOutcome::Inserted)
            }
            1 => {
                // 唯一匹配 → 行内全部非缺失列覆写（过滤字段允许包含在覆写集内，
                // 谓词已锁定唯一行）
                let sets: Vec<(String, CellValue)> = cells
                    .iter()
                    .filter(|(_, v)| v.is_present())
                    .cloned()
                    .collect();
                if !sets.is_empty() && !self.dry_run {
                    store.update_row(&job.table, &sets, &filters)?;
                }
                Ok(RowOutcome::Updated)
            }
            n => {
                // 多条匹配 → 冲突，不做任何变更
                let err = UpdateError::MultipleMatchConflict {
                    row: row.row_number,
                    match_count: n,
                };
                let mut filter_values = serde_json::Map::new();
                for (field, value) in &filters {
                    filter_values.insert(field.clone(), value.to_json());
                }

                let mut record = ErrorRecord::new(&job.filename, err.to_string())
                    .with_row(row.row_number)
                    .with_table(&job.table);
                record.filter_fields = Some(filter_fields.to_vec());
                record.filter_values = Some(filter_values);
                record.match_count = Some(n);
                sink.record(record);
                Ok(RowOutcome::Conflict)
            }
        }
    }

    /// 插入一行（dry-run 抑制写入; Missing 列整体省略; 空白文本列落 NULL）
    fn insert_row(
        &self,
        store: &TableStore,
        table: &str,
        cells: &[(String, CellValue)],
    ) -> UpdateResult<()> {
        let columns: Vec<(String, CellValue)> = cells
            .iter()
            .filter(|(_, v)| v.is_present())
            .cloned()
            .collect();

        // 整行缺失: 无可写内容，按原样计为插入但不发语句
        if columns.is_empty() || self.dry_run {
            return Ok(());
        }

        store.insert_row(table, &columns)?;
        Ok(())
    }
}
