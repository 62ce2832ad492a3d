// ==========================================
// 表更新系统 - 批次编排器
// ==========================================
// 批次流程: 定位作业文件夹 → 校验命名并取时间戳 → 快照基准库 →
//           按文件名排序逐个处理 CSV → 收尾检查错误日志
// 红线: 单个文件的失败只跳过该文件，绝不终止批次;
//       批次级致命错误（文件夹/基准库缺失、命名不合法）才向上传播
// ==========================================

use crate::config::FilterCriteria;
use crate::domain::FileSummary;
use crate::engine::reconciler::{FileResult, Reconciler};
use crate::engine::snapshot;
use crate::importer::error::{UpdateError, UpdateResult};
use crate::importer::job_file::JobFile;
use crate::report::ErrorSink;
use chrono::NaiveDate;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{info, warn};

/// 作业文件夹命名正则: YYMMDD_update（进程内编译一次）
fn folder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{6})_update$").expect("文件夹正则字面量非法"))
}

/// 校验作业文件夹名并提取 YYMMDD 时间戳标签
///
/// 六位数字还必须是真实日期（250231 这类伪时间戳同样拒绝）。
pub fn folder_tag(folder_name: &str) -> UpdateResult<String> {
    let captures =
        folder_pattern()
            .captures(folder_name)
            .ok_or_else(|| UpdateError::JobFolderNameInvalid {
                name: folder_name.to_string(),
            })?;
    let tag = captures[1].to_string();

    if NaiveDate::parse_from_str(&tag, "%y%m%d").is_err() {
        return Err(UpdateError::JobFolderNameInvalid {
            name: folder_name.to_string(),
        });
    }
    Ok(tag)
}

/// 在基准目录下定位时间戳最大的作业文件夹
///
/// 只认 `YYMMDD_update` 命名的子目录；一个都没有按文件夹缺失处理。
pub fn find_latest_job_folder(base: &Path) -> UpdateResult<PathBuf> {
    let mut latest: Option<(String, PathBuf)> = None;

    for entry in fs::read_dir(base)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        let Ok(tag) = folder_tag(&name) else {
            continue;
        };

        let replace = match &latest {
            Some((best_tag, _)) => tag > *best_tag,
            None => true,
        };
        if replace {
            latest = Some((tag, entry.path()));
        }
    }

    latest
        .map(|(_, path)| path)
        .ok_or_else(|| UpdateError::JobFolderNotFound {
            path: base.display().to_string(),
        })
}

/// 批次处理汇总
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// 本批次实际写入的数据库副本（dry-run 时为 None）
    pub snapshot_path: Option<PathBuf>,
    pub files_completed: usize,
    pub files_skipped: usize,
    pub files_aborted: usize,
    /// 全批次行级结果合计
    pub rows: FileSummary,
    /// 收尾时错误日志中的错误总数
    pub total_errors: usize,
}

// ==========================================
// BatchOrchestrator - 批次编排
// ==========================================
pub struct BatchOrchestrator<'a> {
    criteria: &'a FilterCriteria,
    dry_run: bool,
    chunk_size: Option<usize>,
}

impl<'a> BatchOrchestrator<'a> {
    pub fn new(criteria: &'a FilterCriteria, dry_run: bool) -> Self {
        Self {
            criteria,
            dry_run,
            chunk_size: None,
        }
    }

    /// 覆盖逐文件处理的分块大小（测试用）
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    /// 执行一个批次
    ///
    /// # 参数
    /// - job_folder: 作业文件夹（YYMMDD_update）
    /// - database: 基准数据库文件
    pub fn run(&self, job_folder: &Path, database: &Path) -> UpdateResult<BatchSummary> {
        if !job_folder.is_dir() {
            return Err(UpdateError::JobFolderNotFound {
                path: job_folder.display().to_string(),
            });
        }

        let folder_name = job_folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let tag = folder_tag(&folder_name)?;

        // 快照: 所有写入只落在作业文件夹内的副本上
        // dry-run 不产生副本，对基准库直接做只读校验与计数
        let (db_path, snapshot_path) = if self.dry_run {
            if !database.exists() {
                return Err(UpdateError::SourceNotFound {
                    path: database.display().to_string(),
                });
            }
            info!(database = %database.display(), "dry-run: 跳过数据库快照");
            (database.to_path_buf(), None)
        } else {
            let copy = snapshot::snapshot(database, job_folder, &tag)?;
            (copy.clone(), Some(copy))
        };

        let sink = ErrorSink::new(job_folder);
        let mut engine = Reconciler::new(self.criteria, self.dry_run);
        if let Some(chunk_size) = self.chunk_size {
            engine = engine.with_chunk_size(chunk_size);
        }

        let mut summary = BatchSummary {
            snapshot_path,
            ..Default::default()
        };

        // 按文件名排序保证批次内处理顺序确定（序号即处理次序）
        for filename in sorted_csv_files(job_folder)? {
            let job = match JobFile::parse(&filename) {
                Ok(job) => job,
                Err(e) => {
                    warn!(file = %filename, error = %e, "跳过: 文件名不符合命名契约");
                    sink.record(crate::report::ErrorRecord::new(&filename, e.to_string()));
                    summary.files_skipped += 1;
                    continue;
                }
            };

            info!(
                file = %filename,
                table = %job.table,
                operation = %job.operation,
                "开始处理作业文件"
            );
            match engine.process_file(&job_folder.join(&filename), &job, &db_path, &sink) {
                FileResult::Completed(file_summary) => {
                    summary.files_completed += 1;
                    summary.rows.total_rows += file_summary.total_rows;
                    summary.rows.inserted += file_summary.inserted;
                    summary.rows.updated += file_summary.updated;
                    summary.rows.conflicts += file_summary.conflicts;
                    summary.rows.no_filter += file_summary.no_filter;
                }
                FileResult::Skipped => summary.files_skipped += 1,
                FileResult::Aborted => summary.files_aborted += 1,
            }
        }

        // 收尾: 错误日志是局部失败唯一的对外记录，批次结束时必须提示
        let log = sink.load();
        summary.total_errors = log.total_errors;
        if log.total_errors > 0 {
            warn!(
                errors = log.total_errors,
                log = %sink.log_path().display(),
                "批次存在错误，详见错误日志"
            );
        }

        info!(
            dry_run = self.dry_run,
            completed = summary.files_completed,
            skipped = summary.files_skipped,
            aborted = summary.files_aborted,
            inserted = summary.rows.inserted,
            updated = summary.rows.updated,
            conflicts = summary.rows.conflicts,
            no_filter = summary.rows.no_filter,
            errors = summary.total_errors,
            "批次处理完成"
        );
        Ok(summary)
    }
}

/// 列出作业文件夹内全部 .csv 文件名并按字典序排序
fn sorted_csv_files(job_folder: &Path) -> UpdateResult<Vec<String>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(job_folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.ends_with(".csv") {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}
