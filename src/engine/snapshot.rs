// ==========================================
// 表更新系统 - 数据库快照
// ==========================================
// 职责: 行处理开始前，把基准数据库原样复制进作业文件夹
// 定位: 本批次的变更检查点（所有写入只发生在副本上）
// ==========================================

use crate::importer::error::{UpdateError, UpdateResult};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// 把基准数据库复制到作业文件夹
///
/// # 参数
/// - source: 基准数据库文件
/// - dest_folder: 作业文件夹
/// - tag: 快照名限定符（通常为作业文件夹的 YYMMDD 时间戳）
///
/// # 返回
/// - Ok(path): 副本路径 `<dest>/<源文件名主干>_<tag>.sqlite`
/// - Err(SourceNotFound): 源文件不存在（批次级致命）
///
/// 目标位置已有同名文件时先显式删除再复制，不做内容变换。
pub fn snapshot(source: &Path, dest_folder: &Path, tag: &str) -> UpdateResult<PathBuf> {
    if !source.exists() {
        return Err(UpdateError::SourceNotFound {
            path: source.display().to_string(),
        });
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "db".to_string());
    let target = dest_folder.join(format!("{}_{}.sqlite", stem, tag));

    if target.exists() {
        fs::remove_file(&target)?;
        info!(target = %target.display(), "已删除旧的数据库副本");
    }

    info!(source = %source.display(), target = %target.display(), "复制基准数据库");
    fs::copy(source, &target)?;
    Ok(target)
}
