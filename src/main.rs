// ==========================================
// 表更新系统 - 命令行主入口
// ==========================================
// 技术栈: Rust + SQLite
// 流程: 加载配置 → 定位作业文件夹 → 快照 → 批次处理 → 汇总退出
// 退出码: 批次级致命错误非零; 文件级/行级错误只进错误日志, 正常退出
// ==========================================

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use table_updater::config::{FilterCriteria, Settings};
use table_updater::engine::{find_latest_job_folder, BatchOrchestrator};
use table_updater::logging;

/// CSV 批量表更新与对账工具
#[derive(Parser, Debug)]
#[command(name = "table-updater", version, about = "CSV 批量表更新与对账工具")]
struct Cli {
    /// 作业根目录（含 config.json / update_criteria.json 与 YYMMDD_update 作业文件夹）
    #[arg(env = "TABLE_UPDATER_BASE")]
    base_dir: PathBuf,

    /// 指定作业文件夹（默认取时间戳最大的 YYMMDD_update）
    #[arg(long)]
    job_folder: Option<PathBuf>,

    /// 覆盖基准数据库路径（默认取 config.json 的 database_path）
    #[arg(long)]
    database: Option<PathBuf>,

    /// 只校验与计数，不快照也不写入
    #[arg(long)]
    dry_run: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();

    tracing::info!("==================================================");
    tracing::info!("{} v{}", table_updater::APP_NAME, table_updater::VERSION);
    tracing::info!("==================================================");

    // 配置均位于作业根目录
    let criteria = FilterCriteria::load(cli.base_dir.join("update_criteria.json"))?;
    let database = match cli.database {
        Some(path) => path,
        None => {
            let settings = Settings::load(cli.base_dir.join("config.json"))?;
            settings.database_path
        }
    };

    let job_folder = match cli.job_folder {
        Some(path) => path,
        None => find_latest_job_folder(&cli.base_dir)
            .with_context(|| format!("定位作业文件夹失败: {}", cli.base_dir.display()))?,
    };
    tracing::info!(
        job_folder = %job_folder.display(),
        database = %database.display(),
        dry_run = cli.dry_run,
        "批次启动"
    );

    let summary = BatchOrchestrator::new(&criteria, cli.dry_run)
        .run(&job_folder, &database)
        .context("批次处理失败")?;

    if let Some(snapshot) = &summary.snapshot_path {
        tracing::info!(snapshot = %snapshot.display(), "更新结果已写入数据库副本");
    }

    Ok(())
}
