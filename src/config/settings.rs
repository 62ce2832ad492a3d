// ==========================================
// 表更新系统 - 运行设置
// ==========================================
// 文档格式: { "database_path": "..." }
// 位置: 作业根目录下 config.json; --database 命令行参数可覆盖
// ==========================================

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 运行设置文档
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 基准数据库文件（快照来源）
    pub database_path: PathBuf,
}

impl Settings {
    /// 从 JSON 文档加载
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!("运行设置读取失败: {}: {}", path.as_ref().display(), e)
        })?;
        let settings: Settings = serde_json::from_str(&raw).map_err(|e| {
            anyhow::anyhow!("运行设置不是合法 JSON: {}: {}", path.as_ref().display(), e)
        })?;
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_settings() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{ "database_path": "/data/tax_db.sqlite" }"#).unwrap();
        file.flush().unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.database_path, PathBuf::from("/data/tax_db.sqlite"));
    }

    #[test]
    fn test_missing_settings_is_fatal() {
        assert!(Settings::load("/no/such/config.json").is_err());
    }
}
