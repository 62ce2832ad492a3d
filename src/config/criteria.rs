// ==========================================
// 表更新系统 - 过滤条件配置
// ==========================================
// 文档格式: { "<table>": { "filter_fields": ["col1", "col2", ...] } }
// 规则: update 作业的目标表必须配置非空 filter_fields;
//       缺失只导致该文件失败，不影响整个批次
// 文档本身缺失/损坏: 批次级致命错误
// ==========================================

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

/// 单表的过滤条件配置
#[derive(Debug, Clone, Deserialize)]
pub struct TableCriteria {
    #[serde(default)]
    pub filter_fields: Vec<String>,
}

/// 全部表的过滤条件配置
#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    tables: HashMap<String, TableCriteria>,
}

impl FilterCriteria {
    /// 从 JSON 文档加载
    ///
    /// 文档不存在或解析失败都向上传播（批次不应在无配置时启动）。
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "过滤条件配置读取失败: {}: {}",
                path.as_ref().display(),
                e
            )
        })?;
        let tables: HashMap<String, TableCriteria> = serde_json::from_str(&raw).map_err(|e| {
            anyhow::anyhow!(
                "过滤条件配置不是合法 JSON: {}: {}",
                path.as_ref().display(),
                e
            )
        })?;

        info!(tables = tables.len(), "过滤条件配置加载完成");
        Ok(Self { tables })
    }

    /// 测试/内嵌场景直接构造
    pub fn from_map(tables: HashMap<String, TableCriteria>) -> Self {
        Self { tables }
    }

    /// 查询某表的有序过滤字段列表
    ///
    /// # 返回
    /// - Some(fields): 已配置且非空
    /// - None: 未配置或配置为空（update 作业按文件级错误处理）
    pub fn filter_fields(&self, table: &str) -> Option<&[String]> {
        self.tables
            .get(table)
            .map(|c| c.filter_fields.as_slice())
            .filter(|fields| !fields.is_empty())
    }
}
