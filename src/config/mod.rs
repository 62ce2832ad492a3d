// ==========================================
// 表更新系统 - 配置层
// ==========================================
// 职责: 外部配置加载（过滤条件 / 运行设置）
// 存储: 作业根目录下的 JSON 文档
// ==========================================

pub mod criteria;
pub mod settings;

// 重导出核心配置类型
pub use criteria::FilterCriteria;
pub use settings::Settings;
