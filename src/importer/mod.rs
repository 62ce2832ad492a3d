// ==========================================
// 表更新系统 - 导入层
// ==========================================
// 职责: 作业文件识别 / CSV 读取 / 类型强制转换 / 表头校验 / 日期规范化
// 约束: 本层只做解析与校验, 不触碰存储写入路径
// ==========================================

// 模块声明
pub mod csv_reader;
pub mod date_normalizer;
pub mod error;
pub mod job_file;
pub mod schema_validator;
pub mod type_plan;

// 重导出核心类型
pub use csv_reader::{ChunkedCsvReader, RawRow, DEFAULT_CHUNK_SIZE};
pub use error::{UpdateError, UpdateResult};
pub use job_file::JobFile;
pub use schema_validator::SchemaCheck;
pub use type_plan::ParsePlan;
