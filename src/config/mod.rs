// ==========================================
// 订单排产系统 - 配置层
// ==========================================
// 职责: 排产参数默认值 + config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;
pub mod planning_config;
pub mod planning_config_reader;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use planning_config::{MaterializerConfig, OptimizerConfig, PlanningConfig};
pub use planning_config_reader::{PlanningConfigReader, StaticConfig};
