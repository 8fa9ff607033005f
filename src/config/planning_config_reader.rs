// ==========================================
// 订单排产系统 - 排产配置读取 Trait
// ==========================================
// 职责: 定义排产服务所需的配置读取接口（不包含实现）
// 实现者: ConfigManager（config_kv 表）/ StaticConfig（内存）
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::planning_config::PlanningConfig;
use async_trait::async_trait;

#[async_trait]
pub trait PlanningConfigReader: Send + Sync {
    /// 读取本轮排产使用的完整配置
    ///
    /// # 返回
    /// - 未覆写的项取默认值
    /// - 覆写值无法解析时返回 ConfigError::InvalidValue,不静默回退
    async fn load_planning_config(&self) -> ConfigResult<PlanningConfig>;
}

// ==========================================
// StaticConfig - 内存配置
// ==========================================
// 用途: 嵌入式调用与测试
#[derive(Debug, Clone, Default)]
pub struct StaticConfig {
    config: PlanningConfig,
}

impl StaticConfig {
    pub fn new(config: PlanningConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl PlanningConfigReader for StaticConfig {
    async fn load_planning_config(&self) -> ConfigResult<PlanningConfig> {
        self.config
            .validate()
            .map_err(|message| ConfigError::InvalidValue {
                key: "static".to_string(),
                message,
            })?;
        Ok(self.config.clone())
    }
}
