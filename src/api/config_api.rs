// ==========================================
// 订单排产系统 - 配置管理 API
// ==========================================
// 职责: 排产参数查询与覆写
// 约束: 覆写后整体配置必须仍然合法，否则恢复原值并返回错误
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{config_keys, ConfigManager};
use crate::config::planning_config::PlanningConfig;

pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 当前生效的排产配置（默认值 + 覆写）
    pub fn get_planning_config(&self) -> ApiResult<PlanningConfig> {
        Ok(self.config_manager.read_planning_config()?)
    }

    /// 全部覆写项快照（JSON）
    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_config_snapshot()?)
    }

    /// 覆写单个配置项
    ///
    /// # 返回
    /// - Ok(PlanningConfig): 覆写后的完整配置
    /// - Err(ApiError::InvalidInput): 未知的键，或覆写后配置不合法（原值已恢复）
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<PlanningConfig> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ApiError::InvalidInput("配置键不能为空".to_string()));
        }
        if !config_keys::ALL.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知的配置键: {}", key)));
        }

        let previous = self.config_manager.get_config_value(key)?;
        self.config_manager.set_config_value(key, value)?;

        match self.config_manager.read_planning_config() {
            Ok(config) => Ok(config),
            Err(err) => {
                match previous {
                    Some(old) => self.config_manager.set_config_value(key, &old)?,
                    None => {
                        self.config_manager.delete_config_value(key)?;
                    }
                }
                tracing::warn!(key, value, error = %err, "配置覆写被拒绝，已恢复原值");
                Err(err.into())
            }
        }
    }

    /// 删除覆写项，恢复默认值
    pub fn reset_config(&self, key: &str) -> ApiResult<bool> {
        if !config_keys::ALL.contains(&key) {
            return Err(ApiError::InvalidInput(format!("未知的配置键: {}", key)));
        }
        Ok(self.config_manager.delete_config_value(key)?)
    }
}
