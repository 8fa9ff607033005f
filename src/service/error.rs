// ==========================================
// 订单排产系统 - 服务层错误类型
// ==========================================

use crate::config::error::ConfigError;
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("已有排产任务在运行，请稍后再试")]
    Busy,

    #[error("仓储错误: {0}")]
    Repository(#[from] RepositoryError),

    #[error("排产计算失败: {0}")]
    Engine(#[from] EngineError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("排产工作线程异常: {0}")]
    Worker(String),
}

pub type PlanningResult<T> = Result<T, PlanningError>;
