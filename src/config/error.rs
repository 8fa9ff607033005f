// ==========================================
// 订单排产系统 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置读取失败: {0}")]
    Database(String),

    #[error("配置锁获取失败: {0}")]
    Lock(String),

    #[error("配置值非法 (key={key}): {message}")]
    InvalidValue { key: String, message: String },
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Database(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
