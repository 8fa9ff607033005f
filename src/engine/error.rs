// ==========================================
// 订单排产系统 - 引擎层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("排产参数非法: {0}")]
    InvalidConfig(String),

    #[error("最优个体引用了不存在的{entity}: id={id}")]
    DanglingReference { entity: &'static str, id: i64 },

    #[error("日期超出可表示范围: {base} 偏移 {days} 天")]
    DateOutOfRange { base: chrono::NaiveDate, days: i64 },
}

pub type EngineResult<T> = Result<T, EngineError>;
