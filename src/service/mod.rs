// ==========================================
// 订单排产系统 - 服务层
// ==========================================
// 职责: 编排 配置 → 快照读取 → 引擎计算 → 整体写入 → 运行日志
// 触发: 每日定时 + 人工触发，共用同一互斥保护
// ==========================================

pub mod daily_trigger;
pub mod error;
pub mod planning_service;

pub use daily_trigger::{next_fire_after, DailyTrigger};
pub use error::{PlanningError, PlanningResult};
pub use planning_service::{PlanRunReport, PlanningService};
