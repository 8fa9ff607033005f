// ==========================================
// 订单排产系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod device_repo;
pub mod error;
pub mod order_repo;
pub mod plan_run_log_repo;
pub mod planning_store;
pub mod schedule_repo;

// 重导出核心仓储
pub use device_repo::DeviceRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use order_repo::{parse_due_date, OrderRepository};
pub use plan_run_log_repo::{PlanRunLog, PlanRunLogRepository, PlanRunStatus};
pub use planning_store::{PlanningSnapshot, PlanningStore, SqlitePlanningStore};
pub use schedule_repo::{SchedulePage, ScheduleRepository, ScheduleRow, ScheduleUpdate};
