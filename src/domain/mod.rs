// ==========================================
// 订单排产系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod device;
pub mod order;
pub mod process;
pub mod schedule;
pub mod types;

// 重导出核心类型
pub use device::Device;
pub use order::Order;
pub use process::{default_process_catalog, ProcessStep, COMPLETED_PROCESS};
pub use schedule::{PlanDiagnostics, PlanOutcome, ScheduleEntry, UnmatchedOrder};
pub use types::{DeviceStatus, EntryStatus, OrderPriority, OrderStatus, RunTrigger};
