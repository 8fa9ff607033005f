// ==========================================
// 订单排产系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供命令行与宿主程序调用
// ==========================================

pub mod config_api;
pub mod dashboard_api;
pub mod error;
pub mod scheduling_api;

// 重导出核心类型
pub use config_api::ConfigApi;
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use scheduling_api::{
    Pagination, ScheduleListResponse, SchedulingApi, UpdateScheduleResponse,
};
