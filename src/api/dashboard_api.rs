// ==========================================
// 订单排产系统 - 看板 API
// ==========================================
// 职责: 订单进度汇总、最近排产运行记录
// ==========================================

use std::sync::Arc;

use crate::api::error::{ApiError, ApiResult};
use crate::engine::progress::{order_progress, OrderProgress};
use crate::repository::plan_run_log_repo::{PlanRunLog, PlanRunLogRepository};
use crate::repository::planning_store::PlanningStore;

pub struct DashboardApi {
    store: Arc<dyn PlanningStore>,
    run_log_repo: Arc<PlanRunLogRepository>,
}

impl DashboardApi {
    pub fn new(store: Arc<dyn PlanningStore>, run_log_repo: Arc<PlanRunLogRepository>) -> Self {
        Self {
            store,
            run_log_repo,
        }
    }

    /// 订单进度（基于同一快照的订单与设备）
    pub fn order_progress(&self) -> ApiResult<OrderProgress> {
        let _perf = crate::perf::PerfGuard::new("dashboard.order_progress");
        let snapshot = self.store.load_snapshot()?;
        Ok(order_progress(&snapshot.orders, &snapshot.devices))
    }

    /// 最近的排产运行记录
    pub fn recent_runs(&self, limit: usize) -> ApiResult<Vec<PlanRunLog>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        Ok(self.run_log_repo.list_recent(limit)?)
    }
}
