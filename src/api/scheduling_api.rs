// ==========================================
// 订单排产系统 - 排产 API
// ==========================================
// 职责: 人工触发排产、排产计划分页查询、人工修改排产条目
// ==========================================

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::RunTrigger;
use crate::repository::order_repo::OrderRepository;
use crate::repository::schedule_repo::{ScheduleRepository, ScheduleRow, ScheduleUpdate};
use crate::service::planning_service::{PlanRunReport, PlanningService};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: usize,
    pub page_size: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleListResponse {
    pub items: Vec<ScheduleRow>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateScheduleResponse {
    pub success_count: usize,
    pub failed_count: usize,
    /// 被标记为已交付的订单行数
    pub orders_delivered: usize,
}

impl UpdateScheduleResponse {
    pub fn all_succeeded(&self) -> bool {
        self.failed_count == 0
    }
}

pub struct SchedulingApi {
    planning_service: Arc<PlanningService>,
    schedule_repo: Arc<ScheduleRepository>,
    order_repo: Arc<OrderRepository>,
}

impl SchedulingApi {
    pub fn new(
        planning_service: Arc<PlanningService>,
        schedule_repo: Arc<ScheduleRepository>,
        order_repo: Arc<OrderRepository>,
    ) -> Self {
        Self {
            planning_service,
            schedule_repo,
            order_repo,
        }
    }

    /// 人工触发一轮排产
    pub async fn manual_execute(&self) -> ApiResult<PlanRunReport> {
        Ok(self.planning_service.execute(RunTrigger::Manual).await?)
    }

    /// 分页查询排产计划
    ///
    /// # 参数
    /// - page / page_size: 非正数回退为 1 / 10
    /// - device: 设备名称过滤，空白视为不过滤
    pub fn list_schedule(
        &self,
        page: i64,
        page_size: i64,
        device: Option<&str>,
    ) -> ApiResult<ScheduleListResponse> {
        let page = positive_or(page, DEFAULT_PAGE);
        let page_size = positive_or(page_size, DEFAULT_PAGE_SIZE);
        let device = device.map(str::trim).filter(|d| !d.is_empty());

        let result = self.schedule_repo.list_paged(page, page_size, device)?;
        Ok(ScheduleListResponse {
            pagination: Pagination {
                page,
                page_size,
                total: result.total,
                total_pages: result.total.div_ceil(page_size),
            },
            items: result.rows,
        })
    }

    /// 人工修改排产条目的状态与工序，并把关联订单标记为已交付
    pub fn update_schedule_entries(
        &self,
        updates: &[ScheduleUpdate],
    ) -> ApiResult<UpdateScheduleResponse> {
        if updates.is_empty() {
            return Err(ApiError::InvalidInput("修改列表不能为空".to_string()));
        }

        let (success_count, failed_count) = self.schedule_repo.update_entries(updates)?;

        let order_nos: Vec<String> = updates
            .iter()
            .filter_map(|u| u.order_no.as_deref())
            .map(str::trim)
            .filter(|no| !no.is_empty())
            .collect::<BTreeSet<&str>>()
            .into_iter()
            .map(str::to_string)
            .collect();
        let orders_delivered = self.order_repo.mark_delivered(&order_nos)?;

        info!(success_count, failed_count, orders_delivered, "人工修改排产条目");

        Ok(UpdateScheduleResponse {
            success_count,
            failed_count,
            orders_delivered,
        })
    }
}

fn positive_or(value: i64, fallback: usize) -> usize {
    if value > 0 {
        value as usize
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positive_or_fallback() {
        assert_eq!(positive_or(3, 1), 3);
        assert_eq!(positive_or(0, 1), 1);
        assert_eq!(positive_or(-5, 10), 10);
    }
}
