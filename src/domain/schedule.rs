// ==========================================
// 订单排产系统 - 排产计划领域模型
// ==========================================
// 对齐: scheduling 表
// 红线: 每次排产整体重算,不保留跨轮次的条目身份
// ==========================================

use crate::domain::process::COMPLETED_PROCESS;
use crate::domain::types::EntryStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// ScheduleEntry - 排产条目
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub order_no: String,      // 订单编号
    pub name: String,          // 产品名称
    pub start_time: NaiveDate, // 开始日期
    pub end_time: NaiveDate,   // 结束日期
    pub status: EntryStatus,   // 条目状态
    #[serde(rename = "process")]
    pub process_name: String,  // 工序名称(已完成订单为 "none")
    #[serde(rename = "device")]
    pub device_name: String,   // 设备名称
}

impl ScheduleEntry {
    /// 是否为已完成且无后续工序的条目
    pub fn is_completed(&self) -> bool {
        self.status == EntryStatus::Done && self.process_name == COMPLETED_PROCESS
    }
}

// ==========================================
// PlanDiagnostics - 排产诊断信息
// ==========================================
// 用途: 让调用方区分"未匹配到设备"与"已排产",避免订单静默丢失
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanDiagnostics {
    /// 名称与类型均未匹配到设备的在产订单
    pub unmatched_orders: Vec<UnmatchedOrder>,
    /// 交货期缺失或无法解析的在产订单 id(不计延期惩罚)
    pub unknown_due_dates: Vec<i64>,
    /// 不在配置类别序列中的设备类别(追加在计划末尾)
    pub undeclared_categories: Vec<String>,
}

impl PlanDiagnostics {
    pub fn is_clean(&self) -> bool {
        self.unmatched_orders.is_empty()
            && self.unknown_due_dates.is_empty()
            && self.undeclared_categories.is_empty()
    }

    pub fn unmatched_ids(&self) -> Vec<i64> {
        self.unmatched_orders.iter().map(|o| o.id).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnmatchedOrder {
    pub id: i64,
    pub order_no: String,
    pub name: String,
    #[serde(rename = "type")]
    pub order_type: String,
}

// ==========================================
// PlanOutcome - 单次排产结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanOutcome {
    /// 按类别顺序排列的排产条目
    pub entries: Vec<ScheduleEntry>,
    /// 诊断信息
    pub diagnostics: PlanDiagnostics,
    /// 最优个体适应度(无可搜索订单时为 None)
    pub best_fitness: Option<f64>,
}
