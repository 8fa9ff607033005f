// ==========================================
// 订单排产系统 - 订单领域模型
// ==========================================
// 对齐: purchase 表
// 用途: CRUD 层写入,排产引擎只读
// ==========================================

use crate::domain::types::{OrderPriority, OrderStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Order - 生产订单
// ==========================================
// 红线: 排产引擎不修改 status / priority,状态变更由调用方在排产之后完成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,                     // 订单主键
    pub order_no: String,            // 订单编号
    pub name: String,                // 产品名称(设备匹配的首选依据)
    #[serde(rename = "type")]
    pub order_type: String,          // 产品类型(设备类别提示)
    pub quantity: i64,               // 数量
    pub due_date: Option<NaiveDate>, // 交货期(无法解析时为 None,视为未知)
    pub status: OrderStatus,         // 订单状态
    pub priority: OrderPriority,     // 优先级
}

impl Order {
    /// 是否参与本轮排产搜索
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// 是否已交付(由排产计划生成回溯的完成窗口)
    pub fn is_delivered(&self) -> bool {
        self.status == OrderStatus::Delivered
    }

    /// 是否为加急订单
    pub fn is_urgent(&self) -> bool {
        self.priority == OrderPriority::Urgent
    }
}
