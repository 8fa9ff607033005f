// ==========================================
// 订单排产系统 - 搜索空间与个体编码
// ==========================================
// 编码: 个体 = 与 OrderSlot 列表一一对齐的 Assignment 序列
// 红线: Assignment 的设备只能取自对应 OrderSlot 的候选集
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 单个订单的分配（基因）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub order_id: i64,
    pub order_no: String,
    pub process_id: u32,
    pub device_id: i64,
    pub start_offset_days: u32, // 相对"今天"的天数偏移
}

/// 个体（候选排产方案）
pub type Individual = Vec<Assignment>;

/// 可搜索订单（已匹配到至少一台设备的在产订单）
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSlot {
    pub order_index: usize, // 在输入订单列表中的下标
    pub order_id: i64,
    pub order_no: String,
    pub due_date: Option<NaiveDate>,
    pub candidates: Vec<i64>, // 候选设备 id，非空
}
