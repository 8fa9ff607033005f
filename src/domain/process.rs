// ==========================================
// 订单排产系统 - 工序目录
// ==========================================
// 说明: 工序目录是静态配置,不来自数据库
// 默认值: 切割 8 天 / 焊接 12 天 / 检测 6 天 / 组装 10 天
// ==========================================

use serde::{Deserialize, Serialize};

/// 已完成订单在计划中的工序占位名
pub const COMPLETED_PROCESS: &str = "none";

/// 工序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub id: u32,
    pub name: String,
    pub duration_days: u32,
}

impl ProcessStep {
    pub fn new(id: u32, name: &str, duration_days: u32) -> Self {
        Self {
            id,
            name: name.to_string(),
            duration_days,
        }
    }
}

/// 默认工序目录
pub fn default_process_catalog() -> Vec<ProcessStep> {
    vec![
        ProcessStep::new(1, "切割", 8),
        ProcessStep::new(2, "焊接", 12),
        ProcessStep::new(3, "检测", 6),
        ProcessStep::new(4, "组装", 10),
    ]
}
