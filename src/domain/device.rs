// ==========================================
// 订单排产系统 - 设备领域模型
// ==========================================
// 对齐: resource 表
// ==========================================

use crate::domain::types::DeviceStatus;
use serde::{Deserialize, Serialize};

// ==========================================
// Device - 生产设备
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,                 // 设备主键
    pub code: String,            // 设备编码
    pub name: String,            // 设备名称
    #[serde(rename = "type")]
    pub device_type: String,     // 设备类别(计划按类别分组)
    pub status: DeviceStatus,    // 运行状态
    pub worker_id: Option<i64>,  // 关联人员(排产不使用)
    pub raw_id: Option<i64>,     // 关联原材料(排产不使用)
}

impl Device {
    pub fn is_operating(&self) -> bool {
        self.status.is_operating()
    }
}
