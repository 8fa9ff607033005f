// ==========================================
// 订单排产系统 - 领域类型定义
// ==========================================
// 职责: 把外部存储中的"字符串布尔值/数字字符串"规范化为枚举
// 约束: 外部表示只在仓储层出现,领域层只使用枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 订单状态 (Order Status)
// ==========================================
// 外部表示: -1 已取消 / 0 生产中 / 1 已交付
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Cancelled,    // 已取消
    InProduction, // 生产中(待排产)
    Delivered,    // 已交付
}

impl OrderStatus {
    /// 从存储值解析
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(OrderStatus::Cancelled),
            0 => Some(OrderStatus::InProduction),
            1 => Some(OrderStatus::Delivered),
            _ => None,
        }
    }

    /// 转换为存储值
    pub fn code(&self) -> i64 {
        match self {
            OrderStatus::Cancelled => -1,
            OrderStatus::InProduction => 0,
            OrderStatus::Delivered => 1,
        }
    }

    /// 是否参与排产搜索
    pub fn is_active(&self) -> bool {
        *self == OrderStatus::InProduction
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Cancelled => write!(f, "CANCELLED"),
            OrderStatus::InProduction => write!(f, "IN_PRODUCTION"),
            OrderStatus::Delivered => write!(f, "DELIVERED"),
        }
    }
}

// ==========================================
// 订单优先级 (Order Priority)
// ==========================================
// 外部表示: "0" 普通 / "1" 加急 / 其他值原样保留
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderPriority {
    Normal,
    Urgent,
    Other(String),
}

impl OrderPriority {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "0" => OrderPriority::Normal,
            "1" => OrderPriority::Urgent,
            other => OrderPriority::Other(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            OrderPriority::Normal => "0",
            OrderPriority::Urgent => "1",
            OrderPriority::Other(s) => s.as_str(),
        }
    }
}

impl fmt::Display for OrderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ==========================================
// 设备状态 (Device Status)
// ==========================================
// 外部表示: "true" 运行中, 其余任何值(含 NULL)均视为离线
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    Operating,
    Offline,
}

impl DeviceStatus {
    pub fn from_flag(flag: Option<&str>) -> Self {
        match flag {
            Some("true") => DeviceStatus::Operating,
            _ => DeviceStatus::Offline,
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            DeviceStatus::Operating => "true",
            DeviceStatus::Offline => "false",
        }
    }

    pub fn is_operating(&self) -> bool {
        *self == DeviceStatus::Operating
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Operating => write!(f, "OPERATING"),
            DeviceStatus::Offline => write!(f, "OFFLINE"),
        }
    }
}

// ==========================================
// 排产条目状态 (Entry Status)
// ==========================================
// 外部表示: 0 进行中 / 1 已完成 / -1 排队或阻塞
// 说明: 单次排产内 Running 与 Blocked 是分支而非迁移; Done 只分配给已交付订单
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryStatus {
    Running,
    Done,
    Blocked,
}

impl EntryStatus {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(EntryStatus::Running),
            1 => Some(EntryStatus::Done),
            -1 => Some(EntryStatus::Blocked),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            EntryStatus::Running => 0,
            EntryStatus::Done => 1,
            EntryStatus::Blocked => -1,
        }
    }
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryStatus::Running => write!(f, "RUNNING"),
            EntryStatus::Done => write!(f, "DONE"),
            EntryStatus::Blocked => write!(f, "BLOCKED"),
        }
    }
}

// ==========================================
// 排产触发方式 (Run Trigger)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunTrigger {
    Timer,  // 每日定时
    Manual, // 人工触发
}

impl RunTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunTrigger::Timer => "TIMER",
            RunTrigger::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for RunTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_codes() {
        for code in [-1, 0, 1] {
            let status = OrderStatus::from_code(code).unwrap();
            assert_eq!(status.code(), code);
        }
        assert!(OrderStatus::from_code(7).is_none());
        assert!(OrderStatus::InProduction.is_active());
        assert!(!OrderStatus::Delivered.is_active());
        assert!(!OrderStatus::Cancelled.is_active());
    }

    #[test]
    fn test_priority_keeps_unknown_value() {
        assert_eq!(OrderPriority::from_code("1"), OrderPriority::Urgent);
        assert_eq!(OrderPriority::from_code(" 0 "), OrderPriority::Normal);
        let other = OrderPriority::from_code("rush");
        assert_eq!(other.code(), "rush");
    }

    #[test]
    fn test_device_status_only_true_is_operating() {
        assert!(DeviceStatus::from_flag(Some("true")).is_operating());
        assert!(!DeviceStatus::from_flag(Some("false")).is_operating());
        assert!(!DeviceStatus::from_flag(Some("TRUE")).is_operating());
        assert!(!DeviceStatus::from_flag(None).is_operating());
    }

    #[test]
    fn test_entry_status_codes() {
        assert_eq!(EntryStatus::Running.code(), 0);
        assert_eq!(EntryStatus::Done.code(), 1);
        assert_eq!(EntryStatus::Blocked.code(), -1);
        assert_eq!(EntryStatus::from_code(-1), Some(EntryStatus::Blocked));
    }
}
