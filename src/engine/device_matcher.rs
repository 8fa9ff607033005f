// ==========================================
// 订单排产系统 - 设备匹配
// ==========================================
// 规则（顺序执行，命中即返回）:
// 1) 设备名称包含订单产品名称 → 返回全部名称命中的设备
// 2) 设备类别等于订单类型 → 返回全部类别命中的设备
// 3) 均未命中 → 空集，订单本轮不可排产（由 Planner 写入诊断）
// 说明: 匹配不过滤离线设备，离线只影响计划生成阶段的条目状态
// ==========================================

use crate::domain::device::Device;
use crate::domain::order::Order;

pub struct DeviceMatcher<'a> {
    devices: &'a [Device],
}

impl<'a> DeviceMatcher<'a> {
    pub fn new(devices: &'a [Device]) -> Self {
        Self { devices }
    }

    /// 解析订单的候选设备
    ///
    /// 空白产品名称不参与名称匹配（否则会命中全部设备）；非空名称按原文做子串匹配
    pub fn match_order(&self, order: &Order) -> Vec<&'a Device> {
        let name = order.name.as_str();
        if !name.trim().is_empty() {
            let by_name: Vec<&Device> = self
                .devices
                .iter()
                .filter(|d| d.name.contains(name))
                .collect();
            if !by_name.is_empty() {
                return by_name;
            }
        }

        self.devices
            .iter()
            .filter(|d| d.device_type == order.order_type)
            .collect()
    }

    /// 候选设备 id 列表（保持设备输入顺序）
    pub fn candidate_ids(&self, order: &Order) -> Vec<i64> {
        self.match_order(order).into_iter().map(|d| d.id).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DeviceStatus, OrderPriority, OrderStatus};

    fn device(id: i64, name: &str, device_type: &str) -> Device {
        Device {
            id,
            code: format!("D{}", id),
            name: name.to_string(),
            device_type: device_type.to_string(),
            status: DeviceStatus::Operating,
            worker_id: None,
            raw_id: None,
        }
    }

    fn order(name: &str, order_type: &str) -> Order {
        Order {
            id: 1,
            order_no: "PO-1".to_string(),
            name: name.to_string(),
            order_type: order_type.to_string(),
            quantity: 10,
            due_date: None,
            status: OrderStatus::InProduction,
            priority: OrderPriority::Normal,
        }
    }

    #[test]
    fn test_name_match_wins_over_type() {
        let devices = vec![
            device(1, "R1-lathe", "capacitor"),
            device(2, "resistor-lathe", "resistor"),
        ];
        let matcher = DeviceMatcher::new(&devices);
        assert_eq!(matcher.candidate_ids(&order("R1", "resistor")), vec![1]);
    }

    #[test]
    fn test_falls_back_to_type() {
        let devices = vec![
            device(1, "cap-lathe", "capacitor"),
            device(2, "res-lathe-a", "resistor"),
            device(3, "res-lathe-b", "resistor"),
        ];
        let matcher = DeviceMatcher::new(&devices);
        assert_eq!(matcher.candidate_ids(&order("X9", "resistor")), vec![2, 3]);
    }

    #[test]
    fn test_no_match_is_empty() {
        let devices = vec![device(1, "cap-lathe", "capacitor")];
        let matcher = DeviceMatcher::new(&devices);
        assert!(matcher.match_order(&order("R1", "relay")).is_empty());
    }

    #[test]
    fn test_blank_name_uses_type_only() {
        let devices = vec![
            device(1, "cap-lathe", "capacitor"),
            device(2, "relay-lathe", "relay"),
        ];
        let matcher = DeviceMatcher::new(&devices);
        assert_eq!(matcher.candidate_ids(&order("  ", "relay")), vec![2]);
    }

    #[test]
    fn test_padded_name_is_matched_verbatim() {
        let devices = vec![
            device(1, "R1-lathe", "resistor"),
            device(2, "cap-1", "capacitor"),
            device(3, "line R1", "relay"),
        ];
        let matcher = DeviceMatcher::new(&devices);
        // " R1" 只命中名称中含前导空格的设备
        assert_eq!(matcher.candidate_ids(&order(" R1", "capacitor")), vec![3]);
        // "R1 " 无名称命中，回退到类型
        assert_eq!(matcher.candidate_ids(&order("R1 ", "capacitor")), vec![2]);
    }
}
