// ==========================================
// 订单排产系统 - 订单进度汇总
// ==========================================
// 纯计算: 输入订单与设备快照，输出看板所需的计数
// ==========================================

use crate::domain::device::Device;
use crate::domain::order::Order;
use crate::domain::types::OrderStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderProgress {
    /// 在产且加急的订单
    pub urgent_orders: Vec<Order>,
    pub delivered_count: usize,
    pub undelivered_count: usize,
    pub cancelled_count: usize,
    /// 已取消 + 在产
    pub total_orders: usize,
    pub operating_devices: usize,
    pub total_devices: usize,
    /// "运行中/总数"
    pub device_ratio: String,
}

pub fn order_progress(orders: &[Order], devices: &[Device]) -> OrderProgress {
    let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count();

    let urgent_orders: Vec<Order> = orders
        .iter()
        .filter(|o| o.is_active() && o.is_urgent())
        .cloned()
        .collect();

    let delivered_count = count(OrderStatus::Delivered);
    let undelivered_count = count(OrderStatus::InProduction);
    let cancelled_count = count(OrderStatus::Cancelled);
    let operating_devices = devices.iter().filter(|d| d.is_operating()).count();

    OrderProgress {
        urgent_orders,
        delivered_count,
        undelivered_count,
        cancelled_count,
        total_orders: cancelled_count + undelivered_count,
        operating_devices,
        total_devices: devices.len(),
        device_ratio: format!("{}/{}", operating_devices, devices.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DeviceStatus, OrderPriority};

    fn order(id: i64, status: OrderStatus, priority: OrderPriority) -> Order {
        Order {
            id,
            order_no: format!("PO-{}", id),
            name: "R1".to_string(),
            order_type: "resistor".to_string(),
            quantity: 1,
            due_date: None,
            status,
            priority,
        }
    }

    fn device(id: i64, status: DeviceStatus) -> Device {
        Device {
            id,
            code: String::new(),
            name: format!("dev-{}", id),
            device_type: "resistor".to_string(),
            status,
            worker_id: None,
            raw_id: None,
        }
    }

    #[test]
    fn test_progress_counts() {
        let orders = vec![
            order(1, OrderStatus::InProduction, OrderPriority::Urgent),
            order(2, OrderStatus::InProduction, OrderPriority::Normal),
            order(3, OrderStatus::Delivered, OrderPriority::Urgent),
            order(4, OrderStatus::Cancelled, OrderPriority::Normal),
            order(5, OrderStatus::Delivered, OrderPriority::Other("9".to_string())),
        ];
        let devices = vec![
            device(1, DeviceStatus::Operating),
            device(2, DeviceStatus::Offline),
            device(3, DeviceStatus::Operating),
        ];

        let progress = order_progress(&orders, &devices);
        assert_eq!(progress.urgent_orders.len(), 1);
        assert_eq!(progress.urgent_orders[0].id, 1);
        assert_eq!(progress.delivered_count, 2);
        assert_eq!(progress.undelivered_count, 2);
        assert_eq!(progress.cancelled_count, 1);
        assert_eq!(progress.total_orders, 3);
        assert_eq!(progress.device_ratio, "2/3");
    }

    #[test]
    fn test_progress_on_empty_snapshot() {
        let progress = order_progress(&[], &[]);
        assert!(progress.urgent_orders.is_empty());
        assert_eq!(progress.device_ratio, "0/0");
    }
}
