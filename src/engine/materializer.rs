// ==========================================
// 订单排产系统 - 计划生成（后处理）
// ==========================================
// 输入: 最优个体（已解析为 订单/设备/工序）+ 已交付订单
// 输出: 按类别顺序排列的 ScheduleEntry 序列
// ==========================================
// 规则（逐类别）:
// 1) 在产条目按个体原顺序排布: start = today + offset + i·节拍, end = start + 节拍
//    搜索得到的开始偏移在此阶段丢弃
// 2) 首条为 Running，其余 Blocked；类别内无运行中设备时全部 Blocked
// 3) 已交付订单生成回溯窗口 [cursor - 窗口, cursor]，cursor 从今天起每条回退步长
// 4) 类别按配置顺序拼接；未声明的类别按名称升序追加在末尾
// ==========================================

use crate::config::planning_config::MaterializerConfig;
use crate::domain::device::Device;
use crate::domain::order::Order;
use crate::domain::process::{ProcessStep, COMPLETED_PROCESS};
use crate::domain::schedule::ScheduleEntry;
use crate::domain::types::EntryStatus;
use crate::engine::error::{EngineError, EngineResult};
use chrono::{NaiveDate, TimeDelta};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// 在产订单的最终分配
#[derive(Debug, Clone, Copy)]
pub struct PlannedWork<'a> {
    pub order: &'a Order,
    pub device: &'a Device,
    pub process: &'a ProcessStep,
}

impl PlannedWork<'_> {
    pub fn category(&self) -> &str {
        &self.device.device_type
    }
}

/// 已交付订单（回溯生成完成窗口）
///
/// category 取解析到的设备类别，与该设备的在产条目落在同一类别块；无设备时取订单类型
#[derive(Debug, Clone)]
pub struct CompletedWork<'a> {
    pub order: &'a Order,
    pub device_name: String,
    pub category: String,
}

impl<'a> CompletedWork<'a> {
    /// 由匹配到的首台设备构造；无设备时名称与类别均回退为订单类型
    pub fn new(order: &'a Order, device: Option<&Device>) -> Self {
        let (device_name, category) = match device {
            Some(d) => (d.name.clone(), d.device_type.clone()),
            None => (order.order_type.clone(), order.order_type.clone()),
        };
        Self {
            order,
            device_name,
            category,
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedPlan {
    pub entries: Vec<ScheduleEntry>,
    pub undeclared_categories: Vec<String>,
}

pub struct PlanMaterializer<'a> {
    config: &'a MaterializerConfig,
}

impl<'a> PlanMaterializer<'a> {
    pub fn new(config: &'a MaterializerConfig) -> Self {
        Self { config }
    }

    pub fn materialize(
        &self,
        planned: &[PlannedWork<'_>],
        completed: &[CompletedWork<'_>],
        devices: &[Device],
        today: NaiveDate,
    ) -> EngineResult<MaterializedPlan> {
        let undeclared = self.undeclared_categories(planned, completed);
        if !undeclared.is_empty() {
            warn!(categories = ?undeclared, "存在未声明的设备类别，追加在计划末尾");
        }

        let mut entries = Vec::with_capacity(planned.len() + completed.len());
        for category in self.config.categories.iter().chain(undeclared.iter()) {
            let offline = !devices
                .iter()
                .any(|d| d.device_type == *category && d.is_operating());

            let in_progress: Vec<&PlannedWork<'_>> =
                planned.iter().filter(|w| w.category() == category).collect();
            let done: Vec<&CompletedWork<'_>> =
                completed.iter().filter(|w| w.category() == category).collect();

            debug!(
                category = %category,
                offline,
                in_progress = in_progress.len(),
                completed = done.len(),
                "生成类别计划"
            );

            self.push_in_progress(&mut entries, &in_progress, offline, today)?;
            self.push_completed(&mut entries, &done, today)?;
        }

        Ok(MaterializedPlan {
            entries,
            undeclared_categories: undeclared,
        })
    }

    fn push_in_progress(
        &self,
        entries: &mut Vec<ScheduleEntry>,
        works: &[&PlannedWork<'_>],
        offline: bool,
        today: NaiveDate,
    ) -> EngineResult<()> {
        let cadence = self.config.cadence_days;
        for (i, work) in works.iter().enumerate() {
            let offset = (i as i64)
                .checked_mul(cadence)
                .and_then(|d| d.checked_add(self.config.cadence_offset_days))
                .ok_or(EngineError::DateOutOfRange {
                    base: today,
                    days: i64::MAX,
                })?;
            let start_time = shift_days(today, offset)?;
            let status = if offline || i > 0 {
                EntryStatus::Blocked
            } else {
                EntryStatus::Running
            };
            entries.push(ScheduleEntry {
                order_no: work.order.order_no.clone(),
                name: work.order.name.clone(),
                start_time,
                end_time: shift_days(start_time, cadence)?,
                status,
                process_name: work.process.name.clone(),
                device_name: work.device.name.clone(),
            });
        }
        Ok(())
    }

    fn push_completed(
        &self,
        entries: &mut Vec<ScheduleEntry>,
        works: &[&CompletedWork<'_>],
        today: NaiveDate,
    ) -> EngineResult<()> {
        let mut cursor = today;
        for work in works {
            entries.push(ScheduleEntry {
                order_no: work.order.order_no.clone(),
                name: work.order.name.clone(),
                start_time: shift_days(cursor, -self.config.completed_window_days)?,
                end_time: cursor,
                status: EntryStatus::Done,
                process_name: COMPLETED_PROCESS.to_string(),
                device_name: work.device_name.clone(),
            });
            cursor = shift_days(cursor, -self.config.completed_step_days)?;
        }
        Ok(())
    }

    fn undeclared_categories(
        &self,
        planned: &[PlannedWork<'_>],
        completed: &[CompletedWork<'_>],
    ) -> Vec<String> {
        let seen: BTreeSet<&str> = planned
            .iter()
            .map(|w| w.category())
            .chain(completed.iter().map(|w| w.category()))
            .collect();
        seen.into_iter()
            .filter(|c| !self.config.categories.iter().any(|declared| declared == c))
            .map(str::to_string)
            .collect()
    }
}

/// 日期平移；超出 chrono 可表示范围时返回错误而不是 panic
fn shift_days(base: NaiveDate, days: i64) -> EngineResult<NaiveDate> {
    TimeDelta::try_days(days)
        .and_then(|delta| base.checked_add_signed(delta))
        .ok_or(EngineError::DateOutOfRange { base, days })
}

/// 把已完成条目（Done 且工序为 "none"）稳定地排到其余条目之后
///
/// 用于定时/人工排产写库前的整体排序
pub fn sort_completed_last(entries: &mut [ScheduleEntry]) {
    entries.sort_by_key(|e| e.is_completed());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{DeviceStatus, OrderPriority, OrderStatus};
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn order(id: i64, name: &str, order_type: &str, status: OrderStatus) -> Order {
        Order {
            id,
            order_no: format!("PO-{}", id),
            name: name.to_string(),
            order_type: order_type.to_string(),
            quantity: 1,
            due_date: None,
            status,
            priority: OrderPriority::Normal,
        }
    }

    fn device(id: i64, name: &str, device_type: &str, status: DeviceStatus) -> Device {
        Device {
            id,
            code: format!("D{}", id),
            name: name.to_string(),
            device_type: device_type.to_string(),
            status,
            worker_id: None,
            raw_id: None,
        }
    }

    fn process() -> ProcessStep {
        ProcessStep::new(1, "切割", 8)
    }

    #[test]
    fn test_in_progress_cadence_and_status() {
        let config = MaterializerConfig::default();
        let devices = vec![device(1, "res-1", "resistor", DeviceStatus::Operating)];
        let orders = vec![
            order(1, "A", "resistor", OrderStatus::InProduction),
            order(2, "B", "resistor", OrderStatus::InProduction),
            order(3, "C", "resistor", OrderStatus::InProduction),
        ];
        let step = process();
        let planned: Vec<PlannedWork> = orders
            .iter()
            .map(|o| PlannedWork {
                order: o,
                device: &devices[0],
                process: &step,
            })
            .collect();

        let plan = PlanMaterializer::new(&config)
            .materialize(&planned, &[], &devices, today())
            .unwrap();
        assert_eq!(plan.entries.len(), 3);
        let statuses: Vec<EntryStatus> = plan.entries.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![EntryStatus::Running, EntryStatus::Blocked, EntryStatus::Blocked]
        );
        for (i, entry) in plan.entries.iter().enumerate() {
            assert_eq!(entry.start_time, today() + Duration::days(2 * i as i64));
            assert_eq!(entry.end_time, entry.start_time + Duration::days(2));
            assert_eq!(entry.process_name, "切割");
            assert_eq!(entry.device_name, "res-1");
        }
    }

    #[test]
    fn test_offline_category_blocks_everything() {
        let config = MaterializerConfig::default();
        let devices = vec![
            device(1, "res-1", "resistor", DeviceStatus::Offline),
            device(2, "cap-1", "capacitor", DeviceStatus::Operating),
        ];
        let orders = vec![
            order(1, "A", "resistor", OrderStatus::InProduction),
            order(2, "B", "resistor", OrderStatus::InProduction),
        ];
        let step = process();
        let planned: Vec<PlannedWork> = orders
            .iter()
            .map(|o| PlannedWork {
                order: o,
                device: &devices[0],
                process: &step,
            })
            .collect();

        let plan = PlanMaterializer::new(&config)
            .materialize(&planned, &[], &devices, today())
            .unwrap();
        assert!(plan.entries.iter().all(|e| e.status == EntryStatus::Blocked));
    }

    #[test]
    fn test_completed_windows_step_backwards() {
        let config = MaterializerConfig::default();
        let devices = vec![device(1, "relay-1", "relay", DeviceStatus::Offline)];
        let orders = vec![
            order(1, "A", "relay", OrderStatus::Delivered),
            order(2, "B", "relay", OrderStatus::Delivered),
        ];
        let completed: Vec<CompletedWork> = orders
            .iter()
            .map(|o| CompletedWork::new(o, Some(&devices[0])))
            .collect();

        let plan = PlanMaterializer::new(&config)
            .materialize(&[], &completed, &devices, today())
            .unwrap();
        assert_eq!(plan.entries.len(), 2);
        assert!(plan.entries.iter().all(|e| e.status == EntryStatus::Done));
        assert!(plan.entries.iter().all(|e| e.process_name == COMPLETED_PROCESS));
        assert_eq!(plan.entries[0].end_time, today());
        assert_eq!(plan.entries[0].start_time, today() - Duration::days(4));
        assert_eq!(plan.entries[1].end_time, today() - Duration::days(2));
        assert_eq!(plan.entries[1].start_time, today() - Duration::days(6));
    }

    #[test]
    fn test_category_order_and_undeclared_tail() {
        let config = MaterializerConfig::default();
        let devices = vec![
            device(1, "relay-1", "relay", DeviceStatus::Operating),
            device(2, "res-1", "resistor", DeviceStatus::Operating),
            device(3, "ind-1", "inductor", DeviceStatus::Operating),
        ];
        let orders = vec![
            order(1, "A", "relay", OrderStatus::InProduction),
            order(2, "B", "inductor", OrderStatus::InProduction),
            order(3, "C", "resistor", OrderStatus::InProduction),
        ];
        let step = process();
        let planned: Vec<PlannedWork> = orders
            .iter()
            .zip(devices.iter())
            .map(|(o, d)| PlannedWork {
                order: o,
                device: d,
                process: &step,
            })
            .collect();

        let plan = PlanMaterializer::new(&config)
            .materialize(&planned, &[], &devices, today())
            .unwrap();
        let names: Vec<&str> = plan.entries.iter().map(|e| e.device_name.as_str()).collect();
        assert_eq!(names, vec!["res-1", "relay-1", "ind-1"]);
        assert_eq!(plan.undeclared_categories, vec!["inductor".to_string()]);
        // 每个类别的首条都是 Running
        assert!(plan.entries.iter().all(|e| e.status == EntryStatus::Running));
    }

    #[test]
    fn test_materialize_is_idempotent() {
        let config = MaterializerConfig::default();
        let devices = vec![device(1, "cap-1", "capacitor", DeviceStatus::Operating)];
        let orders = vec![
            order(1, "A", "capacitor", OrderStatus::InProduction),
            order(2, "B", "capacitor", OrderStatus::Delivered),
        ];
        let step = process();
        let planned = vec![PlannedWork {
            order: &orders[0],
            device: &devices[0],
            process: &step,
        }];
        let completed = vec![CompletedWork::new(&orders[1], Some(&devices[0]))];

        let materializer = PlanMaterializer::new(&config);
        let first = materializer
            .materialize(&planned, &completed, &devices, today())
            .unwrap();
        let second = materializer
            .materialize(&planned, &completed, &devices, today())
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first.entries).unwrap(),
            serde_json::to_string(&second.entries).unwrap()
        );
    }

    #[test]
    fn test_out_of_range_dates_are_errors() {
        let devices = vec![device(1, "cap-1", "capacitor", DeviceStatus::Operating)];
        let orders = vec![
            order(1, "A", "capacitor", OrderStatus::InProduction),
            order(2, "B", "capacitor", OrderStatus::InProduction),
            order(3, "C", "capacitor", OrderStatus::Delivered),
        ];
        let step = process();
        let planned: Vec<PlannedWork> = orders[..2]
            .iter()
            .map(|o| PlannedWork {
                order: o,
                device: &devices[0],
                process: &step,
            })
            .collect();

        let config = MaterializerConfig {
            cadence_days: 1_000_000_000,
            ..MaterializerConfig::default()
        };
        let err = PlanMaterializer::new(&config)
            .materialize(&planned, &[], &devices, today())
            .unwrap_err();
        assert!(matches!(err, EngineError::DateOutOfRange { .. }));

        let config = MaterializerConfig {
            completed_window_days: i64::MAX / 2,
            ..MaterializerConfig::default()
        };
        let completed = vec![CompletedWork::new(&orders[2], Some(&devices[0]))];
        let err = PlanMaterializer::new(&config)
            .materialize(&[], &completed, &devices, today())
            .unwrap_err();
        assert!(matches!(err, EngineError::DateOutOfRange { .. }));
    }

    #[test]
    fn test_completed_without_device_falls_back_to_order_type() {
        let orders = vec![order(1, "A", "relay", OrderStatus::Delivered)];
        let work = CompletedWork::new(&orders[0], None);
        assert_eq!(work.device_name, "relay");
        assert_eq!(work.category(), "relay");
    }

    #[test]
    fn test_sort_completed_last_is_stable() {
        let entry = |no: &str, status: EntryStatus, process: &str| ScheduleEntry {
            order_no: no.to_string(),
            name: no.to_string(),
            start_time: today(),
            end_time: today(),
            status,
            process_name: process.to_string(),
            device_name: "d".to_string(),
        };
        let mut entries = vec![
            entry("1", EntryStatus::Done, COMPLETED_PROCESS),
            entry("2", EntryStatus::Running, "切割"),
            entry("3", EntryStatus::Done, COMPLETED_PROCESS),
            entry("4", EntryStatus::Blocked, "焊接"),
            entry("5", EntryStatus::Done, "检测"),
        ];
        sort_completed_last(&mut entries);
        let order: Vec<&str> = entries.iter().map(|e| e.order_no.as_str()).collect();
        assert_eq!(order, vec!["2", "4", "5", "1", "3"]);
    }
}
