// ==========================================
// 订单排产系统 - 适应度评估
// ==========================================
// fitness = 1 / (makespan + w·延期天数 + c·冲突天数 + 1)
// - makespan: 所有分配的最大结束偏移
// - 延期: 交货期早于 today + 结束偏移 时累加超期天数；交货期未知不计
// - 冲突: 同设备按开始偏移排序后，相邻两项重叠的天数
// 说明: 设备时间表每次评估重新构建，不跨调用共享
// ==========================================

use crate::config::planning_config::OptimizerConfig;
use crate::engine::assignment::{Assignment, OrderSlot};
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};

/// 单个设备上的占用区间 [start, end)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Interval {
    start: u32,
    end: u32,
}

/// 适应度分解（便于日志与测试）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitnessBreakdown {
    pub makespan: u32,
    pub lateness_days: i64,
    pub conflict_days: u32,
    pub fitness: f64,
}

pub struct FitnessEvaluator<'a> {
    slots: &'a [OrderSlot],
    durations: HashMap<u32, u32>,
    today: NaiveDate,
    due_date_weight: f64,
    conflict_weight: f64,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(config: &OptimizerConfig, slots: &'a [OrderSlot], today: NaiveDate) -> Self {
        Self {
            slots,
            durations: config
                .processes
                .iter()
                .map(|p| (p.id, p.duration_days))
                .collect(),
            today,
            due_date_weight: config.due_date_weight,
            conflict_weight: config.conflict_weight,
        }
    }

    pub fn fitness(&self, individual: &[Assignment]) -> f64 {
        self.evaluate(individual).fitness
    }

    pub fn evaluate(&self, individual: &[Assignment]) -> FitnessBreakdown {
        let mut device_schedules: BTreeMap<i64, Vec<Interval>> = BTreeMap::new();
        let mut lateness_days: i64 = 0;
        let mut makespan: u32 = 0;

        for (assignment, slot) in individual.iter().zip(self.slots.iter()) {
            let duration = self
                .durations
                .get(&assignment.process_id)
                .copied()
                .unwrap_or(0);
            let end = assignment.start_offset_days.saturating_add(duration);
            makespan = makespan.max(end);

            device_schedules
                .entry(assignment.device_id)
                .or_default()
                .push(Interval {
                    start: assignment.start_offset_days,
                    end,
                });

            lateness_days += self.lateness(slot.due_date, end);
        }

        let conflict_days: u32 = device_schedules
            .values_mut()
            .map(|intervals| overlap_days(intervals))
            .sum();

        let penalty = makespan as f64
            + self.due_date_weight * lateness_days as f64
            + self.conflict_weight * conflict_days as f64;

        FitnessBreakdown {
            makespan,
            lateness_days,
            conflict_days,
            fitness: 1.0 / (penalty + 1.0),
        }
    }

    /// 超期天数（未超期或交货期未知时为 0）
    ///
    /// 以相对今天的天数比较，不构造完工日期，偏移再大也不会溢出
    fn lateness(&self, due_date: Option<NaiveDate>, end_offset: u32) -> i64 {
        let Some(due) = due_date else {
            return 0;
        };
        let slack = (due - self.today).num_days();
        (i64::from(end_offset) - slack).max(0)
    }
}

/// 相邻区间重叠天数之和（区间按开始时间稳定排序）
fn overlap_days(intervals: &mut [Interval]) -> u32 {
    intervals.sort_by_key(|iv| iv.start);
    intervals
        .windows(2)
        .map(|pair| {
            let (prev, next) = (pair[0], pair[1]);
            if next.start < prev.end {
                prev.end.min(next.end) - next.start
            } else {
                0
            }
        })
        .sum()
}
