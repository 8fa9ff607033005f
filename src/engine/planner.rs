// ==========================================
// 订单排产系统 - 排产门面
// ==========================================
// 流程: 设备匹配 → 遗传算法搜索 → 解析最优个体 → 计划生成
// 约束:
// - 纯计算，不访问数据库；输入为同一快照中的订单与设备
// - 已取消订单不参与；已交付订单只生成完成窗口
// - 未匹配订单写入诊断，不静默丢弃
// ==========================================

use crate::config::planning_config::PlanningConfig;
use crate::domain::device::Device;
use crate::domain::order::Order;
use crate::domain::process::ProcessStep;
use crate::domain::schedule::{PlanDiagnostics, PlanOutcome, UnmatchedOrder};
use crate::domain::types::OrderStatus;
use crate::engine::assignment::{Assignment, OrderSlot};
use crate::engine::device_matcher::DeviceMatcher;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::fitness::FitnessEvaluator;
use crate::engine::materializer::{CompletedWork, PlanMaterializer, PlannedWork};
use crate::engine::optimizer::GeneticOptimizer;
use chrono::NaiveDate;
use rand::Rng;
use std::collections::HashMap;
use tracing::{info, instrument, warn};

pub struct Planner<'a> {
    config: &'a PlanningConfig,
}

impl<'a> Planner<'a> {
    pub fn new(config: &'a PlanningConfig) -> Self {
        Self { config }
    }

    /// 执行一轮排产计算
    ///
    /// # 返回
    /// - entries: 按类别顺序排列（未做"已完成置后"排序）
    /// - diagnostics: 未匹配订单 / 交货期未知 / 未声明类别
    /// - best_fitness: 无可搜索订单时为 None
    #[instrument(skip_all, fields(orders = orders.len(), devices = devices.len(), %today))]
    pub fn plan<R: Rng>(
        &self,
        orders: &[Order],
        devices: &[Device],
        today: NaiveDate,
        rng: &mut R,
    ) -> EngineResult<PlanOutcome> {
        self.config.validate().map_err(EngineError::InvalidConfig)?;

        let matcher = DeviceMatcher::new(devices);
        let mut diagnostics = PlanDiagnostics::default();
        let mut slots = Vec::new();
        let mut completed = Vec::new();

        for (order_index, order) in orders.iter().enumerate() {
            match order.status {
                OrderStatus::Cancelled => {}
                OrderStatus::Delivered => {
                    let first = matcher.match_order(order).into_iter().next();
                    completed.push(CompletedWork::new(order, first));
                }
                OrderStatus::InProduction => {
                    let candidates = matcher.candidate_ids(order);
                    if candidates.is_empty() {
                        diagnostics.unmatched_orders.push(UnmatchedOrder {
                            id: order.id,
                            order_no: order.order_no.clone(),
                            name: order.name.clone(),
                            order_type: order.order_type.clone(),
                        });
                        continue;
                    }
                    if order.due_date.is_none() {
                        diagnostics.unknown_due_dates.push(order.id);
                    }
                    slots.push(OrderSlot {
                        order_index,
                        order_id: order.id,
                        order_no: order.order_no.clone(),
                        due_date: order.due_date,
                        candidates,
                    });
                }
            }
        }

        if !diagnostics.unmatched_orders.is_empty() {
            warn!(
                unmatched = ?diagnostics.unmatched_ids(),
                "部分在产订单未匹配到任何设备，本轮不排产"
            );
        }

        let (planned, best_fitness) = if slots.is_empty() {
            (Vec::new(), None)
        } else {
            let optimizer_config = &self.config.optimizer;
            let evaluator = FitnessEvaluator::new(optimizer_config, &slots, today);
            let optimizer = GeneticOptimizer::new(optimizer_config, &slots, evaluator)?;
            let result = optimizer.optimize(rng);
            let planned = self.resolve(&result.best, &slots, orders, devices)?;
            (planned, Some(result.best_fitness))
        };

        let materialized = PlanMaterializer::new(&self.config.materializer).materialize(
            &planned,
            &completed,
            devices,
            today,
        )?;
        diagnostics.undeclared_categories = materialized.undeclared_categories;

        info!(
            searched = slots.len(),
            completed = completed.len(),
            entries = materialized.entries.len(),
            best_fitness = ?best_fitness,
            "排产计算完成"
        );

        Ok(PlanOutcome {
            entries: materialized.entries,
            diagnostics,
            best_fitness,
        })
    }

    /// 把最优个体的 id 引用解析为 订单/设备/工序
    fn resolve<'o>(
        &'o self,
        best: &[Assignment],
        slots: &[OrderSlot],
        orders: &'o [Order],
        devices: &'o [Device],
    ) -> EngineResult<Vec<PlannedWork<'o>>> {
        let device_by_id: HashMap<i64, &Device> = devices.iter().map(|d| (d.id, d)).collect();
        let process_by_id: HashMap<u32, &ProcessStep> = self
            .config
            .optimizer
            .processes
            .iter()
            .map(|p| (p.id, p))
            .collect();

        best.iter()
            .zip(slots.iter())
            .map(|(assignment, slot)| {
                let order = orders.get(slot.order_index).ok_or(EngineError::DanglingReference {
                    entity: "订单",
                    id: slot.order_id,
                })?;
                let device = device_by_id.get(&assignment.device_id).copied().ok_or(
                    EngineError::DanglingReference {
                        entity: "设备",
                        id: assignment.device_id,
                    },
                )?;
                let process = process_by_id.get(&assignment.process_id).copied().ok_or(
                    EngineError::DanglingReference {
                        entity: "工序",
                        id: i64::from(assignment.process_id),
                    },
                )?;
                Ok(PlannedWork {
                    order,
                    device,
                    process,
                })
            })
            .collect()
    }
}
