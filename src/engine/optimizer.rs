// ==========================================
// 订单排产系统 - 遗传算法优化器
// ==========================================
// 流程: 初始化 → (评估 → 轮盘赌选择 → 单点交叉 → 变异) × G → 取最优
// 约束:
// - 每轮排产独立运行，不保留跨轮次状态
// - 随机源由调用方注入，固定种子可复现
// - 种群规模恒定；奇数规模时最后一个未配对个体原样进入变异
// ==========================================

use crate::config::planning_config::OptimizerConfig;
use crate::engine::assignment::{Assignment, Individual, OrderSlot};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::fitness::FitnessEvaluator;
use rand::prelude::IndexedRandom;
use rand::Rng;
use tracing::{debug, info, instrument};

// ==========================================
// OptimizationResult - 优化结果
// ==========================================
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// 最终种群中适应度最高的个体（并列取首个）
    pub best: Individual,
    pub best_fitness: f64,
    /// 最终种群全部个体的适应度
    pub final_fitness: Vec<f64>,
    /// 每代评估时的最优适应度
    pub generation_best: Vec<f64>,
}

// ==========================================
// GeneticOptimizer - 遗传算法优化器
// ==========================================
pub struct GeneticOptimizer<'a> {
    config: &'a OptimizerConfig,
    slots: &'a [OrderSlot],
    evaluator: FitnessEvaluator<'a>,
}

impl<'a> GeneticOptimizer<'a> {
    pub fn new(
        config: &'a OptimizerConfig,
        slots: &'a [OrderSlot],
        evaluator: FitnessEvaluator<'a>,
    ) -> EngineResult<Self> {
        config.validate().map_err(EngineError::InvalidConfig)?;
        Ok(Self {
            config,
            slots,
            evaluator,
        })
    }

    /// 执行完整搜索
    #[instrument(skip_all, fields(
        orders = self.slots.len(),
        population = self.config.population_size,
        generations = self.config.generations
    ))]
    pub fn optimize<R: Rng>(&self, rng: &mut R) -> OptimizationResult {
        let pop_size = self.config.population_size;
        let mut population = self.initialize_population(rng);
        let mut generation_best = Vec::with_capacity(self.config.generations);

        for generation in 0..self.config.generations {
            let fitness = self.evaluate_population(&population);
            let best = fitness.iter().copied().fold(0.0_f64, f64::max);
            generation_best.push(best);
            if generation % 10 == 0 {
                debug!(generation, best_fitness = best, "代际评估");
            }

            let parents = roulette_select(&fitness, pop_size, rng);
            let mut next = Vec::with_capacity(pop_size);

            for pair in parents.chunks(2) {
                match *pair {
                    [a, b] => {
                        let (c1, c2) =
                            single_point_crossover(&population[a], &population[b], rng);
                        next.push(c1);
                        next.push(c2);
                    }
                    [a] => next.push(population[a].clone()),
                    _ => {}
                }
            }

            for child in next.iter_mut() {
                self.mutate(child, rng);
            }
            population = next;
        }

        let final_fitness = self.evaluate_population(&population);
        let best_at = best_index(&final_fitness);
        let best_fitness = final_fitness.get(best_at).copied().unwrap_or(0.0);
        let best = population.swap_remove(best_at);

        info!(best_fitness, "遗传算法搜索完成");

        OptimizationResult {
            best,
            best_fitness,
            final_fitness,
            generation_best,
        }
    }

    /// 初始化种群：每个订单随机候选设备、随机工序、随机开始偏移
    pub fn initialize_population<R: Rng>(&self, rng: &mut R) -> Vec<Individual> {
        (0..self.config.population_size)
            .map(|_| self.random_individual(rng))
            .collect()
    }

    fn random_individual<R: Rng>(&self, rng: &mut R) -> Individual {
        self.slots
            .iter()
            .filter_map(|slot| {
                let device_id = *slot.candidates.choose(rng)?;
                let process = self.config.processes.choose(rng)?;
                Some(Assignment {
                    order_id: slot.order_id,
                    order_no: slot.order_no.clone(),
                    process_id: process.id,
                    device_id,
                    start_offset_days: rng.random_range(0..self.config.start_horizon_days),
                })
            })
            .collect()
    }

    pub fn evaluate_population(&self, population: &[Individual]) -> Vec<f64> {
        population
            .iter()
            .map(|individual| self.evaluator.fitness(individual))
            .collect()
    }

    /// 变异：每个分配以 mutation_rate 概率改设备或改开始偏移
    ///
    /// 候选集为空时不改设备
    pub fn mutate<R: Rng>(&self, individual: &mut Individual, rng: &mut R) {
        for (assignment, slot) in individual.iter_mut().zip(self.slots.iter()) {
            if !rng.random_bool(self.config.mutation_rate) {
                continue;
            }
            if rng.random_bool(self.config.device_mutation_share) {
                if let Some(&device_id) = slot.candidates.choose(rng) {
                    assignment.device_id = device_id;
                }
            } else {
                assignment.start_offset_days =
                    rng.random_range(0..self.config.start_horizon_days);
            }
        }
    }
}

// ==========================================
// 遗传算子
// ==========================================

/// 轮盘赌选择（有放回），返回被选中个体的下标
///
/// 适应度总和为 0 或非有限值时退化为均匀选择
pub fn roulette_select<R: Rng>(fitness: &[f64], count: usize, rng: &mut R) -> Vec<usize> {
    if fitness.is_empty() {
        return Vec::new();
    }

    let total: f64 = fitness.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return (0..count)
            .map(|_| rng.random_range(0..fitness.len()))
            .collect();
    }

    (0..count)
        .map(|_| {
            let r = rng.random::<f64>() * total;
            let mut cumulative = 0.0;
            for (index, f) in fitness.iter().enumerate() {
                cumulative += f;
                if r < cumulative {
                    return index;
                }
            }
            fitness.len() - 1
        })
        .collect()
}

/// 单点交叉：两个子代共用同一交叉点
pub fn single_point_crossover<R: Rng>(
    p1: &[Assignment],
    p2: &[Assignment],
    rng: &mut R,
) -> (Individual, Individual) {
    let len = p1.len().min(p2.len());
    if len == 0 {
        return (p1.to_vec(), p2.to_vec());
    }

    let point = rng.random_range(0..len);
    let child1 = p1[..point].iter().chain(p2[point..].iter()).cloned().collect();
    let child2 = p2[..point].iter().chain(p1[point..].iter()).cloned().collect();
    (child1, child2)
}

/// 最大适应度下标（并列取首个）
fn best_index(fitness: &[f64]) -> usize {
    let mut best = 0;
    for (index, f) in fitness.iter().enumerate() {
        if *f > fitness[best] {
            best = index;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    fn slots(n: i64) -> Vec<OrderSlot> {
        (0..n)
            .map(|i| OrderSlot {
                order_index: i as usize,
                order_id: i + 1,
                order_no: format!("PO-{}", i + 1),
                due_date: Some(today() + chrono::Duration::days(30)),
                candidates: if i % 2 == 0 { vec![10, 11] } else { vec![20] },
            })
            .collect()
    }

    fn small_config() -> OptimizerConfig {
        OptimizerConfig {
            population_size: 20,
            generations: 15,
            ..OptimizerConfig::default()
        }
    }

    #[test]
    fn test_population_respects_candidates() {
        let config = small_config();
        let slots = slots(6);
        let evaluator = FitnessEvaluator::new(&config, &slots, today());
        let optimizer = GeneticOptimizer::new(&config, &slots, evaluator).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        let population = optimizer.initialize_population(&mut rng);
        assert_eq!(population.len(), 20);
        for individual in &population {
            assert_eq!(individual.len(), 6);
            for (assignment, slot) in individual.iter().zip(slots.iter()) {
                assert_eq!(assignment.order_id, slot.order_id);
                assert!(slot.candidates.contains(&assignment.device_id));
                assert!(assignment.start_offset_days < config.start_horizon_days);
                assert!((1..=4).contains(&assignment.process_id));
            }
        }
    }

    #[test]
    fn test_best_is_not_worse_than_final_population() {
        let config = small_config();
        let slots = slots(8);
        let evaluator = FitnessEvaluator::new(&config, &slots, today());
        let optimizer = GeneticOptimizer::new(&config, &slots, evaluator).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let result = optimizer.optimize(&mut rng);
        assert_eq!(result.final_fitness.len(), config.population_size);
        assert_eq!(result.generation_best.len(), config.generations);
        assert!(result.final_fitness.iter().all(|f| result.best_fitness >= *f));
        assert_eq!(result.best.len(), 8);

        let ids: HashSet<i64> = result.best.iter().map(|a| a.order_id).collect();
        assert_eq!(ids.len(), 8);
    }

    #[test]
    fn test_fixed_seed_is_reproducible() {
        let config = small_config();
        let slots = slots(5);

        let run = |seed: u64| {
            let evaluator = FitnessEvaluator::new(&config, &slots, today());
            let optimizer = GeneticOptimizer::new(&config, &slots, evaluator).unwrap();
            optimizer.optimize(&mut StdRng::seed_from_u64(seed))
        };

        let a = run(99);
        let b = run(99);
        assert_eq!(a.best, b.best);
        assert_eq!(a.best_fitness, b.best_fitness);
    }

    #[test]
    fn test_odd_population_keeps_size() {
        let config = OptimizerConfig {
            population_size: 7,
            generations: 5,
            ..OptimizerConfig::default()
        };
        let slots = slots(3);
        let evaluator = FitnessEvaluator::new(&config, &slots, today());
        let optimizer = GeneticOptimizer::new(&config, &slots, evaluator).unwrap();
        let result = optimizer.optimize(&mut StdRng::seed_from_u64(1));
        assert_eq!(result.final_fitness.len(), 7);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = OptimizerConfig {
            population_size: 0,
            ..OptimizerConfig::default()
        };
        let slots = slots(1);
        let evaluator = FitnessEvaluator::new(&config, &slots, today());
        assert!(matches!(
            GeneticOptimizer::new(&config, &slots, evaluator),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_roulette_falls_back_to_uniform_on_zero_sum() {
        let mut rng = StdRng::seed_from_u64(3);
        let picks = roulette_select(&[0.0, 0.0, 0.0], 30, &mut rng);
        assert_eq!(picks.len(), 30);
        assert!(picks.iter().all(|i| *i < 3));

        let picks = roulette_select(&[f64::NAN, 1.0], 10, &mut rng);
        assert!(picks.iter().all(|i| *i < 2));

        assert!(roulette_select(&[], 5, &mut rng).is_empty());
    }

    #[test]
    fn test_roulette_never_picks_zero_fitness_when_others_positive() {
        let mut rng = StdRng::seed_from_u64(11);
        let picks = roulette_select(&[0.0, 1.0, 0.0], 50, &mut rng);
        assert!(picks.iter().all(|i| *i == 1));
    }

    #[test]
    fn test_crossover_is_symmetric() {
        let make = |device_id: i64| -> Individual {
            (1..=5)
                .map(|i| Assignment {
                    order_id: i,
                    order_no: format!("PO-{}", i),
                    process_id: 1,
                    device_id,
                    start_offset_days: 0,
                })
                .collect()
        };
        let p1 = make(1);
        let p2 = make(2);
        let mut rng = StdRng::seed_from_u64(5);
        let (c1, c2) = single_point_crossover(&p1, &p2, &mut rng);

        assert_eq!(c1.len(), 5);
        assert_eq!(c2.len(), 5);
        for i in 0..5 {
            // 同一位置上两个子代的设备来自不同亲本
            assert_ne!(c1[i].device_id, c2[i].device_id);
            assert_eq!(c1[i].order_id, (i + 1) as i64);
        }
        let point = c1.iter().take_while(|a| a.device_id == 1).count();
        assert!(c1[point..].iter().all(|a| a.device_id == 2));
        assert!(c2[..point].iter().all(|a| a.device_id == 2));
    }

    #[test]
    fn test_mutation_with_full_rate_stays_in_candidates() {
        let config = OptimizerConfig {
            mutation_rate: 1.0,
            ..small_config()
        };
        let slots = slots(4);
        let evaluator = FitnessEvaluator::new(&config, &slots, today());
        let optimizer = GeneticOptimizer::new(&config, &slots, evaluator).unwrap();
        let mut rng = StdRng::seed_from_u64(8);

        let mut individual = optimizer.initialize_population(&mut rng).remove(0);
        for _ in 0..20 {
            optimizer.mutate(&mut individual, &mut rng);
        }
        for (assignment, slot) in individual.iter().zip(slots.iter()) {
            assert!(slot.candidates.contains(&assignment.device_id));
            assert!(assignment.start_offset_days < config.start_horizon_days);
        }
    }

    #[test]
    fn test_empty_search_space() {
        let config = small_config();
        let evaluator = FitnessEvaluator::new(&config, &[], today());
        let optimizer = GeneticOptimizer::new(&config, &[], evaluator).unwrap();
        let result = optimizer.optimize(&mut StdRng::seed_from_u64(2));
        assert!(result.best.is_empty());
        assert_eq!(result.best_fitness, 1.0);
    }
}
