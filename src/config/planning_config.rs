// ==========================================
// 订单排产系统 - 排产参数
// ==========================================
// 职责: 遗传算法参数、计划生成参数、定时触发参数
// 说明: 默认值对齐现网行为,可通过 config_kv 覆写
// ==========================================

use crate::domain::process::{default_process_catalog, ProcessStep};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// 所有天数类参数的上限（约 100 年）
pub const MAX_SPAN_DAYS: i64 = 36_500;

// ==========================================
// OptimizerConfig - 遗传算法参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub population_size: usize,    // 种群大小
    pub generations: usize,        // 迭代代数
    pub mutation_rate: f64,        // 单个分配的变异概率
    pub device_mutation_share: f64, // 变异时改设备(而非改开始时间)的概率
    pub due_date_weight: f64,      // 延期惩罚权重
    pub conflict_weight: f64,      // 设备冲突惩罚权重
    pub start_horizon_days: u32,   // 随机开始偏移上限(不含)
    pub processes: Vec<ProcessStep>, // 工序目录
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            population_size: 50,
            generations: 100,
            mutation_rate: 0.01,
            device_mutation_share: 0.5,
            due_date_weight: 0.5,
            conflict_weight: 1.0,
            start_horizon_days: 100,
            processes: default_process_catalog(),
        }
    }
}

impl OptimizerConfig {
    /// 校验参数,返回首个不合法项的说明
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size == 0 {
            return Err("population_size 必须大于 0".to_string());
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(format!("mutation_rate 超出 [0,1]: {}", self.mutation_rate));
        }
        if !(0.0..=1.0).contains(&self.device_mutation_share) {
            return Err(format!(
                "device_mutation_share 超出 [0,1]: {}",
                self.device_mutation_share
            ));
        }
        if !self.due_date_weight.is_finite() || self.due_date_weight < 0.0 {
            return Err(format!("due_date_weight 不合法: {}", self.due_date_weight));
        }
        if !self.conflict_weight.is_finite() || self.conflict_weight < 0.0 {
            return Err(format!("conflict_weight 不合法: {}", self.conflict_weight));
        }
        if self.start_horizon_days == 0 || i64::from(self.start_horizon_days) > MAX_SPAN_DAYS {
            return Err(format!(
                "start_horizon_days 超出 [1,{}]: {}",
                MAX_SPAN_DAYS, self.start_horizon_days
            ));
        }
        if self.processes.is_empty() {
            return Err("工序目录不能为空".to_string());
        }
        if let Some(p) = self
            .processes
            .iter()
            .find(|p| i64::from(p.duration_days) > MAX_SPAN_DAYS)
        {
            return Err(format!(
                "工序 {} 的工期超出上限 {}: {}",
                p.name, MAX_SPAN_DAYS, p.duration_days
            ));
        }
        Ok(())
    }
}

// ==========================================
// MaterializerConfig - 计划生成参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterializerConfig {
    pub categories: Vec<String>,     // 类别输出顺序
    pub cadence_days: i64,           // 在产条目节拍(天)
    pub cadence_offset_days: i64,    // 在产条目整体偏移(天)
    pub completed_window_days: i64,  // 已完成条目窗口长度(天)
    pub completed_step_days: i64,    // 已完成条目游标回退步长(天)
}

impl Default for MaterializerConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                "resistor".to_string(),
                "capacitor".to_string(),
                "relay".to_string(),
            ],
            cadence_days: 2,
            cadence_offset_days: 0,
            completed_window_days: 4,
            completed_step_days: 2,
        }
    }
}

impl MaterializerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_SPAN_DAYS).contains(&self.cadence_days) {
            return Err(format!(
                "cadence_days 超出 [1,{}]: {}",
                MAX_SPAN_DAYS, self.cadence_days
            ));
        }
        if !(-MAX_SPAN_DAYS..=MAX_SPAN_DAYS).contains(&self.cadence_offset_days) {
            return Err(format!(
                "cadence_offset_days 超出 ±{}: {}",
                MAX_SPAN_DAYS, self.cadence_offset_days
            ));
        }
        let window = 0..=MAX_SPAN_DAYS;
        if !window.contains(&self.completed_window_days)
            || !window.contains(&self.completed_step_days)
        {
            return Err(format!(
                "已完成窗口参数超出 [0,{}]: window={}, step={}",
                MAX_SPAN_DAYS, self.completed_window_days, self.completed_step_days
            ));
        }
        Ok(())
    }
}

// ==========================================
// PlanningConfig - 单次排产完整配置
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningConfig {
    pub optimizer: OptimizerConfig,
    pub materializer: MaterializerConfig,
    pub daily_trigger_time: NaiveTime, // 每日定时排产时间(本地时间)
    pub seed: Option<u64>,             // 固定随机种子(None 表示每轮取系统熵)
}

impl Default for PlanningConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            materializer: MaterializerConfig::default(),
            daily_trigger_time: NaiveTime::from_hms_opt(2, 0, 0).unwrap_or(NaiveTime::MIN),
            seed: None,
        }
    }
}

impl PlanningConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.optimizer.validate()?;
        self.materializer.validate()
    }
}
