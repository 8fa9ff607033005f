// ==========================================
// 订单排产系统 - 引擎层
// ==========================================
// 职责: 设备匹配、遗传算法搜索、计划生成
// 红线: Engine 不拼 SQL，随机源由调用方注入
// ==========================================

pub mod assignment;
pub mod device_matcher;
pub mod error;
pub mod fitness;
pub mod materializer;
pub mod optimizer;
pub mod planner;
pub mod progress;

// 重导出核心引擎
pub use assignment::{Assignment, Individual, OrderSlot};
pub use device_matcher::DeviceMatcher;
pub use error::{EngineError, EngineResult};
pub use fitness::{FitnessBreakdown, FitnessEvaluator};
pub use materializer::{sort_completed_last, CompletedWork, PlanMaterializer, PlannedWork};
pub use optimizer::{GeneticOptimizer, OptimizationResult};
pub use planner::Planner;
pub use progress::{order_progress, OrderProgress};
