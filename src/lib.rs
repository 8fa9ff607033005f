// ==========================================
// 订单排产系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite + tokio
// 职责: 订单-设备匹配、遗传算法分配搜索、排产计划生成与整体写入
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 匹配/搜索/计划生成
pub mod engine;

// 配置层 - 排产参数
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 性能统计
pub mod perf;

// 服务层 - 排产编排与定时触发
pub mod service;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DeviceStatus, EntryStatus, OrderPriority, OrderStatus, RunTrigger};

// 领域实体
pub use domain::{Device, Order, PlanDiagnostics, PlanOutcome, ProcessStep, ScheduleEntry};

// 引擎
pub use engine::{DeviceMatcher, FitnessEvaluator, GeneticOptimizer, PlanMaterializer, Planner};

// 服务
pub use service::{DailyTrigger, PlanRunReport, PlanningError, PlanningService};

// API
pub use api::{ConfigApi, DashboardApi, SchedulingApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订单排产系统";
