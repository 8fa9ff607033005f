// ==========================================
// 订单排产系统 - 应用状态
// ==========================================
// 职责: 打开共享连接、建表、组装仓储/服务/API
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{ConfigApi, DashboardApi, SchedulingApi};
use crate::config::config_manager::ConfigManager;
use crate::config::planning_config_reader::PlanningConfigReader;
use crate::db::{init_schema, open_sqlite_connection};
use crate::repository::{
    DeviceRepository, OrderRepository, PlanRunLogRepository, PlanningStore, ScheduleRepository,
    SqlitePlanningStore,
};
use crate::service::{DailyTrigger, PlanningService};

/// 数据库路径环境变量
pub const ENV_DB_PATH: &str = "ORDER_APS_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源，所有仓储共用同一连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    pub order_repo: Arc<OrderRepository>,
    pub device_repo: Arc<DeviceRepository>,
    pub schedule_repo: Arc<ScheduleRepository>,
    pub run_log_repo: Arc<PlanRunLogRepository>,
    pub config_manager: Arc<ConfigManager>,

    /// 排产服务（定时与人工触发共用）
    pub planning_service: Arc<PlanningService>,

    pub scheduling_api: Arc<SchedulingApi>,
    pub dashboard_api: Arc<DashboardApi>,
    pub config_api: Arc<ConfigApi>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开连接并应用统一 PRAGMA、安装 SQL 统计
    /// 2. 初始化 schema（幂等）
    /// 3. 组装仓储、配置、排产服务与 API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let mut conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);
        init_schema(&conn).map_err(|e| format!("数据库初始化失败: {}", e))?;

        Self::from_connection(db_path, Arc::new(Mutex::new(conn)))
    }

    /// 基于已初始化 schema 的共享连接组装
    pub fn from_connection(db_path: String, conn: Arc<Mutex<Connection>>) -> Result<Self, String> {
        // ==========================================
        // 初始化Repository层
        // ==========================================
        let order_repo = Arc::new(OrderRepository::new(conn.clone()));
        let device_repo = Arc::new(DeviceRepository::new(conn.clone()));
        let schedule_repo = Arc::new(ScheduleRepository::new(conn.clone()));
        let run_log_repo = Arc::new(PlanRunLogRepository::new(conn.clone()));
        let store: Arc<dyn PlanningStore> = Arc::new(SqlitePlanningStore::new(conn.clone()));

        let config_manager = Arc::new(
            ConfigManager::from_connection(conn)
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );

        // ==========================================
        // 初始化服务层
        // ==========================================
        let config_reader: Arc<dyn PlanningConfigReader> = config_manager.clone();
        let planning_service = Arc::new(PlanningService::new(
            store.clone(),
            run_log_repo.clone(),
            config_reader,
        ));

        // ==========================================
        // 初始化API层
        // ==========================================
        let scheduling_api = Arc::new(SchedulingApi::new(
            planning_service.clone(),
            schedule_repo.clone(),
            order_repo.clone(),
        ));
        let dashboard_api = Arc::new(DashboardApi::new(store, run_log_repo.clone()));
        let config_api = Arc::new(ConfigApi::new(config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            order_repo,
            device_repo,
            schedule_repo,
            run_log_repo,
            config_manager,
            planning_service,
            scheduling_api,
            dashboard_api,
            config_api,
        })
    }

    /// 每日定时触发器（需在 tokio 运行时内 spawn）
    pub fn daily_trigger(&self) -> DailyTrigger {
        DailyTrigger::new(self.planning_service.clone())
    }
}

/// 获取默认数据库路径
///
/// 优先级: `ORDER_APS_DB_PATH` > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var(ENV_DB_PATH) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./order_aps.db");

    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        let dir = if cfg!(debug_assertions) {
            data_dir.join("order-aps-dev")
        } else {
            data_dir.join("order-aps")
        };

        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("order_aps.db");
        }
    }

    path.to_string_lossy().to_string()
}
