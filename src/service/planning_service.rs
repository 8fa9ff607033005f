// ==========================================
// 订单排产系统 - 排产服务
// ==========================================
// 流程: 互斥保护 → 读配置 → 登记运行日志 → [工作线程: 读快照 → 计算 → 已完成置后 → 整体写入] → 收尾日志
// 约束:
// - 定时与人工触发共用同一互斥标志，并发的第二次调用直接返回 Busy
// - 读失败不写任何数据；写失败回滚，上一版计划保持不变
// - 计算与 SQLite 访问均为同步阻塞，放入 spawn_blocking
// ==========================================

use crate::config::planning_config::PlanningConfig;
use crate::config::planning_config_reader::PlanningConfigReader;
use crate::domain::schedule::{PlanDiagnostics, PlanOutcome};
use crate::domain::types::RunTrigger;
use crate::engine::materializer::sort_completed_last;
use crate::engine::planner::Planner;
use crate::perf::PerfGuard;
use crate::repository::plan_run_log_repo::PlanRunLogRepository;
use crate::repository::planning_store::PlanningStore;
use crate::service::error::{PlanningError, PlanningResult};
use chrono::{Local, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// "今天"的来源（测试时可固定）
pub type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// 单轮排产结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRunReport {
    pub run_id: String,
    pub trigger: RunTrigger,
    pub started_at: NaiveDateTime,
    pub finished_at: NaiveDateTime,
    pub entries_written: usize,
    pub best_fitness: Option<f64>,
    pub diagnostics: PlanDiagnostics,
}

/// 运行标志守卫，离开作用域即释放
struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct PlanningService {
    store: Arc<dyn PlanningStore>,
    run_log: Arc<PlanRunLogRepository>,
    config_reader: Arc<dyn PlanningConfigReader>,
    clock: Clock,
    running: Arc<AtomicBool>,
}

impl PlanningService {
    pub fn new(
        store: Arc<dyn PlanningStore>,
        run_log: Arc<PlanRunLogRepository>,
        config_reader: Arc<dyn PlanningConfigReader>,
    ) -> Self {
        Self {
            store,
            run_log,
            config_reader,
            clock: Arc::new(|| Local::now().date_naive()),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 替换"今天"的来源
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config_reader(&self) -> Arc<dyn PlanningConfigReader> {
        Arc::clone(&self.config_reader)
    }

    /// 是否有排产任务正在运行
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> PlanningResult<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| PlanningError::Busy)?;
        Ok(RunGuard {
            flag: Arc::clone(&self.running),
        })
    }

    /// 执行一轮排产
    #[instrument(skip(self), fields(trigger = %trigger))]
    pub async fn execute(&self, trigger: RunTrigger) -> PlanningResult<PlanRunReport> {
        let _guard = self.try_begin().inspect_err(|_| {
            warn!("已有排产任务在运行，本次触发被拒绝");
        })?;

        let config = self
            .config_reader
            .load_planning_config()
            .await
            .inspect_err(|e| error!(error = %e, "读取排产配置失败"))?;

        let run_id = Uuid::new_v4().to_string();
        let started_at = Local::now().naive_local();
        let today = (self.clock)();
        let config_snapshot = serde_json::to_string(&config).ok();
        self.run_log
            .start(&run_id, trigger, started_at, config_snapshot.as_deref())?;
        info!(run_id = %run_id, %today, "排产开始");

        let result = self.run_blocking(&run_id, config, today).await;
        let finished_at = Local::now().naive_local();

        match result {
            Ok((outcome, entries_written)) => {
                let diagnostics_json = serde_json::to_string(&outcome.diagnostics)
                    .unwrap_or_else(|_| "{}".to_string());
                if let Err(e) = self.run_log.finish_success(
                    &run_id,
                    finished_at,
                    entries_written,
                    outcome.best_fitness,
                    &diagnostics_json,
                ) {
                    warn!(run_id = %run_id, error = %e, "运行日志收尾失败");
                }
                info!(
                    run_id = %run_id,
                    entries_written,
                    best_fitness = ?outcome.best_fitness,
                    unmatched = outcome.diagnostics.unmatched_orders.len(),
                    "排产完成"
                );
                Ok(PlanRunReport {
                    run_id,
                    trigger,
                    started_at,
                    finished_at,
                    entries_written,
                    best_fitness: outcome.best_fitness,
                    diagnostics: outcome.diagnostics,
                })
            }
            Err(err) => {
                if let Err(e) = self
                    .run_log
                    .finish_failure(&run_id, finished_at, &err.to_string())
                {
                    warn!(run_id = %run_id, error = %e, "运行日志收尾失败");
                }
                error!(run_id = %run_id, error = %err, "排产失败，保留上一版计划");
                Err(err)
            }
        }
    }

    async fn run_blocking(
        &self,
        run_id: &str,
        config: PlanningConfig,
        today: NaiveDate,
    ) -> PlanningResult<(PlanOutcome, usize)> {
        let store = Arc::clone(&self.store);
        let run_id = run_id.to_string();
        tokio::task::spawn_blocking(move || -> PlanningResult<(PlanOutcome, usize)> {
            let _perf = PerfGuard::for_run("planning.execute", &run_id);

            let snapshot = store.load_snapshot()?;
            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let mut outcome =
                Planner::new(&config).plan(&snapshot.orders, &snapshot.devices, today, &mut rng)?;

            sort_completed_last(&mut outcome.entries);
            let written = store.replace_schedule(&outcome.entries)?;
            Ok((outcome, written))
        })
        .await
        .map_err(|e| PlanningError::Worker(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::planning_config_reader::StaticConfig;
    use crate::db::init_schema;
    use crate::domain::schedule::ScheduleEntry;
    use crate::repository::error::{RepositoryError, RepositoryResult};
    use crate::repository::plan_run_log_repo::PlanRunStatus;
    use crate::repository::planning_store::{PlanningSnapshot, SqlitePlanningStore};
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn shared() -> Arc<Mutex<Connection>> {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO purchase (id, order_no, name, type, quantity, due_date, status, priority)
            VALUES (1, 'PO-1', 'R1', 'resistor', 5, '2025-07-01', 0, '0');
            INSERT INTO purchase (id, order_no, name, type, quantity, due_date, status, priority)
            VALUES (2, 'PO-2', 'C1', 'capacitor', 5, '2025-07-01', 1, '0');
            INSERT INTO resource (id, code, name, type, status) VALUES (1, 'D1', 'resistor-lathe-1', 'resistor', 'true');
            INSERT INTO resource (id, code, name, type, status) VALUES (2, 'D2', 'cap-1', 'capacitor', 'true');
            "#,
        )
        .unwrap();
        Arc::new(Mutex::new(conn))
    }

    fn small_config() -> PlanningConfig {
        let mut config = PlanningConfig::default();
        config.optimizer.population_size = 6;
        config.optimizer.generations = 3;
        config.seed = Some(11);
        config
    }

    fn service(conn: Arc<Mutex<Connection>>, config: PlanningConfig) -> PlanningService {
        let today = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        PlanningService::new(
            Arc::new(SqlitePlanningStore::new(conn.clone())),
            Arc::new(PlanRunLogRepository::new(conn)),
            Arc::new(StaticConfig::new(config)),
        )
        .with_clock(Arc::new(move || today))
    }

    struct FailingStore;

    impl PlanningStore for FailingStore {
        fn load_snapshot(&self) -> RepositoryResult<PlanningSnapshot> {
            Ok(PlanningSnapshot::default())
        }

        fn replace_schedule(&self, _entries: &[ScheduleEntry]) -> RepositoryResult<usize> {
            Err(RepositoryError::DatabaseTransactionError("磁盘已满".to_string()))
        }
    }

    #[tokio::test]
    async fn test_execute_writes_plan_and_run_log() {
        let conn = shared();
        let svc = service(conn.clone(), small_config());

        let report = svc.execute(RunTrigger::Manual).await.unwrap();
        assert_eq!(report.entries_written, 2);
        assert!(report.best_fitness.is_some());
        assert!(!svc.is_running());

        let log = PlanRunLogRepository::new(conn)
            .find_by_id(&report.run_id)
            .unwrap()
            .unwrap();
        assert_eq!(log.status, PlanRunStatus::Succeeded);
        assert_eq!(log.entries_written, Some(2));
        assert!(log.config_snapshot_json.is_some());
    }

    #[tokio::test]
    async fn test_second_run_is_busy_while_first_holds_guard() {
        let svc = service(shared(), small_config());
        let guard = svc.try_begin().unwrap();
        let err = svc.execute(RunTrigger::Timer).await.unwrap_err();
        assert!(matches!(err, PlanningError::Busy));
        drop(guard);
        assert!(svc.execute(RunTrigger::Timer).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_config_releases_guard() {
        let mut config = small_config();
        config.optimizer.population_size = 0;
        let svc = service(shared(), config);

        let err = svc.execute(RunTrigger::Manual).await.unwrap_err();
        assert!(matches!(err, PlanningError::Config(_)));
        assert!(!svc.is_running());
    }

    #[tokio::test]
    async fn test_write_failure_is_recorded() {
        let conn = shared();
        let run_log = Arc::new(PlanRunLogRepository::new(conn));
        let svc = PlanningService::new(
            Arc::new(FailingStore),
            run_log.clone(),
            Arc::new(StaticConfig::new(small_config())),
        );

        let err = svc.execute(RunTrigger::Manual).await.unwrap_err();
        assert!(matches!(err, PlanningError::Repository(_)));

        let recent = run_log.list_recent(1).unwrap();
        assert_eq!(recent[0].status, PlanRunStatus::Failed);
        assert!(recent[0]
            .error_message
            .as_deref()
            .unwrap_or_default()
            .contains("磁盘已满"));
    }
}
