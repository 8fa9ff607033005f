// ==========================================
// 订单排产系统 - 每日定时触发
// ==========================================
// 每天在配置的本地时间触发一次 execute(Timer)
// 触发时间每轮重新读取，配置读取失败时沿用上一轮的时间
// 执行失败只记录日志，循环不退出
// ==========================================

use crate::domain::types::RunTrigger;
use crate::service::error::PlanningError;
use crate::service::planning_service::PlanningService;
use chrono::{Duration, Local, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// 计算 `now` 之后（严格晚于）的下一个触发时刻
pub fn next_fire_after(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today_fire = now.date().and_time(at);
    if today_fire > now {
        today_fire
    } else {
        today_fire + Duration::days(1)
    }
}

pub struct DailyTrigger {
    service: Arc<PlanningService>,
}

impl DailyTrigger {
    pub fn new(service: Arc<PlanningService>) -> Self {
        Self { service }
    }

    /// 启动后台任务；`shutdown` 置为 true 时退出
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut fire_at = crate::config::PlanningConfig::default().daily_trigger_time;

        loop {
            if *shutdown.borrow() {
                info!("定时排产任务退出");
                return;
            }
            match self.service.config_reader().load_planning_config().await {
                Ok(config) => fire_at = config.daily_trigger_time,
                Err(e) => warn!(error = %e, %fire_at, "读取定时配置失败，沿用上一轮触发时间"),
            }

            let now = Local::now().naive_local();
            let next = next_fire_after(now, fire_at);
            let wait = (next - now).to_std().unwrap_or_default();
            info!(next_fire = %next, "下一次定时排产");

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("定时排产任务退出");
                        return;
                    }
                    continue;
                }
            }

            match self.service.execute(RunTrigger::Timer).await {
                Ok(report) => info!(
                    run_id = %report.run_id,
                    entries_written = report.entries_written,
                    "定时排产完成"
                ),
                Err(PlanningError::Busy) => warn!("定时排产跳过: 已有任务在运行"),
                Err(e) => error!(error = %e, "定时排产失败"),
            }
        }
    }
}
