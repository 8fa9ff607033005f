// ==========================================
// 订单排产系统 - 排产运行日志仓储
// ==========================================
// 对齐: plan_run_log 表
// 用途: 每轮排产（定时/人工）一行，记录结果或失败原因
// ==========================================

use crate::domain::types::RunTrigger;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanRunStatus {
    Running,
    Succeeded,
    Failed,
}

impl PlanRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanRunStatus::Running => "RUNNING",
            PlanRunStatus::Succeeded => "SUCCEEDED",
            PlanRunStatus::Failed => "FAILED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "RUNNING" => Some(PlanRunStatus::Running),
            "SUCCEEDED" => Some(PlanRunStatus::Succeeded),
            "FAILED" => Some(PlanRunStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRunLog {
    pub run_id: String,
    pub trigger: RunTrigger,
    pub started_at: NaiveDateTime,
    pub finished_at: Option<NaiveDateTime>,
    pub status: PlanRunStatus,
    pub entries_written: Option<i64>,
    pub best_fitness: Option<f64>,
    pub diagnostics_json: Option<String>,
    pub config_snapshot_json: Option<String>,
    pub error_message: Option<String>,
}

pub struct PlanRunLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlanRunLogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 登记一轮排产（状态 RUNNING）
    pub fn start(
        &self,
        run_id: &str,
        trigger: RunTrigger,
        started_at: NaiveDateTime,
        config_snapshot_json: Option<&str>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO plan_run_log (run_id, trigger_type, started_at, status, config_snapshot_json)
               VALUES (?1, ?2, ?3, ?4, ?5)"#,
            params![
                run_id,
                trigger.as_str(),
                started_at.format(TS_FORMAT).to_string(),
                PlanRunStatus::Running.as_str(),
                config_snapshot_json,
            ],
        )?;
        Ok(())
    }

    pub fn finish_success(
        &self,
        run_id: &str,
        finished_at: NaiveDateTime,
        entries_written: usize,
        best_fitness: Option<f64>,
        diagnostics_json: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"UPDATE plan_run_log
               SET finished_at = ?2, status = ?3, entries_written = ?4, best_fitness = ?5, diagnostics_json = ?6
               WHERE run_id = ?1"#,
            params![
                run_id,
                finished_at.format(TS_FORMAT).to_string(),
                PlanRunStatus::Succeeded.as_str(),
                entries_written as i64,
                best_fitness,
                diagnostics_json,
            ],
        )?;
        ensure_found(affected, run_id)
    }

    pub fn finish_failure(
        &self,
        run_id: &str,
        finished_at: NaiveDateTime,
        error_message: &str,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"UPDATE plan_run_log
               SET finished_at = ?2, status = ?3, error_message = ?4
               WHERE run_id = ?1"#,
            params![
                run_id,
                finished_at.format(TS_FORMAT).to_string(),
                PlanRunStatus::Failed.as_str(),
                error_message,
            ],
        )?;
        ensure_found(affected, run_id)
    }

    pub fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<PlanRunLog>> {
        let conn = self.get_conn()?;
        let log = conn
            .query_row(
                r#"SELECT run_id, trigger_type, started_at, finished_at, status, entries_written,
                          best_fitness, diagnostics_json, config_snapshot_json, error_message
                   FROM plan_run_log WHERE run_id = ?1"#,
                params![run_id],
                map_row,
            )
            .optional()?;
        Ok(log)
    }

    /// 最近的运行记录（按开始时间倒序）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<PlanRunLog>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT run_id, trigger_type, started_at, finished_at, status, entries_written,
                      best_fitness, diagnostics_json, config_snapshot_json, error_message
               FROM plan_run_log
               ORDER BY started_at DESC
               LIMIT ?1"#,
        )?;
        let logs = stmt
            .query_map(params![limit as i64], map_row)?
            .collect::<Result<Vec<PlanRunLog>, _>>()?;
        Ok(logs)
    }
}

fn ensure_found(affected: usize, run_id: &str) -> RepositoryResult<()> {
    if affected == 0 {
        return Err(RepositoryError::NotFound {
            entity: "PlanRunLog".to_string(),
            id: run_id.to_string(),
        });
    }
    Ok(())
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        message.into(),
    )
}

fn parse_ts(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TS_FORMAT)
        .map_err(|e| conversion_error(idx, format!("{} ({})", e, raw)))
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<PlanRunLog> {
    let trigger_raw: String = row.get(1)?;
    let trigger = match trigger_raw.as_str() {
        "TIMER" => RunTrigger::Timer,
        "MANUAL" => RunTrigger::Manual,
        other => return Err(conversion_error(1, format!("未知触发方式: {}", other))),
    };
    let status_raw: String = row.get(4)?;
    let status = PlanRunStatus::parse(&status_raw)
        .ok_or_else(|| conversion_error(4, format!("未知运行状态: {}", status_raw)))?;

    Ok(PlanRunLog {
        run_id: row.get(0)?,
        trigger,
        started_at: parse_ts(2, &row.get::<_, String>(2)?)?,
        finished_at: row
            .get::<_, Option<String>>(3)?
            .map(|s| parse_ts(3, &s))
            .transpose()?,
        status,
        entries_written: row.get(5)?,
        best_fitness: row.get(6)?,
        diagnostics_json: row.get(7)?,
        config_snapshot_json: row.get(8)?,
        error_message: row.get(9)?,
    })
}
