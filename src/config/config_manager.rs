// ==========================================
// 订单排产系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::planning_config::PlanningConfig;
use crate::config::planning_config_reader::PlanningConfigReader;
use crate::db::open_sqlite_connection;
use crate::domain::process::ProcessStep;
use async_trait::async_trait;
use chrono::NaiveTime;
use rusqlite::{params, Connection};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// 配置键
// ==========================================
pub mod config_keys {
    // ===== 遗传算法 =====
    pub const GA_POPULATION_SIZE: &str = "ga.population_size";
    pub const GA_GENERATIONS: &str = "ga.generations";
    pub const GA_MUTATION_RATE: &str = "ga.mutation_rate";
    pub const GA_DEVICE_MUTATION_SHARE: &str = "ga.device_mutation_share";
    pub const GA_DUE_DATE_WEIGHT: &str = "ga.due_date_weight";
    pub const GA_CONFLICT_WEIGHT: &str = "ga.conflict_weight";
    pub const GA_START_HORIZON_DAYS: &str = "ga.start_horizon_days";
    pub const GA_PROCESS_CATALOG: &str = "ga.process_catalog"; // JSON 数组
    pub const GA_SEED: &str = "ga.seed";

    // ===== 计划生成 =====
    pub const PLAN_CATEGORIES: &str = "plan.categories"; // JSON 数组
    pub const PLAN_CADENCE_DAYS: &str = "plan.cadence_days";
    pub const PLAN_CADENCE_OFFSET_DAYS: &str = "plan.cadence_offset_days";
    pub const PLAN_COMPLETED_WINDOW_DAYS: &str = "plan.completed_window_days";
    pub const PLAN_COMPLETED_STEP_DAYS: &str = "plan.completed_step_days";

    // ===== 定时触发 =====
    pub const TRIGGER_DAILY_TIME: &str = "trigger.daily_time"; // HH:MM

    /// 全部可覆写的键
    pub const ALL: &[&str] = &[
        GA_POPULATION_SIZE,
        GA_GENERATIONS,
        GA_MUTATION_RATE,
        GA_DEVICE_MUTATION_SHARE,
        GA_DUE_DATE_WEIGHT,
        GA_CONFLICT_WEIGHT,
        GA_START_HORIZON_DAYS,
        GA_PROCESS_CATALOG,
        GA_SEED,
        PLAN_CATEGORIES,
        PLAN_CADENCE_DAYS,
        PLAN_CADENCE_OFFSET_DAYS,
        PLAN_COMPLETED_WINDOW_DAYS,
        PLAN_COMPLETED_STEP_DAYS,
        TRIGGER_DAILY_TIME,
    ];
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| ConfigError::Lock(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::Lock(e.to_string()))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::Lock(e.to_string()))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 删除 global scope 覆写项（恢复默认值）
    pub fn delete_config_value(&self, key: &str) -> ConfigResult<bool> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::Lock(e.to_string()))?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
        )?;
        Ok(affected > 0)
    }

    /// 获取所有 global 配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 写入排产运行日志，便于复盘当次参数
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ConfigError::Lock(e.to_string()))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }

    // ===== 解析辅助 =====

    fn parse_value<T>(&self, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_config_value(key)? {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{} ({})", e, raw),
                }),
        }
    }

    fn parse_json<T: DeserializeOwned>(&self, key: &str) -> ConfigResult<Option<T>> {
        match self.get_config_value(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    fn parse_time(&self, key: &str) -> ConfigResult<Option<NaiveTime>> {
        match self.get_config_value(key)? {
            None => Ok(None),
            Some(raw) => {
                let trimmed = raw.trim();
                NaiveTime::parse_from_str(trimmed, "%H:%M")
                    .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
                    .map(Some)
                    .map_err(|e| ConfigError::InvalidValue {
                        key: key.to_string(),
                        message: format!("{} ({})", e, raw),
                    })
            }
        }
    }

    /// 在默认配置上叠加 config_kv 中的覆写项
    pub fn read_planning_config(&self) -> ConfigResult<PlanningConfig> {
        use config_keys::*;

        let mut config = PlanningConfig::default();

        // ===== 遗传算法 =====
        let ga = &mut config.optimizer;
        if let Some(v) = self.parse_value::<usize>(GA_POPULATION_SIZE)? {
            ga.population_size = v;
        }
        if let Some(v) = self.parse_value::<usize>(GA_GENERATIONS)? {
            ga.generations = v;
        }
        if let Some(v) = self.parse_value::<f64>(GA_MUTATION_RATE)? {
            ga.mutation_rate = v;
        }
        if let Some(v) = self.parse_value::<f64>(GA_DEVICE_MUTATION_SHARE)? {
            ga.device_mutation_share = v;
        }
        if let Some(v) = self.parse_value::<f64>(GA_DUE_DATE_WEIGHT)? {
            ga.due_date_weight = v;
        }
        if let Some(v) = self.parse_value::<f64>(GA_CONFLICT_WEIGHT)? {
            ga.conflict_weight = v;
        }
        if let Some(v) = self.parse_value::<u32>(GA_START_HORIZON_DAYS)? {
            ga.start_horizon_days = v;
        }
        if let Some(v) = self.parse_json::<Vec<ProcessStep>>(GA_PROCESS_CATALOG)? {
            ga.processes = v;
        }
        config.seed = self.parse_value::<u64>(GA_SEED)?;

        // ===== 计划生成 =====
        let plan = &mut config.materializer;
        if let Some(v) = self.parse_json::<Vec<String>>(PLAN_CATEGORIES)? {
            plan.categories = v;
        }
        if let Some(v) = self.parse_value::<i64>(PLAN_CADENCE_DAYS)? {
            plan.cadence_days = v;
        }
        if let Some(v) = self.parse_value::<i64>(PLAN_CADENCE_OFFSET_DAYS)? {
            plan.cadence_offset_days = v;
        }
        if let Some(v) = self.parse_value::<i64>(PLAN_COMPLETED_WINDOW_DAYS)? {
            plan.completed_window_days = v;
        }
        if let Some(v) = self.parse_value::<i64>(PLAN_COMPLETED_STEP_DAYS)? {
            plan.completed_step_days = v;
        }

        // ===== 定时触发 =====
        if let Some(v) = self.parse_time(TRIGGER_DAILY_TIME)? {
            config.daily_trigger_time = v;
        }

        config
            .validate()
            .map_err(|message| ConfigError::InvalidValue {
                key: "planning_config".to_string(),
                message,
            })?;

        Ok(config)
    }
}

#[async_trait]
impl PlanningConfigReader for ConfigManager {
    async fn load_planning_config(&self) -> ConfigResult<PlanningConfig> {
        self.read_planning_config()
    }
}
