// ==========================================
// 订单排产系统 - 排产存储网关
// ==========================================
// 读: 订单 + 设备在同一只读事务内读取（快照语义）
// 写: 删除全部排产条目 + 写入新序列，单事务；失败回滚，旧计划保留
// ==========================================

use crate::domain::device::Device;
use crate::domain::order::Order;
use crate::domain::schedule::ScheduleEntry;
use crate::repository::device_repo::query_devices;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_repo::query_orders;
use crate::repository::schedule_repo::insert_entries;
use rusqlite::{Connection, TransactionBehavior};
use std::sync::{Arc, Mutex};
use tracing::{debug, instrument};

/// 单次排产的输入快照
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanningSnapshot {
    pub orders: Vec<Order>,
    pub devices: Vec<Device>,
}

/// 排产存储接口
///
/// 实现方需保证 `replace_schedule` 的原子性
pub trait PlanningStore: Send + Sync {
    fn load_snapshot(&self) -> RepositoryResult<PlanningSnapshot>;

    /// 整体替换排产计划，返回写入条数
    fn replace_schedule(&self, entries: &[ScheduleEntry]) -> RepositoryResult<usize>;
}

// ==========================================
// SqlitePlanningStore - SQLite 实现
// ==========================================
pub struct SqlitePlanningStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqlitePlanningStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl PlanningStore for SqlitePlanningStore {
    #[instrument(skip_all)]
    fn load_snapshot(&self) -> RepositoryResult<PlanningSnapshot> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;

        let orders = query_orders(&tx)?;
        let devices = query_devices(&tx)?;

        tx.commit()?;
        debug!(orders = orders.len(), devices = devices.len(), "读取排产快照");
        Ok(PlanningSnapshot { orders, devices })
    }

    #[instrument(skip_all, fields(entries = entries.len()))]
    fn replace_schedule(&self, entries: &[ScheduleEntry]) -> RepositoryResult<usize> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed = tx.execute("DELETE FROM scheduling", [])?;
        let written = insert_entries(&tx, entries)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        debug!(removed, written, "排产计划已整体替换");
        Ok(written)
    }
}
