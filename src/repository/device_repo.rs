// ==========================================
// 订单排产系统 - 设备数据仓储
// ==========================================
// 对齐: resource 表
// 说明: status 为文本布尔值，只有 "true" 视为运行中
// ==========================================

use crate::domain::device::Device;
use crate::domain::types::DeviceStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

pub struct DeviceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DeviceRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询全部设备（按 id 升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Device>> {
        let conn = self.get_conn()?;
        query_devices(&conn)
    }

    pub fn insert(&self, device: &Device) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO resource (id, code, name, type, status, worker_id, raw_id)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                device.id,
                device.code,
                device.name,
                device.device_type,
                device.status.flag(),
                device.worker_id,
                device.raw_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 运行中设备数 / 设备总数
    pub fn count_operating(&self) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;
        let (operating, total): (i64, i64) = conn.query_row(
            "SELECT COALESCE(SUM(CASE WHEN status = 'true' THEN 1 ELSE 0 END), 0), COUNT(*) FROM resource",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((operating as usize, total as usize))
    }
}

/// 读取全部设备（可在事务内调用）
pub(crate) fn query_devices(conn: &Connection) -> RepositoryResult<Vec<Device>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, code, name, type, status, worker_id, raw_id
           FROM resource
           ORDER BY id"#,
    )?;

    let devices = stmt
        .query_map([], map_row)?
        .collect::<Result<Vec<Device>, _>>()?;
    Ok(devices)
}

fn map_row(row: &rusqlite::Row) -> rusqlite::Result<Device> {
    Ok(Device {
        id: row.get(0)?,
        code: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        name: row.get(2)?,
        device_type: row.get::<_, Option<String>>(3)?.unwrap_or_default(),
        status: DeviceStatus::from_flag(row.get::<_, Option<String>>(4)?.as_deref()),
        worker_id: row.get(5)?,
        raw_id: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    #[test]
    fn test_status_flag_and_count() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO resource (id, code, name, type, status) VALUES (1, 'D1', 'res-1', 'resistor', 'true');
            INSERT INTO resource (id, code, name, type, status) VALUES (2, 'D2', 'res-2', 'resistor', 'false');
            INSERT INTO resource (id, code, name, type, status) VALUES (3, 'D3', 'cap-1', 'capacitor', NULL);
            "#,
        )
        .unwrap();
        let repo = DeviceRepository::new(Arc::new(Mutex::new(conn)));

        let devices = repo.list_all().unwrap();
        assert_eq!(devices.len(), 3);
        assert!(devices[0].is_operating());
        assert!(!devices[1].is_operating());
        assert!(!devices[2].is_operating());
        assert_eq!(repo.count_operating().unwrap(), (1, 3));
    }
}
