// ==========================================
// 订单排产系统 - 排产计划数据仓储
// ==========================================
// 对齐: scheduling 表
// 写入: 整体替换由 PlanningStore 在单事务内完成；此处提供查询与人工修改
// ==========================================

use crate::domain::schedule::ScheduleEntry;
use crate::domain::types::EntryStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDate;
use rusqlite::{params, Connection, ToSql};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 列表查询结果行（带数据库 id 与按产品名称关联的订单数量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub id: i64,
    #[serde(flatten)]
    pub entry: ScheduleEntry,
    pub quantity: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchedulePage {
    pub rows: Vec<ScheduleRow>,
    pub total: usize,
}

/// 人工修改单条排产条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleUpdate {
    pub id: i64,
    pub status: EntryStatus,
    pub process: String,
    /// 关联订单编号（修改后标记为已交付）
    pub order_no: Option<String>,
}

pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 全部条目（按写入顺序）
    pub fn list_all(&self) -> RepositoryResult<Vec<ScheduleEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT order_no, name, start_time, end_time, status, process, device
               FROM scheduling
               ORDER BY id"#,
        )?;
        let entries = stmt
            .query_map([], |row| map_entry(row, 0))?
            .collect::<Result<Vec<ScheduleEntry>, _>>()?;
        Ok(entries)
    }

    /// 分页查询
    ///
    /// # 参数
    /// - `page`: 页码（从 1 开始）
    /// - `page_size`: 每页条数
    /// - `device`: 设备名称过滤（None 为不过滤）
    pub fn list_paged(
        &self,
        page: usize,
        page_size: usize,
        device: Option<&str>,
    ) -> RepositoryResult<SchedulePage> {
        let conn = self.get_conn()?;
        let limit = page_size as i64;
        let offset = page.saturating_sub(1).saturating_mul(page_size) as i64;

        let filter = if device.is_some() {
            "WHERE s.device = ?1"
        } else {
            ""
        };
        let mut args: Vec<&dyn ToSql> = Vec::new();
        if let Some(device) = device.as_ref() {
            args.push(device);
        }

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM scheduling s {}", filter),
            args.as_slice(),
            |row| row.get(0),
        )?;

        let (limit_at, offset_at) = (args.len() + 1, args.len() + 2);
        args.push(&limit);
        args.push(&offset);

        let sql = format!(
            r#"SELECT s.id, s.order_no, s.name, s.start_time, s.end_time, s.status, s.process, s.device,
                      (SELECT p.quantity FROM purchase p WHERE p.name = s.name ORDER BY p.id LIMIT 1)
               FROM scheduling s
               {}
               ORDER BY s.id
               LIMIT ?{} OFFSET ?{}"#,
            filter, limit_at, offset_at
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(args.as_slice(), |row| {
                Ok(ScheduleRow {
                    id: row.get(0)?,
                    entry: map_entry(row, 1)?,
                    quantity: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<ScheduleRow>, _>>()?;

        Ok(SchedulePage {
            rows,
            total: total as usize,
        })
    }

    /// 按 id 修改状态与工序（单事务）
    ///
    /// # 返回
    /// - `Ok((success, failed))`: 命中与未命中的条数
    pub fn update_entries(&self, updates: &[ScheduleUpdate]) -> RepositoryResult<(usize, usize)> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let mut success = 0;
        for update in updates {
            let affected = tx.execute(
                "UPDATE scheduling SET status = ?1, process = ?2 WHERE id = ?3",
                params![update.status.code(), update.process, update.id],
            )?;
            if affected > 0 {
                success += 1;
            }
        }

        tx.commit()?;
        Ok((success, updates.len() - success))
    }
}

/// 写入条目（调用方负责事务）
pub(crate) fn insert_entries(conn: &Connection, entries: &[ScheduleEntry]) -> RepositoryResult<usize> {
    let mut stmt = conn.prepare(
        r#"INSERT INTO scheduling (order_no, name, start_time, end_time, status, process, device)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
    )?;
    for entry in entries {
        stmt.execute(params![
            entry.order_no,
            entry.name,
            entry.start_time.format("%Y-%m-%d").to_string(),
            entry.end_time.format("%Y-%m-%d").to_string(),
            entry.status.code(),
            entry.process_name,
            entry.device_name,
        ])?;
    }
    Ok(entries.len())
}

fn parse_date(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(&row.get::<_, String>(idx)?, "%Y-%m-%d").map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 从 `base` 列开始映射 order_no..device 七列
fn map_entry(row: &rusqlite::Row, base: usize) -> rusqlite::Result<ScheduleEntry> {
    let status_idx = base + 4;
    let code: i64 = row.get(status_idx)?;
    let status = EntryStatus::from_code(code).ok_or_else(|| {
        rusqlite::Error::IntegralValueOutOfRange(status_idx, code)
    })?;
    Ok(ScheduleEntry {
        order_no: row.get(base)?,
        name: row.get(base + 1)?,
        start_time: parse_date(row, base + 2)?,
        end_time: parse_date(row, base + 3)?,
        status,
        process_name: row.get(base + 5)?,
        device_name: row.get(base + 6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn entry(order_no: &str, name: &str, device: &str) -> ScheduleEntry {
        let day = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        ScheduleEntry {
            order_no: order_no.to_string(),
            name: name.to_string(),
            start_time: day,
            end_time: day + chrono::Duration::days(2),
            status: EntryStatus::Running,
            process_name: "切割".to_string(),
            device_name: device.to_string(),
        }
    }

    fn seeded() -> ScheduleRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO purchase (id, order_no, name, type, quantity, status) VALUES (1, 'PO-1', 'R1', 'resistor', 30, 0);
            INSERT INTO purchase (id, order_no, name, type, quantity, status) VALUES (2, 'PO-9', 'R1', 'resistor', 99, 0);
            "#,
        )
        .unwrap();
        let entries: Vec<ScheduleEntry> = (1..=5)
            .map(|i| {
                let device = if i % 2 == 0 { "cap-1" } else { "res-1" };
                let name = if i == 1 { "R1" } else { "C1" };
                entry(&format!("PO-{}", i), name, device)
            })
            .collect();
        insert_entries(&conn, &entries).unwrap();
        ScheduleRepository::new(Arc::new(Mutex::new(conn)))
    }

    #[test]
    fn test_list_paged_without_filter() {
        let repo = seeded();
        let page = repo.list_paged(1, 2, None).unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.rows.len(), 2);
        // 数量按产品名称关联，同名取 id 最小的订单
        assert_eq!(page.rows[0].quantity, Some(30));
        assert_eq!(page.rows[1].quantity, None);

        let last = repo.list_paged(3, 2, None).unwrap();
        assert_eq!(last.rows.len(), 1);
        assert_eq!(last.rows[0].entry.order_no, "PO-5");
    }

    #[test]
    fn test_list_paged_with_device_filter() {
        let repo = seeded();
        let page = repo.list_paged(1, 10, Some("cap-1")).unwrap();
        assert_eq!(page.total, 2);
        assert!(page.rows.iter().all(|r| r.entry.device_name == "cap-1"));
    }

    #[test]
    fn test_update_entries_counts_misses() {
        let repo = seeded();
        let updates = vec![
            ScheduleUpdate {
                id: 1,
                status: EntryStatus::Done,
                process: "none".to_string(),
                order_no: Some("PO-1".to_string()),
            },
            ScheduleUpdate {
                id: 404,
                status: EntryStatus::Done,
                process: "none".to_string(),
                order_no: None,
            },
        ];
        assert_eq!(repo.update_entries(&updates).unwrap(), (1, 1));

        let entries = repo.list_all().unwrap();
        assert_eq!(entries[0].status, EntryStatus::Done);
        assert!(entries[0].is_completed());
    }
}
