// ==========================================
// 订单排产系统 - 订单数据仓储
// ==========================================
// 对齐: purchase 表
// 红线: Repository 不含业务逻辑
// 说明: 外部表示(数字状态/文本优先级/文本交货期)只在此处解析
// ==========================================

use crate::domain::order::Order;
use crate::domain::types::{OrderPriority, OrderStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rusqlite::{params, params_from_iter, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// OrderRepository - 订单仓储
// ==========================================
pub struct OrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OrderRepository {
    /// 从已有连接创建仓储实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 查询全部订单（按 id 升序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        query_orders(&conn)
    }

    /// 写入订单（外部 CRUD 的最小子集，供初始化与测试数据使用）
    pub fn insert(&self, order: &Order) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO purchase (id, order_no, name, type, quantity, due_date, status, priority)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"#,
            params![
                order.id,
                order.order_no,
                order.name,
                order.order_type,
                order.quantity,
                order.due_date.map(|d| d.format("%Y-%m-%d").to_string()),
                order.status.code(),
                order.priority.code(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 按订单编号批量标记为已交付
    ///
    /// # 返回
    /// - `Ok(count)`: 受影响的订单行数
    pub fn mark_delivered(&self, order_nos: &[String]) -> RepositoryResult<usize> {
        if order_nos.is_empty() {
            return Ok(0);
        }

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        let placeholders = vec!["?"; order_nos.len()].join(", ");
        let sql = format!(
            "UPDATE purchase SET status = {} WHERE order_no IN ({})",
            OrderStatus::Delivered.code(),
            placeholders
        );
        let count = tx.execute(&sql, params_from_iter(order_nos.iter()))?;

        tx.commit()?;
        Ok(count)
    }
}

/// 读取全部订单（可在事务内调用）
///
/// 状态码无法识别的行跳过并记录告警
pub(crate) fn query_orders(conn: &Connection) -> RepositoryResult<Vec<Order>> {
    let mut stmt = conn.prepare(
        r#"SELECT id, order_no, name, type, quantity, due_date, status, priority
           FROM purchase
           ORDER BY id"#,
    )?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<i64>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    let mut orders = Vec::with_capacity(rows.len());
    for (id, order_no, name, order_type, quantity, due_date, status, priority) in rows {
        let Some(status) = OrderStatus::from_code(status) else {
            warn!(order_id = id, status, "订单状态码无法识别，已跳过");
            continue;
        };
        orders.push(Order {
            id,
            order_no,
            name,
            order_type: order_type.unwrap_or_default(),
            quantity: quantity.unwrap_or(0),
            due_date: parse_due_date(due_date.as_deref()),
            status,
            priority: OrderPriority::from_code(priority.as_deref().unwrap_or("0")),
        });
    }
    Ok(orders)
}

/// 解析交货期文本
///
/// 支持 `YYYY-MM-DD`、`YYYY/MM/DD`、`YYYY-MM-DD HH:MM:SS`、RFC3339；其余视为未知
pub fn parse_due_date(raw: Option<&str>) -> Option<NaiveDate> {
    let text = raw?.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(text, "%Y/%m/%d"))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.date_naive())
        })
}
