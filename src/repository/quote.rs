use crate::model::{Quote, StoreError, StoredQuote};
use chrono::Utc;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, Row};
use std::{
    path::Path,
    time::{Duration, Instant},
};
use tokio::{task, time::timeout};
use tracing::warn;

pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS quote (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        code TEXT NOT NULL,
        codein TEXT NOT NULL,
        name TEXT NOT NULL,
        high REAL NOT NULL,
        low REAL NOT NULL,
        var_bid TEXT NOT NULL,
        pct_change REAL NOT NULL,
        bid TEXT NOT NULL,
        ask TEXT NOT NULL,
        timestamp INTEGER NOT NULL,
        create_date TEXT NOT NULL,
        inserted_at TEXT NOT NULL
    )
"#;

/// Append-only quote log in a single SQLite file.
///
/// Cloning is cheap and every clone shares the same pool. Concurrent writers
/// are serialized by SQLite itself (WAL plus busy timeout).
#[derive(Clone)]
pub struct QuoteRepository {
    pool: Pool<SqliteConnectionManager>,
}

impl QuoteRepository {
    pub fn open(path: impl AsRef<Path>) -> Result<QuoteRepository, StoreError> {
        let manager = SqliteConnectionManager::file(path).with_init(configure);
        let pool = Pool::builder()
            .connection_timeout(BUSY_TIMEOUT)
            .build(manager)?;
        Ok(QuoteRepository { pool })
    }

    pub fn ensure_schema(&self) -> Result<(), StoreError> {
        self.pool.get()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    pub fn insert(&self, row: &Quote) -> Result<i64, StoreError> {
        let conn = self.pool.get()?;
        insert(&conn, row)
    }

    /// Inserts on the blocking pool and stops waiting once `deadline` elapses.
    pub async fn insert_within(&self, row: Quote, deadline: Duration) -> Result<i64, StoreError> {
        let expires_at = Instant::now() + deadline;
        let repo = self.clone();
        let task = task::spawn_blocking(move || repo.insert_before(&row, expires_at, deadline));

        match timeout(deadline, task).await {
            Ok(res) => res?,
            Err(_) => Err(StoreError::DeadlineExceeded(deadline)),
        }
    }

    fn insert_before(
        &self,
        row: &Quote,
        expires_at: Instant,
        deadline: Duration,
    ) -> Result<i64, StoreError> {
        let remaining = expires_at.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(StoreError::DeadlineExceeded(deadline));
        }
        let conn = self.pool.get_timeout(remaining)?;

        // Lock waits are the only unbounded part of an insert, so the busy
        // handler gets whatever is left of the budget.
        let remaining = expires_at.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(StoreError::DeadlineExceeded(deadline));
        }
        conn.busy_timeout(remaining)?;
        let res = insert(&conn, row);
        if let Err(e) = conn.busy_timeout(BUSY_TIMEOUT) {
            warn!(%e, "Failed to restore busy timeout");
        }
        res
    }

    pub fn list_recent(&self, limit: u32) -> Result<Vec<StoredQuote>, StoreError> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, inserted_at, code, codein, name, high, low, var_bid,
                pct_change, bid, ask, timestamp, create_date
            FROM quote
            ORDER BY id DESC
            LIMIT ?
            "#,
        )?;
        let rows = stmt
            .query_map(params![limit], mapper)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

fn configure(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))?;
    conn.busy_timeout(BUSY_TIMEOUT)
}

fn insert(conn: &Connection, row: &Quote) -> Result<i64, StoreError> {
    let query = r#"
        INSERT INTO quote (code, codein, name, high, low, var_bid, pct_change, bid, ask, timestamp, create_date, inserted_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
    "#;
    let inserted_at = Utc::now();
    let params = params![
        &row.code,
        &row.codein,
        &row.name,
        row.high,
        row.low,
        &row.var_bid,
        row.pct_change,
        &row.bid,
        &row.ask,
        row.timestamp,
        &row.create_date,
        inserted_at,
    ];
    conn.execute(query, params)?;
    Ok(conn.last_insert_rowid())
}

fn mapper(row: &Row) -> rusqlite::Result<StoredQuote> {
    Ok(StoredQuote {
        id: row.get(0)?,
        inserted_at: row.get(1)?,
        quote: Quote {
            code: row.get(2)?,
            codein: row.get(3)?,
            name: row.get(4)?,
            high: row.get(5)?,
            low: row.get(6)?,
            var_bid: row.get(7)?,
            pct_change: row.get(8)?,
            bid: row.get(9)?,
            ask: row.get(10)?,
            timestamp: row.get(11)?,
            create_date: row.get(12)?,
        },
    })
}
