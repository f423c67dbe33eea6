//! Reconciliation store: one SQLite table of previously classified
//! performances. Rows are inserted once and never updated by the pipeline;
//! stored theater/date/team carry forward when a page stops showing them.

use std::path::Path;

use chrono::NaiveDate;
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::info;

use crate::error::{AppError, Result};
use crate::types::{PerformanceRecord, Theater};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS performances (
    id INTEGER PRIMARY KEY,
    theater TEXT NOT NULL,
    date TEXT NOT NULL,
    team TEXT,
    draw INTEGER NOT NULL
)";

const DATE_FMT: &str = "%Y-%m-%d";

pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating the file and schema if needed) the store at `path`.
    pub async fn open(path: &Path) -> Result<Store> {
        let newly_created = !path.exists();
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;
        if newly_created {
            info!("initialized new store at {}", path.display());
        }
        Store::init(pool).await
    }

    /// Test seam: a private in-memory store.
    pub async fn in_memory() -> Result<Store> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Store::init(pool).await
    }

    async fn init(pool: SqlitePool) -> Result<Store> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Store { pool })
    }

    pub async fn get(&self, id: u32) -> Result<Option<PerformanceRecord>> {
        let row = sqlx::query("SELECT id, theater, date, team, draw FROM performances WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(record_from_row).transpose()
    }

    /// Insert a freshly classified performance unless the id already exists.
    /// Returns whether a row was written; an existing row is never touched.
    pub async fn insert_if_absent(&self, rec: &PerformanceRecord) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO performances (id, theater, date, team, draw)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(rec.id)
        .bind(rec.theater.cn_name())
        .bind(rec.date.format(DATE_FMT).to_string())
        .bind(rec.team.as_deref())
        .bind(rec.draw)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All stored `(id, draw)` pairs with a date on or after `date`, sorted
    /// by id.
    pub async fn ids_on_or_after(&self, date: NaiveDate) -> Result<Vec<(u32, bool)>> {
        let rows = sqlx::query("SELECT id, draw FROM performances WHERE date >= ? ORDER BY id")
            .bind(date.format(DATE_FMT).to_string())
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|row| {
                let id: i64 = row.try_get("id")?;
                let draw: bool = row.try_get("draw")?;
                Ok((id as u32, draw))
            })
            .collect()
    }
}

fn record_from_row(row: SqliteRow) -> Result<PerformanceRecord> {
    let id: i64 = row.try_get("id")?;
    let theater: String = row.try_get("theater")?;
    let date: String = row.try_get("date")?;
    let team: Option<String> = row.try_get("team")?;
    let draw: bool = row.try_get("draw")?;

    Ok(PerformanceRecord {
        id: id as u32,
        theater: Theater::from_name(&theater)?,
        date: NaiveDate::parse_from_str(&date, DATE_FMT)
            .map_err(|_| AppError::Config(format!("store row {id}: bad date {date:?}")))?,
        team,
        draw,
    })
}
