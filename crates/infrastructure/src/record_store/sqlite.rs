use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use taskboard_config::ValidationUtils;
use taskboard_domain::{RecordStore, TaskEntity};
use taskboard_errors::{StorageError, StorageResult};

use super::weak_etag;

/// 基于 SQLite 的表存储实现
///
/// 每个任务一行，以 (partition_key, row_key) 为主键。表名来自配置，
/// 构造时校验为纯字母数字标识符后才拼入 SQL。
pub struct SqliteRecordStore {
    pool: SqlitePool,
    table_name: String,
    version: AtomicU64,
}

impl SqliteRecordStore {
    pub fn new(pool: SqlitePool, table_name: &str) -> StorageResult<Self> {
        ValidationUtils::validate_table_name(table_name, "table_name")
            .map_err(|_| StorageError::InvalidName(table_name.to_string()))?;
        Ok(Self {
            pool,
            table_name: table_name.to_string(),
            version: AtomicU64::new(0),
        })
    }

    /// 连接数据库，文件不存在时自动创建
    pub async fn connect(url: &str, table_name: &str, max_connections: u32) -> StorageResult<Self> {
        debug!("Creating SQLite record store at: {}", url);

        let connect_options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StorageError::record_store("connect", e))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .connect_with(connect_options)
            .await
            .map_err(|e| StorageError::record_store("connect", e))?;

        info!("SQLite record store connected, table: {}", table_name);
        Self::new(pool, table_name)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn row_to_entity(row: &SqliteRow) -> Result<TaskEntity, sqlx::Error> {
        let id: String = row.try_get("id")?;
        let id = Uuid::parse_str(&id).map_err(|e| sqlx::Error::ColumnDecode {
            index: "id".to_string(),
            source: Box::new(e),
        })?;

        Ok(TaskEntity {
            partition_key: row.try_get("partition_key")?,
            row_key: row.try_get("row_key")?,
            id,
            task_name: row.try_get("task_name")?,
            assignee: row.try_get("assignee")?,
            deadline: row.try_get::<DateTime<Utc>, _>("deadline")?,
            file_name: row.try_get("file_name")?,
            timestamp: row.try_get::<Option<DateTime<Utc>>, _>("timestamp")?,
            etag: row.try_get("etag")?,
        })
    }
}

const COLUMNS: &str =
    "partition_key, row_key, id, task_name, assignee, deadline, file_name, timestamp, etag";

#[async_trait]
impl RecordStore for SqliteRecordStore {
    #[instrument(skip(self), fields(table = %self.table_name))]
    async fn ensure_table_exists(&self) -> StorageResult<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                partition_key TEXT NOT NULL,
                row_key TEXT NOT NULL,
                id TEXT NOT NULL,
                task_name TEXT NOT NULL,
                assignee TEXT NOT NULL,
                deadline DATETIME NOT NULL,
                file_name TEXT,
                timestamp DATETIME NOT NULL,
                etag TEXT NOT NULL,
                PRIMARY KEY (partition_key, row_key)
            )
            "#,
            self.table_name
        );

        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::record_store("ensure_table_exists", e))?;

        debug!("Successfully ensured table {} exists", self.table_name);
        Ok(())
    }

    #[instrument(skip(self, entity), fields(
        partition_key = %entity.partition_key,
        row_key = %entity.row_key,
    ))]
    async fn upsert_replace(&self, entity: &TaskEntity) -> StorageResult<TaskEntity> {
        let now = Utc::now();
        let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        let etag = weak_etag(now, version);

        let sql = format!(
            r#"
            INSERT INTO {} ({COLUMNS})
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT (partition_key, row_key) DO UPDATE SET
                id = excluded.id,
                task_name = excluded.task_name,
                assignee = excluded.assignee,
                deadline = excluded.deadline,
                file_name = excluded.file_name,
                timestamp = excluded.timestamp,
                etag = excluded.etag
            "#,
            self.table_name
        );

        sqlx::query(&sql)
            .bind(&entity.partition_key)
            .bind(&entity.row_key)
            .bind(entity.id.to_string())
            .bind(&entity.task_name)
            .bind(&entity.assignee)
            .bind(entity.deadline)
            .bind(&entity.file_name)
            .bind(now)
            .bind(&etag)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::record_store("upsert_replace", e))?;

        let mut stored = entity.clone();
        stored.timestamp = Some(now);
        stored.etag = Some(etag);
        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn get(&self, partition_key: &str, row_key: &str) -> StorageResult<Option<TaskEntity>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} WHERE partition_key = ? AND row_key = ?",
            self.table_name
        );

        let row = sqlx::query(&sql)
            .bind(partition_key)
            .bind(row_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::record_store("get", e))?;

        row.as_ref()
            .map(Self::row_to_entity)
            .transpose()
            .map_err(|e| StorageError::record_store("get", e))
    }

    #[instrument(skip(self))]
    async fn scan_all(&self) -> StorageResult<Vec<TaskEntity>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM {} ORDER BY partition_key, row_key",
            self.table_name
        );

        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StorageError::record_store("scan_all", e))?;

        rows.iter()
            .map(Self::row_to_entity)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| StorageError::record_store("scan_all", e))
    }

    #[instrument(skip(self))]
    async fn delete(&self, partition_key: &str, row_key: &str) -> StorageResult<bool> {
        let sql = format!(
            "DELETE FROM {} WHERE partition_key = ? AND row_key = ?",
            self.table_name
        );

        let result = sqlx::query(&sql)
            .bind(partition_key)
            .bind(row_key)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::record_store("delete", e))?;

        Ok(result.rows_affected() > 0)
    }
}
