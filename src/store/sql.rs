//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了基于 sea-orm 的SQL记录存储，支持SQLite、PostgreSQL和MySQL。

use super::connection::{ensure_database_directory, is_sqlite_memory};
use super::RecordStore;
use crate::config::StoreConfig;
use crate::error::{Result, SyncError};
use crate::model::Record;
use crate::utils::redact_connection_string;
use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, QueryResult,
    Statement, Value,
};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// SQL记录存储
///
/// 表结构：自增主键 `pk`、唯一的 `record_id`、`name`。
/// 主键决定 `find_all` 的返回顺序，并作为插入时返回的存储标识。
pub struct SqlStore {
    connection: DatabaseConnection,
    backend: DbBackend,
    table: String,
}

impl std::fmt::Debug for SqlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqlStore")
            .field("backend", &self.backend)
            .field("table", &self.table)
            .finish()
    }
}

impl SqlStore {
    /// 连接SQL存储
    ///
    /// 表名必须已通过配置校验（仅包含字母、数字和下划线）
    #[instrument(skip(config), level = "info", name = "init_sql_store")]
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let url = config.connection_string.expose_secret();
        ensure_database_directory(url)?;
        info!("Connecting to store at {}", redact_connection_string(url));

        let mut opt = ConnectOptions::new(url.to_string());
        opt.connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .sqlx_logging(false);
        if is_sqlite_memory(url) {
            // 每个连接都是一个独立的内存数据库
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(config.max_connections);
        }

        let connection = Database::connect(opt)
            .await
            .map_err(|e| SyncError::Store(format!("Failed to open database: {}", e)))?;
        let backend = connection.get_database_backend();
        debug!("Store backend: {:?}", backend);

        Ok(Self {
            connection,
            backend,
            table: config.table.clone(),
        })
    }

    fn param(&self, n: usize) -> String {
        match self.backend {
            DbBackend::Postgres => format!("${}", n),
            _ => "?".to_string(),
        }
    }

    fn statement(&self, sql: String, values: Vec<Value>) -> Statement {
        Statement::from_sql_and_values(self.backend, sql, values)
    }

    fn decode_row(row: &QueryResult) -> Result<Record> {
        let id: String = row.try_get("", "record_id")?;
        let name: String = row.try_get("", "name")?;
        Ok(Record { id, name })
    }

    fn create_table_sql(&self) -> String {
        let t = &self.table;
        match self.backend {
            DbBackend::Sqlite => format!(
                "CREATE TABLE IF NOT EXISTS {t} (\
                 pk INTEGER PRIMARY KEY AUTOINCREMENT, \
                 record_id TEXT NOT NULL, \
                 name TEXT NOT NULL)"
            ),
            DbBackend::Postgres => format!(
                "CREATE TABLE IF NOT EXISTS {t} (\
                 pk BIGSERIAL PRIMARY KEY, \
                 record_id TEXT NOT NULL, \
                 name TEXT NOT NULL)"
            ),
            // MySQL 不支持 CREATE INDEX IF NOT EXISTS，唯一键随表一起创建
            DbBackend::MySql => format!(
                "CREATE TABLE IF NOT EXISTS {t} (\
                 pk BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY, \
                 record_id VARCHAR(255) NOT NULL, \
                 name TEXT NOT NULL, \
                 UNIQUE KEY uq_{t}_record_id (record_id))"
            ),
        }
    }

    async fn exists(&self, id: &str) -> Result<bool> {
        let sql = format!(
            "SELECT record_id FROM {} WHERE record_id = {}",
            self.table,
            self.param(1)
        );
        let row = self
            .connection
            .query_one(self.statement(sql, vec![id.to_owned().into()]))
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl RecordStore for SqlStore {
    fn name(&self) -> &'static str {
        match self.backend {
            DbBackend::Sqlite => "sqlite",
            DbBackend::Postgres => "postgres",
            DbBackend::MySql => "mysql",
        }
    }

    #[instrument(skip(self), level = "info", fields(table = %self.table))]
    async fn ensure_schema(&self) -> Result<()> {
        self.connection
            .execute(Statement::from_string(self.backend, self.create_table_sql()))
            .await
            .map_err(|e| SyncError::Store(format!("Could not create table: {}", e)))?;

        if self.backend != DbBackend::MySql {
            let sql = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_{t}_record_id ON {t} (record_id)",
                t = self.table
            );
            if let Err(e) = self
                .connection
                .execute(Statement::from_string(self.backend, sql))
                .await
            {
                warn!("Could not create unique index on record_id: {}", e);
            }
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn find_one(&self, id: &str) -> Result<Record> {
        let sql = format!(
            "SELECT record_id, name FROM {} WHERE record_id = {}",
            self.table,
            self.param(1)
        );
        let row = self
            .connection
            .query_one(self.statement(sql, vec![id.to_owned().into()]))
            .await?;
        match row {
            Some(row) => Self::decode_row(&row),
            None => Err(SyncError::NotFound(id.to_string())),
        }
    }

    #[instrument(skip(self, out), level = "debug")]
    async fn find_all_into(&self, out: &mut Vec<Record>) -> Result<()> {
        let sql = format!("SELECT record_id, name FROM {} ORDER BY pk", self.table);
        let rows = self
            .connection
            .query_all(Statement::from_string(self.backend, sql))
            .await?;

        let start = out.len();
        out.reserve(rows.len());
        for row in &rows {
            match Self::decode_row(row) {
                Ok(record) => out.push(record),
                Err(e) => {
                    out.truncate(start);
                    return Err(e);
                }
            }
        }
        debug!("Loaded {} records from store", rows.len());
        Ok(())
    }

    #[instrument(skip(self, record), level = "debug", fields(id = %record.id))]
    async fn insert(&self, record: &Record) -> Result<String> {
        let values: Vec<Value> = vec![record.id.clone().into(), record.name.clone().into()];
        let insert = format!(
            "INSERT INTO {} (record_id, name) VALUES ({}, {})",
            self.table,
            self.param(1),
            self.param(2)
        );

        match self.backend {
            DbBackend::MySql => {
                let result = self
                    .connection
                    .execute(self.statement(insert, values))
                    .await?;
                Ok(result.last_insert_id().to_string())
            }
            _ => {
                let row = self
                    .connection
                    .query_one(self.statement(format!("{} RETURNING pk", insert), values))
                    .await?
                    .ok_or_else(|| SyncError::Store("insert returned no row".to_string()))?;
                let pk: i64 = row.try_get("", "pk")?;
                Ok(pk.to_string())
            }
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn update_name(&self, id: &str, name: &str) -> Result<()> {
        let sql = format!(
            "UPDATE {} SET name = {} WHERE record_id = {}",
            self.table,
            self.param(1),
            self.param(2)
        );
        let result = self
            .connection
            .execute(self.statement(sql, vec![name.to_owned().into(), id.to_owned().into()]))
            .await?;

        // MySQL 在值未变化时报告0行受影响
        if result.rows_affected() == 0 && !self.exists(id).await? {
            return Err(SyncError::NotFound(id.to_string()));
        }
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete(&self, id: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE record_id = {}",
            self.table,
            self.param(1)
        );
        let result = self
            .connection
            .execute(self.statement(sql, vec![id.to_owned().into()]))
            .await?;
        if result.rows_affected() == 0 {
            return Err(SyncError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(self.connection.ping().await?)
    }
}
