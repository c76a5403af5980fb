//! Database lifecycle and schema migrations.

use crate::config::StoreConfig;
use crate::error::DatabaseError;
use crate::{Error, Result};
use sqlx::SqliteConnection;
use sqlx::sqlite::SqlitePool;
use std::path::Path;

use super::Database;

/// Latest schema version this build knows how to create
pub const SCHEMA_VERSION: i64 = 2;

impl Database {
    /// Open the database at `path` with default settings
    ///
    /// Creates the database file if it doesn't exist and runs migrations.
    pub async fn new(path: &Path) -> Result<Self> {
        Self::open(&StoreConfig::with_path(path)).await
    }

    /// Open the database described by `config`
    ///
    /// Registers the `REGEXP` function on every pooled connection, enables
    /// foreign keys and WAL mode, and brings the schema up to date.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let path = &config.database_path;

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to create database directory: {}",
                    e
                )))
            })?;
        }

        use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to parse database path: {}",
                    e
                )))
            })?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout)
            .with_regexp();

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::ConnectionFailed(format!(
                    "Failed to connect to database: {}",
                    e
                )))
            })?;

        let db = Self {
            pool,
            retry: config.retry.clone(),
        };

        db.run_migrations().await?;

        tracing::info!(
            path = %path.display(),
            max_connections = config.max_connections,
            "Article store opened"
        );

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to acquire connection: {}",
                e
            )))
        })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&mut *conn)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to create schema_version table: {}",
                e
            )))
        })?;

        let current_version = Self::current_version(&mut conn).await?;
        if current_version > SCHEMA_VERSION {
            tracing::warn!(
                current_version,
                known_version = SCHEMA_VERSION,
                "Database schema is newer than this build"
            );
        }

        if current_version < 1 {
            Self::migrate(&mut conn, 1).await?;
        }
        if current_version < 2 {
            Self::migrate(&mut conn, 2).await?;
        }

        Ok(())
    }

    async fn current_version(conn: &mut SqliteConnection) -> Result<i64> {
        let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
            .fetch_one(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to query schema version: {}",
                    e
                )))
            })?;

        Ok(version.unwrap_or(0))
    }

    /// Apply one migration inside a transaction so a partial failure leaves
    /// the schema at the previous version.
    async fn migrate(conn: &mut SqliteConnection, version: i64) -> Result<()> {
        tracing::info!(version, "Applying database migration");

        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to begin transaction: {}",
                    e
                )))
            })?;

        let result = async {
            // Another process may have migrated while we waited for the lock
            if Self::current_version(conn).await? >= version {
                return Ok(false);
            }
            match version {
                1 => Self::migrate_v1_steps(conn).await?,
                2 => Self::migrate_v2_steps(conn).await?,
                other => {
                    return Err(Error::Database(DatabaseError::MigrationFailed(format!(
                        "unknown schema version {}",
                        other
                    ))));
                }
            }
            Self::record_migration(conn, version).await?;
            Ok::<bool, Error>(true)
        }
        .await;

        match result {
            Ok(applied) => {
                sqlx::query("COMMIT")
                    .execute(&mut *conn)
                    .await
                    .map_err(|e| {
                        Error::Database(DatabaseError::MigrationFailed(format!(
                            "Failed to commit migration v{}: {}",
                            version, e
                        )))
                    })?;
                if applied {
                    tracing::info!(version, "Database migration complete");
                }
                Ok(())
            }
            Err(e) => {
                let _ = sqlx::query("ROLLBACK").execute(&mut *conn).await;
                Err(e)
            }
        }
    }

    /// Migration v1: groups, articles, memberships and attachment mappings
    async fn migrate_v1_steps(conn: &mut SqliteConnection) -> Result<()> {
        Self::execute_ddl(
            conn,
            "create groups table",
            r#"
            CREATE TABLE groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                group_name TEXT NOT NULL UNIQUE,
                description TEXT,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .await?;

        Self::execute_ddl(
            conn,
            "create articles table",
            r#"
            CREATE TABLE articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                message_id TEXT NOT NULL UNIQUE,
                header TEXT NOT NULL,
                body TEXT NOT NULL,
                thread TEXT,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .await?;

        // (group_id, article_number) is the per-group numbering invariant
        Self::execute_ddl(
            conn,
            "create articles_to_groups table",
            r#"
            CREATE TABLE articles_to_groups (
                article_id INTEGER NOT NULL REFERENCES articles(id),
                group_id INTEGER NOT NULL REFERENCES groups(id),
                article_number INTEGER NOT NULL CHECK (article_number > 0),
                PRIMARY KEY (group_id, article_number),
                UNIQUE (article_id, group_id)
            )
            "#,
        )
        .await?;

        Self::execute_ddl(
            conn,
            "create attachments_articles_mapping table",
            r#"
            CREATE TABLE attachments_articles_mapping (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                article_id INTEGER NOT NULL REFERENCES articles(id),
                content_type TEXT NOT NULL,
                attachment_id TEXT NOT NULL
            )
            "#,
        )
        .await?;

        Ok(())
    }

    /// Migration v2: indexes for thread, time and per-article lookups
    async fn migrate_v2_steps(conn: &mut SqliteConnection) -> Result<()> {
        for (what, sql) in [
            (
                "create thread index",
                "CREATE INDEX idx_articles_thread ON articles(thread)",
            ),
            (
                "create article time index",
                "CREATE INDEX idx_articles_created_at ON articles(created_at)",
            ),
            (
                "create group time index",
                "CREATE INDEX idx_groups_created_at ON groups(created_at)",
            ),
            (
                "create membership article index",
                "CREATE INDEX idx_articles_to_groups_article ON articles_to_groups(article_id)",
            ),
            (
                "create attachment article index",
                "CREATE INDEX idx_attachments_article ON attachments_articles_mapping(article_id)",
            ),
        ] {
            Self::execute_ddl(conn, what, sql).await?;
        }

        Ok(())
    }

    async fn execute_ddl(conn: &mut SqliteConnection, what: &str, sql: &str) -> Result<()> {
        sqlx::query(sql).execute(&mut *conn).await.map_err(|e| {
            Error::Database(DatabaseError::MigrationFailed(format!(
                "Failed to {}: {}",
                what, e
            )))
        })?;
        Ok(())
    }

    async fn record_migration(conn: &mut SqliteConnection, version: i64) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, ?)")
            .bind(version)
            .bind(now)
            .execute(&mut *conn)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::MigrationFailed(format!(
                    "Failed to record migration: {}",
                    e
                )))
            })?;

        Ok(())
    }

    /// Schema version currently applied
    pub async fn schema_version(&self) -> Result<i64> {
        let mut conn = self.pool.acquire().await.map_err(|e| {
            Error::Database(DatabaseError::ConnectionFailed(format!(
                "Failed to acquire connection: {}",
                e
            )))
        })?;
        Self::current_version(&mut conn).await
    }

    /// Close the database connection
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
