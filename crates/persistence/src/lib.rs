//! Persistence layer for Rankboard
//!
//! Provides SQLite storage for leaderboard members (one ordered set per board).

pub mod repository;
pub mod schema;

pub use sqlx::sqlite::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection error: {0}")]
    Connection(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Connection settings for a file-backed database
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    pub max_connections: u32,
    /// How long a connection waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl DatabaseSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/rankboard.db"),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

/// Split a SQL script into statements. Comment lines are dropped first, so
/// a `;` inside a comment never ends a statement.
fn split_statements(script: &str) -> Vec<String> {
    let code: String = script
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n");

    code.split(';')
        .map(str::trim)
        .filter(|sql| !sql.is_empty())
        .map(str::to_string)
        .collect()
}

/// Database connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (or create) a database file with default settings
    pub async fn new(path: impl AsRef<Path>) -> DbResult<Self> {
        Self::connect(&DatabaseSettings::new(path.as_ref())).await
    }

    /// Open (or create) a database file
    pub async fn connect(settings: &DatabaseSettings) -> DbResult<Self> {
        let path = settings.path.as_path();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());
        let options = SqliteConnectOptions::from_str(&url)
            .map_err(|e| DbError::Connection(e.to_string()))?
            // WAL mode: readers keep a stable snapshot while a writer commits
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(settings.busy_timeout);

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;
        info!(path = %path.display(), "Database opened");

        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub async fn in_memory() -> DbResult<Self> {
        // A single connection: every connection to sqlite::memory: is its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations (execute each statement individually)
    async fn run_migrations(&self) -> DbResult<()> {
        for sql in split_statements(schema::CREATE_TABLES) {
            sqlx::query(&sql)
                .execute(&self.pool)
                .await
                .map_err(|e| DbError::Migration(format!("{e}: {sql}")))?;
        }

        // Run ALTER TABLE migrations (tolerate "duplicate column name" errors)
        for migration in schema::MIGRATIONS {
            match sqlx::query(migration).execute(&self.pool).await {
                Ok(_) => {}
                Err(e) => {
                    let err_msg = e.to_string();
                    if !err_msg.contains("duplicate column name") {
                        return Err(DbError::Migration(format!("{e}: {migration}")));
                    }
                }
            }
        }

        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_ignores_semicolons_in_comments() {
        let script = "-- first; not a statement\n\
                      CREATE TABLE a (x INTEGER);\n\n  -- b; c\n\
                      CREATE INDEX i ON a(x)\n";
        assert_eq!(
            split_statements(script),
            vec!["CREATE TABLE a (x INTEGER)", "CREATE INDEX i ON a(x)"]
        );
    }

    #[test]
    fn test_schema_splits_into_create_statements() {
        let statements = split_statements(schema::CREATE_TABLES);
        assert_eq!(statements.len(), 2);
        assert!(statements.iter().all(|sql| sql.starts_with("CREATE ")));
    }

    #[tokio::test]
    async fn test_migrations_are_rerunnable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("board.db");

        let db = Database::new(&path).await.unwrap();
        db.close().await;

        // Second open re-applies CREATE IF NOT EXISTS and the tolerated ALTER
        let db = Database::new(&path).await.unwrap();
        let columns: Vec<(String,)> =
            sqlx::query_as("SELECT name FROM pragma_table_info('leaderboard_members')")
                .fetch_all(db.pool())
                .await
                .unwrap();
        let names: Vec<&str> = columns.iter().map(|(n,)| n.as_str()).collect();
        assert!(names.contains(&"updated_at"));
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_in_memory_opens() {
        let db = Database::in_memory().await.unwrap();
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leaderboard_members")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
