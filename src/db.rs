//! SQLite connection pool.

use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool, PoolError, PooledConnection};
use diesel::sqlite::SqliteConnection;

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;
pub type DbConnection = PooledConnection<ConnectionManager<SqliteConnection>>;

/// PRAGMAs run on every connection handed out by the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlitePragmas {
    pub journal_wal: bool,
    pub foreign_keys: bool,
    pub busy_timeout: Option<Duration>,
}

impl Default for SqlitePragmas {
    fn default() -> Self {
        Self {
            journal_wal: true,
            foreign_keys: true,
            busy_timeout: Some(Duration::from_secs(30)),
        }
    }
}

impl SqlitePragmas {
    pub fn to_sql(&self) -> String {
        let mut sql = String::new();
        if self.journal_wal {
            sql.push_str("PRAGMA journal_mode = WAL; PRAGMA synchronous = NORMAL; ");
        }
        if self.foreign_keys {
            sql.push_str("PRAGMA foreign_keys = ON; ");
        }
        if let Some(timeout) = self.busy_timeout {
            sql.push_str(&format!("PRAGMA busy_timeout = {}; ", timeout.as_millis()));
        }
        sql.trim_end().to_string()
    }
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        let sql = self.to_sql();
        if sql.is_empty() {
            return Ok(());
        }
        conn.batch_execute(&sql).map_err(|e| {
            log::error!("Failed to apply SQLite pragmas: {e}");
            diesel::r2d2::Error::QueryError(e)
        })
    }
}

/// Opens a pool on `database_url` with the default pragmas.
pub fn establish_connection_pool(database_url: &str) -> Result<DbPool, PoolError> {
    Pool::builder()
        .connection_customizer(Box::new(SqlitePragmas::default()))
        .build(ConnectionManager::<SqliteConnection>::new(database_url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pragmas_enable_wal_and_foreign_keys() {
        let sql = SqlitePragmas::default().to_sql();
        assert!(sql.starts_with("PRAGMA journal_mode = WAL;"));
        assert!(sql.contains("PRAGMA foreign_keys = ON;"));
        assert!(sql.ends_with("PRAGMA busy_timeout = 30000;"));
    }

    #[test]
    fn disabled_pragmas_are_skipped() {
        let pragmas = SqlitePragmas {
            journal_wal: false,
            foreign_keys: false,
            busy_timeout: None,
        };
        assert_eq!(pragmas.to_sql(), "");
    }
}
