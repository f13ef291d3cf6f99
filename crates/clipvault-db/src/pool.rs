//! Database connection pool management.
//!
//! This module provides connection pooling for SQLite using r2d2.
//! It handles pool initialization, connection customization, and running migrations.

use std::sync::atomic::{AtomicUsize, Ordering};

use clipvault_common::{Error, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::migrations;

/// Type alias for the database connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Type alias for a pooled database connection.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

const POOL_SIZE: u32 = 4;

static MEMORY_DB_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Initialize a new database pool with the given file path.
///
/// Creates the SQLite file if needed, sets `busy_timeout` on every
/// connection and runs pending migrations before handing the pool out.
///
/// # Example
///
/// ```no_run
/// use clipvault_db::pool::init_pool;
///
/// let pool = init_pool("/var/lib/clipvault/clipvault.db").unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_pool(db_path: &str) -> Result<DbPool> {
    let manager = SqliteConnectionManager::file(db_path)
        .with_init(|conn| conn.execute_batch("PRAGMA busy_timeout = 5000;"));

    build_and_migrate(manager)
}

/// Initialize an in-memory database pool for testing.
///
/// Every pooled connection shares one named in-memory database, so rows
/// written through one connection are visible through the others. The
/// database disappears when the pool is dropped.
///
/// # Example
///
/// ```
/// use clipvault_db::pool::init_memory_pool;
///
/// let pool = init_memory_pool().unwrap();
/// let conn = pool.get().unwrap();
/// ```
pub fn init_memory_pool() -> Result<DbPool> {
    let n = MEMORY_DB_COUNTER.fetch_add(1, Ordering::Relaxed);
    let uri = format!(
        "file:clipvault-mem-{}-{}?mode=memory&cache=shared",
        std::process::id(),
        n
    );
    let manager = SqliteConnectionManager::file(uri);

    build_and_migrate(manager)
}

fn build_and_migrate(manager: SqliteConnectionManager) -> Result<DbPool> {
    let pool = Pool::builder()
        .max_size(POOL_SIZE)
        .build(manager)
        .map_err(|e| Error::database(format!("Failed to create connection pool: {}", e)))?;

    let conn = pool
        .get()
        .map_err(|e| Error::database(format!("Failed to get connection for migrations: {}", e)))?;

    migrations::run_migrations(&conn)
        .map_err(|e| Error::database(format!("Failed to run migrations: {}", e)))?;

    Ok(pool)
}

/// Get a connection from the pool.
///
/// This is a convenience wrapper around `pool.get()` that converts the
/// r2d2 error into our common Error type.
pub fn get_conn(pool: &DbPool) -> Result<PooledConnection> {
    pool.get()
        .map_err(|e| Error::database(format!("Failed to get connection from pool: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_memory_pool() {
        let pool = init_memory_pool().unwrap();
        assert_eq!(pool.max_size(), POOL_SIZE);
    }

    #[test]
    fn test_migrations_run_on_init() {
        let pool = init_memory_pool().unwrap();
        let conn = get_conn(&pool).unwrap();

        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='videos'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_connections_share_memory_database() {
        let pool = init_memory_pool().unwrap();

        let writer = get_conn(&pool).unwrap();
        writer
            .execute(
                "INSERT INTO videos (video_id, file_path, created_at) VALUES (?, ?, ?)",
                rusqlite::params!["VID_1", "a.mp4", "2024-01-01T00:00:00Z"],
            )
            .unwrap();

        // Held concurrently with the writer, so this is a different connection.
        let reader = get_conn(&pool).unwrap();
        let count: i64 = reader
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_memory_pools_are_isolated() {
        let a = init_memory_pool().unwrap();
        let b = init_memory_pool().unwrap();

        get_conn(&a)
            .unwrap()
            .execute(
                "INSERT INTO videos (video_id, file_path, created_at) VALUES ('VID_1', 'a.mp4', 'x')",
                [],
            )
            .unwrap();

        let count: i64 = get_conn(&b)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM videos", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }
}
