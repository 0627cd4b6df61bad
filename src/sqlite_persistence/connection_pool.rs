use anyhow::{anyhow, Context, Result};
use rusqlite::{Connection, OpenFlags, Transaction, TransactionBehavior};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_READ_POOL_SIZE: usize = 4;

/// Shared handle to a SQLite database: one write connection plus a small
/// round-robin pool of read-only connections.
///
/// Connections are only reachable inside the closures passed to [`with_read`]
/// and [`with_write_tx`], so a lock is never held past the unit of work.
///
/// [`with_read`]: SqliteConnectionPool::with_read
/// [`with_write_tx`]: SqliteConnectionPool::with_write_tx
#[derive(Clone)]
pub struct SqliteConnectionPool {
    write_conn: Arc<Mutex<Connection>>,
    read_pool: Arc<Vec<Mutex<Connection>>>,
    read_index: Arc<AtomicUsize>,
}

fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute("PRAGMA foreign_keys = ON;", [])?;
    Ok(())
}

impl SqliteConnectionPool {
    /// Wraps an already prepared write connection and opens `read_pool_size`
    /// read-only connections to the same file.
    pub fn new<P: AsRef<Path>>(
        db_path: P,
        write_conn: Connection,
        read_pool_size: usize,
    ) -> Result<Self> {
        let db_path = db_path.as_ref();
        configure(&write_conn)?;
        // WAL lets readers proceed while a write transaction is open.
        write_conn.pragma_update(None, "journal_mode", "WAL")?;

        let mut read_pool = Vec::with_capacity(read_pool_size);
        for _ in 0..read_pool_size.max(1) {
            let conn = Connection::open_with_flags(
                db_path,
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .with_context(|| format!("Failed to open read connection to {:?}", db_path))?;
            configure(&conn)?;
            read_pool.push(Mutex::new(conn));
        }

        Ok(SqliteConnectionPool {
            write_conn: Arc::new(Mutex::new(write_conn)),
            read_pool: Arc::new(read_pool),
            read_index: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn with_read<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.read_pool.len();
        let conn = self.read_pool[index]
            .lock()
            .map_err(|_| anyhow!("Read connection mutex poisoned"))?;
        f(&conn)
    }

    /// Runs `f` inside an IMMEDIATE transaction on the write connection and commits
    /// when it returns `Ok`. Any error rolls the transaction back.
    pub fn with_write_tx<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction) -> Result<T>,
    {
        let mut conn = self
            .write_conn
            .lock()
            .map_err(|_| anyhow!("Write connection mutex poisoned"))?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }
}
