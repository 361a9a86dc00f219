#![forbid(unsafe_code)]

use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taxipark_model::FieldErrors;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

pub mod cars;
pub mod drivers;
pub mod filters;
pub mod manufacturers;
pub mod schema;

pub const CRATE_NAME: &str = "taxipark-store";

const DEFAULT_MAX_CONNECTIONS: usize = 8;

#[derive(Debug)]
pub enum StoreError {
    /// The requested record does not exist.
    NotFound(&'static str),
    /// A write violated a field-level constraint; reported next to the
    /// offending input, like form validation failures.
    Constraint(FieldErrors),
    Sqlite(String),
}

impl StoreError {
    #[must_use]
    pub fn constraint(field: &str, message: &str) -> Self {
        Self::Constraint(FieldErrors::single(field, message))
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(what) => write!(f, "{what} not found"),
            Self::Constraint(errors) => write!(f, "constraint violated: {errors}"),
            Self::Sqlite(message) => write!(f, "sqlite error: {message}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        Self::Sqlite(e.to_string())
    }
}

/// Live record cardinalities for the landing page. Three independent reads;
/// no cross-count snapshot is taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct AggregateCounts {
    pub num_drivers: u64,
    pub num_cars: u64,
    pub num_manufacturers: u64,
}

pub fn aggregate_counts(conn: &Connection) -> Result<AggregateCounts, StoreError> {
    Ok(AggregateCounts {
        num_drivers: drivers::count(conn)?,
        num_cars: cars::count(conn)?,
        num_manufacturers: manufacturers::count(conn)?,
    })
}

/// Handle to the sqlite database. Connections are opened per acquisition and
/// bounded by a semaphore so a handler can never hold the pool open-ended.
#[derive(Debug, Clone)]
pub struct Store {
    path: PathBuf,
    permits: Arc<Semaphore>,
}

/// A scoped connection: the permit is released and the connection closed
/// when the guard drops.
#[derive(Debug)]
pub struct StoreConnection {
    pub conn: Connection,
    _permit: OwnedSemaphorePermit,
}

impl Store {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_max_connections(path, DEFAULT_MAX_CONNECTIONS)
    }

    #[must_use]
    pub fn with_max_connections(path: impl Into<PathBuf>, max_connections: usize) -> Self {
        Self {
            path: path.into(),
            permits: Arc::new(Semaphore::new(max_connections.max(1))),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open a connection outside the request path (CLI, startup).
    pub fn connect(&self) -> Result<Connection, StoreError> {
        open_connection(&self.path)
    }

    /// Acquire a scoped connection for one request.
    pub async fn acquire(&self) -> Result<StoreConnection, StoreError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| StoreError::Sqlite(e.to_string()))?;
        let path = self.path.clone();
        let conn = tokio::task::spawn_blocking(move || open_connection(&path))
            .await
            .map_err(|e| StoreError::Sqlite(e.to_string()))??;
        Ok(StoreConnection {
            conn,
            _permit: permit,
        })
    }
}

fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.execute_batch(
        "PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON; PRAGMA busy_timeout=5000;",
    )?;
    Ok(conn)
}

#[cfg(test)]
pub(crate) fn test_conn() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .expect("enable foreign keys");
    schema::init_schema(&conn).expect("init schema");
    conn
}

#[cfg(test)]
mod store_tests {
    use super::*;

    #[test]
    fn acquire_is_bounded_and_scoped() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Store::with_max_connections(dir.path().join("taxi.sqlite"), 2);
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        rt.block_on(async {
            let first = store.acquire().await.expect("first connection");
            schema::init_schema(&first.conn).expect("init schema");
            let second = store.acquire().await.expect("second connection");
            drop(first);
            drop(second);
            let third = store.acquire().await.expect("third connection");
            let counts = aggregate_counts(&third.conn).expect("counts");
            assert_eq!(counts.num_drivers, 0);
        });
    }
}
