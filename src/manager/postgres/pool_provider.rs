//! Pool provider abstraction for read/write routing.
//!
//! [`PostgresStorage`](super::PostgresStorage) sends lookups and listings to
//! `read()` and every INSERT/UPDATE/DELETE to `write()`.
//!
//! For testing, use [`TestDbPools`] which creates a read-only replica to
//! verify correct read/write routing.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Trait for providing database pools with read/write routing.
///
/// Implementations can provide separate read and write pools, or use a
/// single pool for both operations.
pub trait PoolProvider: Clone + Send + Sync + 'static {
    /// Get a pool for read operations. May be a replica.
    fn read(&self) -> &PgPool;

    /// Get a pool for write operations. Always the primary.
    fn write(&self) -> &PgPool;
}

/// A single pool serves both reads and writes.
impl PoolProvider for PgPool {
    fn read(&self) -> &PgPool {
        self
    }

    fn write(&self) -> &PgPool {
        self
    }
}

/// Test pool provider with read-only replica enforcement.
///
/// This creates two separate connection pools from the same database:
/// - Primary pool for writes (normal permissions)
/// - Replica pool for reads (enforces `default_transaction_read_only = on`)
///
/// Writes routed through `.read()` fail with
/// "cannot execute INSERT/UPDATE/DELETE in a read-only transaction".
#[derive(Clone, Debug)]
pub struct TestDbPools {
    primary: PgPool,
    replica: PgPool,
}

impl TestDbPools {
    /// Create test pools from a single database pool.
    pub async fn new(pool: PgPool) -> Result<Self, sqlx::Error> {
        let primary = pool.clone();

        let replica = PgPoolOptions::new()
            .max_connections(pool.options().get_max_connections())
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    sqlx::query("SET default_transaction_read_only = on")
                        .execute(&mut *conn)
                        .await?;
                    Ok(())
                })
            })
            .connect_with(pool.connect_options().as_ref().clone())
            .await?;

        Ok(Self { primary, replica })
    }
}

impl PoolProvider for TestDbPools {
    fn read(&self) -> &PgPool {
        &self.replica
    }

    fn write(&self) -> &PgPool {
        &self.primary
    }
}
