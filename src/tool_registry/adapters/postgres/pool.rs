//! Connection pool shared by the `PostgreSQL` adapters.

use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};

/// `PostgreSQL` connection pool type used by every adapter in the crate.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a pool of at most `max_size` connections to `database_url`.
///
/// # Errors
///
/// Returns [`PoolError`] when the initial connection cannot be established.
pub fn connect_pool(database_url: &str, max_size: u32) -> Result<PgPool, PoolError> {
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    Pool::builder().max_size(max_size).build(manager)
}
