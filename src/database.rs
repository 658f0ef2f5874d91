use diesel::connection::{Instrumentation, InstrumentationEvent};
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_types::BigInt;
use diesel::*;
use uuid::Uuid;

use crate::errors::Error;

pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds the connection pool off `DATABASE_URL`, exactly as the reference
/// tool's `database.rs` does; every component that touches the database takes
/// a `PgPool` rather than a bare connection.
pub fn get_pool() -> Result<PgPool, Error> {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = Pool::builder().build(manager)?;
    Ok(pool)
}

/// Diesel instrumentation hook installed via `set_default_instrumentation`
/// in `main`; logs every query and transaction boundary through `tracing`
/// instead of diesel's own stderr logger.
struct TracingInstrumentation;

impl Instrumentation for TracingInstrumentation {
    fn on_connection_event(&mut self, event: InstrumentationEvent<'_>) {
        tracing::debug!(event = ?event, "diesel event");
    }
}

pub fn simple_logger() -> Option<Box<dyn Instrumentation>> {
    Some(Box::new(TracingInstrumentation))
}

/// Serializes the version engine's "close previous, open new" step per
/// taxonomy (§4.8, §5) behind a Postgres advisory lock keyed by the
/// taxonomy's id, rather than relying on transaction isolation alone.
pub fn with_taxonomy_version_lock<T>(
    conn: &mut PgConnection,
    taxonomy_id: Uuid,
    f: impl FnOnce(&mut PgConnection) -> Result<T, Error>,
) -> Result<T, Error> {
    let key = advisory_lock_key(taxonomy_id);

    diesel::sql_query("SELECT pg_advisory_lock($1)")
        .bind::<BigInt, _>(key)
        .execute(conn)?;

    let result = f(conn);

    diesel::sql_query("SELECT pg_advisory_unlock($1)")
        .bind::<BigInt, _>(key)
        .execute(conn)?;

    result
}

fn advisory_lock_key(id: Uuid) -> i64 {
    let bytes = id.as_bytes();
    i64::from_be_bytes(bytes[0..8].try_into().expect("uuid is 16 bytes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advisory_lock_key_is_deterministic() {
        let id = Uuid::new_v4();
        assert_eq!(advisory_lock_key(id), advisory_lock_key(id));
    }
}
