use diesel::{
    RunQueryDsl, SqliteConnection,
    r2d2::{ConnectionManager, CustomizeConnection, Pool},
};
use diesel_migrations::MigrationHarness;

use crate::{MIGRATIONS, config::ConfigError};

pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

/// SQLite leaves foreign keys unchecked unless asked, per connection.
pub fn enable_foreign_keys(
    conn: &mut SqliteConnection,
) -> diesel::QueryResult<()> {
    diesel::sql_query("PRAGMA foreign_keys = ON").execute(conn)?;
    Ok(())
}

#[derive(Debug)]
struct ForeignKeys;

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ForeignKeys {
    fn on_acquire(
        &self,
        conn: &mut SqliteConnection,
    ) -> Result<(), diesel::r2d2::Error> {
        enable_foreign_keys(conn).map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn make_pool(database_url: &str) -> Result<DbPool, ConfigError> {
    tracing::info!(database_url, "opening database");

    // Every connection to `:memory:` is a database of its own.
    let max_size = if database_url == ":memory:" { 1 } else { 10 };
    Ok(Pool::builder()
        .max_size(max_size)
        .connection_customizer(Box::new(ForeignKeys))
        .build(ConnectionManager::<SqliteConnection>::new(database_url))?)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), ConfigError> {
    let span = tracing::span!(tracing::Level::INFO, "migrations");
    let _guard = span.enter();

    let mut conn = pool.get()?;
    let applied = conn
        .run_pending_migrations(MIGRATIONS)
        .map_err(|err| ConfigError::Migrations(err.to_string()))?;
    tracing::info!(applied = applied.len(), "database is up to date");
    Ok(())
}

/// A migrated in-memory database.
#[cfg(test)]
pub fn test_connection() -> SqliteConnection {
    use diesel::Connection;

    let mut conn = SqliteConnection::establish(":memory:").unwrap();
    enable_foreign_keys(&mut conn).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    conn
}

/// A pool over a single migrated in-memory database.
#[cfg(test)]
pub fn test_pool() -> DbPool {
    let pool = make_pool(":memory:").unwrap();
    run_migrations(&pool).unwrap();
    assert_eq!(pool.state().idle_connections, 1);
    pool
}
