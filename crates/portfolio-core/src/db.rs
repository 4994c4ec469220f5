use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr, SqlErr};

/// Open the service connection.
///
/// This connection is the elevated credential: it is not subject to per-row
/// policies, so every operation in this crate checks the caller itself before
/// writing. Do not hand it to general-purpose data access.
pub async fn connect(url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(url.to_string());

    // A single connection keeps SQLite writers serialized and lets an
    // in-memory database live for the lifetime of the pool.
    options.max_connections(1);
    options.connect_timeout(Duration::from_secs(5));
    options.acquire_timeout(Duration::from_secs(5));
    if url.contains(":memory:") {
        options.min_connections(1);
    } else {
        options.min_connections(0);
        options.idle_timeout(Duration::from_secs(30));
    }
    options.sqlx_logging(false);

    Database::connect(options).await
}

/// Connect and bring the schema up to date.
pub async fn connect_and_migrate(url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = connect(url).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

pub(crate) fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}
