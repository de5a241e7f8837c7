use std::time::Duration;

use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};

use crate::error::StoreResult;

const FILE_PRAGMAS: [&str; 3] =
    ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA cache_size=-64000"];

/// An in-memory database lives only as long as its one connection.
const IN_MEMORY_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn is_in_memory(database_url: &str) -> bool {
    database_url.contains(":memory:")
}

fn connect_options(database_url: &str) -> ConnectOptions {
    let mut options = ConnectOptions::new(database_url.to_string());
    if is_in_memory(database_url) {
        // Each pooled connection would otherwise get its own empty database,
        // and recycling the single one would drop every table.
        options
            .max_connections(1)
            .min_connections(1)
            .max_lifetime(IN_MEMORY_LIFETIME)
            .idle_timeout(IN_MEMORY_LIFETIME);
    }
    options
}

pub async fn connect_and_migrate(database_url: &str) -> StoreResult<DatabaseConnection> {
    let db = Database::connect(connect_options(database_url)).await?;

    if !is_in_memory(database_url) {
        for pragma in FILE_PRAGMAS {
            run_sql(&db, pragma).await?;
        }
    }
    run_sql(&db, "PRAGMA foreign_keys=ON").await?;

    Migrator::up(&db, None).await?;
    Ok(db)
}

async fn run_sql(db: &DatabaseConnection, sql: &str) -> StoreResult<()> {
    db.execute(Statement::from_string(db.get_database_backend(), sql.to_string())).await?;
    Ok(())
}
