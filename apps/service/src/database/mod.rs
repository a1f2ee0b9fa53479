/// Persistence layer
///
/// The monitoring core only ever talks to the `Storage` trait; the LibSQL
/// implementation lives here alongside the schema migrations.
pub mod migrations;
pub mod models;
pub mod repository;

pub use repository::{LibsqlStorage, StatusWriteback, Storage};

use anyhow::Result;

/// Initialize database with schema
pub async fn initialize_database(conn: &libsql::Connection) -> Result<()> {
    migrations::run_migrations(conn).await
}
