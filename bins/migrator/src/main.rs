//! Database migration runner for Filegate.
//!
//! Reads the connection string from `DATABASE_URL`.
//!
//! Usage:
//!   migrator up      - Create the file_records table
//!   migrator down    - Rollback last migration
//!   migrator status  - Show migration status
//!   migrator fresh   - Drop all tables and re-run migrations

use filegate_db::migration::Migrator;
use sea_orm_migration::prelude::*;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    cli::run_cli(Migrator).await;
}
