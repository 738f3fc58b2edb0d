use crate::error::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_accounts_table(pool).await?;
    create_admin_grants_table(pool).await?;
    create_attendance_events_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_accounts_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS accounts (
            id INTEGER PRIMARY KEY,
            external_id INTEGER UNIQUE NOT NULL,
            full_name TEXT NOT NULL,
            handle TEXT,
            display_name TEXT NOT NULL,
            employee_code INTEGER UNIQUE,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_admin_grants_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admin_grants (
            external_id INTEGER PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_attendance_events_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS attendance_events (
            id INTEGER PRIMARY KEY,
            account_id INTEGER NOT NULL,
            kind TEXT NOT NULL CHECK (kind IN ('enter', 'exit')),
            occurred_at DATETIME NOT NULL,
            local_day DATE NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (account_id) REFERENCES accounts (id),
            UNIQUE (account_id, kind, local_day)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
