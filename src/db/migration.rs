use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    info!("Running database migrations...");

    // One row per signature ever seen for the tracked address. The primary
    // key is the only dedup mechanism the crawl relies on.
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS signatures (
            signature TEXT PRIMARY KEY NOT NULL,
            slot INTEGER NOT NULL,
            block_time INTEGER,
            err TEXT,
            memo TEXT,
            confirmation_status TEXT,
            created_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS transaction_details (
            signature TEXT PRIMARY KEY NOT NULL,
            block_number INTEGER,
            gas INTEGER,
            block_timestamp INTEGER,
            status TEXT,
            document TEXT NOT NULL,
            updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
        )"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_signatures_block_time
         ON signatures(block_time)"
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_transaction_details_status
         ON transaction_details(status)"
    )
    .execute(pool)
    .await?;

    info!("Database migrations completed successfully");
    Ok(())
}
