use crate::blockchain::models::TransactionDetail;
use sqlx::SqlitePool;

/// What an upsert did to the stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Modified,
    Unchanged,
}

/// Enriched transaction documents keyed by signature.
#[derive(Clone)]
pub struct DetailStore {
    pool: SqlitePool,
}

impl DetailStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Replace the whole document for `detail`'s signature, creating it if
    /// needed. Both statements are single atomic writes: the insert wins or
    /// loses on the primary key, and the update only fires when the canonical
    /// document text differs.
    pub async fn upsert(&self, detail: &TransactionDetail) -> Result<UpsertOutcome, sqlx::Error> {
        let document = detail
            .to_document()
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let block_number = detail.block_number.map(|n| n as i64);
        let gas = detail.gas.map(|g| g as i64);
        let status = detail.status.map(|s| s.as_str());

        let inserted = sqlx::query(
            r#"
            INSERT INTO transaction_details
            (signature, block_number, gas, block_timestamp, status, document)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(signature) DO NOTHING
            "#,
        )
        .bind(detail.signature())
        .bind(block_number)
        .bind(gas)
        .bind(detail.block_timestamp)
        .bind(status)
        .bind(&document)
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() == 1 {
            return Ok(UpsertOutcome::Created);
        }

        let updated = sqlx::query(
            r#"
            UPDATE transaction_details
            SET block_number = ?, gas = ?, block_timestamp = ?, status = ?, document = ?,
                updated_at = strftime('%s', 'now')
            WHERE signature = ? AND document IS NOT ?
            "#,
        )
        .bind(block_number)
        .bind(gas)
        .bind(detail.block_timestamp)
        .bind(status)
        .bind(&document)
        .bind(detail.signature())
        .bind(&document)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 1 {
            Ok(UpsertOutcome::Modified)
        } else {
            Ok(UpsertOutcome::Unchanged)
        }
    }

    pub async fn get(&self, signature: &str) -> Result<Option<TransactionDetail>, sqlx::Error> {
        let document: Option<String> =
            sqlx::query_scalar("SELECT document FROM transaction_details WHERE signature = ?")
                .bind(signature)
                .fetch_optional(&self.pool)
                .await?;

        document
            .map(|doc| TransactionDetail::from_document(&doc))
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))
    }

    pub async fn count(&self) -> Result<u64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transaction_details")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }
}
