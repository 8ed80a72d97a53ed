use crate::blockchain::models::SignatureRecord;
use sqlx::{Row, SqlitePool};

/// Append-only set of signature records, unique by signature.
#[derive(Clone)]
pub struct SignatureStore {
    pool: SqlitePool,
}

impl SignatureStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert the record unless its signature is already stored. Returns
    /// `true` only when a new row was written; a duplicate is not an error.
    pub async fn insert_if_absent(&self, record: &SignatureRecord) -> Result<bool, sqlx::Error> {
        let err = record.err.as_ref().map(|e| e.to_string());

        let result = sqlx::query(
            r#"
            INSERT INTO signatures (signature, slot, block_time, err, memo, confirmation_status)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(signature) DO NOTHING
            "#,
        )
        .bind(&record.signature)
        .bind(record.slot as i64)
        .bind(record.block_time)
        .bind(err)
        .bind(&record.memo)
        .bind(&record.confirmation_status)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn count(&self) -> Result<u64, sqlx::Error> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM signatures")
            .fetch_one(&self.pool)
            .await?;

        Ok(count as u64)
    }

    /// Every stored signature, oldest block time first.
    pub async fn distinct_signatures(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT DISTINCT signature FROM signatures ORDER BY block_time, signature")
            .fetch_all(&self.pool)
            .await
    }

    pub async fn contains(&self, signature: &str) -> Result<bool, sqlx::Error> {
        let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM signatures WHERE signature = ?")
            .bind(signature)
            .fetch_optional(&self.pool)
            .await?;

        Ok(found.is_some())
    }

    pub async fn get(&self, signature: &str) -> Result<Option<SignatureRecord>, sqlx::Error> {
        let row = sqlx::query(
            "SELECT signature, slot, block_time, err, memo, confirmation_status
             FROM signatures WHERE signature = ?",
        )
        .bind(signature)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let err = row
            .get::<Option<String>, _>("err")
            .map(|text| serde_json::from_str(&text))
            .transpose()
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Some(SignatureRecord {
            signature: row.get("signature"),
            slot: row.get::<i64, _>("slot") as u64,
            block_time: row.get("block_time"),
            err,
            memo: row.get("memo"),
            confirmation_status: row.get("confirmation_status"),
        }))
    }
}
