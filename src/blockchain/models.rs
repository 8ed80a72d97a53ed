use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One entry of `getSignaturesForAddress`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureRecord {
    pub signature: String,
    pub slot: u64,
    #[serde(default)]
    pub block_time: Option<i64>,
    /// Non-null when the transaction failed on-chain.
    #[serde(default)]
    pub err: Option<Value>,
    #[serde(default)]
    pub memo: Option<String>,
    #[serde(default)]
    pub confirmation_status: Option<String>,
}

impl SignatureRecord {
    pub fn block_time_utc(&self) -> Option<DateTime<Utc>> {
        self.block_time.and_then(|ts| DateTime::from_timestamp(ts, 0))
    }

    pub fn failed(&self) -> bool {
        self.err.as_ref().is_some_and(|e| !e.is_null())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Failed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// A `getTransaction` payload keyed by its signature, with the normalized
/// fields derived from it.
///
/// `raw` holds the node's result object untouched. The derived fields are a
/// pure function of `raw`, so building a detail twice from the same payload
/// yields the same document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TxStatus>,
    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

impl TransactionDetail {
    pub fn from_payload(signature: &str, mut raw: Map<String, Value>) -> Self {
        // A stored document fed back in must not carry stale derived fields
        for key in ["_id", "block_number", "gas", "block_timestamp", "status"] {
            raw.remove(key);
        }

        let block_number = raw.get("slot").and_then(Value::as_u64);

        let gas = raw
            .get("meta")
            .and_then(|meta| meta.get("computeUnitsConsumed"))
            .and_then(Value::as_u64);

        let block_timestamp = raw.get("blockTime").and_then(Value::as_i64);

        // Missing `err` counts as null
        let status = raw.get("meta").filter(|meta| meta.is_object()).map(|meta| {
            match meta.get("err") {
                None | Some(Value::Null) => TxStatus::Success,
                Some(_) => TxStatus::Failed,
            }
        });

        Self {
            id: signature.to_string(),
            block_number,
            gas,
            block_timestamp,
            status,
            raw,
        }
    }

    pub fn signature(&self) -> &str {
        &self.id
    }

    pub fn fee(&self) -> Option<u64> {
        self.raw
            .get("meta")
            .and_then(|meta| meta.get("fee"))
            .and_then(Value::as_u64)
    }

    /// Canonical JSON text of the full document. Object keys come out sorted,
    /// so equal details always serialize to identical bytes.
    pub fn to_document(&self) -> Result<String, serde_json::Error> {
        let value = serde_json::to_value(self)?;
        serde_json::to_string(&value)
    }

    pub fn from_document(document: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(document)
    }
}
