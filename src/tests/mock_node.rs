//! Scriptable stand-in for a Solana JSON-RPC endpoint.

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

/// How `getSignaturesForAddress` pages are produced.
pub enum Signatures {
    /// Newest-first history paged by `before`, like a real node.
    History(Vec<Value>),
    /// Page keyed by the `before` boundary; anything else is empty.
    Scripted(HashMap<Option<String>, Vec<Value>>),
    /// The same page whatever the boundary.
    Fixed(Vec<Value>),
}

pub struct MockNode {
    signatures: Mutex<Signatures>,
    transactions: Mutex<HashMap<String, Value>>,
    /// Request indices (0-based, counting every HTTP request) answered with 429.
    rate_limited: Mutex<HashSet<usize>>,
    /// Answer every request with 429.
    always_rate_limited: Mutex<bool>,
    /// Request indices answered with HTTP 500.
    failing: Mutex<HashSet<usize>>,
    /// Request indices answered with a JSON-RPC error object.
    rpc_errors: Mutex<HashSet<usize>>,
    /// `getTransaction` signatures answered with HTTP 500.
    failing_transactions: Mutex<HashSet<String>>,
    requests: Mutex<Vec<Value>>,
}

impl MockNode {
    pub fn new(signatures: Signatures) -> Self {
        Self {
            signatures: Mutex::new(signatures),
            transactions: Mutex::new(HashMap::new()),
            rate_limited: Mutex::new(HashSet::new()),
            always_rate_limited: Mutex::new(false),
            failing: Mutex::new(HashSet::new()),
            rpc_errors: Mutex::new(HashSet::new()),
            failing_transactions: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_history(history: Vec<Value>) -> Self {
        Self::new(Signatures::History(history))
    }

    pub fn set_transaction(&self, signature: &str, transaction: Value) {
        self.transactions
            .lock()
            .unwrap()
            .insert(signature.to_string(), transaction);
    }

    pub fn rate_limit_request(&self, index: usize) {
        self.rate_limited.lock().unwrap().insert(index);
    }

    pub fn rate_limit_all(&self) {
        *self.always_rate_limited.lock().unwrap() = true;
    }

    pub fn fail_request(&self, index: usize) {
        self.failing.lock().unwrap().insert(index);
    }

    pub fn rpc_error_on_request(&self, index: usize) {
        self.rpc_errors.lock().unwrap().insert(index);
    }

    pub fn fail_transaction(&self, signature: &str) {
        self.failing_transactions
            .lock()
            .unwrap()
            .insert(signature.to_string());
    }

    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, method: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|r| r["method"] == method)
            .collect()
    }

    /// Start serving on an ephemeral port; returns the endpoint URL.
    pub async fn spawn(self) -> (Arc<Self>, String) {
        let node = Arc::new(self);
        let app = Router::new()
            .route("/", post(handle))
            .with_state(node.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (node, url)
    }

    fn signatures_page(&self, params: &Value) -> Value {
        let options = &params[1];
        let before = options["before"].as_str().map(str::to_string);
        let limit = options["limit"].as_u64().unwrap_or(1000) as usize;

        let page: Vec<Value> = match &*self.signatures.lock().unwrap() {
            Signatures::History(history) => {
                let start = match &before {
                    None => 0,
                    Some(boundary) => match history.iter().position(|r| r["signature"] == *boundary) {
                        Some(index) => index + 1,
                        None => history.len(),
                    },
                };
                history.iter().skip(start).cloned().collect()
            }
            Signatures::Scripted(pages) => pages.get(&before).cloned().unwrap_or_default(),
            Signatures::Fixed(page) => page.clone(),
        };

        Value::Array(page.into_iter().take(limit).collect())
    }

    fn transaction(&self, params: &Value) -> Result<Value, StatusCode> {
        let signature = params[0].as_str().unwrap_or_default();

        if self.failing_transactions.lock().unwrap().contains(signature) {
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }

        Ok(self
            .transactions
            .lock()
            .unwrap()
            .get(signature)
            .cloned()
            .unwrap_or(Value::Null))
    }
}

async fn handle(State(node): State<Arc<MockNode>>, Json(request): Json<Value>) -> Response {
    let index = {
        let mut requests = node.requests.lock().unwrap();
        requests.push(request.clone());
        requests.len() - 1
    };

    if *node.always_rate_limited.lock().unwrap() || node.rate_limited.lock().unwrap().contains(&index) {
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }
    if node.failing.lock().unwrap().contains(&index) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    let id = request["id"].clone();

    if node.rpc_errors.lock().unwrap().contains(&index) {
        return Json(json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": -32005, "message": "Node is behind" }
        }))
        .into_response();
    }

    let result = match request["method"].as_str() {
        Some("getSignaturesForAddress") => node.signatures_page(&request["params"]),
        Some("getTransaction") => match node.transaction(&request["params"]) {
            Ok(result) => result,
            Err(status) => return status.into_response(),
        },
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": -32601, "message": "Method not found" }
            }))
            .into_response()
        }
    };

    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result })).into_response()
}
