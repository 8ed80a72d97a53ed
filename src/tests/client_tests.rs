use super::mock_node::{MockNode, Signatures};
use super::{history, sig, signature_json, test_config, transaction_json, ADDRESS};
use crate::blockchain::client::{ClientError, SolanaClient};
use serde_json::{json, Value};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

async fn client_for(node: MockNode) -> (std::sync::Arc<MockNode>, SolanaClient) {
    let (node, url) = node.spawn().await;
    let client = SolanaClient::new(&test_config(&url)).unwrap();
    (node, client)
}

#[tokio::test]
async fn signature_request_carries_limit_boundary_and_commitment() {
    let (node, client) = client_for(MockNode::with_history(history(6))).await;

    let page = client
        .get_signatures_for_address(ADDRESS, 2, Some(&sig(5)), Some("finalized"))
        .await
        .unwrap();

    assert_eq!(page.len(), 2);
    assert_eq!(page[0].signature, sig(4));
    assert_eq!(page[1].signature, sig(3));
    assert_eq!(page[0].block_time, Some(1_700_000_004));

    let request = &node.requests()[0];
    assert_eq!(request["jsonrpc"], "2.0");
    assert_eq!(request["method"], "getSignaturesForAddress");
    assert_eq!(
        request["params"],
        json!([ADDRESS, { "limit": 2, "before": sig(5), "commitment": "finalized" }])
    );
}

#[tokio::test]
async fn first_page_omits_before() {
    let (node, client) = client_for(MockNode::with_history(history(3))).await;

    client
        .get_signatures_for_address(ADDRESS, 10, None, None)
        .await
        .unwrap();

    assert_eq!(node.requests()[0]["params"], json!([ADDRESS, { "limit": 10 }]));
}

#[tokio::test]
async fn unknown_boundary_is_an_empty_page() {
    let mut pages = HashMap::new();
    pages.insert(None, vec![signature_json(&sig(1), 1, None)]);
    let (_node, client) = client_for(MockNode::new(Signatures::Scripted(pages))).await;

    let page = client
        .get_signatures_for_address(ADDRESS, 10, Some(&sig(9)), None)
        .await
        .unwrap();

    assert!(page.is_empty());
}

#[tokio::test]
async fn unknown_transaction_is_none() {
    let (_node, client) = client_for(MockNode::with_history(vec![])).await;

    assert!(client.get_transaction(&sig(1)).await.unwrap().is_none());
}

#[tokio::test]
async fn transaction_is_returned_with_derived_fields() {
    let node = MockNode::with_history(vec![]);
    node.set_transaction(&sig(1), transaction_json(77, 1_700_000_077, Value::Null));
    let (_node, client) = client_for(node).await;

    let detail = client.get_transaction(&sig(1)).await.unwrap().unwrap();

    assert_eq!(detail.signature(), sig(1));
    assert_eq!(detail.block_number, Some(77));
    assert_eq!(detail.fee(), Some(5000));
    assert_eq!(detail.raw["version"], 0);
}

#[tokio::test]
async fn non_object_transaction_is_malformed() {
    let node = MockNode::with_history(vec![]);
    node.set_transaction(&sig(1), json!("not a transaction"));
    let (_node, client) = client_for(node).await;

    assert!(matches!(
        client.get_transaction(&sig(1)).await,
        Err(ClientError::Malformed(_))
    ));
}

#[tokio::test]
async fn server_error_is_returned_not_retried() {
    let node = MockNode::with_history(history(3));
    node.fail_request(0);
    let (node, client) = client_for(node).await;

    let result = client.get_signatures_for_address(ADDRESS, 10, None, None).await;

    assert!(matches!(result, Err(ClientError::Status(status)) if status.as_u16() == 500));
    assert_eq!(node.requests().len(), 1);
}

#[tokio::test]
async fn repeated_rate_limits_resend_the_same_request() {
    let node = MockNode::with_history(history(3));
    node.rate_limit_request(0);
    node.rate_limit_request(1);
    let (node, client) = client_for(node).await;

    let page = client
        .get_signatures_for_address(ADDRESS, 10, None, None)
        .await
        .unwrap();

    assert_eq!(page.len(), 3);
    let requests = node.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0], requests[1]);
    assert_eq!(requests[1], requests[2]);
}

#[tokio::test]
async fn json_rpc_error_object_is_an_error() {
    let node = MockNode::with_history(vec![]);
    node.rpc_error_on_request(0);
    let (_node, client) = client_for(node).await;

    match client.get_transaction(&sig(1)).await {
        Err(ClientError::JsonRpc { code, message }) => {
            assert_eq!(code, -32005);
            assert_eq!(message, "Node is behind");
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn unreachable_endpoint_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = SolanaClient::new(&test_config(&url)).unwrap();

    assert!(matches!(
        client.get_signatures_for_address(ADDRESS, 1, None, None).await,
        Err(ClientError::Http(_))
    ));
}

#[tokio::test]
async fn cancelled_client_sends_nothing() {
    let (node, url) = MockNode::with_history(history(3)).spawn().await;
    let shutdown = CancellationToken::new();
    let client = SolanaClient::new(&test_config(&url)).unwrap().with_shutdown(shutdown.clone());
    shutdown.cancel();

    assert!(matches!(
        client.get_signatures_for_address(ADDRESS, 10, None, None).await,
        Err(ClientError::Cancelled)
    ));
    assert!(node.requests().is_empty());
}
