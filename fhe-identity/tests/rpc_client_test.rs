//! JSON-RPC chain client and wallet tests against a mock node.

use std::time::Duration;

use alloy_primitives::{Address, B256};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use alloy::sol_types::{SolCall, SolValue};
use fhe_identity::chain::IPrivateIdentity;
use fhe_identity::config::DEFAULT_CONTRACT_ADDRESS;
use fhe_identity::{
    ChainClient, ChainError, CiphertextHandle, ContractCall, Eip712Payload, JsonRpcChainClient,
    JsonRpcWallet, WalletError, WalletSigner,
};

const ACCOUNT: &str = "0x00000000000000000000000000000000000000aa";

fn tx_hash() -> String {
    format!("0x{}", "ab".repeat(32))
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "result": result,
    }))
}

fn rpc_error(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": 1,
        "error": { "code": code, "message": message },
    }))
}

async fn mock_rpc(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(response)
        .mount(server)
        .await;
}

fn receipt(status: &str, block: &str) -> Value {
    json!({
        "type": "0x0",
        "status": status,
        "cumulativeGasUsed": "0x5208",
        "logs": [],
        "logsBloom": format!("0x{}", "00".repeat(256)),
        "transactionHash": tx_hash(),
        "transactionIndex": "0x0",
        "blockHash": format!("0x{}", "cd".repeat(32)),
        "blockNumber": block,
        "gasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "from": ACCOUNT,
        "to": "0x4abbbc78d17cebce8580c549e9650f34e6615424",
        "contractAddress": null,
    })
}

/// Mount a transaction hash and a block height for the provider's block poller.
async fn mock_submission(server: &MockServer) {
    mock_rpc(server, "eth_sendTransaction", rpc_result(json!(tx_hash()))).await;
    mock_rpc(server, "eth_blockNumber", rpc_result(json!("0x10"))).await;
}

fn client(server: &MockServer) -> JsonRpcChainClient {
    JsonRpcChainClient::with_poll_interval(
        &server.uri(),
        DEFAULT_CONTRACT_ADDRESS,
        Duration::from_millis(10),
    )
    .unwrap()
}

fn account() -> Address {
    ACCOUNT.parse().unwrap()
}

async fn request_bodies(server: &MockServer, rpc_method: &str) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|r| serde_json::from_slice::<Value>(&r.body).ok())
        .filter(|body| body["method"] == rpc_method)
        .collect()
}

#[tokio::test]
async fn test_send_waits_for_receipt() {
    let server = MockServer::start().await;
    mock_submission(&server).await;

    // first poll: not yet mined
    Mock::given(method("POST"))
        .and(body_partial_json(json!({ "method": "eth_getTransactionReceipt" })))
        .respond_with(rpc_result(Value::Null))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    mock_rpc(&server, "eth_getTransactionReceipt", rpc_result(receipt("0x1", "0x10"))).await;

    let receipt = client(&server)
        .send(account(), ContractCall::CheckIsAdult)
        .await
        .unwrap();
    assert_eq!(receipt.tx_hash, B256::repeat_byte(0xab));
    assert_eq!(receipt.block_number, 16);
    assert!(request_bodies(&server, "eth_getTransactionReceipt").await.len() >= 2);

    let sent = request_bodies(&server, "eth_sendTransaction").await;
    let tx = &sent[0]["params"][0];
    assert_eq!(tx["from"].as_str().unwrap().to_lowercase(), ACCOUNT);
    assert_eq!(
        tx["to"].as_str().unwrap().to_lowercase(),
        "0x4abbbc78d17cebce8580c549e9650f34e6615424"
    );
    let selector = hex::encode(IPrivateIdentity::checkIsAdultCall::SELECTOR);
    assert_eq!(tx["input"], format!("0x{}", selector));
}

#[tokio::test]
async fn test_reverted_receipt() {
    let server = MockServer::start().await;
    mock_submission(&server).await;
    mock_rpc(&server, "eth_getTransactionReceipt", rpc_result(receipt("0x0", "0x2"))).await;

    let err = client(&server)
        .send(account(), ContractCall::CheckIsVip)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Reverted { tx_hash } if tx_hash == B256::repeat_byte(0xab)));
}

#[tokio::test]
async fn test_rpc_error_propagates() {
    let server = MockServer::start().await;
    mock_rpc(
        &server,
        "eth_sendTransaction",
        rpc_error(-32000, "insufficient funds for gas"),
    )
    .await;

    let err = client(&server)
        .send(account(), ContractCall::CheckIsAdult)
        .await
        .unwrap_err();
    match err {
        ChainError::Rpc { code, message } => {
            assert_eq!(code, -32000);
            assert_eq!(message, "insufficient funds for gas");
        }
        other => panic!("expected rpc error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_failure_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let err = client(&server)
        .static_call(account(), ContractCall::GetAge)
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::Transport(_)));
}

#[tokio::test]
async fn test_static_call_returns_handle() {
    let server = MockServer::start().await;
    let word = format!("0x{}", hex::encode(B256::repeat_byte(0x11).abi_encode()));
    mock_rpc(&server, "eth_call", rpc_result(json!(word))).await;

    let output = client(&server)
        .static_call(account(), ContractCall::CheckIsVip)
        .await
        .unwrap();
    let handle = ContractCall::CheckIsVip.decode_handle(&output).unwrap();
    assert_eq!(handle, CiphertextHandle(B256::repeat_byte(0x11)));

    let calls = request_bodies(&server, "eth_call").await;
    let selector = hex::encode(IPrivateIdentity::checkIsVIPCall::SELECTOR);
    assert_eq!(calls[0]["params"][0]["input"], format!("0x{}", selector));
}

#[tokio::test]
async fn test_set_identity_calldata() {
    let server = MockServer::start().await;
    mock_submission(&server).await;
    mock_rpc(&server, "eth_getTransactionReceipt", rpc_result(receipt("0x1", "0x1"))).await;

    let field = |byte: u8| fhe_identity::EncryptedField {
        handle: CiphertextHandle(B256::repeat_byte(byte)),
        proof: fhe_identity::InputProof(vec![byte; 40].into()),
    };
    let call = ContractCall::SetIdentity {
        age: field(1),
        credit_score: field(2),
        membership_tier: field(3),
    };
    let expected = call.encode();

    client(&server).send(account(), call).await.unwrap();

    let sent = request_bodies(&server, "eth_sendTransaction").await;
    assert_eq!(
        sent[0]["params"][0]["input"],
        format!("0x{}", hex::encode(&expected))
    );

    let decoded = IPrivateIdentity::setIdentityCall::abi_decode(&expected).unwrap();
    assert_eq!(decoded.inputCredit, B256::repeat_byte(2));
    assert_eq!(decoded.tierProof.len(), 40);
}

#[test]
fn test_invalid_endpoint() {
    let err = JsonRpcChainClient::new("not a url", DEFAULT_CONTRACT_ADDRESS).unwrap_err();
    assert!(matches!(err, ChainError::InvalidEndpoint(_)));
    assert!(JsonRpcWallet::new("::").is_err());
}

// ============================================================================
// Wallet
// ============================================================================

#[tokio::test]
async fn test_wallet_accounts() {
    let server = MockServer::start().await;
    mock_rpc(&server, "eth_requestAccounts", rpc_result(json!([ACCOUNT]))).await;

    let wallet = JsonRpcWallet::new(&server.uri()).unwrap();
    assert_eq!(wallet.request_accounts().await.unwrap(), vec![account()]);
}

#[tokio::test]
async fn test_wallet_signs_typed_data_as_json_string() {
    let server = MockServer::start().await;
    mock_rpc(&server, "eth_signTypedData_v4", rpc_result(json!("0xdeadbeef"))).await;

    let payload = Eip712Payload {
        domain: json!({ "name": "Decryption", "version": "1" }),
        types: json!({}),
        primary_type: "UserDecryptRequestVerification".to_string(),
        message: json!({ "durationDays": "10" }),
    };

    let wallet = JsonRpcWallet::new(&server.uri()).unwrap();
    let signature = wallet.sign_typed_data(account(), &payload).await.unwrap();
    assert_eq!(signature, "0xdeadbeef");

    let requests = request_bodies(&server, "eth_signTypedData_v4").await;
    let params = &requests[0]["params"];
    assert_eq!(params[0].as_str().unwrap().to_lowercase(), ACCOUNT);
    let typed: Value = serde_json::from_str(params[1].as_str().unwrap()).unwrap();
    assert_eq!(typed["primaryType"], "UserDecryptRequestVerification");
}

#[tokio::test]
async fn test_wallet_user_rejection() {
    let server = MockServer::start().await;
    mock_rpc(
        &server,
        "eth_signTypedData_v4",
        rpc_error(4001, "User denied message signature"),
    )
    .await;

    let payload = Eip712Payload {
        domain: Value::Null,
        types: Value::Null,
        primary_type: "UserDecryptRequestVerification".to_string(),
        message: Value::Null,
    };

    let wallet = JsonRpcWallet::new(&server.uri()).unwrap();
    let err = wallet.sign_typed_data(account(), &payload).await.unwrap_err();
    assert!(matches!(err, WalletError::Rejected(_)));
}
