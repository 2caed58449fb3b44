#![allow(clippy::disallowed_methods)]

use serde_json::{json, Value};
use std::sync::Arc;
use lottery_common::{
    config::TRANSACTION_TTL_MILLIS,
    crypto::hash,
    network::Network,
    rpc::RPCHandler,
    time::get_current_time_in_millis,
};
use lottery_node::core::blockchain::Blockchain;

fn build_handler() -> RPCHandler<Arc<Blockchain>> {
    let mut handler = RPCHandler::new(Blockchain::new(Network::Standalone));
    lottery_node::rpc::rpc::register_methods(&mut handler);
    handler
}

async fn call(handler: &RPCHandler<Arc<Blockchain>>, method: &str, params: Option<Value>) -> Value {
    let mut request = json!({"jsonrpc": "2.0", "id": 1, "method": method});
    if let Some(params) = params {
        request["params"] = params;
    }

    match handler
        .handle_request(&serde_json::to_vec(&request).expect("encode request"))
        .await
    {
        Ok(response) => response,
        Err(e) => e.to_json(),
    }
}

fn expires_at() -> u64 {
    get_current_time_in_millis() + TRANSACTION_TTL_MILLIS
}

async fn deploy(handler: &RPCHandler<Arc<Blockchain>>) -> String {
    let response = call(
        handler,
        "deploy_contract",
        Some(json!({"caller": hash(b"alice").to_hex(), "expires_at": expires_at()})),
    )
    .await;
    response["result"]["contract_address"]
        .as_str()
        .expect("contract address")
        .to_owned()
}

fn contract_call(contract: &str, circuit: Value) -> Value {
    json!({
        "contract": contract,
        "circuit": circuit,
        "caller": hash(b"alice").to_hex(),
        "expires_at": expires_at()
    })
}

#[tokio::test]
async fn test_get_info_and_version() {
    let handler = build_handler();

    let info = call(&handler, "get_info", None).await;
    assert_eq!(info["result"]["height"], 0);
    assert_eq!(info["result"]["network"], "standalone");
    assert_eq!(info["result"]["contracts"], 0);

    let version = call(&handler, "get_version", Some(json!({}))).await;
    assert!(version["result"].is_string());
}

#[tokio::test]
async fn test_lottery_round_over_rpc() {
    let handler = build_handler();
    let contract = deploy(&handler).await;

    let state = call(&handler, "get_contract_state", Some(json!({"address": contract}))).await;
    assert_eq!(state["result"], json!({"round": 0, "total_tickets": 0, "winning_ticket": 0}));

    for _ in 0..2 {
        let receipt = call(&handler, "call_contract", Some(contract_call(&contract, json!("buy_ticket")))).await;
        assert!(receipt["result"]["tx_hash"].is_string());
    }

    let receipt = call(
        &handler,
        "call_contract",
        Some(contract_call(&contract, json!({"draw_winner": {"winning_ticket": 2}}))),
    )
    .await;
    assert_eq!(receipt["result"]["block_height"], 4);

    let claim = call(
        &handler,
        "call_contract",
        Some(contract_call(&contract, json!({"claim_prize": {"ticket_id": 2}}))),
    )
    .await;
    assert!(claim.get("error").is_none());

    let state = call(&handler, "get_contract_state", Some(json!({"address": contract}))).await;
    assert_eq!(state["result"], json!({"round": 1, "total_tickets": 2, "winning_ticket": 2}));
}

#[tokio::test]
async fn test_contract_errors() {
    let handler = build_handler();
    let contract = deploy(&handler).await;

    let failed = call(
        &handler,
        "call_contract",
        Some(contract_call(&contract, json!({"draw_winner": {"winning_ticket": 1}}))),
    )
    .await;
    assert_eq!(failed["error"]["code"], -10);

    let losing = call(
        &handler,
        "call_contract",
        Some(contract_call(&contract, json!({"claim_prize": {"ticket_id": 3}}))),
    )
    .await;
    assert_eq!(losing["error"]["code"], -10);

    let unknown = hash(b"unknown").to_hex();
    let missing = call(&handler, "call_contract", Some(contract_call(&unknown, json!("buy_ticket")))).await;
    assert_eq!(missing["error"]["code"], -11);

    let mut expired = contract_call(&contract, json!("buy_ticket"));
    expired["expires_at"] = json!(1);
    let expired = call(&handler, "call_contract", Some(expired)).await;
    assert_eq!(expired["error"]["code"], -12);

    let state = call(&handler, "get_contract_state", Some(json!({"address": unknown}))).await;
    assert!(state["result"].is_null());
    assert!(state.get("error").is_none());
}

#[tokio::test]
async fn test_param_validation() {
    let handler = build_handler();

    let missing = call(&handler, "call_contract", None).await;
    assert_eq!(missing["error"]["code"], -32602);

    let malformed = call(&handler, "get_contract_state", Some(json!({"address": "zz"}))).await;
    assert_eq!(malformed["error"]["code"], -32602);

    let unexpected = call(&handler, "get_info", Some(json!(["extra"]))).await;
    assert_eq!(unexpected["error"]["code"], -32602);

    let unknown = call(&handler, "get_balance", None).await;
    assert_eq!(unknown["error"]["code"], -32601);
}
