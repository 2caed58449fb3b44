use std::sync::Arc;

use log::{debug, info};
use lottery_common::{
    api::node::{GetContractStateParams, GetInfoResult},
    async_handler,
    config::VERSION,
    context::Context,
    rpc::{parse_params, require_no_params, server::ClientAddr, InternalRpcError, RPCHandler},
    transaction::{DeployTransaction, Transaction},
};
use serde_json::{json, Value};

use crate::core::blockchain::Blockchain;

pub fn register_methods(handler: &mut RPCHandler<Arc<Blockchain>>) {
    info!("Registering RPC methods...");
    handler.register_method("get_version", async_handler!(version));
    handler.register_method("get_info", async_handler!(get_info));
    handler.register_method("deploy_contract", async_handler!(deploy_contract));
    handler.register_method("call_contract", async_handler!(call_contract));
    handler.register_method("get_contract_state", async_handler!(get_contract_state));
}

async fn version(_: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_no_params(body)?;
    Ok(json!(VERSION))
}

async fn get_info(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    require_no_params(body)?;
    let blockchain: &Arc<Blockchain> = context.get()?;

    Ok(json!(GetInfoResult {
        height: blockchain.get_height().await,
        network: *blockchain.get_network(),
        version: VERSION.into(),
        contracts: blockchain.count_contracts().await,
    }))
}

async fn deploy_contract(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let tx: DeployTransaction = parse_params(body)?;
    let blockchain: &Arc<Blockchain> = context.get()?;

    if let Some(ClientAddr(Some(ip))) = context.get_optional::<ClientAddr>() {
        debug!("Deploy requested by {} from {}", tx.caller.short(), ip);
    }

    let receipt = blockchain.deploy_contract(tx).await?;
    Ok(json!(receipt))
}

async fn call_contract(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let tx: Transaction = parse_params(body)?;
    let blockchain: &Arc<Blockchain> = context.get()?;
    let receipt = blockchain.call_contract(tx).await?;
    Ok(json!(receipt))
}

async fn get_contract_state(context: &Context, body: Value) -> Result<Value, InternalRpcError> {
    let params: GetContractStateParams = parse_params(body)?;
    let blockchain: &Arc<Blockchain> = context.get()?;
    // null for an unknown address, not an error
    Ok(json!(blockchain.get_contract_state(&params.address).await))
}
