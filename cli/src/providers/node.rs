use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, trace, warn};
use lottery_common::{
    api::node::{
        GetContractStateParams, GetInfoResult, CONTRACT_ASSERTION_CODE, CONTRACT_NOT_FOUND_CODE,
        TRANSACTION_EXPIRED_CODE,
    },
    config::{HEALTH_PATH, JSON_RPC_PATH},
    contract::LedgerState,
    crypto::Hash,
    rpc::client::{JsonRPCClient, JsonRPCError},
    transaction::{DeployTransaction, DeployTxData, FinalizedTxData, ProvenTransaction},
};
use tokio::time::{sleep, timeout};

use super::{ProviderError, PublicDataProvider, SubmissionProvider};

// A health probe must answer quickly or it counts as a miss
const HEALTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// JSON-RPC client of the development node
pub struct NodeClient {
    rpc: JsonRPCClient,
    http: reqwest::Client,
    address: String,
}

impl NodeClient {
    pub fn new(address: &str) -> Result<Self, ProviderError> {
        let address = address.trim_end_matches('/').to_owned();
        let rpc = JsonRPCClient::new(format!("{}{}", address, JSON_RPC_PATH))?;
        let http = reqwest::Client::builder()
            .timeout(HEALTH_REQUEST_TIMEOUT)
            .build()
            .map_err(JsonRPCError::from)?;

        Ok(Self { rpc, http, address })
    }

    pub fn get_address(&self) -> &str {
        &self.address
    }

    pub async fn get_version(&self) -> Result<String, ProviderError> {
        trace!("get_version");
        Ok(self.rpc.call("get_version").await?)
    }

    pub async fn get_info(&self) -> Result<GetInfoResult, ProviderError> {
        trace!("get_info");
        Ok(self.rpc.call("get_info").await?)
    }

    pub async fn is_healthy(&self) -> bool {
        match self
            .http
            .get(format!("{}{}", self.address, HEALTH_PATH))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Health probe on {} failed: {}", self.address, e);
                false
            }
        }
    }

    // Poll the health route until the node answers or `limit` elapses
    pub async fn wait_for_health(&self, limit: Duration, interval: Duration) -> Result<(), ProviderError> {
        let probe = async {
            loop {
                if self.is_healthy().await {
                    return;
                }
                info!("Waiting for node at {} to be ready...", self.address);
                sleep(interval).await;
            }
        };

        timeout(limit, probe)
            .await
            .map_err(|_| ProviderError::SyncTimeout(limit.as_secs()))
    }
}

// Turn node rejection codes into typed errors
fn map_rejection(err: JsonRPCError, contract: &Hash) -> ProviderError {
    match err {
        JsonRPCError::ServerError { code, message } if code == CONTRACT_ASSERTION_CODE => {
            ProviderError::Assertion(message)
        }
        JsonRPCError::ServerError { code, .. } if code == CONTRACT_NOT_FOUND_CODE => {
            ProviderError::ContractNotFound(contract.clone())
        }
        JsonRPCError::ServerError { code, message } if code == TRANSACTION_EXPIRED_CODE => {
            ProviderError::Expired(message)
        }
        e => ProviderError::Rpc(e),
    }
}

#[async_trait]
impl PublicDataProvider for NodeClient {
    async fn query_contract_state(&self, address: &Hash) -> Result<Option<LedgerState>, ProviderError> {
        trace!("query_contract_state {}", address);
        let params = GetContractStateParams {
            address: std::borrow::Cow::Borrowed(address),
        };
        Ok(self.rpc.call_with("get_contract_state", &params).await?)
    }
}

#[async_trait]
impl SubmissionProvider for NodeClient {
    async fn submit_tx(&self, tx: ProvenTransaction) -> Result<FinalizedTxData, ProviderError> {
        let transaction = tx.transaction;
        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "Submitting {} to contract {}",
                transaction.circuit,
                transaction.contract.short()
            );
        }

        self.rpc
            .call_with("call_contract", &transaction)
            .await
            .map_err(|e| {
                let err = map_rejection(e, &transaction.contract);
                warn!("Transaction rejected by node: {}", err);
                err
            })
    }

    async fn deploy(&self, tx: DeployTransaction) -> Result<DeployTxData, ProviderError> {
        debug!("Submitting deployment for {}", tx.caller.short());
        Ok(self.rpc.call_with("deploy_contract", &tx).await?)
    }
}
