mod node;
mod proof;

use std::sync::Arc;

use async_trait::async_trait;
use lottery_common::{
    contract::{Circuit, LedgerState, LotteryError},
    crypto::Hash,
    rpc::client::JsonRPCError,
    transaction::{DeployTransaction, DeployTxData, FinalizedTxData, ProvenTransaction, Transaction},
};
use thiserror::Error;

pub use node::NodeClient;
pub use proof::LocalProofProvider;

use crate::wallet::Wallet;

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error(transparent)]
    Rpc(#[from] JsonRPCError),
    // Reported by the node while applying the transaction
    #[error("Contract assertion failed on node: {}", _0)]
    Assertion(String),
    // Raised by the local circuit execution, nothing was submitted
    #[error("Contract assertion failed: {}", _0)]
    Contract(#[from] LotteryError),
    #[error("No contract deployed at {}", _0)]
    ContractNotFound(Hash),
    #[error("Transaction rejected as expired: {}", _0)]
    Expired(String),
    #[error("Node did not answer within {} seconds", _0)]
    SyncTimeout(u64),
}

// Read access to the public ledger of deployed contracts
#[async_trait]
pub trait PublicDataProvider: Send + Sync {
    async fn query_contract_state(&self, address: &Hash) -> Result<Option<LedgerState>, ProviderError>;
}

// Runs a circuit against the last known ledger before anything is submitted
#[async_trait]
pub trait ProofProvider: Send + Sync {
    async fn prove(&self, state: &LedgerState, tx: Transaction) -> Result<ProvenTransaction, ProviderError>;
}

pub trait WalletProvider: Send + Sync {
    fn identity(&self) -> Hash;

    // Stamp a circuit call with the caller identity and its expiration
    fn balance_tx(&self, contract: Hash, circuit: Circuit) -> Transaction;

    fn balance_deploy(&self) -> DeployTransaction;
}

#[async_trait]
pub trait SubmissionProvider: Send + Sync {
    // Resolves once the transaction is included in a block
    async fn submit_tx(&self, tx: ProvenTransaction) -> Result<FinalizedTxData, ProviderError>;

    async fn deploy(&self, tx: DeployTransaction) -> Result<DeployTxData, ProviderError>;
}

/// Everything a lottery session needs to talk to the network
///
/// Built once after the wallet is ready and handed to the API explicitly.
#[derive(Clone)]
pub struct LotteryProviders {
    pub public_data: Arc<dyn PublicDataProvider>,
    pub proof: Arc<dyn ProofProvider>,
    pub wallet: Arc<dyn WalletProvider>,
    pub submission: Arc<dyn SubmissionProvider>,
}

impl LotteryProviders {
    pub fn new(node: Arc<NodeClient>, wallet: Arc<Wallet>) -> Self {
        Self {
            public_data: node.clone(),
            proof: Arc::new(LocalProofProvider),
            wallet,
            submission: node,
        }
    }
}
