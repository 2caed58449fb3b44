use std::sync::Arc;

use indexmap::IndexMap;
use log::{debug, info};
use lottery_common::{
    contract::{LedgerState, LotteryContract},
    crypto::{compute_contract_address, Hash},
    network::Network,
    time::get_current_time_in_millis,
    transaction::{BlockHeight, DeployTransaction, DeployTxData, FinalizedTxData, Transaction},
};
use tokio::sync::RwLock;

use super::error::BlockchainError;

struct ChainState {
    height: BlockHeight,
    // Contracts deployed so far, used to derive fresh addresses
    deploy_nonce: u64,
    // Kept in deployment order for listing
    contracts: IndexMap<Hash, LotteryContract>,
}

impl ChainState {
    fn next_height(&self) -> Result<BlockHeight, BlockchainError> {
        self.height
            .checked_add(1)
            .ok_or(BlockchainError::HeightOverflow)
    }
}

/// In-memory chain hosting lottery contracts
///
/// Every accepted transaction is mined in its own block. The write lock
/// orders all state changes, so concurrent buyers get distinct tickets.
pub struct Blockchain {
    network: Network,
    state: RwLock<ChainState>,
}

impl Blockchain {
    pub fn new(network: Network) -> Arc<Self> {
        info!("Initializing {} chain", network);
        Arc::new(Self {
            network,
            state: RwLock::new(ChainState {
                height: 0,
                deploy_nonce: 0,
                contracts: IndexMap::new(),
            }),
        })
    }

    pub fn get_network(&self) -> &Network {
        &self.network
    }

    pub async fn get_height(&self) -> BlockHeight {
        self.state.read().await.height
    }

    pub async fn count_contracts(&self) -> usize {
        self.state.read().await.contracts.len()
    }

    pub async fn get_contract_state(&self, address: &Hash) -> Option<LedgerState> {
        let state = self.state.read().await;
        state
            .contracts
            .get(address)
            .map(|contract| *contract.ledger())
    }

    // All contracts with their ledger, in deployment order
    pub async fn get_contracts(&self) -> Vec<(Hash, LedgerState)> {
        let state = self.state.read().await;
        state
            .contracts
            .iter()
            .map(|(address, contract)| (address.clone(), *contract.ledger()))
            .collect()
    }

    pub async fn deploy_contract(
        &self,
        tx: DeployTransaction,
    ) -> Result<DeployTxData, BlockchainError> {
        let now = get_current_time_in_millis();
        if tx.is_expired(now) {
            return Err(BlockchainError::TransactionExpired {
                expires_at: tx.expires_at,
                now,
            });
        }

        let mut state = self.state.write().await;
        let height = state.next_height()?;
        let nonce = state.deploy_nonce;
        let next_nonce = nonce.checked_add(1).ok_or(BlockchainError::NonceOverflow)?;

        let contract_address = compute_contract_address(&tx.caller, nonce);
        let tx_hash = tx.hash_at(&contract_address, height);

        state
            .contracts
            .insert(contract_address.clone(), LotteryContract::new());
        state.deploy_nonce = next_nonce;
        state.height = height;

        if log::log_enabled!(log::Level::Info) {
            info!(
                "Contract {} deployed by {} at height {}",
                contract_address,
                tx.caller.short(),
                height
            );
        }

        Ok(DeployTxData {
            contract_address,
            tx_hash,
            block_height: height,
        })
    }

    /// Execute a circuit call and mine it
    ///
    /// The circuit runs on a copy of the contract, which replaces the
    /// stored one only when execution succeeds.
    pub async fn call_contract(&self, tx: Transaction) -> Result<FinalizedTxData, BlockchainError> {
        let now = get_current_time_in_millis();
        if tx.is_expired(now) {
            return Err(BlockchainError::TransactionExpired {
                expires_at: tx.expires_at,
                now,
            });
        }

        let mut state = self.state.write().await;
        let height = state.next_height()?;
        let contract = state
            .contracts
            .get(&tx.contract)
            .ok_or_else(|| BlockchainError::ContractNotFound(tx.contract.clone()))?;

        let mut updated = contract.clone();
        let output = updated.execute(&tx.circuit)?;

        let tx_hash = tx.hash_at(height);
        state.contracts.insert(tx.contract.clone(), updated);
        state.height = height;

        if log::log_enabled!(log::Level::Debug) {
            debug!(
                "{} on {} by {} mined at height {} (output: {:?})",
                tx.circuit,
                tx.contract,
                tx.caller.short(),
                height,
                output
            );
        }

        Ok(FinalizedTxData {
            tx_hash,
            block_height: height,
        })
    }
}
