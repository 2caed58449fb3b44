use std::time::Duration;

use log::{debug, info, warn};
use lottery_common::{
    api::node::GetInfoResult,
    config::{
        GENESIS_SEED, IDENTITY_DOMAIN, TRANSACTION_TTL_MILLIS, WALLET_SYNC_POLL_INTERVAL_MILLIS,
        WALLET_SYNC_TIMEOUT_SECS,
    },
    contract::Circuit,
    crypto::{hash_parts, Hash},
    network::Network,
    time::get_current_time_in_millis,
    transaction::{DeployTransaction, Transaction},
};
use rand::RngCore;
use thiserror::Error;
use tokio::time::{sleep, timeout};

use crate::providers::{NodeClient, ProviderError, WalletProvider};

pub const SEED_SIZE: usize = 32;

#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid seed, expected {} hexadecimal characters", SEED_SIZE * 2)]
    InvalidSeedLength,
    #[error("Invalid seed: {}", _0)]
    InvalidSeedHex(#[from] hex::FromHexError),
}

/// Holds the seed of the current user
///
/// Only the derived identity ever leaves the wallet.
pub struct Wallet {
    seed: [u8; SEED_SIZE],
    identity: Hash,
    network: Network,
}

impl Wallet {
    // Fresh wallet from a random seed
    pub fn create(network: Network) -> Self {
        let mut seed = [0u8; SEED_SIZE];
        rand::thread_rng().fill_bytes(&mut seed);
        Self::from_seed(seed, network)
    }

    pub fn from_seed(seed: [u8; SEED_SIZE], network: Network) -> Self {
        let identity = hash_parts(&[IDENTITY_DOMAIN, &seed]);
        Self {
            seed,
            identity,
            network,
        }
    }

    pub fn from_seed_hex(value: &str, network: Network) -> Result<Self, WalletError> {
        let value = value.trim();
        let value = value.strip_prefix("0x").unwrap_or(value);
        let bytes = hex::decode(value)?;
        let seed: [u8; SEED_SIZE] = bytes
            .try_into()
            .map_err(|_| WalletError::InvalidSeedLength)?;
        Ok(Self::from_seed(seed, network))
    }

    // Well-known wallet of standalone nodes
    pub fn genesis(network: Network) -> Self {
        Self::from_seed(GENESIS_SEED.to_bytes(), network)
    }

    pub fn get_seed_hex(&self) -> String {
        hex::encode(self.seed)
    }

    pub fn get_identity(&self) -> &Hash {
        &self.identity
    }

    pub fn get_network(&self) -> Network {
        self.network
    }

    pub async fn wait_for_sync(&self, node: &NodeClient) -> Result<GetInfoResult, ProviderError> {
        self.wait_for_sync_with(
            node,
            Duration::from_secs(WALLET_SYNC_TIMEOUT_SECS),
            Duration::from_millis(WALLET_SYNC_POLL_INTERVAL_MILLIS),
        )
        .await
    }

    // Poll the node until it answers, giving up after `limit`
    pub async fn wait_for_sync_with(
        &self,
        node: &NodeClient,
        limit: Duration,
        interval: Duration,
    ) -> Result<GetInfoResult, ProviderError> {
        info!("Syncing wallet {} with {}...", self.identity.short(), node.get_address());
        let probe = async {
            loop {
                match node.get_info().await {
                    Ok(info) => return info,
                    Err(e) => {
                        debug!("Node not ready yet: {}", e);
                        sleep(interval).await;
                    }
                }
            }
        };

        let info = timeout(limit, probe)
            .await
            .map_err(|_| ProviderError::SyncTimeout(limit.as_secs()))?;

        if info.network != self.network {
            warn!(
                "Node reports network {} while wallet is configured for {}",
                info.network,
                self.network
            );
        }
        Ok(info)
    }
}

impl WalletProvider for Wallet {
    fn identity(&self) -> Hash {
        self.identity.clone()
    }

    fn balance_tx(&self, contract: Hash, circuit: Circuit) -> Transaction {
        Transaction {
            contract,
            circuit,
            caller: self.identity.clone(),
            expires_at: get_current_time_in_millis() + TRANSACTION_TTL_MILLIS,
        }
    }

    fn balance_deploy(&self) -> DeployTransaction {
        DeployTransaction {
            caller: self.identity.clone(),
            expires_at: get_current_time_in_millis() + TRANSACTION_TTL_MILLIS,
        }
    }
}
