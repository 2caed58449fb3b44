use std::{path::Path, sync::Arc, time::Duration};

use log::{debug, info, trace, warn};
use lottery_common::{
    contract::{Circuit, LedgerState},
    crypto::Hash,
    transaction::{DeployTxData, FinalizedTxData},
};
use thiserror::Error;
use tokio::{
    sync::{Mutex, RwLock},
    task::JoinHandle,
    time::interval,
};

use crate::{
    providers::{LotteryProviders, ProviderError},
    tickets::{TicketLedger, TicketLedgerError},
};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    TicketLedger(#[from] TicketLedgerError),
    #[error("None of your tickets won (winning ticket {}, owned: {:?})", winning, owned)]
    NoWinningTicket { winning: u64, owned: Vec<u64> },
    #[error("Ledger state of contract {} is not available", _0)]
    StateUnavailable(Hash),
}

/// Receipt of a confirmed purchase
#[derive(Debug, Clone)]
pub struct TicketPurchase {
    pub ticket_id: u64,
    pub receipt: FinalizedTxData,
}

/// A lottery session bound to one deployed contract
///
/// Calls go one at a time: each waits for the previous provider response.
pub struct LotteryApi {
    providers: LotteryProviders,
    contract_address: Hash,
    tickets: Mutex<TicketLedger>,
    state: RwLock<Option<LedgerState>>,
}

pub type SharedLotteryApi = Arc<LotteryApi>;

impl LotteryApi {
    // Deploy a fresh contract and bind a session to it
    pub async fn deploy<P: AsRef<Path>>(
        providers: LotteryProviders,
        tickets_path: P,
    ) -> Result<(SharedLotteryApi, DeployTxData), ApiError> {
        let tx = providers.wallet.balance_deploy();
        let receipt = providers.submission.deploy(tx).await?;
        if log::log_enabled!(log::Level::Info) {
            info!(
                "Contract deployed at {} in block {}",
                receipt.contract_address, receipt.block_height
            );
        }

        let api = Self::join(providers, receipt.contract_address.clone(), tickets_path).await?;
        Ok((api, receipt))
    }

    // Bind a session to an existing contract, failing when nothing is deployed there
    pub async fn join<P: AsRef<Path>>(
        providers: LotteryProviders,
        contract_address: Hash,
        tickets_path: P,
    ) -> Result<SharedLotteryApi, ApiError> {
        let state = providers
            .public_data
            .query_contract_state(&contract_address)
            .await?
            .ok_or_else(|| ProviderError::ContractNotFound(contract_address.clone()))?;

        let tickets = TicketLedger::open(
            tickets_path,
            &providers.wallet.identity(),
            &contract_address,
        )?;
        debug!(
            "Joined contract {} with {} owned ticket(s)",
            contract_address.short(),
            tickets.tickets().len()
        );

        Ok(Arc::new(Self {
            providers,
            contract_address,
            tickets: Mutex::new(tickets),
            state: RwLock::new(Some(state)),
        }))
    }

    pub fn get_contract_address(&self) -> &Hash {
        &self.contract_address
    }

    // Query the latest ledger and cache it
    pub async fn get_ledger_state(&self) -> Result<LedgerState, ApiError> {
        let state = self
            .providers
            .public_data
            .query_contract_state(&self.contract_address)
            .await?
            .ok_or_else(|| ApiError::StateUnavailable(self.contract_address.clone()))?;

        *self.state.write().await = Some(state);
        Ok(state)
    }

    // Last state seen, without a network round trip
    pub async fn get_cached_state(&self) -> Option<LedgerState> {
        *self.state.read().await
    }

    pub async fn get_owned_tickets(&self) -> Vec<u64> {
        self.tickets.lock().await.tickets().to_vec()
    }

    // Prove locally then submit, nothing is sent when the circuit fails
    async fn call(&self, circuit: Circuit) -> Result<FinalizedTxData, ApiError> {
        let state = self.get_ledger_state().await?;
        let tx = self
            .providers
            .wallet
            .balance_tx(self.contract_address.clone(), circuit);
        let proven = self.providers.proof.prove(&state, tx).await?;
        trace!("submitting {}", circuit);
        let receipt = self.providers.submission.submit_tx(proven).await?;

        if log::log_enabled!(log::Level::Debug) {
            debug!("{} confirmed in block {} ({})", circuit, receipt.block_height, receipt.tx_hash);
        }
        Ok(receipt)
    }

    /// Buy a ticket and record it as owned
    ///
    /// The node receipt carries no output so the ID is read back from the
    /// ledger after confirmation. Another purchase landing in between makes
    /// this record the wrong ID.
    pub async fn buy_ticket(&self) -> Result<TicketPurchase, ApiError> {
        let receipt = self.call(Circuit::BuyTicket).await?;
        let state = self.get_ledger_state().await?;
        let ticket_id = state.total_tickets;

        self.tickets.lock().await.record_purchase(ticket_id)?;
        info!("Bought ticket #{}", ticket_id);
        Ok(TicketPurchase { ticket_id, receipt })
    }

    pub async fn draw_winner(&self, winning_ticket: u64) -> Result<FinalizedTxData, ApiError> {
        let receipt = self.call(Circuit::DrawWinner { winning_ticket }).await?;
        info!("Winning ticket #{} drawn", winning_ticket);
        Ok(receipt)
    }

    /// Claim with the owned ticket matching the current winning number
    ///
    /// Fails without submitting anything when no owned ticket matches.
    pub async fn claim_prize(&self) -> Result<(u64, FinalizedTxData), ApiError> {
        let state = self.get_ledger_state().await?;
        let ticket_id = {
            let tickets = self.tickets.lock().await;
            match tickets.find_winning_ticket(state.winning_ticket) {
                Some(id) => id,
                None => {
                    return Err(ApiError::NoWinningTicket {
                        winning: state.winning_ticket,
                        owned: tickets.tickets().to_vec(),
                    })
                }
            }
        };

        let receipt = self.claim_ticket(ticket_id).await?;
        Ok((ticket_id, receipt))
    }

    // Claim with an explicit ticket, the local circuit rejects losing ones
    pub async fn claim_ticket(&self, ticket_id: u64) -> Result<FinalizedTxData, ApiError> {
        let receipt = self.call(Circuit::ClaimPrize { ticket_id }).await?;
        info!("Prize claimed with ticket #{}", ticket_id);
        Ok(receipt)
    }

    /// Refresh the cached state periodically until the handle is aborted
    pub fn spawn_state_refresh(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let api = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = interval(every);
            // first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = api.get_ledger_state().await {
                    warn!("Error while refreshing ledger state: {}", e);
                }
            }
        })
    }
}
