use async_trait::async_trait;
use log::debug;
use lottery_common::{
    contract::{LedgerState, LotteryContract},
    transaction::{ProvenTransaction, Transaction},
};

use super::{ProofProvider, ProviderError};

/// Proves a call by running its circuit on a copy of the queried ledger
///
/// A failing assertion stops the call here, before anything reaches the node.
pub struct LocalProofProvider;

#[async_trait]
impl ProofProvider for LocalProofProvider {
    async fn prove(&self, state: &LedgerState, tx: Transaction) -> Result<ProvenTransaction, ProviderError> {
        let mut contract = LotteryContract::from_state(*state);
        let simulated_output = contract.execute(&tx.circuit)?;

        if log::log_enabled!(log::Level::Debug) {
            debug!("{} proven locally, expected ledger: {}", tx.circuit, contract.ledger());
        }

        Ok(ProvenTransaction {
            transaction: tx,
            simulated_output,
        })
    }
}
