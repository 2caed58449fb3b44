use serde::{Deserialize, Serialize};
use std::borrow::Cow;

use crate::{crypto::Hash, network::Network, transaction::BlockHeight};

// JSON-RPC codes reported for rejected transactions
pub const CONTRACT_ASSERTION_CODE: i16 = -10;
pub const CONTRACT_NOT_FOUND_CODE: i16 = -11;
pub const TRANSACTION_EXPIRED_CODE: i16 = -12;
pub const CHAIN_LIMIT_CODE: i16 = -13;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GetInfoResult {
    pub height: BlockHeight,
    pub network: Network,
    pub version: String,
    // Number of contracts deployed on the node
    pub contracts: usize,
}

#[derive(Serialize, Deserialize)]
pub struct GetContractStateParams<'a> {
    pub address: Cow<'a, Hash>,
}
