use lottery_common::{
    api::node::{
        CHAIN_LIMIT_CODE, CONTRACT_ASSERTION_CODE, CONTRACT_NOT_FOUND_CODE,
        TRANSACTION_EXPIRED_CODE,
    },
    contract::LotteryError,
    crypto::Hash,
    rpc::InternalRpcError,
    time::TimestampMillis,
};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BlockchainError {
    #[error("Contract assertion failed: {}", _0)]
    Contract(#[from] LotteryError),
    #[error("Contract {} not found", _0)]
    ContractNotFound(Hash),
    #[error("Transaction expired at {} (now {})", expires_at, now)]
    TransactionExpired {
        expires_at: TimestampMillis,
        now: TimestampMillis,
    },
    #[error("Block height overflow")]
    HeightOverflow,
    #[error("Deploy nonce overflow")]
    NonceOverflow,
}

impl BlockchainError {
    pub fn get_code(&self) -> i16 {
        match self {
            Self::Contract(_) => CONTRACT_ASSERTION_CODE,
            Self::ContractNotFound(_) => CONTRACT_NOT_FOUND_CODE,
            Self::TransactionExpired { .. } => TRANSACTION_EXPIRED_CODE,
            Self::HeightOverflow | Self::NonceOverflow => CHAIN_LIMIT_CODE,
        }
    }
}

impl From<BlockchainError> for InternalRpcError {
    fn from(err: BlockchainError) -> Self {
        InternalRpcError::Custom(err.get_code(), err.to_string())
    }
}
