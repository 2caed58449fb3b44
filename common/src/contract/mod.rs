mod error;
mod ledger;
mod lottery;

pub use error::LotteryError;
pub use ledger::{Circuit, LedgerState};
pub use lottery::LotteryContract;
