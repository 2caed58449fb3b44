pub mod blockchain;
pub mod error;
