// Lottery command line frontend
// Wallet, provider bundle and session API shared by the binary and its tests

pub mod api;
pub mod config;
pub mod providers;
pub mod tickets;
pub mod wallet;
