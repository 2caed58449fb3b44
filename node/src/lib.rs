// Lottery development node
// Hosts lottery contracts in memory and serves them over JSON-RPC

pub mod config;
pub mod core;
pub mod rpc;
