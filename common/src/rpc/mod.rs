#[cfg(feature = "rpc-server")]
pub mod server;

#[cfg(feature = "rpc-client")]
pub mod client;

mod error;
mod rpc_handler;
mod types;

pub use error::*;
pub use rpc_handler::*;
pub use types::*;
