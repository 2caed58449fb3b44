use crate::crypto::Hash;

pub const VERSION: &str = env!("BUILD_VERSION");

// Seed of the pre-funded account every standalone node knows about
pub const GENESIS_SEED: Hash = Hash::new([
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01,
]);

// Domain tag mixed with a seed to derive the public identity
pub const IDENTITY_DOMAIN: &[u8] = b"lottery-identity";

// Transactions are valid for 30 minutes after being balanced
pub const TRANSACTION_TTL_MILLIS: u64 = 30 * 60 * 1000;

// JSON-RPC route exposed by the node
pub const JSON_RPC_PATH: &str = "/json_rpc";
// Liveness route polled before using a standalone node
pub const HEALTH_PATH: &str = "/health";

pub const DEFAULT_RPC_BIND_ADDRESS: &str = "127.0.0.1:8080";

// Wallet sync gives up after this many seconds
pub const WALLET_SYNC_TIMEOUT_SECS: u64 = 30;
// Delay between two sync attempts
pub const WALLET_SYNC_POLL_INTERVAL_MILLIS: u64 = 1000;

// Standalone environment health wait
pub const NODE_HEALTH_TIMEOUT_SECS: u64 = 600;
pub const NODE_HEALTH_POLL_INTERVAL_SECS: u64 = 5;

// Ledger state refresh cadence of an active session
pub const STATE_REFRESH_INTERVAL_SECS: u64 = 10;
