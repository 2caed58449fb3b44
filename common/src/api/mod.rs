// Request and response types of the node JSON-RPC API
// Transactions and receipts are sent as is, see `crate::transaction`

pub mod node;
