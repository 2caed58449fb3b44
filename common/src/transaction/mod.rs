use serde::{Deserialize, Serialize};

use crate::{
    contract::Circuit,
    crypto::{hash_parts, Hash},
    time::TimestampMillis,
};

// Block height at which a transaction was accepted
pub type BlockHeight = u64;

/// A circuit call addressed to a deployed contract
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    pub contract: Hash,
    pub circuit: Circuit,
    // Identity of the wallet that balanced the call
    pub caller: Hash,
    pub expires_at: TimestampMillis,
}

impl Transaction {
    pub fn is_expired(&self, now: TimestampMillis) -> bool {
        now > self.expires_at
    }

    // Hash of the transaction once included at the given height
    pub fn hash_at(&self, height: BlockHeight) -> Hash {
        hash_parts(&[
            self.contract.as_bytes(),
            &self.circuit.to_bytes(),
            self.caller.as_bytes(),
            &self.expires_at.to_le_bytes(),
            &height.to_le_bytes(),
        ])
    }
}

/// Request to instantiate a new lottery contract
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeployTransaction {
    pub caller: Hash,
    pub expires_at: TimestampMillis,
}

impl DeployTransaction {
    pub fn is_expired(&self, now: TimestampMillis) -> bool {
        now > self.expires_at
    }

    pub fn hash_at(&self, contract: &Hash, height: BlockHeight) -> Hash {
        hash_parts(&[
            b"deploy",
            contract.as_bytes(),
            self.caller.as_bytes(),
            &self.expires_at.to_le_bytes(),
            &height.to_le_bytes(),
        ])
    }
}

/// A transaction after the circuit ran locally against the last known state
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ProvenTransaction {
    pub transaction: Transaction,
    // Output of the local execution, `Some(id)` for a purchase
    pub simulated_output: Option<u64>,
}

/// Receipt of a confirmed circuit call
///
/// Carries no circuit output: a buyer recovers its ticket ID by reading
/// the ledger after confirmation.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct FinalizedTxData {
    pub tx_hash: Hash,
    pub block_height: BlockHeight,
}

/// Receipt of a confirmed deployment
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct DeployTxData {
    pub contract_address: Hash,
    pub tx_hash: Hash,
    pub block_height: BlockHeight,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash;

    fn transaction(circuit: Circuit) -> Transaction {
        Transaction {
            contract: hash(b"contract"),
            circuit,
            caller: hash(b"caller"),
            expires_at: 1_000,
        }
    }

    #[test]
    fn test_expiration_boundary() {
        let tx = transaction(Circuit::BuyTicket);
        assert!(!tx.is_expired(999));
        assert!(!tx.is_expired(1_000));
        assert!(tx.is_expired(1_001));
    }

    #[test]
    fn test_hash_depends_on_height_and_circuit() {
        let buy = transaction(Circuit::BuyTicket);
        let draw = transaction(Circuit::DrawWinner { winning_ticket: 1 });
        assert_ne!(buy.hash_at(1), buy.hash_at(2));
        assert_ne!(buy.hash_at(1), draw.hash_at(1));
        assert_eq!(buy.hash_at(1), buy.hash_at(1));
    }

    #[test]
    fn test_transaction_json_shape() {
        let tx = transaction(Circuit::ClaimPrize { ticket_id: 4 });
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["circuit"]["claim_prize"]["ticket_id"], 4);
        assert_eq!(value["expires_at"], 1_000);
        assert_eq!(value["caller"], hash(b"caller").to_hex());
    }
}
