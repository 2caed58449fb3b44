use blake3::hash as blake3_hash;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};
use std::{
    convert::TryInto,
    fmt::{Display, Error, Formatter},
    hash::Hasher,
    str::FromStr,
};

pub const HASH_SIZE: usize = 32; // 32 bytes / 256 bits

// Prefix byte separating contract addresses from other digests
const CONTRACT_ADDRESS_PREFIX: u8 = 0xff;

#[derive(Eq, PartialEq, PartialOrd, Ord, Clone, Debug)]
pub struct Hash([u8; HASH_SIZE]);

impl Hash {
    pub const fn new(bytes: [u8; HASH_SIZE]) -> Self {
        Hash(bytes)
    }

    pub const fn zero() -> Self {
        Hash::new([0; HASH_SIZE])
    }

    pub fn as_bytes(&self) -> &[u8; HASH_SIZE] {
        &self.0
    }

    pub fn to_bytes(self) -> [u8; HASH_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    // First bytes in hex, enough to tell identities apart in logs and prompts
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl FromStr for Hash {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|_| "Invalid hex string")?;
        let bytes: [u8; HASH_SIZE] = bytes.try_into().map_err(|_| "Invalid hash")?;
        Ok(Hash::new(bytes))
    }
}

// Hash a byte array using the blake3 algorithm
#[inline(always)]
pub fn hash(value: &[u8]) -> Hash {
    let result: [u8; HASH_SIZE] = blake3_hash(value).into();
    Hash(result)
}

// Hash several byte slices as if they were concatenated
pub fn hash_parts(parts: &[&[u8]]) -> Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    let result: [u8; HASH_SIZE] = hasher.finalize().into();
    Hash(result)
}

impl std::hash::Hash for Hash {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl AsRef<Hash> for Hash {
    fn as_ref(&self) -> &Hash {
        self
    }
}

impl AsRef<[u8]> for Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for Hash {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{}", &self.to_hex())
    }
}

impl Serialize for Hash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'a> Deserialize<'a> for Hash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let hex = String::deserialize(deserializer)?;
        if hex.len() != HASH_SIZE * 2 {
            return Err(SerdeError::custom("Invalid hex length"));
        }

        let decoded_hex = hex::decode(hex).map_err(SerdeError::custom)?;
        let bytes: [u8; HASH_SIZE] = decoded_hex
            .try_into()
            .map_err(|_| SerdeError::custom("Could not transform hex to bytes array for Hash"))?;
        Ok(Hash::new(bytes))
    }
}

/// Compute the address of a freshly deployed contract
///
/// Formula: address = blake3(0xff || deployer || nonce)
///
/// The nonce is the number of contracts the node deployed before this one,
/// so the same deployer always receives a new address.
pub fn compute_contract_address(deployer: &Hash, nonce: u64) -> Hash {
    hash_parts(&[
        &[CONTRACT_ADDRESS_PREFIX],
        deployer.as_bytes(),
        &nonce.to_le_bytes(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_from_str_accepts_prefix() {
        let hex = "0000000000000000000000000000000000000000000000000000000000000001";
        let plain: Hash = hex.parse().unwrap();
        let prefixed: Hash = format!("0x{hex}").parse().unwrap();
        assert_eq!(plain, prefixed);
        assert_eq!(plain.as_bytes()[31], 1);
    }

    #[test]
    fn test_hash_from_str_rejects_bad_input() {
        assert!("zz".parse::<Hash>().is_err());
        assert!("00ff".parse::<Hash>().is_err());
    }

    #[test]
    fn test_hash_parts_matches_concatenation() {
        let joined = hash(b"lottery-identity");
        let split = hash_parts(&[b"lottery", b"-identity"]);
        assert_eq!(joined, split);
    }

    #[test]
    fn test_contract_address_depends_on_nonce() {
        let deployer = hash(b"deployer");
        let first = compute_contract_address(&deployer, 0);
        let second = compute_contract_address(&deployer, 1);
        assert_ne!(first, second);
        assert_eq!(first, compute_contract_address(&deployer, 0));
    }

    #[test]
    fn test_serde_hex() {
        let value = hash(b"abc");
        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, format!("\"{}\"", value.to_hex()));
        let back: Hash = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
        assert!(serde_json::from_str::<Hash>("\"abcd\"").is_err());
    }
}
