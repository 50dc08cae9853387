//! # Value Objects
//!
//! Strongly-typed on-chain identifiers. Parsing goes through the validation
//! predicates so a constructed `Address` or `HumanId` is always well-formed.

use primitive_types::{H160, H256};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::errors::PoshError;
use super::validation::{validate_address, validate_human_id};

/// Transaction hash.
pub type TxHash = H256;

/// 20-byte account or contract address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub H160);

impl Address {
    /// The zero address.
    pub const ZERO: Address = Address(H160([0u8; 20]));

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        self.0.as_fixed_bytes()
    }

    /// True for `0x000…000`.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<H160> for Address {
    fn from(value: H160) -> Self {
        Self(value)
    }
}

impl From<[u8; 20]> for Address {
    fn from(value: [u8; 20]) -> Self {
        Self(H160(value))
    }
}

impl FromStr for Address {
    type Err = PoshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let checked = validate_address(s, "address")?;
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(&checked[2..], &mut bytes)
            .map_err(|e| PoshError::decode("address", e.to_string()))?;
        Ok(Self(H160(bytes)))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

/// 32-byte human identifier assigned by the identity registry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HumanId(pub H256);

impl HumanId {
    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_fixed_bytes()
    }

    /// True for the all-zero identifier the registry returns for unknown wallets.
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl From<H256> for HumanId {
    fn from(value: H256) -> Self {
        Self(value)
    }
}

impl From<[u8; 32]> for HumanId {
    fn from(value: [u8; 32]) -> Self {
        Self(H256(value))
    }
}

impl FromStr for HumanId {
    type Err = PoshError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let checked = validate_human_id(s, "humanId")?;
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&checked[2..], &mut bytes)
            .map_err(|e| PoshError::decode("humanId", e.to_string()))?;
        Ok(Self(H256(bytes)))
    }
}

impl fmt::Display for HumanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

macro_rules! string_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

string_serde!(Address);
string_serde!(HumanId);

/// Full lowercase hex of a 32-byte hash.
pub fn hash_to_hex(hash: &H256) -> String {
    format!("0x{}", hex::encode(hash.as_bytes()))
}
