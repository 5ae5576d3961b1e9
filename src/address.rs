//! Ledger addresses.
//!
//! An address is a kind tag (account or contract) plus a 20-byte body.
//! Account bodies are derived from the secp256k1 public key: the last 20
//! bytes of the SHA3-256 digest of the 64-byte uncompressed point (SEC1
//! encoding with the 0x04 prefix stripped). Contract addresses are assigned
//! at deployment, never derived.
//!
//! Textual form: `hx` + 40 hex chars for accounts, `cx` + 40 for contracts.

use k256::ecdsa::VerifyingKey;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::crypto::sha3_256;

/// Byte length of an address body.
pub const BODY_LEN: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AddressKind {
    Account,
    Contract,
}

impl AddressKind {
    fn prefix(&self) -> &'static str {
        match self {
            AddressKind::Account => "hx",
            AddressKind::Contract => "cx",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("address must be 42 characters, got {0}")]
    Length(usize),
    #[error("unknown address prefix: {0}")]
    Prefix(String),
    #[error("invalid hex in address: {0}")]
    Hex(String),
}

/// Fixed-width handle naming an account or contract on the ledger.
/// Equality is byte-exact over (kind, body).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    kind: AddressKind,
    body: [u8; BODY_LEN],
}

impl Address {
    /// Construct an account address from a 20-byte body.
    pub fn account(body: [u8; BODY_LEN]) -> Self {
        Address {
            kind: AddressKind::Account,
            body,
        }
    }

    /// Construct a contract address from a 20-byte body.
    pub fn contract(body: [u8; BODY_LEN]) -> Self {
        Address {
            kind: AddressKind::Contract,
            body,
        }
    }

    /// Derive the account address for a secp256k1 public key.
    ///
    /// Hash-and-truncate: SHA3-256 over the uncompressed point without its
    /// 0x04 tag, keeping the right-most 20 bytes. Deterministic, so an
    /// address recovered from a signature is directly comparable to stored
    /// addresses.
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        let digest = sha3_256(&point.as_bytes()[1..]);
        let mut body = [0u8; BODY_LEN];
        body.copy_from_slice(&digest[32 - BODY_LEN..]);
        Address::account(body)
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn body(&self) -> &[u8; BODY_LEN] {
        &self.body
    }

    /// True when the address names a contract rather than a plain account.
    pub fn is_contract(&self) -> bool {
        self.kind == AddressKind::Contract
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), hex::encode(self.body))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 2 + BODY_LEN * 2 {
            return Err(AddressParseError::Length(s.len()));
        }
        let prefix = s
            .get(..2)
            .ok_or_else(|| AddressParseError::Prefix(s.to_string()))?;
        let kind = match prefix {
            "hx" => AddressKind::Account,
            "cx" => AddressKind::Contract,
            other => return Err(AddressParseError::Prefix(other.to_string())),
        };
        let raw = hex::decode(&s[2..]).map_err(|e| AddressParseError::Hex(e.to_string()))?;
        let mut body = [0u8; BODY_LEN];
        body.copy_from_slice(&raw);
        Ok(Address { kind, body })
    }
}

// Addresses travel as strings in JSON (envelopes, key files) and as keys
// in the persistent store.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    #[test]
    fn test_display_parse_roundtrip() {
        let addr = Address::account([7u8; 20]);
        let s = addr.to_string();
        assert!(s.starts_with("hx"));
        assert_eq!(s.len(), 42);
        assert_eq!(s.parse::<Address>().unwrap(), addr);

        let contract = Address::contract([9u8; 20]);
        let s = contract.to_string();
        assert!(s.starts_with("cx"));
        assert_eq!(s.parse::<Address>().unwrap(), contract);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            "hx1234".parse::<Address>(),
            Err(AddressParseError::Length(_))
        ));
        assert!(matches!(
            "zz0000000000000000000000000000000000000000".parse::<Address>(),
            Err(AddressParseError::Prefix(_))
        ));
        assert!(matches!(
            "hx00000000000000000000000000000000000000zz".parse::<Address>(),
            Err(AddressParseError::Hex(_))
        ));
    }

    #[test]
    fn test_kind_distinguishes_equality() {
        let body = [3u8; 20];
        assert_ne!(Address::account(body), Address::contract(body));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let keys = KeyPair::generate();
        let a = Address::from_public_key(&keys.public_key());
        let b = Address::from_public_key(&keys.public_key());
        assert_eq!(a, b);
        assert!(!a.is_contract());
    }

    #[test]
    fn test_json_string_form() {
        let addr = Address::account([1u8; 20]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", addr));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }
}
