//! The relay envelope: the untrusted payload a third party submits to
//! execute a transfer on the signer's behalf.
//!
//! Wire form is JSON: a hex `signature` next to the call `params` (claimed
//! sender, recipient, hex value, hex nonce). Decoding is an explicit,
//! fallible schema step - no field is trusted until it has parsed into its
//! typed form, and the signature must be exactly 65 bytes.
//!
//! The authorization digest is SHA3-256 over the canonical serialization of
//! the envelope with the signature field emptied. Signer and verifier share
//! `signing_digest`, so the byte range covered by the signature is a single
//! protocol choice; the raw transmitted bytes are never hashed.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::crypto::{sha3_256, CryptoError, KeyPair, HASH_LEN, SIG_LEN};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed envelope: {0}")]
    Json(String),
    #[error("invalid address: {0}")]
    BadAddress(String),
    #[error("invalid hex number: {0}")]
    BadNumber(String),
    #[error("invalid signature encoding: {0}")]
    BadSignature(String),
    #[error("signature must be 65 bytes, got {0}")]
    SignatureLength(usize),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignError {
    #[error(transparent)]
    Crypto(#[from] CryptoError),
    #[error("envelope encoding failed: {0}")]
    Encode(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayParams {
    pub from: String,
    pub to: String,
    pub value: String,
    pub nonce: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub signature: String,
    pub params: RelayParams,
}

/// The envelope after every field has been validated into its typed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteCall {
    pub from: Address,
    pub to: Address,
    pub value: i128,
    pub nonce: u64,
    pub signature: Vec<u8>,
}

impl RelayEnvelope {
    /// Parse raw payload bytes into the envelope schema.
    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(payload).map_err(|e| DecodeError::Json(e.to_string()))
    }

    /// Validate every field into its typed form. Nothing downstream looks
    /// at the envelope strings again after this step.
    pub fn validate(&self) -> Result<RemoteCall, DecodeError> {
        let from = self
            .params
            .from
            .parse()
            .map_err(|e| DecodeError::BadAddress(format!("from: {e}")))?;
        let to = self
            .params
            .to
            .parse()
            .map_err(|e| DecodeError::BadAddress(format!("to: {e}")))?;
        let value = parse_hex_i128(&self.params.value)?;
        let nonce = parse_hex_u64(&self.params.nonce)?;

        let signature =
            hex::decode(&self.signature).map_err(|e| DecodeError::BadSignature(e.to_string()))?;
        if signature.len() != SIG_LEN {
            return Err(DecodeError::SignatureLength(signature.len()));
        }

        Ok(RemoteCall {
            from,
            to,
            value,
            nonce,
            signature,
        })
    }

    /// The digest the signature covers: the canonical envelope bytes with
    /// the signature field emptied.
    pub fn signing_digest(&self) -> Result<[u8; HASH_LEN], DecodeError> {
        let unsigned = RelayEnvelope {
            signature: String::new(),
            params: self.params.clone(),
        };
        let canonical =
            serde_json::to_vec(&unsigned).map_err(|e| DecodeError::Json(e.to_string()))?;
        Ok(sha3_256(&canonical))
    }
}

/// Client-side signer: build a relay envelope for `keys` transferring
/// `value` to `to`, ready to hand to any relayer.
pub fn build_signed(
    keys: &KeyPair,
    to: &Address,
    value: u128,
    nonce: u64,
) -> Result<Vec<u8>, SignError> {
    let mut envelope = RelayEnvelope {
        signature: String::new(),
        params: RelayParams {
            from: keys.address().to_string(),
            to: to.to_string(),
            value: format!("0x{value:x}"),
            nonce: format!("0x{nonce:x}"),
        },
    };
    let digest = envelope
        .signing_digest()
        .map_err(|e| SignError::Encode(e.to_string()))?;
    envelope.signature = hex::encode(keys.sign_recoverable(&digest)?);
    serde_json::to_vec(&envelope).map_err(|e| SignError::Encode(e.to_string()))
}

fn strip_radix_prefix(s: &str) -> &str {
    s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s)
}

fn parse_hex_i128(s: &str) -> Result<i128, DecodeError> {
    let (negative, rest) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let value = i128::from_str_radix(strip_radix_prefix(rest), 16)
        .map_err(|e| DecodeError::BadNumber(format!("value `{s}`: {e}")))?;
    Ok(if negative { -value } else { value })
}

fn parse_hex_u64(s: &str) -> Result<u64, DecodeError> {
    u64::from_str_radix(strip_radix_prefix(s), 16)
        .map_err(|e| DecodeError::BadNumber(format!("nonce `{s}`: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_then_decode_roundtrip() {
        let keys = KeyPair::generate();
        let to = Address::account([0xbb; 20]);

        let payload = build_signed(&keys, &to, 0x32, 1).unwrap();
        let envelope = RelayEnvelope::decode(&payload).unwrap();
        let call = envelope.validate().unwrap();

        assert_eq!(call.from, keys.address());
        assert_eq!(call.to, to);
        assert_eq!(call.value, 50);
        assert_eq!(call.nonce, 1);
        assert_eq!(call.signature.len(), SIG_LEN);
    }

    #[test]
    fn test_digest_ignores_signature_field() {
        let keys = KeyPair::generate();
        let to = Address::account([0xbb; 20]);
        let payload = build_signed(&keys, &to, 10, 2).unwrap();
        let signed = RelayEnvelope::decode(&payload).unwrap();

        let mut stripped = signed.clone();
        stripped.signature = String::new();

        assert_eq!(
            signed.signing_digest().unwrap(),
            stripped.signing_digest().unwrap()
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            RelayEnvelope::decode(b"not json at all"),
            Err(DecodeError::Json(_))
        ));
        // Structurally valid JSON but missing fields.
        assert!(matches!(
            RelayEnvelope::decode(b"{\"signature\": \"00\"}"),
            Err(DecodeError::Json(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let keys = KeyPair::generate();
        let to = Address::account([0xbb; 20]);
        let payload = build_signed(&keys, &to, 1, 1).unwrap();
        let good = RelayEnvelope::decode(&payload).unwrap();

        let mut bad = good.clone();
        bad.params.from = "hx123".to_string();
        assert!(matches!(bad.validate(), Err(DecodeError::BadAddress(_))));

        let mut bad = good.clone();
        bad.params.value = "0xzz".to_string();
        assert!(matches!(bad.validate(), Err(DecodeError::BadNumber(_))));

        let mut bad = good.clone();
        bad.params.nonce = "-0x1".to_string();
        assert!(matches!(bad.validate(), Err(DecodeError::BadNumber(_))));

        let mut bad = good.clone();
        bad.signature = "zz".repeat(65);
        assert!(matches!(bad.validate(), Err(DecodeError::BadSignature(_))));

        let mut bad = good.clone();
        bad.signature = "ab".repeat(64);
        assert_eq!(bad.validate(), Err(DecodeError::SignatureLength(64)));
    }

    #[test]
    fn test_hex_parsing_accepts_both_prefixes() {
        assert_eq!(parse_hex_i128("0x32").unwrap(), 50);
        assert_eq!(parse_hex_i128("32").unwrap(), 50);
        assert_eq!(parse_hex_i128("-0x32").unwrap(), -50);
        assert_eq!(parse_hex_u64("0X10").unwrap(), 16);
    }
}
