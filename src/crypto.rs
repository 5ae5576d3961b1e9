//! Keys, digests and signature recovery.
//!
//! The relay protocol authorizes a transfer from whoever produced a
//! recoverable secp256k1 signature, so this module exposes both sides:
//! `KeyPair::sign_recoverable` for the signer and `recover_public_key` for
//! the verifier. Recovery is pure and deterministic; it reads and writes no
//! state.

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use sha3::{Digest, Sha3_256};
use thiserror::Error;

use crate::address::Address;

/// Byte length of a message hash.
pub const HASH_LEN: usize = 32;
/// Byte length of a recoverable signature: 64-byte compact ECDSA signature
/// followed by a 1-byte recovery id (0-3).
pub const SIG_LEN: usize = 65;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid secret key: {0}")]
    InvalidSecretKey(String),
    #[error("signing failed: {0}")]
    Signing(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("message hash must be 32 bytes and signature 65 bytes")]
    MalformedInput,
    #[error("recovery id out of range: {0}")]
    InvalidRecoveryId(u8),
    #[error("public key recovery failed")]
    Recovery,
}

/// SHA3-256 digest of `data`.
pub fn sha3_256(data: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Recover the secp256k1 public key that produced `signature` over
/// `message_hash`.
///
/// The recovery id selects the unique candidate key; there is no search or
/// ambiguity once the id is known. Inputs of the wrong length are rejected
/// up front - recovery is never attempted on short or oversized material.
pub fn recover_public_key(
    message_hash: &[u8],
    signature: &[u8],
) -> Result<VerifyingKey, RecoveryError> {
    if message_hash.len() != HASH_LEN || signature.len() != SIG_LEN {
        return Err(RecoveryError::MalformedInput);
    }
    let recovery_id = RecoveryId::from_byte(signature[SIG_LEN - 1])
        .ok_or(RecoveryError::InvalidRecoveryId(signature[SIG_LEN - 1]))?;
    let compact =
        Signature::from_slice(&signature[..SIG_LEN - 1]).map_err(|_| RecoveryError::Recovery)?;
    VerifyingKey::recover_from_prehash(message_hash, &compact, recovery_id)
        .map_err(|_| RecoveryError::Recovery)
}

/// A secp256k1 keypair.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a fresh keypair.
    pub fn generate() -> Self {
        let mut csprng = OsRng;
        KeyPair {
            signing_key: SigningKey::random(&mut csprng),
        }
    }

    /// Restore a keypair from a hex-encoded secret key.
    pub fn from_secret_hex(secret: &str) -> Result<Self, CryptoError> {
        let raw = hex::decode(secret).map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        let signing_key = SigningKey::from_slice(&raw)
            .map_err(|e| CryptoError::InvalidSecretKey(e.to_string()))?;
        Ok(KeyPair { signing_key })
    }

    /// Secret key as hex, for key files.
    pub fn secret_hex(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    pub fn public_key(&self) -> VerifyingKey {
        VerifyingKey::from(&self.signing_key)
    }

    /// The ledger address derived from this keypair's public key.
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key())
    }

    /// Sign a 32-byte message hash, producing the 65-byte recoverable form.
    pub fn sign_recoverable(
        &self,
        message_hash: &[u8; HASH_LEN],
    ) -> Result<[u8; SIG_LEN], CryptoError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(message_hash)
            .map_err(|e| CryptoError::Signing(e.to_string()))?;
        let mut out = [0u8; SIG_LEN];
        out[..SIG_LEN - 1].copy_from_slice(signature.to_bytes().as_slice());
        out[SIG_LEN - 1] = recovery_id.to_byte();
        Ok(out)
    }
}
