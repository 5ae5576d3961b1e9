//! The relay authorization pipeline.
//!
//! decode -> digest -> recover -> authorize -> replay check -> transfer.
//! One-shot and all-or-nothing: a payload that fails any stage is inert and
//! the ledger is untouched. On success the transfer engine is invoked with
//! the *recovered* identity - the submitting caller never appears in the
//! ledger mutation at all.

use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::address::Address;
use crate::crypto::{recover_public_key, RecoveryError};
use crate::relay::envelope::{DecodeError, RelayEnvelope};
use crate::token::{LedgerStore, Token, TokenError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Recovery(#[from] RecoveryError),
    #[error("signature recovers {recovered}, payload claims {claimed}")]
    Unauthorized {
        claimed: Address,
        recovered: Address,
    },
    #[error("nonce {0} already spent for this sender")]
    ReplayedNonce(u64),
    #[error(transparent)]
    Transfer(#[from] TokenError),
}

/// Success receipt: the hex form of the authorization digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt(String);

impl Receipt {
    fn from_digest(digest: [u8; 32]) -> Self {
        Receipt(format!("0x{}", hex::encode(digest)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Receipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<S: LedgerStore> Token<S> {
    /// Execute a transfer authorized by the signature inside `payload`
    /// rather than by the submitting caller.
    ///
    /// The recovered signer MUST equal the payload's claimed sender; any
    /// mismatch (or any earlier failure) rejects the payload with no state
    /// change. There is no default-to-authorized path.
    pub fn remote_transfer(&mut self, payload: &[u8]) -> Result<Receipt, RelayError> {
        let envelope = RelayEnvelope::decode(payload)?;
        let call = envelope.validate()?;
        let digest = envelope.signing_digest()?;

        let public_key = recover_public_key(&digest, &call.signature)?;
        let recovered = Address::from_public_key(&public_key);
        if recovered != call.from {
            debug!(claimed = %call.from, recovered = %recovered, "relay rejected: signer mismatch");
            return Err(RelayError::Unauthorized {
                claimed: call.from,
                recovered,
            });
        }

        if self.relay_nonce_used(&call.from, call.nonce) {
            return Err(RelayError::ReplayedNonce(call.nonce));
        }

        self.transfer(&call.from, &call.to, call.value, Some(b"relayed transfer"))?;
        self.consume_relay_nonce(&call.from, call.nonce)?;

        debug!(from = %call.from, to = %call.to, value = call.value, "relayed transfer applied");
        Ok(Receipt::from_digest(digest))
    }
}
