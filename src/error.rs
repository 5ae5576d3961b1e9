use thiserror::Error;

use crate::address::AddressParseError;
use crate::crypto::{CryptoError, RecoveryError};
use crate::relay::{DecodeError, RelayError, SignError};
use crate::storage::StorageError;
use crate::token::TokenError;

/// Top-level error for the CLI boundary.
#[derive(Error, Debug)]
pub enum SignetError {
    #[error("token error: {0}")]
    Token(#[from] TokenError),
    #[error("relay error: {0}")]
    Relay(#[from] RelayError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),
    #[error("recovery error: {0}")]
    Recovery(#[from] RecoveryError),
    #[error("envelope error: {0}")]
    Decode(#[from] DecodeError),
    #[error("signing error: {0}")]
    Sign(#[from] SignError),
    #[error("invalid address: {0}")]
    Address(#[from] AddressParseError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("key file error: {0}")]
    KeyFile(String),
}
