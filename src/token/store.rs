//! Ledger state: balances plus the scalar supply fields.
//!
//! Pure data, no validation logic - the transfer engine owns the
//! invariants. The trait exists so the engine and the relay pipeline can be
//! exercised against an in-memory ledger in tests while the CLI runs on the
//! persistent one.

use std::collections::{HashMap, HashSet};

use crate::address::Address;
use crate::storage::{Storage, StorageError};

/// Persistent mapping from address to balance, plus decimals, total supply,
/// the one-shot initialization flag and the set of consumed relay nonces.
pub trait LedgerStore {
    /// Balance of `owner`. Defaults to 0 for unseen addresses, never errors.
    fn balance(&self, owner: &Address) -> u128;
    fn set_balance(&mut self, owner: &Address, value: u128) -> Result<(), StorageError>;

    fn decimals(&self) -> u32;
    fn set_decimals(&mut self, value: u32) -> Result<(), StorageError>;

    fn total_supply(&self) -> u128;
    fn set_total_supply(&mut self, value: u128) -> Result<(), StorageError>;

    fn initialized(&self) -> bool;
    fn set_initialized(&mut self) -> Result<(), StorageError>;

    /// True when `(owner, nonce)` has already authorized a relayed transfer.
    fn nonce_used(&self, owner: &Address, nonce: u64) -> bool;
    fn mark_nonce(&mut self, owner: &Address, nonce: u64) -> Result<(), StorageError>;
}

/// In-memory ledger for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    balances: HashMap<Address, u128>,
    decimals: u32,
    total_supply: u128,
    initialized: bool,
    used_nonces: HashSet<(Address, u64)>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all balances. Equals `total_supply()` whenever the transfer
    /// engine's invariants hold.
    pub fn circulating(&self) -> u128 {
        self.balances.values().sum()
    }
}

impl LedgerStore for MemoryLedger {
    fn balance(&self, owner: &Address) -> u128 {
        self.balances.get(owner).copied().unwrap_or(0)
    }

    fn set_balance(&mut self, owner: &Address, value: u128) -> Result<(), StorageError> {
        self.balances.insert(*owner, value);
        Ok(())
    }

    fn decimals(&self) -> u32 {
        self.decimals
    }

    fn set_decimals(&mut self, value: u32) -> Result<(), StorageError> {
        self.decimals = value;
        Ok(())
    }

    fn total_supply(&self) -> u128 {
        self.total_supply
    }

    fn set_total_supply(&mut self, value: u128) -> Result<(), StorageError> {
        self.total_supply = value;
        Ok(())
    }

    fn initialized(&self) -> bool {
        self.initialized
    }

    fn set_initialized(&mut self) -> Result<(), StorageError> {
        self.initialized = true;
        Ok(())
    }

    fn nonce_used(&self, owner: &Address, nonce: u64) -> bool {
        self.used_nonces.contains(&(*owner, nonce))
    }

    fn mark_nonce(&mut self, owner: &Address, nonce: u64) -> Result<(), StorageError> {
        self.used_nonces.insert((*owner, nonce));
        Ok(())
    }
}

/// Sled-backed ledger used by the CLI binary.
pub struct DbLedger {
    storage: Storage,
}

impl DbLedger {
    pub fn new(storage: Storage) -> Self {
        DbLedger { storage }
    }

    pub fn open(path: &str) -> Result<Self, StorageError> {
        Ok(DbLedger {
            storage: Storage::open(path)?,
        })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.storage.flush()
    }

    fn balance_key(owner: &Address) -> String {
        format!("balance:{}", owner)
    }

    fn nonce_key(owner: &Address, nonce: u64) -> String {
        format!("nonce:{}:{}", owner, nonce)
    }
}

impl LedgerStore for DbLedger {
    fn balance(&self, owner: &Address) -> u128 {
        match self.storage.get::<u128>(&Self::balance_key(owner)) {
            Ok(Some(value)) => value,
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!("balance read failed for {}: {}", owner, e);
                0
            }
        }
    }

    fn set_balance(&mut self, owner: &Address, value: u128) -> Result<(), StorageError> {
        self.storage.put(&Self::balance_key(owner), &value)
    }

    fn decimals(&self) -> u32 {
        self.storage
            .get::<u32>("meta:decimals")
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    fn set_decimals(&mut self, value: u32) -> Result<(), StorageError> {
        self.storage.put("meta:decimals", &value)
    }

    fn total_supply(&self) -> u128 {
        self.storage
            .get::<u128>("meta:total_supply")
            .ok()
            .flatten()
            .unwrap_or(0)
    }

    fn set_total_supply(&mut self, value: u128) -> Result<(), StorageError> {
        self.storage.put("meta:total_supply", &value)
    }

    fn initialized(&self) -> bool {
        self.storage
            .get::<bool>("meta:initialized")
            .ok()
            .flatten()
            .unwrap_or(false)
    }

    fn set_initialized(&mut self) -> Result<(), StorageError> {
        self.storage.put("meta:initialized", &true)
    }

    fn nonce_used(&self, owner: &Address, nonce: u64) -> bool {
        self.storage
            .contains(&Self::nonce_key(owner, nonce))
            .unwrap_or(false)
    }

    fn mark_nonce(&mut self, owner: &Address, nonce: u64) -> Result<(), StorageError> {
        self.storage.put(&Self::nonce_key(owner, nonce), &true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_balance_is_zero() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.balance(&Address::account([1u8; 20])), 0);
    }

    #[test]
    fn test_set_and_read_back() {
        let mut ledger = MemoryLedger::new();
        let owner = Address::account([2u8; 20]);

        ledger.set_balance(&owner, 500).unwrap();
        assert_eq!(ledger.balance(&owner), 500);

        ledger.set_balance(&owner, 0).unwrap();
        // A zero balance stays a valid entry, it does not error.
        assert_eq!(ledger.balance(&owner), 0);
    }

    #[test]
    fn test_circulating_sums_all_entries() {
        let mut ledger = MemoryLedger::new();
        ledger.set_balance(&Address::account([1u8; 20]), 300).unwrap();
        ledger.set_balance(&Address::account([2u8; 20]), 700).unwrap();
        assert_eq!(ledger.circulating(), 1000);
    }

    #[test]
    fn test_nonce_tracking() {
        let mut ledger = MemoryLedger::new();
        let owner = Address::account([3u8; 20]);

        assert!(!ledger.nonce_used(&owner, 1));
        ledger.mark_nonce(&owner, 1).unwrap();
        assert!(ledger.nonce_used(&owner, 1));
        // Per-owner, not global.
        assert!(!ledger.nonce_used(&Address::account([4u8; 20]), 1));
    }

    #[test]
    fn test_initialized_flag() {
        let mut ledger = MemoryLedger::new();
        assert!(!ledger.initialized());
        ledger.set_initialized().unwrap();
        assert!(ledger.initialized());
    }
}
