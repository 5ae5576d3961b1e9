//! The transfer engine.
//!
//! Owns every balance mutation: one-shot initialization and the
//! validate-then-apply transfer step, including the recipient-notification
//! callback for contract recipients and event emission. The relay pipeline
//! delegates here after establishing the authorized sender; it never touches
//! balances itself.

use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::address::Address;
use crate::storage::StorageError;
use crate::token::events::{EventSink, LogSink, TransferRecord};
use crate::token::store::LedgerStore;

/// Upper bound for the decimal precision field.
pub const MAX_DECIMALS: i32 = 21;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ReceiverError(pub String);

/// Notification hook for contract recipients. Invoked synchronously after
/// the recipient's balance has been credited; returning an error aborts the
/// whole transfer.
pub trait TokenReceiver {
    fn on_token_received(
        &mut self,
        from: &Address,
        value: u128,
        data: &[u8],
    ) -> Result<(), ReceiverError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("transfer value cannot be less than zero")]
    NegativeValue,
    #[error("initial supply cannot be less than zero")]
    NegativeSupply,
    #[error("decimals out of range: {0}")]
    DecimalsOutOfRange(i32),
    #[error("ledger is already initialized")]
    AlreadyInitialized,
    #[error("insufficient balance")]
    InsufficientBalance,
    #[error("balance overflow")]
    Overflow,
    #[error("no receiver registered for contract {0}")]
    NoReceiver(Address),
    #[error("recipient rejected the transfer: {0}")]
    CallbackRejected(String),
    #[error(transparent)]
    Store(#[from] StorageError),
}

/// Immutable token metadata, fixed at construction.
#[derive(Debug, Clone)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
}

/// The token service: ledger store, metadata, contract receivers and the
/// event sink.
///
/// Every mutation takes `&mut self`, so calls are serialized by
/// construction - a multi-step mutation (read, write, notify, emit) runs to
/// completion before any other call can observe the store.
pub struct Token<S: LedgerStore> {
    store: S,
    metadata: TokenMetadata,
    receivers: HashMap<Address, Box<dyn TokenReceiver>>,
    events: Box<dyn EventSink>,
}

impl<S: LedgerStore> Token<S> {
    pub fn new(store: S, metadata: TokenMetadata) -> Self {
        Token {
            store,
            metadata,
            receivers: HashMap::new(),
            events: Box::new(LogSink),
        }
    }

    /// Replace the default log sink.
    pub fn with_events(mut self, events: Box<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Register the notification receiver for a contract address.
    pub fn register_receiver(&mut self, contract: Address, receiver: Box<dyn TokenReceiver>) {
        self.receivers.insert(contract, receiver);
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One-shot initialization: mints `initial_supply * 10^decimals` to
    /// `owner`. The only operation that may create value.
    pub fn init(
        &mut self,
        owner: &Address,
        initial_supply: i128,
        decimals: i32,
    ) -> Result<(), TokenError> {
        if self.store.initialized() {
            return Err(TokenError::AlreadyInitialized);
        }
        if initial_supply < 0 {
            return Err(TokenError::NegativeSupply);
        }
        if !(0..=MAX_DECIMALS).contains(&decimals) {
            return Err(TokenError::DecimalsOutOfRange(decimals));
        }

        let scale = 10u128.checked_pow(decimals as u32).ok_or(TokenError::Overflow)?;
        let supply = (initial_supply as u128)
            .checked_mul(scale)
            .ok_or(TokenError::Overflow)?;

        self.store.set_decimals(decimals as u32)?;
        self.store.set_total_supply(supply)?;
        self.store.set_balance(owner, supply)?;
        self.store.set_initialized()?;

        debug!(owner = %owner, supply, decimals, "ledger initialized");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn symbol(&self) -> &str {
        &self.metadata.symbol
    }

    pub fn decimals(&self) -> u32 {
        self.store.decimals()
    }

    pub fn total_supply(&self) -> u128 {
        self.store.total_supply()
    }

    pub fn balance_of(&self, owner: &Address) -> u128 {
        self.store.balance(owner)
    }

    /// Move `value` from `from` to `to`.
    ///
    /// `from` is the authorized sender: the host boundary passes the caller
    /// identity on the direct path, the relay pipeline passes the recovered
    /// one. Omitted `data` becomes the empty byte string.
    pub fn transfer(
        &mut self,
        from: &Address,
        to: &Address,
        value: i128,
        data: Option<&[u8]>,
    ) -> Result<(), TokenError> {
        self.apply_transfer(from, to, value, data.unwrap_or(b""))
    }

    fn apply_transfer(
        &mut self,
        from: &Address,
        to: &Address,
        value: i128,
        data: &[u8],
    ) -> Result<(), TokenError> {
        if value < 0 {
            return Err(TokenError::NegativeValue);
        }
        let value = value as u128;

        let from_balance = self.store.balance(from);
        if from_balance < value {
            return Err(TokenError::InsufficientBalance);
        }

        // Debit first. The credit reads the store after this write, so a
        // self-transfer nets to zero instead of minting.
        self.store.set_balance(from, from_balance - value)?;

        let to_balance = self.store.balance(to);
        let credited = match to_balance.checked_add(value) {
            Some(v) => v,
            None => {
                self.store.set_balance(from, from_balance)?;
                return Err(TokenError::Overflow);
            }
        };
        if let Err(e) = self.store.set_balance(to, credited) {
            self.store.set_balance(from, from_balance)?;
            return Err(e.into());
        }

        // Both writes are committed before the receiver runs: it observes
        // its balance as already credited, and it holds no handle back into
        // the engine, so it cannot re-enter a transfer against the
        // just-debited balance.
        if to.is_contract() {
            if let Err(err) = self.notify(from, to, value, data) {
                self.store.set_balance(to, to_balance)?;
                self.store.set_balance(from, from_balance)?;
                return Err(err);
            }
        }

        self.events.emit(TransferRecord {
            from: *from,
            to: *to,
            value,
            data: data.to_vec(),
        });
        debug!(from = %from, to = %to, value, "transfer applied");
        Ok(())
    }

    fn notify(
        &mut self,
        from: &Address,
        to: &Address,
        value: u128,
        data: &[u8],
    ) -> Result<(), TokenError> {
        let receiver = self
            .receivers
            .get_mut(to)
            .ok_or(TokenError::NoReceiver(*to))?;
        receiver
            .on_token_received(from, value, data)
            .map_err(|e| TokenError::CallbackRejected(e.0))
    }

    /// True when `(owner, nonce)` has already authorized a relayed transfer.
    pub fn relay_nonce_used(&self, owner: &Address, nonce: u64) -> bool {
        self.store.nonce_used(owner, nonce)
    }

    /// Consume a relay nonce so the same envelope cannot replay.
    pub fn consume_relay_nonce(&mut self, owner: &Address, nonce: u64) -> Result<(), TokenError> {
        Ok(self.store.mark_nonce(owner, nonce)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::events::MemorySink;
    use crate::token::store::MemoryLedger;
    use std::sync::{Arc, Mutex};

    fn metadata() -> TokenMetadata {
        TokenMetadata {
            name: "Signet".to_string(),
            symbol: "SGT".to_string(),
        }
    }

    fn setup() -> (Token<MemoryLedger>, MemorySink, Address) {
        let sink = MemorySink::new();
        let mut token =
            Token::new(MemoryLedger::new(), metadata()).with_events(Box::new(sink.clone()));
        let owner = Address::account([0xaa; 20]);
        token.init(&owner, 1, 6).unwrap();
        (token, sink, owner)
    }

    struct Ack {
        calls: Arc<Mutex<Vec<(Address, u128, Vec<u8>)>>>,
    }

    impl TokenReceiver for Ack {
        fn on_token_received(
            &mut self,
            from: &Address,
            value: u128,
            data: &[u8],
        ) -> Result<(), ReceiverError> {
            self.calls.lock().unwrap().push((*from, value, data.to_vec()));
            Ok(())
        }
    }

    struct Reject;

    impl TokenReceiver for Reject {
        fn on_token_received(
            &mut self,
            _from: &Address,
            _value: u128,
            _data: &[u8],
        ) -> Result<(), ReceiverError> {
            Err(ReceiverError("not accepting tokens".to_string()))
        }
    }

    #[test]
    fn test_init_scales_supply() {
        let (token, _, owner) = setup();
        assert_eq!(token.balance_of(&owner), 1_000_000);
        assert_eq!(token.total_supply(), 1_000_000);
        assert_eq!(token.decimals(), 6);
        assert_eq!(token.name(), "Signet");
        assert_eq!(token.symbol(), "SGT");
    }

    #[test]
    fn test_init_runs_once() {
        let (mut token, _, owner) = setup();
        assert_eq!(
            token.init(&owner, 5, 2),
            Err(TokenError::AlreadyInitialized)
        );
        assert_eq!(token.total_supply(), 1_000_000);
    }

    #[test]
    fn test_init_validation() {
        let owner = Address::account([1u8; 20]);

        let mut token = Token::new(MemoryLedger::new(), metadata());
        assert_eq!(token.init(&owner, -1, 6), Err(TokenError::NegativeSupply));

        assert_eq!(
            token.init(&owner, 1, -1),
            Err(TokenError::DecimalsOutOfRange(-1))
        );
        assert_eq!(
            token.init(&owner, 1, 22),
            Err(TokenError::DecimalsOutOfRange(22))
        );

        // Boundary: 21 is allowed.
        token.init(&owner, 1, 21).unwrap();
        assert_eq!(token.total_supply(), 10u128.pow(21));
    }

    #[test]
    fn test_direct_transfer() {
        let (mut token, sink, owner) = setup();
        let to = Address::account([0xbb; 20]);

        token.transfer(&owner, &to, 100, None).unwrap();

        assert_eq!(token.balance_of(&owner), 999_900);
        assert_eq!(token.balance_of(&to), 100);
        assert_eq!(token.store().circulating(), token.total_supply());

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].from, owner);
        assert_eq!(records[0].to, to);
        assert_eq!(records[0].value, 100);
        assert_eq!(records[0].data, b"");
    }

    #[test]
    fn test_negative_value_rejected() {
        let (mut token, sink, owner) = setup();
        let to = Address::account([0xbb; 20]);

        assert_eq!(
            token.transfer(&owner, &to, -1, None),
            Err(TokenError::NegativeValue)
        );
        assert_eq!(token.balance_of(&owner), 1_000_000);
        assert_eq!(token.balance_of(&to), 0);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_full_balance_boundary() {
        let (mut token, _, owner) = setup();
        let to = Address::account([0xbb; 20]);
        let all = token.balance_of(&owner) as i128;

        assert_eq!(
            token.transfer(&owner, &to, all + 1, None),
            Err(TokenError::InsufficientBalance)
        );
        assert_eq!(token.balance_of(&owner), 1_000_000);
        assert_eq!(token.balance_of(&to), 0);

        token.transfer(&owner, &to, all, None).unwrap();
        assert_eq!(token.balance_of(&owner), 0);
        assert_eq!(token.balance_of(&to), 1_000_000);
    }

    #[test]
    fn test_self_transfer_is_a_net_noop() {
        let (mut token, _, owner) = setup();

        token.transfer(&owner, &owner, 500, None).unwrap();

        assert_eq!(token.balance_of(&owner), 1_000_000);
        assert_eq!(token.store().circulating(), token.total_supply());
    }

    #[test]
    fn test_contract_recipient_notified_after_credit() {
        let (mut token, _, owner) = setup();
        let contract = Address::contract([0xcc; 20]);
        let calls = Arc::new(Mutex::new(Vec::new()));
        token.register_receiver(contract, Box::new(Ack { calls: calls.clone() }));

        token
            .transfer(&owner, &contract, 250, Some(b"payload"))
            .unwrap();

        assert_eq!(token.balance_of(&contract), 250);
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], (owner, 250, b"payload".to_vec()));
    }

    #[test]
    fn test_contract_without_receiver_aborts() {
        let (mut token, sink, owner) = setup();
        let contract = Address::contract([0xcc; 20]);

        assert_eq!(
            token.transfer(&owner, &contract, 250, None),
            Err(TokenError::NoReceiver(contract))
        );
        assert_eq!(token.balance_of(&owner), 1_000_000);
        assert_eq!(token.balance_of(&contract), 0);
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_rejecting_receiver_rolls_back() {
        let (mut token, sink, owner) = setup();
        let contract = Address::contract([0xcc; 20]);
        token.register_receiver(contract, Box::new(Reject));

        let err = token.transfer(&owner, &contract, 250, None).unwrap_err();
        assert!(matches!(err, TokenError::CallbackRejected(_)));

        assert_eq!(token.balance_of(&owner), 1_000_000);
        assert_eq!(token.balance_of(&contract), 0);
        assert_eq!(token.store().circulating(), token.total_supply());
        assert!(sink.records().is_empty());
    }

    #[test]
    fn test_supply_invariant_across_operations() {
        let (mut token, _, owner) = setup();
        let b = Address::account([0xbb; 20]);
        let c = Address::account([0xcd; 20]);

        token.transfer(&owner, &b, 300, None).unwrap();
        token.transfer(&b, &c, 120, None).unwrap();
        let _ = token.transfer(&c, &b, 10_000, None); // fails, must not leak value
        token.transfer(&c, &owner, 20, Some(b"x")).unwrap();

        assert_eq!(token.store().circulating(), token.total_supply());
    }

    #[test]
    fn test_relay_nonce_bookkeeping() {
        let (mut token, _, owner) = setup();
        assert!(!token.relay_nonce_used(&owner, 7));
        token.consume_relay_nonce(&owner, 7).unwrap();
        assert!(token.relay_nonce_used(&owner, 7));
    }
}
