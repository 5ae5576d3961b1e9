//! The token ledger core: store abstraction, transfer engine, events.

pub mod engine;
pub mod events;
pub mod store;

pub use engine::{Token, TokenError, TokenMetadata, TokenReceiver};
pub use events::{EventSink, LogSink, MemorySink, TransferRecord};
pub use store::{DbLedger, LedgerStore, MemoryLedger};
