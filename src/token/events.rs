//! Transfer events.
//!
//! Append-only notifications for external observers (indexers, tests).
//! The core never reads them back for any decision.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::address::Address;

/// One successful transfer, direct or relayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    pub from: Address,
    pub to: Address,
    pub value: u128,
    pub data: Vec<u8>,
}

pub trait EventSink {
    fn emit(&mut self, record: TransferRecord);
}

/// Default sink: writes records to the log stream.
#[derive(Debug, Default)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&mut self, record: TransferRecord) {
        tracing::info!(
            from = %record.from,
            to = %record.to,
            value = record.value,
            "transfer"
        );
    }
}

/// Sink that keeps every record in memory. Clones share the same buffer, so
/// a caller can hand one clone to the token service and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<TransferRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TransferRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl EventSink for MemorySink {
    fn emit(&mut self, record: TransferRecord) {
        self.records.lock().unwrap().push(record);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_shares_buffer_across_clones() {
        let sink = MemorySink::new();
        let mut handle = sink.clone();

        handle.emit(TransferRecord {
            from: Address::account([1u8; 20]),
            to: Address::account([2u8; 20]),
            value: 42,
            data: b"hello".to_vec(),
        });

        let records = sink.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 42);
        assert_eq!(records[0].data, b"hello");
    }
}
