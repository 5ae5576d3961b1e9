//! Relay-authorized transfers: envelope schema and authorization pipeline.

pub mod envelope;
pub mod pipeline;

pub use envelope::{build_signed, DecodeError, RelayEnvelope, RelayParams, RemoteCall, SignError};
pub use pipeline::{Receipt, RelayError};
