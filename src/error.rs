//! Error types for the DHCPv4 client engine.
//!
//! None of these are fatal to the state machine: malformed-input errors
//! cause the offending packet to be dropped, and collaborator failures
//! degrade to "wait for the next timer and retry".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("packet too short: {0} bytes")]
    Truncated(usize),

    #[error("invalid magic cookie")]
    BadCookie,

    #[error("option {0} exceeds packet bounds")]
    TruncatedOption(u8),

    #[error("option stream missing END marker")]
    MissingEnd,

    #[error("option {code} has invalid length {len}")]
    BadOptionLength { code: u8, len: usize },

    #[error("zero-valued time in option {0}")]
    ZeroTime(u8),

    #[error("transmit failed: {0}")]
    Transmit(String),

    #[error("interface operation failed: {0}")]
    Interface(String),
}
