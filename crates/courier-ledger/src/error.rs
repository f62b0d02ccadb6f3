//! Ledger boundary errors.

use thiserror::Error;

/// Failures crossing the RPC boundary.
///
/// `Unavailable` is a transport failure — the caller may retry; nothing in
/// this crate retries silently. `Rejected` means the node answered and said
/// no. `StreamClosed` means the event feed ended.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger node unreachable: {0}")]
    Unavailable(String),

    #[error("ledger node rejected the request: {0}")]
    Rejected(String),

    #[error("transaction event stream closed")]
    StreamClosed,
}
