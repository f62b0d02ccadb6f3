//! Exchange failure taxonomy.
//!
//! Integrity and precondition violations are fatal and abort before any
//! further side effect. Transport failures are surfaced to the caller and
//! never retried here — retry-after-partial-work is the caller's call.

use thiserror::Error;

use courier_core::{Digest, PublicKey};
use courier_ledger::LedgerError;

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Content hashed to something other than the agreed digest. Fatal.
    #[error("content digest mismatch: expected {expected}, stored {actual}")]
    DigestMismatch { expected: Digest, actual: Digest },

    /// The sender tried to reference an artifact its store does not hold.
    #[error("artifact {0} is not in the local attachment store")]
    ArtifactNotStored(Digest),

    /// The membership view has no identity for the counterparty key.
    #[error("no identity in the membership view for key {0}")]
    UnknownParty(PublicKey),

    /// The membership view contains no party other than self.
    #[error("no counterparty found in the membership view")]
    NoCounterparty,

    /// The attachment store could not serve the request. Retriable by the
    /// caller.
    #[error("attachment store request failed")]
    StoreUnavailable(#[source] LedgerError),

    /// The event stream ended before the exchange completed.
    #[error("event stream closed before the exchange completed")]
    StreamClosed,

    /// A finalized transaction references an artifact the store denies
    /// holding. Upstream dependency resolution is broken; not retriable.
    #[error("transaction references attachment {0} but the store reports it absent")]
    VerificationFailed(Digest),

    /// The finality service refused or could not complete the submission.
    #[error("finalization failed")]
    FinalityFailed(#[source] LedgerError),

    /// Any other RPC-boundary failure (directory lookups, subscription).
    #[error("ledger RPC failed")]
    Rpc(#[from] LedgerError),

    /// The task producing the result died before resolving its signal.
    #[error("the exchange was abandoned before a result was produced")]
    Abandoned,
}
