//! courier-exchange — the two-party attachment exchange protocol.
//!
//! One party (the sender) uploads a content-addressed artifact, references
//! it from a transaction, signs, and requests finality with a counterparty.
//! The other (the recipient) observes incoming finalized transactions and
//! resolves a single completion signal when the expected artifact arrives.
//! All ledger interaction goes through the boundary traits in
//! `courier-ledger`.

pub mod coordinator;
pub mod error;
pub mod initiator;
pub mod observer;
pub mod signal;
pub mod upload;

pub use coordinator::{ExchangeCoordinator, Role};
pub use error::ExchangeError;
pub use initiator::FinalityInitiator;
pub use observer::FinalityObserver;
pub use signal::{CompletionSignal, SignalResolver};
pub use upload::AttachmentUploader;
