//! courier-core — shared types, configuration, and cryptographic primitives.
//! All other Courier crates depend on this one.

pub mod config;
pub mod crypto;
pub mod digest;
pub mod identity;
pub mod transaction;

pub use digest::Digest;
pub use identity::{Identity, PublicKey};
pub use transaction::{PendingTransaction, SignedTransaction, TransactionSignature};
