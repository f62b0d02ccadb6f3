//! courier-ledger — the RPC boundary to a ledger node.
//!
//! The exchange protocol never touches ledger state directly; every
//! mutation crosses this boundary and is arbitrated by the node. This crate
//! defines the four collaborator traits the protocol consumes, an HTTP
//! client implementing them against a node's control API, and an in-process
//! memory implementation used by tests and loopback demos.

pub mod boundary;
pub mod error;
pub mod memory;
pub mod rpc;

pub use boundary::{
    AttachmentStore, EventSubscription, FinalityAck, FinalityService, PartyDirectory,
    TransactionEvent, TransactionEvents,
};
pub use error::LedgerError;
pub use memory::{MemoryLedger, MemoryNode};
pub use rpc::RpcNode;
