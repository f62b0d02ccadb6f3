//! Courier integration test harness.
//!
//! Scenarios run end-to-end through the ExchangeCoordinator, with both
//! roles wired to an in-process MemoryLedger network. The ledger node is an
//! external collaborator in this protocol, so the boundary implementation
//! stands in for it — the exchange code under test is exactly what runs
//! against a real node's RPC API.

use courier_core::crypto::Keypair;
use courier_core::Identity;
use courier_ledger::{MemoryLedger, MemoryNode};

mod exchange;

// ── Harness ───────────────────────────────────────────────────────────────────

/// A registered party: its signing keypair and its node connection.
pub struct Party {
    pub keypair: Keypair,
    pub node: MemoryNode,
}

/// Register a party on the network under `name`.
pub fn join(network: &MemoryLedger, name: &str) -> Party {
    let keypair = Keypair::generate();
    let node = network.join(Identity::new(name, keypair.public(), "127.0.0.1:0"));
    Party { keypair, node }
}

/// Build the standard two-party network used by most scenarios.
pub fn two_party_network() -> (MemoryLedger, Party, Party) {
    let network = MemoryLedger::new();
    let alice = join(&network, "Alice");
    let bob = join(&network, "Bob");
    (network, alice, bob)
}
