//! Single-resolution completion signal.
//!
//! Each exchange produces exactly one outcome: `Ok(true)` on success,
//! `Ok(false)` on explicit mismatch, `Err` on propagated failure. The
//! signal is a oneshot channel behind a take-once latch, so a racing
//! producer cannot resolve twice — the first resolution wins and later
//! ones are dropped.

use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::ExchangeError;

/// The one outcome of an exchange.
pub type Outcome = Result<bool, ExchangeError>;

/// Consumer half: blocks (or suspends) until the exchange resolves.
#[derive(Debug)]
pub struct CompletionSignal {
    rx: oneshot::Receiver<Outcome>,
}

/// Producer half: resolves the signal at most once.
pub struct SignalResolver {
    tx: Mutex<Option<oneshot::Sender<Outcome>>>,
}

impl CompletionSignal {
    /// Create a linked resolver/signal pair.
    pub fn new() -> (SignalResolver, CompletionSignal) {
        let (tx, rx) = oneshot::channel();
        (
            SignalResolver {
                tx: Mutex::new(Some(tx)),
            },
            CompletionSignal { rx },
        )
    }

    /// Wait for the outcome.
    ///
    /// A resolver dropped without resolving means the producing task died;
    /// that surfaces as `Abandoned` rather than hanging forever.
    pub async fn wait(self) -> Outcome {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(ExchangeError::Abandoned),
        }
    }
}

impl SignalResolver {
    /// Resolve the signal. Returns whether this call was the one that
    /// resolved it; later calls are no-ops.
    pub fn resolve(&self, outcome: Outcome) -> bool {
        match self.tx.lock().unwrap().take() {
            Some(tx) => {
                // A consumer that already gave up is fine; the outcome is
                // simply dropped.
                let _ = tx.send(outcome);
                true
            }
            None => false,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.tx.lock().unwrap().is_none()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
