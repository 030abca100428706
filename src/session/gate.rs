//! Single-slot rendezvous between a suspended checkpoint and the operator.
//!
//! The gate is either idle or holds exactly one waiting checkpoint. A signal
//! with nothing waiting is dropped rather than remembered, so an extra
//! resume click can never let a later checkpoint skip its pause.

use tokio::sync::oneshot;

/// Receiver a checkpoint awaits until it is released.
pub type Release = oneshot::Receiver<()>;

/// Holds at most one pending resume.
#[derive(Debug, Default)]
pub struct ContinuationGate {
    slot: Option<oneshot::Sender<()>>,
}

impl ContinuationGate {
    /// Create an idle gate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a waiter and return the handle the checkpoint suspends on.
    ///
    /// A slot whose waiter has already gone away is treated as idle.
    ///
    /// # Panics
    ///
    /// Panics if a live checkpoint is already waiting; checkpoints must be
    /// issued one at a time.
    pub fn arm(&mut self) -> Release {
        assert!(
            !self.is_awaiting(),
            "checkpoint issued while another checkpoint is still waiting"
        );
        let (tx, rx) = oneshot::channel();
        self.slot = Some(tx);
        rx
    }

    /// Release the waiting checkpoint, if any.
    ///
    /// Returns `true` when a waiter was released.
    pub fn signal(&mut self) -> bool {
        match self.slot.take() {
            Some(tx) => tx.send(()).is_ok(),
            None => false,
        }
    }

    /// Release the waiting checkpoint during shutdown.
    pub fn force_release(&mut self) -> bool {
        self.signal()
    }

    /// Whether a live checkpoint is waiting.
    #[must_use]
    pub fn is_awaiting(&self) -> bool {
        self.slot.as_ref().is_some_and(|tx| !tx.is_closed())
    }
}
