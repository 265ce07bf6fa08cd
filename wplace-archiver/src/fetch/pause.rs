//! Idempotent pause gate.
//!
//! A `PauseGate` is a shared boolean that dispatchers wait on before starting
//! new work. Pausing never affects work already in flight. Both `pause` and
//! `resume` are idempotent and report whether they changed the state, so
//! concurrent callers can race on them safely: exactly one caller observes
//! the transition.

use tokio::sync::watch;

/// Shared pause/resume signal.
#[derive(Debug)]
pub struct PauseGate {
    state: watch::Sender<bool>,
}

impl Default for PauseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl PauseGate {
    /// Creates a gate in the running (not paused) state.
    pub fn new() -> Self {
        let (state, _) = watch::channel(false);
        Self { state }
    }

    /// Pauses the gate.
    ///
    /// Returns `true` if this call paused it, `false` if it was already
    /// paused.
    pub fn pause(&self) -> bool {
        self.state.send_if_modified(|paused| {
            if *paused {
                false
            } else {
                *paused = true;
                true
            }
        })
    }

    /// Resumes the gate.
    ///
    /// Returns `true` if this call resumed it, `false` if it was not paused.
    pub fn resume(&self) -> bool {
        self.state.send_if_modified(|paused| {
            if *paused {
                *paused = false;
                true
            } else {
                false
            }
        })
    }

    /// Returns true if the gate is paused.
    pub fn is_paused(&self) -> bool {
        *self.state.borrow()
    }

    /// Waits until the gate is not paused.
    ///
    /// Returns immediately when the gate is running.
    pub async fn wait_resumed(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|paused| !*paused).await;
    }
}
