//! User interrupt handling.
//!
//! The first Ctrl+C pauses dispatch through a shared [`PauseGate`]; requests
//! already in flight finish normally. Pressing Enter resumes. A second
//! Ctrl+C while paused cancels the shutdown token, which ends the current run
//! with `Interrupted`.
//!
//! The controller is constructed explicitly and handed to the queue and the
//! discovery engine; nothing is registered until [`InterruptController::start`].

use std::io::BufRead;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::fetch::PauseGate;

/// What an interrupt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// Dispatch was running and is now paused.
    Paused,
    /// Dispatch was already paused; shutdown was requested.
    Shutdown,
}

/// Owns the pause gate and shutdown token driven by Ctrl+C and Enter.
pub struct InterruptController {
    gate: Arc<PauseGate>,
    shutdown: CancellationToken,
    stdin_resume: bool,
    listener: Mutex<Option<(JoinHandle<()>, CancellationToken)>>,
}

impl Default for InterruptController {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptController {
    /// Creates a controller in the running state. Enter-to-resume is enabled.
    pub fn new() -> Self {
        Self {
            gate: Arc::new(PauseGate::new()),
            shutdown: CancellationToken::new(),
            stdin_resume: true,
            listener: Mutex::new(None),
        }
    }

    /// Enables or disables resuming with Enter on stdin.
    ///
    /// Without it, a paused run can only be resumed programmatically or
    /// ended with a second Ctrl+C.
    pub fn with_stdin_resume(mut self, enabled: bool) -> Self {
        self.stdin_resume = enabled;
        self
    }

    /// The gate dispatchers wait on.
    pub fn gate(&self) -> Arc<PauseGate> {
        self.gate.clone()
    }

    /// Token cancelled by a repeated interrupt.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Returns true while paused.
    pub fn is_paused(&self) -> bool {
        self.gate.is_paused()
    }

    /// Returns true once shutdown was requested.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Pauses dispatch. Idempotent.
    pub fn pause(&self) -> bool {
        self.gate.pause()
    }

    /// Resumes dispatch. Idempotent.
    pub fn resume(&self) -> bool {
        self.gate.resume()
    }

    /// Handles one interrupt as Ctrl+C would.
    pub fn interrupt(&self) -> InterruptAction {
        handle_interrupt(&self.gate, &self.shutdown)
    }

    /// Starts listening for Ctrl+C (and Enter, if enabled).
    ///
    /// Must be called within a Tokio runtime. Calling it again while already
    /// listening does nothing.
    pub fn start(&self) {
        let mut listener = self.listener.lock();
        if listener.is_some() {
            return;
        }

        let stop = CancellationToken::new();
        let resume_rx = self.stdin_resume.then(spawn_stdin_reader);
        let handle = tokio::spawn(listen(
            self.gate.clone(),
            self.shutdown.clone(),
            stop.clone(),
            resume_rx,
        ));
        *listener = Some((handle, stop));
        debug!(stdin_resume = self.stdin_resume, "Interrupt listener started");
    }

    /// Stops listening. The gate and token keep their current state.
    pub fn stop(&self) {
        if let Some((handle, stop)) = self.listener.lock().take() {
            stop.cancel();
            handle.abort();
            debug!("Interrupt listener stopped");
        }
    }

    /// Returns true while listening.
    pub fn is_listening(&self) -> bool {
        self.listener.lock().is_some()
    }
}

impl Drop for InterruptController {
    fn drop(&mut self) {
        self.stop();
    }
}

fn handle_interrupt(gate: &PauseGate, shutdown: &CancellationToken) -> InterruptAction {
    if gate.pause() {
        InterruptAction::Paused
    } else {
        shutdown.cancel();
        InterruptAction::Shutdown
    }
}

/// Reads stdin lines on a dedicated thread.
///
/// A blocking read cannot be cancelled, so the thread is detached and ends
/// with the process or at EOF.
fn spawn_stdin_reader() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(1);
    let spawned = std::thread::Builder::new()
        .name("stdin-resume".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                if line.is_err() || tx.blocking_send(()).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!(error = %e, "Failed to start stdin reader, Enter will not resume");
    }
    rx
}

async fn listen(
    gate: Arc<PauseGate>,
    shutdown: CancellationToken,
    stop: CancellationToken,
    mut resume_rx: Option<mpsc::Receiver<()>>,
) {
    loop {
        tokio::select! {
            _ = stop.cancelled() => break,

            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    warn!(error = %e, "Unable to listen for Ctrl+C");
                    break;
                }
                match handle_interrupt(&gate, &shutdown) {
                    InterruptAction::Paused => {
                        info!("Paused. Requests in flight will finish. Press Enter to resume or Ctrl+C again to quit");
                    }
                    InterruptAction::Shutdown => {
                        warn!("Interrupted again while paused, shutting down");
                        break;
                    }
                }
            }

            line = async { resume_rx.as_mut()?.recv().await }, if resume_rx.is_some() => {
                match line {
                    Some(()) => {
                        if gate.resume() {
                            info!("Resumed");
                        }
                    }
                    // stdin closed
                    None => resume_rx = None,
                }
            }
        }
    }
}
