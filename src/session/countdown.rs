// src/session/countdown.rs

/// Handle to the recurring one-second tick driving an attempt.
///
/// The controller owns it while the attempt is active and calls `cancel`
/// exactly once, when the attempt enters `Submitting` or is abandoned.
pub trait Countdown: Send + Sync {
    fn cancel(&mut self);
}

impl Countdown for tokio::task::AbortHandle {
    fn cancel(&mut self) {
        self.abort();
    }
}
