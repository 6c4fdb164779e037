//! The process-wide stop primitive (`spec.md` §5 "Cancellation and
//! timeouts"): a single signal observed by the gossip loop and by every
//! pending-query waiter.

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Clone)]
pub struct Stopper {
    // Holds the sending half open; dropping it closes the channel for
    // every cloned receiver at once, which is the broadcast we want.
    tx: Arc<Mutex<Option<Sender<()>>>>,
    rx: Receiver<()>,
}

impl Stopper {
    pub fn new() -> Self {
        let (tx, rx) = bounded(0);
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
            rx,
        }
    }

    pub fn stop(&self) {
        self.tx.lock().expect("stopper lock poisoned").take();
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.rx.try_recv(), Err(TryRecvError::Disconnected))
    }

    /// Sleeps up to `dur` or until [`Stopper::stop`] is called. Returns
    /// `true` if woken by shutdown.
    pub fn wait_timeout(&self, dur: Duration) -> bool {
        !matches!(self.rx.recv_timeout(dur), Err(RecvTimeoutError::Timeout))
    }
}

impl Default for Stopper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stop_wakes_waiters_immediately() {
        let stopper = Stopper::new();
        assert!(!stopper.is_stopped());
        stopper.stop();
        assert!(stopper.is_stopped());
        assert!(stopper.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn wait_timeout_elapses_when_not_stopped() {
        let stopper = Stopper::new();
        assert!(!stopper.wait_timeout(Duration::from_millis(10)));
    }
}
