//! Gate signal: "the node has an address, protocol traffic may flow".

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct GateInner {
    open: AtomicBool,
    lock: Mutex<()>,
    changed: Condvar,
}

/// Read-only handle to the connectivity gate.
///
/// Cloning is cheap; every clone observes the same gate. Only the
/// connectivity state machine can raise or lower it.
#[derive(Debug, Clone, Default)]
pub struct GateSignal {
    inner: Arc<GateInner>,
}

impl GateSignal {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// True while the station holds an IP address.
    pub fn is_set(&self) -> bool {
        self.inner.open.load(Ordering::Acquire)
    }

    /// Block until the gate is set or `timeout` elapses.
    ///
    /// Returns the gate state at wake-up.
    pub fn wait_set_timeout(&self, timeout: Duration) -> bool {
        if self.is_set() {
            return true;
        }
        let guard = match self.inner.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let result = self
            .inner
            .changed
            .wait_timeout_while(guard, timeout, |_| !self.is_set());
        drop(result);
        self.is_set()
    }

    pub(crate) fn raise(&self) {
        self.store(true);
    }

    pub(crate) fn lower(&self) {
        self.store(false);
    }

    fn store(&self, open: bool) {
        // Hold the lock so a waiter cannot miss the notification between
        // checking the flag and parking.
        let _guard = match self.inner.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.inner.open.store(open, Ordering::Release);
        self.inner.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_gate_starts_cleared() {
        let gate = GateSignal::new();
        assert!(!gate.is_set());
        assert!(!gate.wait_set_timeout(Duration::from_millis(5)));
    }

    #[test]
    fn test_clones_share_state() {
        let gate = GateSignal::new();
        let observer = gate.clone();
        gate.raise();
        assert!(observer.is_set());
        gate.lower();
        assert!(!observer.is_set());
    }

    #[test]
    fn test_waiter_wakes_on_raise() {
        let gate = GateSignal::new();
        let observer = gate.clone();
        let waiter = thread::spawn(move || observer.wait_set_timeout(Duration::from_secs(5)));
        thread::sleep(Duration::from_millis(20));
        gate.raise();
        assert!(waiter.join().unwrap());
    }
}
