//! Async manual-reset latch used to stall the copy loop while paused.

use tokio::sync::watch;

/// Two states: signalled (waiters pass) and reset (waiters park).
///
/// `set` releases all current and future waiters until `reset` re-arms the
/// gate. Waiters are woken through the runtime, never inline on the `set`
/// caller, and dropping one waiter does not disturb the others.
pub struct PauseGate {
    tx: watch::Sender<bool>,
}

impl PauseGate {
    pub fn new(signalled: bool) -> Self {
        let (tx, _) = watch::channel(signalled);
        Self { tx }
    }

    /// Release all current and future waiters.
    pub fn set(&self) {
        self.tx.send_if_modified(|signalled| {
            if *signalled {
                false
            } else {
                *signalled = true;
                true
            }
        });
    }

    /// Re-arm the gate; only transitions when currently signalled.
    pub fn reset(&self) {
        self.tx.send_if_modified(|signalled| {
            if *signalled {
                *signalled = false;
                true
            } else {
                false
            }
        });
    }

    pub fn is_set(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve immediately if signalled, otherwise park until `set`.
    pub async fn wait(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close mid-wait.
        let _ = rx.wait_for(|signalled| *signalled).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn wait_passes_when_signalled() {
        let gate = PauseGate::new(true);
        tokio::time::timeout(Duration::from_millis(50), gate.wait())
            .await
            .expect("signalled gate should not park");
    }

    #[tokio::test]
    async fn set_releases_parked_waiter() {
        let gate = Arc::new(PauseGate::new(false));
        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.wait().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        gate.set();
        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter should be released")
            .unwrap();
    }

    #[tokio::test]
    async fn reset_rearms_after_set() {
        let gate = Arc::new(PauseGate::new(false));
        gate.set();
        gate.reset();
        assert!(!gate.is_set());

        let waiter = tokio::spawn({
            let gate = gate.clone();
            async move { gate.wait().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        gate.set();
        tokio::time::timeout(Duration::from_millis(200), waiter)
            .await
            .expect("waiter should complete exactly once")
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_waiter_does_not_disturb_others() {
        let gate = Arc::new(PauseGate::new(false));
        let dropped = Box::pin({
            let gate = gate.clone();
            async move { gate.wait().await }
        });
        drop(dropped);

        let survivor = tokio::spawn({
            let gate = gate.clone();
            async move { gate.wait().await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!survivor.is_finished());

        gate.set();
        tokio::time::timeout(Duration::from_millis(200), survivor)
            .await
            .expect("surviving waiter should be released")
            .unwrap();
    }

    #[tokio::test]
    async fn reset_is_a_noop_when_already_reset() {
        let gate = PauseGate::new(false);
        gate.reset();
        assert!(!gate.is_set());
        gate.set();
        assert!(gate.is_set());
    }
}
