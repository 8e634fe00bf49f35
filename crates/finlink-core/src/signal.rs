use std::time::Duration;
use tokio::sync::watch;

/// A lightweight cooperative cancellation signal.
///
/// A caller-supplied signal can be combined with a per-call timeout, and the
/// combination cancels when either source fires. This crate only carries the signal
/// itself; `finlink-collab::cancel::compose` builds the combination.
#[derive(Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal fires (or immediately if it already has).
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if *rx.borrow() {
            return;
        }
        let _ = rx.changed().await;
    }

    /// A signal that never fires on its own — used when a caller has no
    /// cancellation source of its own.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }
}

/// Owning half of a [`CancelSignal`]; dropping it or calling [`cancel`] fires
/// the signal for every clone of the paired receiver.
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn new() -> (Self, CancelSignal) {
        let (tx, rx) = watch::channel(false);
        (Self { tx }, CancelSignal { rx })
    }

    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Race a future against a signal + timeout, returning `None` on cancellation
/// or timeout expiry. Used by provider adapters and the artifact writer.
pub async fn run_with_cancel<F, T>(signal: &CancelSignal, timeout: Duration, fut: F) -> Option<T>
where
    F: std::future::Future<Output = T>,
{
    tokio::select! {
        res = fut => Some(res),
        _ = signal.cancelled() => None,
        _ = tokio::time::sleep(timeout) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn never_signal_does_not_cancel_a_fast_future() {
        let signal = CancelSignal::never();
        let result = run_with_cancel(&signal, Duration::from_millis(50), async { 42 }).await;
        assert_eq!(result, Some(42));
    }

    #[tokio::test]
    async fn explicit_cancel_short_circuits_a_pending_future() {
        let (handle, signal) = CancelHandle::new();
        handle.cancel();
        let result = run_with_cancel(&signal, Duration::from_secs(5), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            1
        })
        .await;
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn timeout_fires_before_a_slow_future_completes() {
        let signal = CancelSignal::never();
        let result = run_with_cancel(&signal, Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            1
        })
        .await;
        assert_eq!(result, None);
    }
}
