use std::time::Duration;

use finlink_core::{CancelHandle, CancelSignal};

/// A derived signal that fires when either the parent caller's signal fires
/// or `timeout` elapses. The background
/// watcher task is aborted on drop so composing a signal never leaks a task.
pub struct ComposedCancel {
    pub signal: CancelSignal,
    watcher: tokio::task::JoinHandle<()>,
}

impl Drop for ComposedCancel {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

/// Combines a caller-supplied signal with a per-call timeout into one signal
/// that fires on whichever happens first.
pub fn compose(parent: CancelSignal, timeout: Duration) -> ComposedCancel {
    let (handle, signal) = CancelHandle::new();

    let watcher = tokio::spawn(async move {
        tokio::select! {
            _ = parent.cancelled() => {}
            _ = tokio::time::sleep(timeout) => {}
        }
        handle.cancel();
    });

    ComposedCancel { signal, watcher }
}
