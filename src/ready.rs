//! One-shot readiness signal.

use crate::error::{Error, Result};
use tokio::sync::watch;

/// Sending half, owned by the provider. Flips `false -> true` at most once.
#[derive(Debug)]
pub(crate) struct ReadySignal {
    tx: watch::Sender<bool>,
}

impl ReadySignal {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Mark as ready. Returns `false` if it already was.
    pub(crate) fn resolve(&self) -> bool {
        self.tx.send_if_modified(|ready| {
            if *ready {
                false
            } else {
                *ready = true;
                true
            }
        })
    }

    pub(crate) fn subscribe(&self) -> Ready {
        Ready {
            rx: self.tx.subscribe(),
        }
    }
}

/// Resolves once the provider has finished initializing (and, in eager
/// mode, loading every row).
///
/// Cheap to clone; every clone observes the same state. There is no built-in
/// timeout: if the backend never answers, [`wait`](Self::wait) never returns.
#[derive(Debug, Clone)]
pub struct Ready {
    rx: watch::Receiver<bool>,
}

impl Ready {
    /// `true` once initialization has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until ready. Returns immediately if it already is. Fails with
    /// [`Error::Closed`] if the provider is dropped before becoming ready.
    pub async fn wait(&self) -> Result<()> {
        let mut rx = self.rx.clone();
        let resolved = rx.wait_for(|ready| *ready).await.map(|_| ());
        resolved.map_err(|_| Error::Closed)
    }
}
