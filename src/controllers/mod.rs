//! State controllers: the client's core logic, independent of rendering.
//!
//! # Submodules
//!
//! - [`theme`]: Process-wide light/dark flag with synchronous observers
//! - [`news`]: Load/refresh lifecycle and category filtering for the home view
//! - [`subscription`]: Multi-select digest subscription dialog
//!
//! Controllers publish their state through `tokio::sync::watch` channels (or
//! observer callbacks for the theme) and expose their operations as plain
//! methods. Every pending provider call is raced against the controller's
//! [`Lifetime`], so a response that lands after teardown changes nothing.

use std::future::Future;
use tokio::sync::watch;

pub mod news;
pub mod subscription;
pub mod theme;

#[cfg(test)]
pub(crate) mod testing;

/// Teardown signal shared by a controller and its in-flight work.
#[derive(Debug)]
pub(crate) struct Lifetime {
    ended: watch::Sender<bool>,
}

impl Lifetime {
    pub(crate) fn new() -> Self {
        let (ended, _) = watch::channel(false);
        Self { ended }
    }

    /// End the lifetime. Returns `false` if it had already ended.
    pub(crate) fn end(&self) -> bool {
        !self.ended.send_replace(true)
    }

    pub(crate) fn is_ended(&self) -> bool {
        *self.ended.borrow()
    }

    /// Drive `fut` unless the lifetime ends first, in which case `fut` is
    /// dropped and `None` is returned. If both are ready, the end wins.
    pub(crate) async fn guard<F: Future>(&self, fut: F) -> Option<F::Output> {
        let mut ended = self.ended.subscribe();
        if *ended.borrow_and_update() {
            return None;
        }
        tokio::select! {
            biased;
            _ = ended.wait_for(|ended| *ended) => None,
            out = fut => Some(out),
        }
    }
}
