//! Light/dark display mode shared by every view.
//!
//! One [`ThemeController`] exists per client session and is handed out by
//! `Arc` reference. Observers register callbacks and get the current value
//! right away, then every change, synchronously and in subscription order.
//!
//! # Delivery
//!
//! Values are queued under the state lock in the order they were produced
//! and delivered by one thread at a time, outside the lock. An observer
//! therefore never sees an older value after a newer one, even when
//! `subscribe` and `toggle_theme` race on different threads. A toggle made
//! from inside an observer is delivered after the current round finishes.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info};

type Observer = Arc<dyn Fn(bool) + Send + Sync>;

/// Handle returned by [`ThemeController::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObserverId(u64);

/// One value bound for the observers that were registered when it was produced.
struct Delivery {
    observers: Vec<Observer>,
    is_dark_mode: bool,
}

struct ThemeInner {
    is_dark_mode: bool,
    next_id: u64,
    // Ids are allocated in increasing order, so iteration order is
    // subscription order.
    observers: BTreeMap<ObserverId, Observer>,
    pending: VecDeque<Delivery>,
    delivering: bool,
}

pub struct ThemeController {
    inner: Mutex<ThemeInner>,
}

impl ThemeController {
    pub fn new(is_dark_mode: bool) -> Self {
        Self {
            inner: Mutex::new(ThemeInner {
                is_dark_mode,
                next_id: 0,
                observers: BTreeMap::new(),
                pending: VecDeque::new(),
                delivering: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ThemeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_dark_mode(&self) -> bool {
        self.lock().is_dark_mode
    }

    /// Register `observer` and deliver the current value to it.
    ///
    /// Unless another thread is mid-delivery, the value has been delivered
    /// by the time this returns.
    pub fn subscribe<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        let observer: Observer = Arc::new(observer);
        let (id, current) = {
            let mut inner = self.lock();
            let id = ObserverId(inner.next_id);
            inner.next_id += 1;
            inner.observers.insert(id, Arc::clone(&observer));
            let current = inner.is_dark_mode;
            inner.pending.push_back(Delivery {
                observers: vec![observer],
                is_dark_mode: current,
            });
            (id, current)
        };
        debug!(observer = id.0, is_dark_mode = current, "Theme observer subscribed");
        self.deliver();
        id
    }

    /// Returns `false` if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let removed = self.lock().observers.remove(&id).is_some();
        debug!(observer = id.0, removed, "Theme observer unsubscribed");
        removed
    }

    /// Flip the display mode and notify every observer. Returns the new value.
    pub fn toggle_theme(&self) -> bool {
        let (is_dark_mode, observers) = {
            let mut inner = self.lock();
            inner.is_dark_mode = !inner.is_dark_mode;
            let observers: Vec<Observer> = inner.observers.values().cloned().collect();
            let count = observers.len();
            let is_dark_mode = inner.is_dark_mode;
            inner.pending.push_back(Delivery {
                observers,
                is_dark_mode,
            });
            (is_dark_mode, count)
        };
        info!(is_dark_mode, observers, "Theme toggled");
        self.deliver();
        is_dark_mode
    }

    /// Drain the pending queue unless another caller is already draining it.
    fn deliver(&self) {
        {
            let mut inner = self.lock();
            if inner.delivering {
                return;
            }
            inner.delivering = true;
        }
        loop {
            let next = {
                let mut inner = self.lock();
                match inner.pending.pop_front() {
                    Some(delivery) => delivery,
                    None => {
                        inner.delivering = false;
                        return;
                    }
                }
            };
            for observer in &next.observers {
                observer(next.is_dark_mode);
            }
        }
    }
}

impl std::fmt::Debug for ThemeController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("ThemeController")
            .field("is_dark_mode", &inner.is_dark_mode)
            .field("observers", &inner.observers.len())
            .field("pending", &inner.pending.len())
            .finish()
    }
}
