//! Home view controller: loading, refreshing and filtering aggregated news.
//!
//! # Lifecycle
//!
//! ```text
//!            load() / refresh()
//!   Idle ───────────────────────▶ Loading ──ok──▶ Loaded(data)
//!                                    │
//!                                    └──err──▶ Failed(message)
//! ```
//!
//! `Loaded` and `Failed` both accept another `load()`/`refresh()`. A failed
//! load keeps the previous data so the view can keep showing it next to the
//! error.
//!
//! # Sequencing
//!
//! Every `load()`/`refresh()` takes a ticket from a per-controller counter.
//! When a response arrives, it is applied only if its ticket is still the
//! latest one; older responses are dropped. After [`NewsViewController::teardown`]
//! nothing is applied at all.

use super::Lifetime;
use super::subscription::{DialogHandle, SubscriptionForm};
use crate::api::{NewsProvider, SubscriptionProvider};
use crate::models::{NewsArticle, NewsResponse};
use crate::utils::category_key;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, instrument, warn};

pub const LOAD_FAILED_MESSAGE: &str = "Failed to load news. Please try again later.";
pub const REFRESH_FAILED_MESSAGE: &str = "Failed to fetch latest news.";

/// The pseudo-category selecting every group.
pub const ALL_CATEGORIES: &str = "all";

/// Time the server is given to re-aggregate before the client reloads.
pub const DEFAULT_REFRESH_DELAY: Duration = Duration::from_millis(2000);

/// Everything the home view renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub news_data: Option<Arc<NewsResponse>>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected_category: String,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            news_data: None,
            loading: false,
            error: None,
            selected_category: ALL_CATEGORIES.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

impl ViewState {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.news_data.is_some() {
            Phase::Loaded
        } else {
            Phase::Idle
        }
    }

    /// Articles for the selected category; see [`filter_news`].
    pub fn filtered_news(&self) -> Vec<NewsArticle> {
        self.news_data
            .as_deref()
            .map(|data| {
                filter_news(data, &self.selected_category)
                    .into_iter()
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Project `data` onto `selected`.
///
/// `"all"` concatenates every group in key order. Anything else is compared
/// against the keys after [`category_key`] normalization on both sides;
/// no match yields an empty list.
pub fn filter_news<'a>(data: &'a NewsResponse, selected: &str) -> Vec<&'a NewsArticle> {
    if selected.trim().eq_ignore_ascii_case(ALL_CATEGORIES) {
        return data.iter().flat_map(|(_, articles)| articles).collect();
    }
    let wanted = category_key(selected);
    data.iter()
        .filter(|(key, _)| category_key(key) == wanted)
        .flat_map(|(_, articles)| articles)
        .collect()
}

/// How a `load()` or `refresh()` call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// The response was applied to the view state.
    Loaded,
    /// The provider failed and the error message was applied.
    Failed,
    /// A newer request was issued meanwhile; this response was dropped.
    Superseded,
    /// The controller was torn down before the response arrived.
    TornDown,
}

pub struct NewsViewController<P> {
    provider: P,
    refresh_delay: Duration,
    state: watch::Sender<ViewState>,
    sequence: AtomicU64,
    lifetime: Lifetime,
}

impl<P: NewsProvider> NewsViewController<P> {
    pub fn new(provider: P) -> Self {
        let (state, _) = watch::channel(ViewState::default());
        Self {
            provider,
            refresh_delay: DEFAULT_REFRESH_DELAY,
            state,
            sequence: AtomicU64::new(0),
            lifetime: Lifetime::new(),
        }
    }

    pub fn with_refresh_delay(mut self, refresh_delay: Duration) -> Self {
        self.refresh_delay = refresh_delay;
        self
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> ViewState {
        self.state.borrow().clone()
    }

    pub fn select_category(&self, category: impl Into<String>) {
        let category = category.into();
        debug!(%category, "Category selected");
        self.state
            .send_modify(|state| state.selected_category = category);
    }

    pub fn filtered_news(&self) -> Vec<NewsArticle> {
        self.state.borrow().filtered_news()
    }

    /// Read the current aggregation and replace the view's data with it.
    #[instrument(level = "info", skip_all)]
    pub async fn load(&self) -> RequestOutcome {
        if self.lifetime.is_ended() {
            return RequestOutcome::TornDown;
        }
        let ticket = self.begin();
        self.read(ticket).await
    }

    /// Ask the server to re-aggregate, wait for the refresh delay, then load.
    #[instrument(level = "info", skip_all)]
    pub async fn refresh(&self) -> RequestOutcome {
        if self.lifetime.is_ended() {
            return RequestOutcome::TornDown;
        }
        let ticket = self.begin();

        match self.lifetime.guard(self.provider.trigger_aggregation()).await {
            None => self.dropped(ticket),
            Some(Err(e)) => {
                warn!(ticket, error = %e, "Error fetching news");
                self.settle(ticket, RequestOutcome::Failed, |state| {
                    state.error = Some(REFRESH_FAILED_MESSAGE.to_string());
                    state.loading = false;
                })
            }
            Some(Ok(())) => {
                // A later load() does not cancel this; the delayed load takes
                // its own ticket and wins if it lands last.
                info!(
                    ticket,
                    delay_ms = self.refresh_delay.as_millis() as u64,
                    "Aggregation triggered; reloading after delay"
                );
                if self.lifetime.guard(sleep(self.refresh_delay)).await.is_none() {
                    return self.dropped(ticket);
                }
                self.load().await
            }
        }
    }

    /// End this controller's lifetime. Pending responses and delays become no-ops.
    pub fn teardown(&self) {
        if self.lifetime.end() {
            info!("News view torn down");
        }
    }

    /// Launch the subscription dialog as an independent child.
    ///
    /// The returned handle resolves once the dialog closes; the dialog's
    /// lifetime does not depend on this view's.
    pub fn open_subscription<S: SubscriptionProvider>(
        &self,
        provider: S,
    ) -> (SubscriptionForm<S>, DialogHandle) {
        info!("Opening subscription dialog");
        SubscriptionForm::open(provider)
    }

    fn begin(&self) -> u64 {
        let ticket = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.loading = true;
            state.error = None;
        });
        debug!(ticket, "Request started");
        ticket
    }

    async fn read(&self, ticket: u64) -> RequestOutcome {
        let t0 = Instant::now();
        match self.lifetime.guard(self.provider.read_aggregated_news()).await {
            None => self.dropped(ticket),
            Some(Ok(data)) => {
                let categories = data.len();
                let articles = data.total_articles();
                let outcome = self.settle(ticket, RequestOutcome::Loaded, |state| {
                    state.news_data = Some(Arc::new(data));
                    state.loading = false;
                });
                if outcome == RequestOutcome::Loaded {
                    info!(
                        ticket,
                        categories,
                        articles,
                        elapsed_ms = t0.elapsed().as_millis() as u64,
                        "News loaded"
                    );
                }
                outcome
            }
            Some(Err(e)) => {
                warn!(ticket, error = %e, "Error loading news");
                self.settle(ticket, RequestOutcome::Failed, |state| {
                    state.error = Some(LOAD_FAILED_MESSAGE.to_string());
                    state.loading = false;
                })
            }
        }
    }

    /// Apply `update` if `ticket` is still the latest request and the view is alive.
    fn settle(
        &self,
        ticket: u64,
        outcome: RequestOutcome,
        update: impl FnOnce(&mut ViewState),
    ) -> RequestOutcome {
        let applied = self.state.send_if_modified(|state| {
            if self.lifetime.is_ended() || self.sequence.load(Ordering::SeqCst) != ticket {
                return false;
            }
            update(state);
            true
        });
        if applied { outcome } else { self.dropped(ticket) }
    }

    fn dropped(&self, ticket: u64) -> RequestOutcome {
        if self.lifetime.is_ended() {
            debug!(ticket, "Response arrived after teardown; ignored");
            RequestOutcome::TornDown
        } else {
            debug!(
                ticket,
                latest = self.sequence.load(Ordering::SeqCst),
                "Stale response discarded"
            );
            RequestOutcome::Superseded
        }
    }
}
