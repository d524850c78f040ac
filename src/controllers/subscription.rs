//! Digest subscription dialog.
//!
//! The form collects an email address and a set of categories, then submits
//! them once. The dialog closes on success and stays open on failure so the
//! user can correct the input and retry.
//!
//! ```text
//!   Editing ──submit()──▶ Submitting ──ok──▶ Done (closed)
//!      ▲                      │
//!      └────────err───────────┘  (message set)
//! ```

use super::Lifetime;
use crate::api::SubscriptionProvider;
use crate::error::ValidationFailure;
use crate::models::SubscriptionRequest;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, instrument, warn};

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Verification email sent. Check your inbox.";
pub const DEFAULT_ERROR_MESSAGE: &str = "Error subscribing.";

/// Categories the dialog offers, in display order.
pub const AVAILABLE_CATEGORIES: [&str; 5] =
    ["sports", "technology", "business", "entertainment", "education"];

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+(?:\.[a-zA-Z0-9!#$%&'*+/=?^_`{|}~-]+)*@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$",
    )
    .unwrap()
});

/// Well-formed email predicate: at most 254 characters overall, at most 64
/// before the `@`, dot-separated atoms on the left and hostname labels on
/// the right.
pub fn is_well_formed_email(email: &str) -> bool {
    let Some((local, _)) = email.split_once('@') else {
        return false;
    };
    !email.is_empty() && email.len() <= 254 && local.len() <= 64 && EMAIL_RE.is_match(email)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    pub email: String,
    pub categories: BTreeSet<String>,
    pub submitting: bool,
    pub message: Option<String>,
    pub closed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPhase {
    Editing,
    Submitting,
    Done,
}

impl FormState {
    pub fn validate(&self) -> Result<(), ValidationFailure> {
        if !is_well_formed_email(&self.email) {
            return Err(ValidationFailure::InvalidEmail);
        }
        if self.categories.is_empty() {
            return Err(ValidationFailure::NoCategories);
        }
        Ok(())
    }

    pub fn phase(&self) -> FormPhase {
        if self.closed {
            FormPhase::Done
        } else if self.submitting {
            FormPhase::Submitting
        } else {
            FormPhase::Editing
        }
    }
}

/// How the dialog closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogOutcome {
    Subscribed { message: String },
    Dismissed,
}

/// Resolves when the dialog closes. Held by whoever opened the dialog.
#[derive(Debug)]
pub struct DialogHandle {
    rx: oneshot::Receiver<DialogOutcome>,
}

impl DialogHandle {
    /// Wait for the dialog to close. A dialog dropped without closing counts as dismissed.
    pub async fn closed(self) -> DialogOutcome {
        self.rx.await.unwrap_or(DialogOutcome::Dismissed)
    }
}

/// How a `submit()` call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Subscribed,
    Failed,
    /// Validation blocked the submission before any I/O.
    Rejected(ValidationFailure),
    /// A submission is already in flight.
    Busy,
    /// The dialog was closed before or during the submission.
    Closed,
}

pub struct SubscriptionForm<S> {
    provider: S,
    state: watch::Sender<FormState>,
    close_tx: Mutex<Option<oneshot::Sender<DialogOutcome>>>,
    lifetime: Lifetime,
}

impl<S: SubscriptionProvider> SubscriptionForm<S> {
    pub fn open(provider: S) -> (Self, DialogHandle) {
        let (state, _) = watch::channel(FormState::default());
        let (close_tx, rx) = oneshot::channel();
        let form = Self {
            provider,
            state,
            close_tx: Mutex::new(Some(close_tx)),
            lifetime: Lifetime::new(),
        };
        (form, DialogHandle { rx })
    }

    pub fn subscribe(&self) -> watch::Receiver<FormState> {
        self.state.subscribe()
    }

    pub fn state(&self) -> FormState {
        self.state.borrow().clone()
    }

    pub fn set_email(&self, email: impl Into<String>) {
        let email = email.into();
        self.state.send_if_modified(|state| {
            if state.email == email {
                return false;
            }
            state.email = email;
            true
        });
    }

    /// Add `category` if absent, remove it if present. Returns whether it is now selected.
    pub fn toggle_category(&self, category: &str) -> bool {
        let mut selected = false;
        self.state.send_modify(|state| {
            selected = state.categories.insert(category.to_string());
            if !selected {
                state.categories.remove(category);
            }
        });
        debug!(category, selected, "Category toggled");
        selected
    }

    pub fn is_selected(&self, category: &str) -> bool {
        self.state.borrow().categories.contains(category)
    }

    /// Whether the submit control should be enabled.
    pub fn is_valid(&self) -> bool {
        self.state.borrow().validate().is_ok()
    }

    #[instrument(level = "info", skip_all)]
    pub async fn submit(&self) -> SubmitOutcome {
        let mut prepared = Err(SubmitOutcome::Closed);
        self.state.send_if_modified(|state| {
            prepared = if state.closed {
                Err(SubmitOutcome::Closed)
            } else if state.submitting {
                Err(SubmitOutcome::Busy)
            } else if let Err(failure) = state.validate() {
                Err(SubmitOutcome::Rejected(failure))
            } else {
                state.submitting = true;
                Ok(SubscriptionRequest {
                    email: state.email.clone(),
                    categories: state.categories.iter().cloned().collect(),
                })
            };
            prepared.is_ok()
        });
        let request = match prepared {
            Ok(request) => request,
            Err(outcome) => {
                debug!(?outcome, "Submission not started");
                return outcome;
            }
        };

        let categories = request.categories.len();
        match self.lifetime.guard(self.provider.create_subscription(request)).await {
            None => {
                debug!("Dialog closed while submitting; response ignored");
                SubmitOutcome::Closed
            }
            Some(Ok(reply)) => {
                let message = reply
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string());
                info!(categories, "Subscription created");
                self.state.send_modify(|state| {
                    state.message = Some(message.clone());
                    state.submitting = false;
                    state.closed = true;
                });
                self.lifetime.end();
                self.signal_close(DialogOutcome::Subscribed { message });
                SubmitOutcome::Subscribed
            }
            Some(Err(e)) => {
                warn!(error = %e, "Error subscribing");
                let message = e
                    .server_message()
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or(DEFAULT_ERROR_MESSAGE)
                    .to_string();
                self.state.send_modify(|state| {
                    state.message = Some(message);
                    state.submitting = false;
                });
                SubmitOutcome::Failed
            }
        }
    }

    /// Close the dialog without subscribing. A pending submission's response is ignored.
    pub fn cancel(&self) {
        if !self.lifetime.end() {
            return;
        }
        self.state.send_modify(|state| {
            state.submitting = false;
            state.closed = true;
        });
        info!("Subscription dialog dismissed");
        self.signal_close(DialogOutcome::Dismissed);
    }

    fn signal_close(&self, outcome: DialogOutcome) {
        let tx = self
            .close_tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(tx) = tx {
            // The opener may have stopped waiting; that is fine.
            let _ = tx.send(outcome);
        }
    }
}
