//! Navigation surface: the three views the client can show.
//!
//! | Path | View |
//! |------|------|
//! | `/` | [`Route::Home`], the news view |
//! | `/subscribed` | [`Route::Subscribed`], shown after email verification |
//! | `/unsubscribed` | [`Route::Unsubscribed`], shown after leaving the digest |
//!
//! Any other path redirects to `/`.

use std::fmt;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Subscribed,
    Unsubscribed,
}

impl Route {
    /// Resolve a path (optionally with query string or fragment) to a view.
    pub fn resolve(path: &str) -> Route {
        let bare = path.split(['?', '#']).next().unwrap_or_default();
        match bare.trim_matches('/') {
            "subscribed" => Route::Subscribed,
            "unsubscribed" => Route::Unsubscribed,
            "" => Route::Home,
            other => {
                debug!(path = other, "Unknown path; redirecting home");
                Route::Home
            }
        }
    }

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Subscribed => "/subscribed",
            Route::Unsubscribed => "/unsubscribed",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
