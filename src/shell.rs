//! Interactive terminal front end.
//!
//! The shell binds typed commands to controller operations and re-renders
//! the home view whenever the view state or the theme changes. Loads and
//! refreshes run as background tasks, so the prompt stays usable while a
//! refresh waits for the server to re-aggregate.

use crate::api::{NewsProvider, SubscriptionProvider};
use crate::controllers::news::NewsViewController;
use crate::controllers::subscription::{
    AVAILABLE_CATEGORIES, DialogHandle, DialogOutcome, SubmitOutcome, SubscriptionForm,
};
use crate::controllers::theme::ThemeController;
use crate::routes::Route;
use crate::view;
use chrono::Utc;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

const HELP: &str = "\
Commands:
  load                         reload the current aggregation
  refresh                      ask the server to re-aggregate, then reload
  category <name|all>          filter the view
  theme                        toggle light/dark mode
  subscribe <email> <cat>...   subscribe to category digests (retries an open dialog)
  cancel                       close an open subscription dialog
  open <path>                  open a view: /, /subscribed, /unsubscribed
  help                         show this help
  quit                         leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Load,
    Refresh,
    Category(String),
    Theme,
    Subscribe { email: String, categories: Vec<String> },
    Cancel,
    Open(String),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl ShellCommand {
    pub fn parse(line: &str) -> Self {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return ShellCommand::Empty;
        };
        match command.to_lowercase().as_str() {
            "load" | "l" => ShellCommand::Load,
            "refresh" | "r" => ShellCommand::Refresh,
            "category" | "c" => {
                ShellCommand::Category(words.next().unwrap_or("all").to_string())
            }
            "theme" | "t" => ShellCommand::Theme,
            "subscribe" | "s" => ShellCommand::Subscribe {
                email: words.next().unwrap_or_default().to_string(),
                categories: words.map(str::to_string).collect(),
            },
            "cancel" => ShellCommand::Cancel,
            "open" | "o" => ShellCommand::Open(words.next().unwrap_or("/").to_string()),
            "help" | "h" | "?" => ShellCommand::Help,
            "quit" | "q" | "exit" => ShellCommand::Quit,
            other => ShellCommand::Unknown(other.to_string()),
        }
    }
}

/// Fill `form` with `email` and exactly `categories`, then submit it.
///
/// Categories selected by an earlier attempt but missing from `categories`
/// are deselected, so retrying an open dialog sends what was typed last.
pub async fn fill_and_submit<S: SubscriptionProvider>(
    form: &SubscriptionForm<S>,
    email: &str,
    categories: &[String],
) -> SubmitOutcome {
    form.set_email(email);
    for category in categories {
        if !AVAILABLE_CATEGORIES.contains(&category.as_str()) {
            warn!(%category, "Not one of the offered categories; sending anyway");
        }
        if !form.is_selected(category) {
            form.toggle_category(category);
        }
    }
    let stale: Vec<String> = form
        .state()
        .categories
        .into_iter()
        .filter(|category| !categories.contains(category))
        .collect();
    for category in &stale {
        form.toggle_category(category);
    }

    let outcome = form.submit().await;
    if let SubmitOutcome::Rejected(failure) = &outcome {
        println!("Cannot subscribe: {failure}");
    }
    print!("{}", view::render_form(&form.state()));
    outcome
}

/// Wait for the dialog to close and pick the route to show next: the
/// subscribed confirmation on success, home otherwise.
pub async fn close_route(handle: DialogHandle) -> Route {
    match handle.closed().await {
        DialogOutcome::Subscribed { message } => {
            info!(%message, "Subscription dialog closed");
            Route::Subscribed
        }
        DialogOutcome::Dismissed => Route::Home,
    }
}

/// One-shot subscription for the `subscribe` subcommand.
///
/// There is no second attempt from the command line, so a dialog that did
/// not subscribe is cancelled. The interactive shell keeps it open instead.
pub async fn run_subscription<P, S>(
    home: &NewsViewController<P>,
    provider: S,
    email: &str,
    categories: &[String],
) -> Route
where
    P: NewsProvider,
    S: SubscriptionProvider,
{
    let (form, handle) = home.open_subscription(provider);
    if fill_and_submit(&form, email, categories).await != SubmitOutcome::Subscribed {
        form.cancel();
    }
    close_route(handle).await
}

/// Run the shell until `quit` or end of input.
pub async fn run<P, S>(
    home: Arc<NewsViewController<P>>,
    theme: Arc<ThemeController>,
    subscriptions: S,
) -> io::Result<()>
where
    P: NewsProvider + 'static,
    S: SubscriptionProvider + Clone,
{
    let (theme_tx, mut theme_rx) = mpsc::unbounded_channel();
    let observer = theme.subscribe(move |is_dark_mode| {
        let _ = theme_tx.send(is_dark_mode);
    });

    let mut state_rx = home.subscribe();
    let mut is_dark_mode = theme.is_dark_mode();
    let renderer = tokio::spawn(async move {
        loop {
            tokio::select! {
                changed = state_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                mode = theme_rx.recv() => {
                    match mode {
                        Some(mode) => is_dark_mode = mode,
                        None => break,
                    }
                }
            }
            let state = state_rx.borrow_and_update().clone();
            print!("{}", view::render_home(&state, is_dark_mode, Utc::now()));
        }
    });

    println!("{HELP}\n");
    spawn_load(&home);

    let mut dialog: Option<(SubscriptionForm<S>, DialogHandle)> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = ShellCommand::parse(&line);
        debug!(?command, "Shell command");
        match command {
            ShellCommand::Load => spawn_load(&home),
            ShellCommand::Refresh => {
                let home = Arc::clone(&home);
                tokio::spawn(async move { home.refresh().await });
            }
            ShellCommand::Category(category) => home.select_category(category),
            ShellCommand::Theme => {
                theme.toggle_theme();
            }
            ShellCommand::Subscribe { email, categories } => {
                let (form, handle) = dialog
                    .take()
                    .unwrap_or_else(|| home.open_subscription(subscriptions.clone()));
                if fill_and_submit(&form, &email, &categories).await == SubmitOutcome::Subscribed {
                    if let Some(text) = view::render_confirmation(close_route(handle).await) {
                        println!("{text}");
                    }
                } else {
                    println!("The dialog is still open: run subscribe again to retry, or cancel.");
                    dialog = Some((form, handle));
                }
            }
            ShellCommand::Cancel => match dialog.take() {
                Some((form, handle)) => {
                    form.cancel();
                    close_route(handle).await;
                }
                None => println!("No subscription dialog is open."),
            },
            ShellCommand::Open(path) => match Route::resolve(&path) {
                Route::Home => spawn_load(&home),
                route => println!("{}", view::render_confirmation(route).unwrap_or_default()),
            },
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Empty => {}
            ShellCommand::Unknown(command) => println!("Unknown command {command:?}; type help"),
        }
    }

    if let Some((form, _)) = dialog.take() {
        form.cancel();
    }
    home.teardown();
    theme.unsubscribe(observer);
    renderer.abort();
    Ok(())
}

fn spawn_load<P: NewsProvider + 'static>(home: &Arc<NewsViewController<P>>) {
    let home = Arc::clone(home);
    tokio::spawn(async move { home.load().await });
}
