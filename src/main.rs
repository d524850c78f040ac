//! # Newsy Client
//!
//! A terminal client for the Newsy news aggregator. It shows aggregated
//! articles grouped by category, asks the server to re-aggregate on demand,
//! switches between light and dark display modes, and subscribes an email
//! address to category digests.
//!
//! ## Usage
//!
//! ```sh
//! newsy                                   # interactive shell
//! newsy news --category sports --refresh  # one-shot view
//! newsy subscribe -e me@example.com -c sports -c business
//! newsy open /unsubscribed
//! ```
//!
//! ## Architecture
//!
//! - **Controllers** (`controllers`): news view, subscription form and theme
//!   state machines; all client logic lives here
//! - **Providers** (`api`): HTTP implementations of the news and subscription
//!   seams the controllers depend on
//! - **Presentation** (`view`, `shell`, `routes`): renders controller state and
//!   binds commands to controller operations

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod controllers;
mod error;
mod models;
mod routes;
mod shell;
mod utils;
mod view;

use api::{HttpNewsProvider, HttpSubscriptionProvider, NewsProvider, build_http_client};
use cli::{Cli, Command};
use config::ClientConfig;
use controllers::news::{ALL_CATEGORIES, NewsViewController};
use controllers::theme::ThemeController;
use routes::Route;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    let config = ClientConfig::from_cli(&args)?;
    info!(
        api = %config.api_base_url,
        refresh_delay_ms = config.refresh_delay.as_millis() as u64,
        dark_mode = config.dark_mode,
        "newsy starting up"
    );

    let client = build_http_client(config.request_timeout)?;
    let news = HttpNewsProvider::new(client.clone(), config.api_base_url.clone());
    let subscriptions = HttpSubscriptionProvider::new(client, config.api_base_url.clone());

    let theme = Arc::new(ThemeController::new(config.dark_mode));
    let home = Arc::new(NewsViewController::new(news).with_refresh_delay(config.refresh_delay));

    match args.command {
        None => shell::run(Arc::clone(&home), Arc::clone(&theme), subscriptions).await?,
        Some(Command::News { category, refresh }) => {
            show_home(&home, &theme, category, refresh).await;
        }
        Some(Command::Subscribe { email, categories }) => {
            let route = shell::run_subscription(&home, subscriptions, &email, &categories).await;
            if let Some(text) = view::render_confirmation(route) {
                println!("{text}");
            }
        }
        Some(Command::Open { path }) => match Route::resolve(&path) {
            Route::Home => show_home(&home, &theme, ALL_CATEGORIES.to_string(), false).await,
            route => {
                debug!(%route, "Rendering confirmation view");
                println!("{}", view::render_confirmation(route).unwrap_or_default());
            }
        },
    }

    home.teardown();
    Ok(())
}

/// Load (or refresh) once and print the home view.
#[instrument(level = "info", skip(home, theme))]
async fn show_home<P: NewsProvider>(
    home: &NewsViewController<P>,
    theme: &ThemeController,
    category: String,
    refresh: bool,
) {
    home.select_category(category);
    let outcome = if refresh {
        home.refresh().await
    } else {
        home.load().await
    };
    debug!(?outcome, "Home view settled");
    print!(
        "{}",
        view::render_home(&home.state(), theme.is_dark_mode(), Utc::now())
    );
}
