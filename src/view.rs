//! Terminal rendering of controller state.
//!
//! Everything here is presentation: it reads state snapshots and produces
//! text. No function in this module calls a provider or mutates a
//! controller.

use crate::controllers::news::{ALL_CATEGORIES, Phase, ViewState};
use crate::controllers::subscription::{AVAILABLE_CATEGORIES, FormPhase, FormState};
use crate::models::NewsArticle;
use crate::routes::Route;
use crate::utils::category_key;
use chrono::{DateTime, NaiveDateTime, Utc};
use console::Style;
use itertools::Itertools;
use std::fmt::Write;

pub const TITLE: &str = "Newsy - Daily News Aggregator";

const FALLBACK_IMAGE: &str = "https://images.unsplash.com/photo-1504711434969-e33886168f5c?w=800";

/// Lead image to show when an article has none.
pub fn default_image_for_category(category: &str) -> &'static str {
    match category.to_lowercase().as_str() {
        "technology" => "https://images.unsplash.com/photo-1518770660439-4636190af475?w=800",
        "sports" => "https://images.unsplash.com/photo-1461896836934-ffe607ba8211?w=800",
        "business" => "https://images.unsplash.com/photo-1486406146926-c627a92ad1ab?w=800",
        "education" => "https://images.unsplash.com/photo-1506748686214-e9df14d4d9d0?w=800",
        "entertainment" => "https://images.unsplash.com/photo-1517841905240-472988babdf9?w=800",
        _ => FALLBACK_IMAGE,
    }
}

fn parse_published(published_at: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(published_at) {
        return Some(dt.with_timezone(&Utc));
    }
    // The server sends zone-less local timestamps; treat them as UTC.
    NaiveDateTime::parse_from_str(published_at, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Relative age of an article: `"5m ago"`, `"3h ago"`, `"2d ago"`, or the
/// date once it is a week old. Unparseable timestamps are shown as-is.
pub fn format_age(published_at: &str, now: DateTime<Utc>) -> String {
    let Some(published) = parse_published(published_at) else {
        return published_at.to_string();
    };
    let age = now.signed_duration_since(published);
    let minutes = age.num_minutes().max(0);
    if minutes < 60 {
        format!("{minutes}m ago")
    } else if age.num_hours() < 24 {
        format!("{}h ago", age.num_hours())
    } else if age.num_days() < 7 {
        format!("{}d ago", age.num_days())
    } else {
        published.format("%Y-%m-%d").to_string()
    }
}

/// Colors for one display mode.
struct Palette {
    heading: Style,
    accent: Style,
    muted: Style,
    error: Style,
}

impl Palette {
    fn for_mode(is_dark_mode: bool) -> Self {
        if is_dark_mode {
            Self {
                heading: Style::new().white().bold(),
                accent: Style::new().yellow(),
                muted: Style::new().dim(),
                error: Style::new().red().bright(),
            }
        } else {
            Self {
                heading: Style::new().blue().bold(),
                accent: Style::new().cyan(),
                muted: Style::new().black().bright(),
                error: Style::new().red(),
            }
        }
    }
}

fn render_tabs(out: &mut String, state: &ViewState, palette: &Palette) {
    let Some(data) = state.news_data.as_deref() else {
        return;
    };
    let selected = category_key(&state.selected_category);
    let all_selected = state.selected_category.trim().eq_ignore_ascii_case(ALL_CATEGORIES);
    let tab = |label: String, active: bool| {
        if active {
            palette.accent.apply_to(format!("[{label}]")).to_string()
        } else {
            format!(" {label} ")
        }
    };

    let tabs = std::iter::once(tab(format!("All ({})", data.total_articles()), all_selected))
        .chain(data.iter().map(|(category, articles)| {
            let active = !all_selected && category_key(category) == selected;
            tab(format!("{category} ({})", articles.len()), active)
        }))
        .join(" ");
    let _ = writeln!(out, "{tabs}\n");
}

fn render_article(out: &mut String, article: &NewsArticle, palette: &Palette, now: DateTime<Utc>) {
    let image = article
        .image_url
        .as_deref()
        .unwrap_or_else(|| default_image_for_category(&article.category));
    let meta = [
        Some(article.category.clone()),
        article.source.clone(),
        Some(format_age(&article.published_at, now)),
    ]
    .into_iter()
    .flatten()
    .join(" · ");

    let _ = writeln!(out, "• {}", palette.heading.apply_to(&article.title));
    let _ = writeln!(out, "  {}", palette.muted.apply_to(meta));
    if let Some(description) = &article.description {
        let _ = writeln!(out, "  {description}");
    }
    let _ = writeln!(out, "  {}", palette.accent.apply_to(&article.url));
    let _ = writeln!(out, "  {}", palette.muted.apply_to(format!("image: {image}")));
}

/// Render the home view.
pub fn render_home(state: &ViewState, is_dark_mode: bool, now: DateTime<Utc>) -> String {
    let palette = Palette::for_mode(is_dark_mode);
    let mut out = String::new();
    let mode = if is_dark_mode { "dark" } else { "light" };
    let _ = writeln!(out, "{}  ({mode} mode)\n", palette.heading.apply_to(TITLE));

    render_tabs(&mut out, state, &palette);

    if let Some(error) = &state.error {
        let _ = writeln!(out, "{}", palette.error.apply_to(format!("! {error}")));
    }

    match state.phase() {
        Phase::Loading => {
            let _ = writeln!(out, "{}", palette.muted.apply_to("Loading news..."));
        }
        Phase::Idle => {
            let _ = writeln!(out, "{}", palette.muted.apply_to("No news loaded yet."));
        }
        Phase::Loaded | Phase::Failed => {}
    }

    // Stale data stays visible after a failed load.
    if state.news_data.is_some() && !state.loading {
        let articles = state.filtered_news();
        if state.news_data.as_deref().is_some_and(|data| data.is_empty()) {
            let _ = writeln!(out, "{}", palette.muted.apply_to("The server has no news yet."));
        } else if articles.is_empty() {
            let _ = writeln!(
                out,
                "{}",
                palette
                    .muted
                    .apply_to(format!("No articles in \"{}\".", state.selected_category))
            );
        }
        for article in &articles {
            render_article(&mut out, article, &palette, now);
            out.push('\n');
        }
    }
    out
}

/// Render the subscription dialog.
pub fn render_form(state: &FormState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Subscribe to the daily digest");
    let _ = writeln!(out, "  email: {}", state.email);
    for category in AVAILABLE_CATEGORIES {
        let mark = if state.categories.contains(category) { "x" } else { " " };
        let _ = writeln!(out, "  [{mark}] {category}");
    }
    match state.phase() {
        FormPhase::Editing => {}
        FormPhase::Submitting => {
            let _ = writeln!(out, "  Submitting...");
        }
        FormPhase::Done => {
            let _ = writeln!(out, "  (closed)");
        }
    }
    if let Some(message) = &state.message {
        let _ = writeln!(out, "  {message}");
    }
    out
}

/// Render the static confirmation views. Home is rendered by [`render_home`].
pub fn render_confirmation(route: Route) -> Option<&'static str> {
    match route {
        Route::Home => None,
        Route::Subscribed => Some(
            "Your subscription is confirmed. You will receive your first digest with the next edition.",
        ),
        Route::Unsubscribed => {
            Some("You have been unsubscribed. You will no longer receive digest emails.")
        }
    }
}
