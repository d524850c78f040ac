//! Command-line interface definitions for the Newsy client.
//!
//! Global options configure the API connection and the initial theme; they
//! can also be supplied through environment variables. Without a subcommand
//! the client starts an interactive shell.

use clap::{Parser, Subcommand};

/// Command-line arguments for the Newsy client.
///
/// # Examples
///
/// ```sh
/// # Interactive shell against a local server
/// newsy
///
/// # Show technology news after asking the server to re-aggregate
/// newsy --api-url https://newsy.example.com news --category technology --refresh
///
/// # Subscribe to two digests
/// newsy subscribe --email me@example.com --category sports --category business
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Base URL of the Newsy API
    #[arg(long, env = "NEWSY_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Delay between triggering a re-aggregation and reloading, in milliseconds
    #[arg(long, env = "NEWSY_REFRESH_DELAY_MS", default_value_t = 2000)]
    pub refresh_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, env = "NEWSY_REQUEST_TIMEOUT_SECS", default_value_t = 20)]
    pub request_timeout_secs: u64,

    /// Start in dark mode
    #[arg(long, env = "NEWSY_DARK_MODE")]
    pub dark_mode: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Show aggregated news
    News {
        /// Only show this category ("all" shows every category)
        #[arg(short, long, default_value = "all")]
        category: String,

        /// Trigger a server-side re-aggregation first
        #[arg(short, long)]
        refresh: bool,
    },

    /// Subscribe an email address to category digests
    Subscribe {
        #[arg(short, long)]
        email: String,

        /// Category to subscribe to; repeat for several
        #[arg(short, long = "category", required = true)]
        categories: Vec<String>,
    },

    /// Open a view by path ("/", "/subscribed", "/unsubscribed")
    Open {
        #[arg(default_value = "/")]
        path: String,
    },
}
