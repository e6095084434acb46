//! # reddit-daily
//!
//! Emails the top posts of the day from every subreddit an account follows,
//! one message per subreddit.
//!
//! ## Architecture
//!
//! ```text
//! Subscriptions → (per forum) Fetch → Inline CSS → Send → Notify on failure
//! ```
//!
//! - [`subscriptions`]: OAuth listing of followed forums
//! - [`fetcher`]: "top of the day" page retrieval and extraction
//! - [`render`]: CSS inlining for mail clients
//! - [`mailer`]: SMTP delivery
//! - [`notifier`]: Slack webhook on any failure
//!
//! ## Quick Start
//!
//! ```bash
//! # See what would be sent for one forum
//! reddit-daily preview rust -o rust.html
//!
//! # Send today's digests
//! reddit-daily run
//!
//! # Keep running once a day
//! reddit-daily daemon --interval 1d
//! ```

/// Application context and error types.
///
/// [`AppContext`](app::AppContext) wires configuration, secrets and
/// components into a [`Pipeline`](pipeline::Pipeline).
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/reddit-daily/config.toml`.
pub mod config;

/// Repeated runs on a fixed interval.
pub mod daemon;

/// Forum and run outcome models.
pub mod domain;

/// HTTP fetching and daily-top extraction.
///
/// - [`Fetcher`](fetcher::Fetcher): async trait for GET requests
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`DailyTopFetcher`](fetcher::DailyTopFetcher): listing page to email document
/// - [`StylePolicy`](fetcher::StylePolicy): how the email head is built
pub mod fetcher;

/// Email delivery.
pub mod mailer;

/// Failure notification.
pub mod notifier;

/// Run orchestration and per-forum fan-out.
pub mod pipeline;

/// CSS inlining.
pub mod render;

/// Fixed-delay retries.
pub mod retry;

/// Named secret lookup.
pub mod secrets;

/// Followed-forum listing.
pub mod subscriptions;
