//! One run: list subscriptions once, fan out per forum, notify on failure.

pub mod parallel;

pub use parallel::{ForumWorker, ParallelRunner};

use std::sync::Arc;

use chrono::Utc;

use crate::app::Result;
use crate::domain::{Forum, RunOutcome};
use crate::fetcher::DailyTopFetcher;
use crate::mailer::Mailer;
use crate::notifier::{failure_message, Notifier};
use crate::render::CssInliner;
use crate::retry::{retry, RetryConfig};
use crate::secrets::SecretStore;
use crate::subscriptions::SubscriptionSource;

/// Everything a run talks to.
pub struct Components {
    pub subscriptions: Arc<dyn SubscriptionSource + Send + Sync>,
    pub fetcher: DailyTopFetcher,
    pub inliner: CssInliner,
    pub mailer: Arc<dyn Mailer + Send + Sync>,
    pub notifier: Arc<dyn Notifier + Send + Sync>,
    pub secrets: Arc<dyn SecretStore>,
}

pub struct Pipeline {
    subscriptions: Arc<dyn SubscriptionSource + Send + Sync>,
    notifier: Arc<dyn Notifier + Send + Sync>,
    secrets: Arc<dyn SecretStore>,
    retry: RetryConfig,
    runner: ParallelRunner,
}

impl Pipeline {
    pub fn new(components: Components, retry: RetryConfig, workers: usize) -> Self {
        let worker = ForumWorker {
            fetcher: components.fetcher,
            inliner: components.inliner,
            mailer: components.mailer,
            retry: retry.clone(),
        };

        Self {
            subscriptions: components.subscriptions,
            notifier: components.notifier,
            secrets: components.secrets,
            retry,
            runner: ParallelRunner::new(worker, workers),
        }
    }

    pub async fn list_forums(&self) -> Result<Vec<Forum>> {
        let subscriptions = &self.subscriptions;
        retry(&self.retry, "Fetch user subscriptions", || {
            subscriptions.list_subscribed_forums()
        })
        .await
    }

    /// Fetched and inlined email body for one forum, nothing sent.
    pub async fn preview(&self, forum: &Forum) -> Result<String> {
        self.runner.worker().render(forum).await
    }

    /// Execute a full run. Never fails as a whole: per-forum and listing
    /// errors are collected in the outcome.
    pub async fn run(&self, run_id: &str) -> RunOutcome {
        let start = Utc::now();
        let mut outcome = RunOutcome::new(run_id);
        tracing::info!(run_id, "Starting run");

        match self.list_forums().await {
            Ok(forums) if forums.is_empty() => {
                tracing::info!("No subscribed forums");
            }
            Ok(forums) => {
                tracing::info!("Processing {} forums", forums.len());
                outcome.forums = self.runner.run_all(forums).await;
            }
            Err(e) => {
                tracing::error!("Could not list subscriptions: {}", e);
                outcome.listing_error = Some(e);
            }
        }

        if outcome.has_failures() {
            self.notify_failure(run_id).await;
        }

        let elapsed = Utc::now().signed_duration_since(start);
        tracing::info!(
            run_id,
            "Run complete: {} delivered, {} failed ({:.1}s)",
            outcome.delivered(),
            outcome.failed().count(),
            elapsed.num_milliseconds() as f64 / 1000.0
        );

        outcome
    }

    /// Best effort, single attempt.
    pub async fn notify_failure(&self, run_id: &str) {
        let message = match failure_message(self.secrets.as_ref(), run_id) {
            Ok(message) => message,
            Err(e) => {
                tracing::warn!("Failure notification skipped: {}", e);
                return;
            }
        };

        match self.notifier.notify(&message).await {
            Ok(()) => tracing::info!(run_id, "Failure notification sent"),
            Err(e) => tracing::warn!("Failure notification not delivered: {}", e),
        }
    }
}
