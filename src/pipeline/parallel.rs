use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::app::{DigestError, Result};
use crate::domain::{Forum, ForumOutcome};
use crate::fetcher::DailyTopFetcher;
use crate::mailer::Mailer;
use crate::render::CssInliner;
use crate::retry::{retry, RetryConfig};

/// Fetch → render → deliver for a single forum.
#[derive(Clone)]
pub struct ForumWorker {
    pub(crate) fetcher: DailyTopFetcher,
    pub(crate) inliner: CssInliner,
    pub(crate) mailer: Arc<dyn Mailer + Send + Sync>,
    pub(crate) retry: RetryConfig,
}

impl ForumWorker {
    /// Fetch and inline without delivering.
    pub async fn render(&self, forum: &Forum) -> Result<String> {
        let fetcher = &self.fetcher;
        let fragment = retry(
            &self.retry,
            &format!("Extract top posts r/{}", forum.name),
            || fetcher.fetch_daily_top(forum),
        )
        .await?;

        // Rendering is local and deterministic; retrying cannot help.
        self.inliner.inline_css(&fragment)
    }

    pub async fn process(&self, forum: &Forum) -> Result<()> {
        let body = self.render(forum).await?;

        let mailer = &self.mailer;
        let body = body.as_str();
        retry(&self.retry, &format!("Send email r/{}", forum.name), || {
            mailer.send_email(forum, body)
        })
        .await
    }
}

pub struct ParallelRunner {
    worker: ForumWorker,
    semaphore: Arc<Semaphore>,
}

impl ParallelRunner {
    pub fn new(worker: ForumWorker, workers: usize) -> Self {
        Self {
            worker,
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
        }
    }

    pub fn worker(&self) -> &ForumWorker {
        &self.worker
    }

    /// Run every forum independently; outcomes come back in input order.
    pub async fn run_all(&self, forums: Vec<Forum>) -> Vec<ForumOutcome> {
        let mut handles = Vec::new();

        for forum in forums {
            let worker = self.worker.clone();
            let semaphore = self.semaphore.clone();
            let task_forum = forum.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| DigestError::Other(format!("Worker pool closed: {}", e)))?;
                worker.process(&task_forum).await
            });

            handles.push((forum, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (forum, handle) in handles {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!("Task join error for r/{}: {}", forum.name, e);
                    Err(DigestError::Other(format!("task aborted: {}", e)))
                }
            };

            match &result {
                Ok(()) => tracing::info!("r/{} delivered", forum.name),
                Err(e) => tracing::error!("r/{} failed: {}", forum.name, e),
            }

            outcomes.push(ForumOutcome { forum, result });
        }

        outcomes
    }
}
