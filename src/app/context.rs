use std::sync::Arc;

use crate::app::error::{DigestError, Result};
use crate::config::{Config, SecretSource};
use crate::fetcher::{DailyTopFetcher, Fetcher, HttpFetcher};
use crate::mailer::{DryRunMailer, Mailer, SmtpMailer};
use crate::notifier::{Notifier, SlackNotifier};
use crate::pipeline::{Components, Pipeline};
use crate::render::CssInliner;
use crate::secrets::{EnvSecretStore, FileSecretStore, SecretStore};
use crate::subscriptions::{RedditClient, StaticSubscriptions, SubscriptionSource};

/// Per-invocation switches that are not part of the config file.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Render everything but log instead of sending mail
    pub dry_run: bool,
    /// Use these forums instead of the account's subscriptions
    pub forums: Vec<String>,
    /// Overrides `[pipeline] workers`
    pub workers: Option<usize>,
}

pub struct AppContext {
    pub config: Config,
    pub pipeline: Pipeline,
}

impl AppContext {
    pub fn new(config: Config, options: &RunOptions) -> Result<Self> {
        let secrets = Self::secret_store(&config)?;

        let fetcher: Arc<dyn Fetcher + Send + Sync> = Arc::new(HttpFetcher::new(&config.reddit)?);

        let subscriptions: Arc<dyn SubscriptionSource + Send + Sync> = if options.forums.is_empty() {
            Arc::new(RedditClient::new(config.reddit.clone(), secrets.clone())?)
        } else {
            Arc::new(StaticSubscriptions::new(&options.forums))
        };

        let mailer: Arc<dyn Mailer + Send + Sync> = if options.dry_run {
            Arc::new(DryRunMailer::new(config.mail.clone()))
        } else {
            Arc::new(SmtpMailer::new(config.mail.clone(), secrets.clone()))
        };

        let notifier: Arc<dyn Notifier + Send + Sync> = Arc::new(SlackNotifier::new(secrets.clone())?);

        let components = Components {
            subscriptions,
            fetcher: DailyTopFetcher::new(
                fetcher,
                config.reddit.listing_base.clone(),
                config.style.policy.clone(),
            ),
            inliner: CssInliner::new(&config.render.base_url)?,
            mailer,
            notifier,
            secrets,
        };

        let workers = options.workers.unwrap_or(config.pipeline.workers);
        let pipeline = Pipeline::new(components, config.retry.clone(), workers);

        Ok(Self { config, pipeline })
    }

    fn secret_store(config: &Config) -> Result<Arc<dyn SecretStore>> {
        match config.secrets.source {
            SecretSource::Env => {
                let store = match &config.secrets.env_prefix {
                    Some(prefix) => EnvSecretStore::with_prefix(prefix.clone()),
                    None => EnvSecretStore::new(),
                };
                Ok(Arc::new(store))
            }
            SecretSource::File => {
                let path = config.secrets.path.clone().ok_or_else(|| {
                    DigestError::Config("[secrets] source = \"file\" requires a path".into())
                })?;
                Ok(Arc::new(FileSecretStore::new(path)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_from_default_config() {
        let ctx = AppContext::new(Config::default(), &RunOptions::default());
        assert!(ctx.is_ok());
    }

    #[test]
    fn test_file_secrets_require_path() {
        let mut config = Config::default();
        config.secrets.source = SecretSource::File;
        assert!(matches!(
            AppContext::new(config, &RunOptions::default()),
            Err(DigestError::Config(_))
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = Config::default();
        config.render.base_url = "::not a url".into();
        assert!(AppContext::new(config, &RunOptions::default()).is_err());
    }
}
