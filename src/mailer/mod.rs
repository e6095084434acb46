//! Outbound delivery of the rendered digests.

pub mod smtp;

pub use smtp::SmtpMailer;

use async_trait::async_trait;
use serde::Deserialize;

use crate::app::Result;
use crate::domain::Forum;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// Relay host, upgraded with STARTTLS
    pub host: String,
    pub port: u16,
    /// `{forum}` is replaced with the forum display name
    pub subject_template: String,
    /// Body of the `text/plain` alternative
    pub plain_text: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: "smtp.gmail.com".to_string(),
            port: 587,
            subject_template: "Reddit daily r/{forum}".to_string(),
            plain_text: "Daily Subreddit".to_string(),
        }
    }
}

impl MailConfig {
    pub fn subject(&self, forum: &Forum) -> String {
        self.subject_template.replace("{forum}", &forum.name)
    }
}

#[async_trait]
pub trait Mailer {
    /// Deliver one digest email for `forum`.
    async fn send_email(&self, forum: &Forum, body: &str) -> Result<()>;
}

/// Logs what would be sent instead of sending it.
pub struct DryRunMailer {
    config: MailConfig,
}

impl DryRunMailer {
    pub fn new(config: MailConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Mailer for DryRunMailer {
    async fn send_email(&self, forum: &Forum, body: &str) -> Result<()> {
        tracing::info!(
            subject = %self.config.subject(forum),
            bytes = body.len(),
            "Dry run, not sending"
        );
        Ok(())
    }
}
