//! Failure notification to a messaging webhook.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use sha2::{Digest, Sha256};

use crate::app::{DigestError, Result};
use crate::secrets::{self, SecretStore};

#[async_trait]
pub trait Notifier {
    async fn notify(&self, message: &str) -> Result<()>;
}

/// Identifier for one pipeline run: UTC timestamp plus a short digest.
pub fn new_run_id() -> String {
    let now = Utc::now();
    let mut hasher = Sha256::new();
    hasher.update(now.to_rfc3339().as_bytes());
    hasher.update(std::process::id().to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("{}-{}", now.format("%Y%m%dT%H%M%SZ"), &digest[..8])
}

/// Substitute the run id into a message template.
///
/// Accepts `{}`, `{0}` and `{run_id}` placeholders.
pub fn format_failure_message(template: &str, run_id: &str) -> String {
    template
        .replace("{run_id}", run_id)
        .replace("{0}", run_id)
        .replace("{}", run_id)
}

/// Builds the failure message from the `SLACK_MESSAGE` template secret.
pub fn failure_message(secrets: &dyn SecretStore, run_id: &str) -> Result<String> {
    let template = secrets.get_secret(secrets::SLACK_MESSAGE)?;
    Ok(format_failure_message(&template, run_id))
}

/// Posts `{"text": message}` to a Slack incoming webhook.
pub struct SlackNotifier {
    client: Client,
    secrets: Arc<dyn SecretStore>,
}

impl SlackNotifier {
    pub fn new(secrets: Arc<dyn SecretStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DigestError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, secrets })
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn notify(&self, message: &str) -> Result<()> {
        let webhook = self.secrets.get_secret(secrets::SLACK_WEBHOOK_URL)?;

        self.client
            .post(&webhook)
            .json(&serde_json::json!({ "text": message }))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingNotifier {
        pub messages: Mutex<Vec<String>>,
        pub fail: bool,
    }

    impl RecordingNotifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn messages(&self) -> Vec<String> {
            self.messages.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, message: &str) -> Result<()> {
            self.messages.lock().unwrap().push(message.to_string());
            if self.fail {
                return Err(DigestError::TransientNetwork("webhook unreachable".into()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::secrets::MemorySecretStore;

    #[test]
    fn test_format_placeholders() {
        assert_eq!(
            format_failure_message("Reddit Daily failed: run {}", "abc"),
            "Reddit Daily failed: run abc"
        );
        assert_eq!(format_failure_message("run {0}", "abc"), "run abc");
        assert_eq!(format_failure_message("run {run_id}!", "abc"), "run abc!");
        assert_eq!(format_failure_message("no placeholder", "abc"), "no placeholder");
    }

    #[test]
    fn test_failure_message_from_secret() {
        let store = MemorySecretStore::new().with(secrets::SLACK_MESSAGE, "Flow run {} failed");
        assert_eq!(failure_message(&store, "r-1").unwrap(), "Flow run r-1 failed");
        assert!(failure_message(&MemorySecretStore::new(), "r-1").is_err());
    }

    #[test]
    fn test_run_id_shape() {
        let id = new_run_id();
        let (stamp, digest) = id.rsplit_once('-').unwrap();
        assert_eq!(stamp.len(), 16);
        assert!(stamp.ends_with('Z'));
        assert_eq!(digest.len(), 8);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn test_slack_notifier_requires_webhook_secret() {
        let notifier = SlackNotifier::new(Arc::new(MemorySecretStore::new())).unwrap();
        let err = notifier.notify("failed").await.unwrap_err();
        assert!(matches!(err, DigestError::SecretNotFound(_)));
    }
}
