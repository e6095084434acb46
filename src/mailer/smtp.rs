use std::sync::Arc;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::app::{DigestError, Result};
use crate::domain::Forum;
use crate::mailer::{MailConfig, Mailer};
use crate::secrets::{self, SecretStore};

/// Sends each digest to the account's own address over STARTTLS.
pub struct SmtpMailer {
    config: MailConfig,
    secrets: Arc<dyn SecretStore>,
}

impl SmtpMailer {
    pub fn new(config: MailConfig, secrets: Arc<dyn SecretStore>) -> Self {
        Self { config, secrets }
    }
}

/// Build the multipart/alternative message, from and to `address`.
pub fn build_message(config: &MailConfig, forum: &Forum, address: &str, body: &str) -> Result<Message> {
    let mailbox: Mailbox = address
        .parse()
        .map_err(|e| DigestError::Config(format!("Invalid email address: {}", e)))?;

    Message::builder()
        .from(mailbox.clone())
        .to(mailbox)
        .subject(config.subject(forum))
        .multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(config.plain_text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(body.to_string()),
                ),
        )
        .map_err(|e| DigestError::Other(format!("Failed to build email: {}", e)))
}

fn classify(e: lettre::transport::smtp::Error) -> DigestError {
    let code = e.status().map(|c| c.to_string());
    error_for_reply(code.as_deref(), e.is_permanent(), e.to_string())
}

/// Map an SMTP reply code to an error kind. Authentication rejections are
/// permanent replies too, so they are checked first.
fn error_for_reply(code: Option<&str>, permanent: bool, message: String) -> DigestError {
    match code {
        Some("530") | Some("534") | Some("535") => DigestError::Auth(message),
        _ if permanent => DigestError::Delivery(message),
        _ => DigestError::TransientNetwork(message),
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_email(&self, forum: &Forum, body: &str) -> Result<()> {
        let address = self.secrets.get_secret(secrets::EMAIL)?;
        let password = self.secrets.get_secret(secrets::EMAIL_PASSWORD)?;

        let message = build_message(&self.config, forum, &address, body)?;

        // Built per call without pooling: the session is closed once `send`
        // returns, on success and on error.
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.host)
            .map_err(classify)?
            .port(self.config.port)
            .credentials(Credentials::new(address, password))
            .build();

        transport.send(message).await.map_err(classify)?;

        tracing::info!(
            subject = %self.config.subject(forum),
            "Email sent"
        );

        Ok(())
    }
}
