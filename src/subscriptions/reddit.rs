use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::app::{DigestError, Result};
use crate::config::RedditConfig;
use crate::domain::Forum;
use crate::secrets::{self, SecretStore};
use crate::subscriptions::{parse_subscription_page, SubscriptionSource};

const PAGE_LIMIT: usize = 100;
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// OAuth client for the account's subscriptions, using a long-lived
/// refresh token.
pub struct RedditClient {
    client: Client,
    config: RedditConfig,
    secrets: Arc<dyn SecretStore>,
}

impl RedditClient {
    pub fn new(config: RedditConfig, secrets: Arc<dyn SecretStore>) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| DigestError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            secrets,
        })
    }

    async fn access_token(&self) -> Result<String> {
        let app_id = self.secrets.get_secret(secrets::APP_ID)?;
        let app_secret = self.secrets.get_secret(secrets::APP_SECRET)?;
        let refresh_token = self.secrets.get_secret(secrets::REFRESH_TOKEN)?;

        let url = format!("{}/api/v1/access_token", self.config.www_base.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .basic_auth(app_id, Some(app_secret))
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
            ])
            .send()
            .await?;

        check_auth_status(&url, response.status())?;
        let token: TokenResponse = response.json().await?;

        match (token.access_token, token.error) {
            (_, Some(error)) => Err(DigestError::Auth(error)),
            (Some(access_token), None) => Ok(access_token),
            (None, None) => Err(DigestError::Auth("no access token in response".into())),
        }
    }

    async fn fetch_page(&self, url: &str, token: &str, after: Option<String>) -> Result<String> {
        let mut request = self
            .client
            .get(url)
            .bearer_auth(token)
            .query(&[("limit", PAGE_LIMIT.to_string())]);
        if let Some(cursor) = after {
            request = request.query(&[("after", cursor)]);
        }

        let response = request.send().await?;
        check_auth_status(url, response.status())?;
        Ok(response.text().await?)
    }
}

fn check_auth_status(url: &str, status: StatusCode) -> Result<()> {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DigestError::Auth(format!(
            "{} rejected credentials ({})",
            url, status
        ))),
        s if !s.is_success() => Err(DigestError::Fetch {
            url: url.to_string(),
            status: s.as_u16(),
        }),
        _ => Ok(()),
    }
}

/// Follow `after` cursors from the first page until the listing ends or
/// `MAX_PAGES` pages have been read.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> Result<Vec<Forum>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<String>>,
{
    let mut forums = Vec::new();
    let mut after: Option<String> = None;

    for _ in 0..MAX_PAGES {
        let body = fetch_page(after.take()).await?;
        let (page, next) = parse_subscription_page(&body)?;
        forums.extend(page);

        match next {
            Some(cursor) => after = Some(cursor),
            None => return Ok(forums),
        }
    }

    tracing::warn!("Subscription listing truncated at {} pages", MAX_PAGES);
    Ok(forums)
}

#[async_trait]
impl SubscriptionSource for RedditClient {
    async fn list_subscribed_forums(&self) -> Result<Vec<Forum>> {
        let token = self.access_token().await?;
        let base = format!(
            "{}/subreddits/mine/subscriber",
            self.config.oauth_base.trim_end_matches('/')
        );

        let forums = collect_pages(|after| self.fetch_page(&base, &token, after)).await?;

        tracing::info!("Account follows {} forums", forums.len());
        Ok(forums)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::secrets::MemorySecretStore;

    fn page(names: &[&str], after: Option<&str>) -> String {
        let children: Vec<_> = names
            .iter()
            .map(|name| {
                serde_json::json!({
                    "kind": "t5",
                    "data": { "display_name": name, "url": format!("/r/{}/", name) }
                })
            })
            .collect();
        serde_json::json!({
            "kind": "Listing",
            "data": { "after": after, "children": children }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_pages_follow_after_cursor() {
        let requested = Mutex::new(Vec::new());

        let forums = collect_pages(|after: Option<String>| {
            requested.lock().unwrap().push(after.clone());
            let body = match after.as_deref() {
                None => page(&["rust", "science"], Some("t5_b")),
                Some("t5_b") => page(&["gaming"], None),
                Some(other) => panic!("unexpected cursor {}", other),
            };
            async move { Ok(body) }
        })
        .await
        .unwrap();

        let names: Vec<_> = forums.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "science", "gaming"]);
        assert_eq!(
            *requested.lock().unwrap(),
            vec![None, Some("t5_b".to_string())]
        );
    }

    #[tokio::test]
    async fn test_paging_stops_at_page_cap() {
        let mut calls = 0;

        let forums = collect_pages(|_after| {
            calls += 1;
            let body = page(&["loop"], Some("again"));
            async move { Ok(body) }
        })
        .await
        .unwrap();

        assert_eq!(calls, MAX_PAGES);
        assert_eq!(forums.len(), MAX_PAGES);
    }

    #[tokio::test]
    async fn test_paging_error_is_returned() {
        let result = collect_pages(|after: Option<String>| async move {
            match after {
                None => Ok(page(&["rust"], Some("t5_b"))),
                Some(_) => Err(DigestError::Fetch {
                    url: "https://oauth.reddit.com/subreddits/mine/subscriber".into(),
                    status: 503,
                }),
            }
        })
        .await;

        assert!(matches!(result, Err(DigestError::Fetch { status: 503, .. })));
    }

    #[test]
    fn test_auth_status_mapping() {
        assert!(matches!(
            check_auth_status("u", StatusCode::UNAUTHORIZED),
            Err(DigestError::Auth(_))
        ));
        assert!(matches!(
            check_auth_status("u", StatusCode::FORBIDDEN),
            Err(DigestError::Auth(_))
        ));
        assert!(matches!(
            check_auth_status("u", StatusCode::SERVICE_UNAVAILABLE),
            Err(DigestError::Fetch { status: 503, .. })
        ));
        assert!(check_auth_status("u", StatusCode::OK).is_ok());
    }

    #[tokio::test]
    async fn test_missing_credentials() {
        let client = RedditClient::new(
            RedditConfig::default(),
            Arc::new(MemorySecretStore::new().with(secrets::APP_ID, "id")),
        )
        .unwrap();

        let err = client.list_subscribed_forums().await.unwrap_err();
        assert!(matches!(err, DigestError::SecretNotFound(name) if name == secrets::APP_SECRET));
    }
}
