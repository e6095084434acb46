//! The set of forums the configured account follows.

pub mod reddit;

pub use reddit::RedditClient;

use async_trait::async_trait;
use serde::Deserialize;

use crate::app::{DigestError, Result};
use crate::domain::Forum;

#[async_trait]
pub trait SubscriptionSource {
    /// Forums in the order the platform returns them.
    async fn list_subscribed_forums(&self) -> Result<Vec<Forum>>;
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: SubredditData,
}

#[derive(Debug, Deserialize)]
struct SubredditData {
    display_name: String,
    url: Option<String>,
}

/// Parse one page of `/subreddits/mine/subscriber`, returning the forums
/// and the cursor for the next page.
pub fn parse_subscription_page(body: &str) -> Result<(Vec<Forum>, Option<String>)> {
    let listing: Listing = serde_json::from_str(body)
        .map_err(|e| DigestError::Other(format!("Malformed subscription listing: {}", e)))?;

    let forums = listing
        .data
        .children
        .into_iter()
        .map(|child| {
            let mut forum = Forum::new(child.data.display_name);
            if let Some(url) = child.data.url {
                forum.url = url;
            }
            forum
        })
        .collect();

    let after = listing.data.after.filter(|a| !a.is_empty());
    Ok((forums, after))
}

/// A fixed list, for runs that name their forums explicitly.
pub struct StaticSubscriptions {
    forums: Vec<Forum>,
}

impl StaticSubscriptions {
    pub fn new(names: &[String]) -> Self {
        Self {
            forums: names.iter().map(|n| Forum::new(n.as_str())).collect(),
        }
    }
}

#[async_trait]
impl SubscriptionSource for StaticSubscriptions {
    async fn list_subscribed_forums(&self) -> Result<Vec<Forum>> {
        Ok(self.forums.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"{
        "kind": "Listing",
        "data": {
            "after": "t5_2qh1i",
            "dist": 2,
            "children": [
                {"kind": "t5", "data": {"display_name": "rust", "url": "/r/rust/", "subscribers": 300000}},
                {"kind": "t5", "data": {"display_name": "science", "url": "/r/science/"}}
            ]
        }
    }"#;

    #[test]
    fn test_parse_page_keeps_order() {
        let (forums, after) = parse_subscription_page(PAGE).unwrap();
        let names: Vec<_> = forums.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["rust", "science"]);
        assert_eq!(forums[0].url, "/r/rust/");
        assert_eq!(after, Some("t5_2qh1i".into()));
    }

    #[test]
    fn test_parse_last_page() {
        let body = r#"{"kind":"Listing","data":{"after":null,"children":[]}}"#;
        let (forums, after) = parse_subscription_page(body).unwrap();
        assert!(forums.is_empty());
        assert_eq!(after, None);
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_subscription_page("<html>").is_err());
    }

    #[tokio::test]
    async fn test_static_subscriptions() {
        let source = StaticSubscriptions::new(&["gaming".to_string(), "science".to_string()]);
        let forums = source.list_subscribed_forums().await.unwrap();
        assert_eq!(forums, vec![Forum::new("gaming"), Forum::new("science")]);
    }
}
