use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:52.0) Gecko/20100101 Firefox/52.0";

/// Platform endpoints and the client-identifying header shared by every
/// request to the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedditConfig {
    /// Sent as `User-Agent` on listing, page and stylesheet requests
    pub user_agent: String,

    /// Host for the OAuth token endpoint
    pub www_base: String,

    /// Host for authenticated API calls
    pub oauth_base: String,

    /// Host serving the "top of the day" HTML listing pages
    pub listing_base: String,

    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for RedditConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            www_base: "https://www.reddit.com".to_string(),
            oauth_base: "https://oauth.reddit.com".to_string(),
            listing_base: "https://old.reddit.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RedditConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
