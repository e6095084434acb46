pub mod daily_top;
pub mod http_fetcher;
pub mod style;

pub use daily_top::DailyTopFetcher;
pub use http_fetcher::HttpFetcher;
pub use style::StylePolicy;

use async_trait::async_trait;

use crate::app::{DigestError, Result};

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub url: String,
    pub status: u16,
    /// Raw `Content-Type` header, if any
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl FetchResponse {
    /// Declared charset from the `Content-Type` header, lowercased.
    pub fn charset(&self) -> Option<String> {
        let content_type = self.content_type.as_deref()?;
        content_type.split(';').skip(1).find_map(|param| {
            let (key, value) = param.split_once('=')?;
            if key.trim().eq_ignore_ascii_case("charset") {
                Some(value.trim().trim_matches('"').to_ascii_lowercase())
            } else {
                None
            }
        })
    }

    /// Check the status is 200 and the body is UTF-8, returning the text.
    ///
    /// A declared charset other than UTF-8 is rejected even when the bytes
    /// happen to decode.
    pub fn into_utf8_text(self) -> Result<String> {
        if self.status != 200 {
            return Err(DigestError::Fetch {
                url: self.url,
                status: self.status,
            });
        }

        if let Some(charset) = self.charset() {
            if charset != "utf-8" && charset != "utf8" {
                return Err(DigestError::Encoding(format!(
                    "{} declared charset {}",
                    self.url, charset
                )));
            }
        }

        let url = self.url;
        String::from_utf8(self.body)
            .map_err(|e| DigestError::Encoding(format!("{} is not valid UTF-8: {}", url, e)))
    }
}

#[async_trait]
pub trait Fetcher {
    /// GET `url` with the shared client headers. Non-2xx statuses are
    /// returned, not raised, so callers decide how to validate them.
    async fn fetch(&self, url: &str) -> Result<FetchResponse>;
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Serves canned responses keyed by URL and records every request.
    #[derive(Default)]
    pub struct StaticFetcher {
        responses: HashMap<String, FetchResponse>,
        pub requests: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn html(self, url: &str, body: &str) -> Self {
            self.respond(url, 200, Some("text/html; charset=UTF-8"), body.as_bytes())
        }

        pub fn css(self, url: &str, body: &str) -> Self {
            self.respond(url, 200, Some("text/css"), body.as_bytes())
        }

        pub fn respond(
            mut self,
            url: &str,
            status: u16,
            content_type: Option<&str>,
            body: &[u8],
        ) -> Self {
            self.responses.insert(
                url.to_string(),
                FetchResponse {
                    url: url.to_string(),
                    status,
                    content_type: content_type.map(String::from),
                    body: body.to_vec(),
                },
            );
            self
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchResponse> {
            self.requests.lock().unwrap().push(url.to_string());
            self.responses
                .get(url)
                .cloned()
                .ok_or_else(|| DigestError::TransientNetwork(format!("connection refused: {}", url)))
        }
    }
}
