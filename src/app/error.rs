use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DigestError {
    #[error("Secret not found: {0}")]
    SecretNotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    TransientNetwork(String),

    #[error("Request to {url} returned status {status}")]
    Fetch { url: String, status: u16 },

    #[error("Encoding error: {0}")]
    Encoding(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Delivery rejected: {0}")]
    Delivery(String),

    #[error("Failed to read stylesheet {path}: {source}")]
    Style {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for DigestError {
    fn from(e: reqwest::Error) -> Self {
        match (e.status(), e.url()) {
            (Some(status), Some(url)) => DigestError::Fetch {
                url: url.to_string(),
                status: status.as_u16(),
            },
            _ => DigestError::TransientNetwork(e.to_string()),
        }
    }
}

impl From<url::ParseError> for DigestError {
    fn from(e: url::ParseError) -> Self {
        DigestError::Config(format!("Invalid URL: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, DigestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_display() {
        let err = DigestError::Fetch {
            url: "https://old.reddit.com/r/rust/top/".into(),
            status: 429,
        };
        assert_eq!(
            err.to_string(),
            "Request to https://old.reddit.com/r/rust/top/ returned status 429"
        );
    }
}
