use serde::{Deserialize, Serialize};

/// A subreddit the configured account follows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    /// Display name, e.g. `rust`
    pub name: String,
    /// Relative URL as reported by the platform, e.g. `/r/rust/`
    pub url: String,
}

impl Forum {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let url = format!("/r/{}/", name);
        Self { name, url }
    }

    /// Path of the "top of the day" listing for this forum.
    pub fn daily_top_path(&self) -> String {
        format!("/r/{}/top/?sort=top&t=day", self.name)
    }
}
