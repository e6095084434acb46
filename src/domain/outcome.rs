use crate::app::DigestError;
use crate::domain::Forum;

#[derive(Debug)]
pub struct ForumOutcome {
    pub forum: Forum,
    pub result: Result<(), DigestError>,
}

/// Aggregate result of one pipeline run.
#[derive(Debug)]
pub struct RunOutcome {
    pub run_id: String,
    /// Set when the subscription list could not be loaded at all.
    pub listing_error: Option<DigestError>,
    pub forums: Vec<ForumOutcome>,
}

impl RunOutcome {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            listing_error: None,
            forums: Vec::new(),
        }
    }

    pub fn delivered(&self) -> usize {
        self.forums.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &ForumOutcome> {
        self.forums.iter().filter(|o| o.result.is_err())
    }

    pub fn has_failures(&self) -> bool {
        self.listing_error.is_some() || self.failed().next().is_some()
    }
}
