use std::sync::Arc;

use scraper::{Html, Selector};

use crate::app::Result;
use crate::domain::Forum;
use crate::fetcher::style::{rewrite_protocol_relative, SourceHead};
use crate::fetcher::{Fetcher, StylePolicy};

/// Per-post container blocks on the listing page.
const POST_SELECTOR: &str = "html > body > div.content > div.spacer[style]";
const HEAD_SELECTOR: &str = "html > head";
const STYLESHEET_SELECTOR: &str = r#"html > head > link[rel="stylesheet"]"#;

/// Pieces of the listing page that survive into the email.
#[derive(Debug, Clone, Default)]
struct PageParts {
    head: SourceHead,
    posts: Vec<String>,
}

/// Fetches a forum's "top of the day" page and cuts it down to an
/// email-ready document.
#[derive(Clone)]
pub struct DailyTopFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    listing_base: String,
    policy: StylePolicy,
}

impl DailyTopFetcher {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        listing_base: impl Into<String>,
        policy: StylePolicy,
    ) -> Self {
        Self {
            fetcher,
            listing_base: listing_base.into().trim_end_matches('/').to_string(),
            policy,
        }
    }

    pub fn policy(&self) -> &StylePolicy {
        &self.policy
    }

    pub fn page_url(&self, forum: &Forum) -> String {
        format!("{}{}", self.listing_base, forum.daily_top_path())
    }

    /// Fetch the listing and assemble the document.
    ///
    /// Fails with `Fetch` on a non-200 status and `Encoding` on a non-UTF-8
    /// body; nothing partial is returned.
    pub async fn fetch_daily_top(&self, forum: &Forum) -> Result<String> {
        self.fetch_with_policy(forum, &self.policy).await
    }

    /// Same as [`fetch_daily_top`](Self::fetch_daily_top) with an explicit
    /// style policy.
    pub async fn fetch_with_policy(&self, forum: &Forum, policy: &StylePolicy) -> Result<String> {
        let url = self.page_url(forum);
        tracing::info!("Fetching daily top for r/{}", forum.name);

        let text = self.fetcher.fetch(&url).await?.into_utf8_text()?;
        let parts = extract(&text);
        tracing::debug!(
            "r/{}: {} posts, {} linked stylesheets",
            forum.name,
            parts.posts.len(),
            parts.head.stylesheet_hrefs.len()
        );

        let head = policy
            .build_head(&parts.head, &url, self.fetcher.as_ref())
            .await?;

        Ok(assemble(&head, &parts.posts))
    }
}

// The parsed tree is not `Send`, so it never lives across an await.
fn extract(text: &str) -> PageParts {
    let document = Html::parse_document(text);
    let head_selector = Selector::parse(HEAD_SELECTOR).expect("static selector");
    let link_selector = Selector::parse(STYLESHEET_SELECTOR).expect("static selector");
    let post_selector = Selector::parse(POST_SELECTOR).expect("static selector");

    let head = SourceHead {
        html: document.select(&head_selector).next().map(|h| h.html()),
        stylesheet_hrefs: document
            .select(&link_selector)
            .map(|link| link.value().attr("href").map(String::from))
            .collect(),
    };

    let posts = document
        .select(&post_selector)
        .map(|post| rewrite_protocol_relative(&post.html()))
        .collect();

    PageParts { head, posts }
}

fn assemble(head: &str, posts: &[String]) -> String {
    let mut out = String::with_capacity(head.len() + posts.iter().map(String::len).sum::<usize>() + 128);
    out.push_str("<!DOCTYPE html>");
    out.push_str("<html>");
    out.push_str(head);
    out.push_str(r#"<body class="">"#);
    out.push_str(r#"<div class="content" role="main">"#);
    for post in posts {
        out.push_str(post);
    }
    out.push_str("</div>");
    out.push_str("</body>");
    out.push_str("</html>");
    out
}
