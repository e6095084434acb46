//! Style-inclusion policies for the email `<head>`.
//!
//! Mail clients strip different parts of a page head, so the operator picks
//! how stylesheets reach the email: fetched and embedded, copied as links,
//! or read from local files.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::app::{DigestError, Result};
use crate::fetcher::Fetcher;

pub const CHARSET_META: &str =
    r#"<meta http-equiv="Content-Type" content="text/html; charset=UTF-8">"#;

/// Stylesheet used when no policy is configured, relative to the config
/// directory.
pub const DEFAULT_STYLESHEET: &str = "css/reddit.css";

/// Contents written to [`DEFAULT_STYLESHEET`] alongside a fresh config.
pub const BUNDLED_STYLESHEET: &str = include_str!("../../css/reddit.css");

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StylePolicy {
    /// Fetch every linked stylesheet and embed it as a `<style>` block
    DownloadExternal,
    /// Copy the source page head, links and all
    KeepExternal,
    /// Embed one local CSS file
    LiteralCssFile(PathBuf),
    /// Embed several local CSS files, one block each, in order
    LiteralCssFiles(Vec<PathBuf>),
    /// Charset meta tag only
    None,
}

impl Default for StylePolicy {
    fn default() -> Self {
        StylePolicy::LiteralCssFile(PathBuf::from(DEFAULT_STYLESHEET))
    }
}

/// Rewrite protocol-relative attribute values (`="//…"`) to `https://`.
pub fn rewrite_protocol_relative(html: &str) -> String {
    html.replace("=\"//", "=\"https://")
}

/// Resolve a stylesheet `href` found on `page_url` to an absolute URL.
pub fn resolve_stylesheet_href(page_url: &str, href: &str) -> Result<String> {
    if let Some(rest) = href.strip_prefix("//") {
        return Ok(format!("https://{}", rest));
    }
    let base = Url::parse(page_url)?;
    Ok(base.join(href)?.to_string())
}

pub fn style_block(css: &str) -> String {
    format!("\n<style>\n{}\n</style>\n", css)
}

fn wrap_head(inner: &str) -> String {
    format!("<head>{}{}</head>", CHARSET_META, inner)
}

/// What the head builder needs from the source page.
#[derive(Debug, Clone, Default)]
pub struct SourceHead {
    /// Outer HTML of the page `<head>`, if present
    pub html: Option<String>,
    /// `href` of each `<link rel="stylesheet">` in the head, in source order
    pub stylesheet_hrefs: Vec<Option<String>>,
}

impl StylePolicy {
    /// Join relative CSS file paths onto `base`. Absolute paths and the
    /// non-file policies are unchanged.
    pub fn resolve_paths(self, base: &Path) -> Self {
        let resolve = |path: PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path
            }
        };
        match self {
            StylePolicy::LiteralCssFile(path) => StylePolicy::LiteralCssFile(resolve(path)),
            StylePolicy::LiteralCssFiles(paths) => {
                StylePolicy::LiteralCssFiles(paths.into_iter().map(resolve).collect())
            }
            other => other,
        }
    }

    /// Build the output document's `<head>` element.
    pub async fn build_head(
        &self,
        source: &SourceHead,
        page_url: &str,
        fetcher: &(dyn Fetcher + Send + Sync),
    ) -> Result<String> {
        match self {
            StylePolicy::DownloadExternal => {
                let sheets = try_join_all(
                    source
                        .stylesheet_hrefs
                        .iter()
                        .map(|href| download_stylesheet(fetcher, page_url, href.as_deref())),
                )
                .await?;
                let blocks: String = sheets.iter().map(|css| style_block(css)).collect();
                Ok(wrap_head(&blocks))
            }
            StylePolicy::KeepExternal => Ok(match &source.html {
                Some(head) => rewrite_protocol_relative(head),
                None => wrap_head(""),
            }),
            StylePolicy::LiteralCssFile(path) => Ok(wrap_head(&read_css_block(path).await?)),
            StylePolicy::LiteralCssFiles(paths) => {
                let mut blocks = String::new();
                for path in paths {
                    blocks.push_str(&read_css_block(path).await?);
                }
                Ok(wrap_head(&blocks))
            }
            StylePolicy::None => Ok(wrap_head("")),
        }
    }
}

async fn download_stylesheet(
    fetcher: &(dyn Fetcher + Send + Sync),
    page_url: &str,
    href: Option<&str>,
) -> Result<String> {
    let Some(href) = href.filter(|h| !h.is_empty()) else {
        return Ok(String::new());
    };
    let url = resolve_stylesheet_href(page_url, href)?;
    let response = fetcher.fetch(&url).await?;
    if response.status != 200 {
        return Err(DigestError::Fetch {
            url,
            status: response.status,
        });
    }
    tracing::debug!("Embedding stylesheet {}", url);
    Ok(String::from_utf8_lossy(&response.body).into_owned())
}

async fn read_css_block(path: &Path) -> Result<String> {
    let css = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DigestError::Style {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(style_block(&css))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::testing::StaticFetcher;

    const PAGE: &str = "https://old.reddit.com/r/rust/top/?sort=top&t=day";

    fn source() -> SourceHead {
        SourceHead {
            html: Some(
                r#"<head><title>top</title><link rel="stylesheet" href="//www.redditstatic.com/a.css"></head>"#
                    .into(),
            ),
            stylesheet_hrefs: vec![
                Some("//www.redditstatic.com/a.css".into()),
                Some("/static/b.css".into()),
            ],
        }
    }

    #[test]
    fn test_rewrite_protocol_relative() {
        assert_eq!(
            rewrite_protocol_relative(r#"<a href="//i.redd.it/x.png">x</a>"#),
            r#"<a href="https://i.redd.it/x.png">x</a>"#
        );
        assert_eq!(
            rewrite_protocol_relative(r#"<a href="https://a/b">"#),
            r#"<a href="https://a/b">"#
        );
    }

    #[test]
    fn test_resolve_stylesheet_href() {
        assert_eq!(
            resolve_stylesheet_href(PAGE, "//www.redditstatic.com/a.css").unwrap(),
            "https://www.redditstatic.com/a.css"
        );
        assert_eq!(
            resolve_stylesheet_href(PAGE, "/static/b.css").unwrap(),
            "https://old.reddit.com/static/b.css"
        );
        assert_eq!(
            resolve_stylesheet_href(PAGE, "https://cdn.example/c.css").unwrap(),
            "https://cdn.example/c.css"
        );
    }

    #[tokio::test]
    async fn test_download_external_embeds_in_source_order() {
        let fetcher = StaticFetcher::new()
            .css("https://www.redditstatic.com/a.css", ".a{color:red}")
            .css("https://old.reddit.com/static/b.css", ".b{color:blue}");

        let head = StylePolicy::DownloadExternal
            .build_head(&source(), PAGE, &fetcher)
            .await
            .unwrap();

        assert!(head.starts_with("<head><meta"));
        let a = head.find(".a{color:red}").unwrap();
        let b = head.find(".b{color:blue}").unwrap();
        assert!(a < b);
        assert_eq!(head.matches("<style>").count(), 2);
        assert_eq!(fetcher.request_count(), 2);
    }

    #[tokio::test]
    async fn test_download_external_missing_href_embeds_empty_block() {
        let fetcher = StaticFetcher::new();
        let source = SourceHead {
            html: None,
            stylesheet_hrefs: vec![None],
        };

        let head = StylePolicy::DownloadExternal
            .build_head(&source, PAGE, &fetcher)
            .await
            .unwrap();

        assert_eq!(head, format!("<head>{}\n<style>\n\n</style>\n</head>", CHARSET_META));
        assert_eq!(fetcher.request_count(), 0);
    }

    #[tokio::test]
    async fn test_download_external_failed_sheet() {
        let fetcher = StaticFetcher::new()
            .css("https://www.redditstatic.com/a.css", ".a{}")
            .respond("https://old.reddit.com/static/b.css", 404, None, b"");

        let err = StylePolicy::DownloadExternal
            .build_head(&source(), PAGE, &fetcher)
            .await
            .unwrap_err();

        assert!(matches!(err, DigestError::Fetch { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_keep_external_rewrites_links() {
        let head = StylePolicy::KeepExternal
            .build_head(&source(), PAGE, &StaticFetcher::new())
            .await
            .unwrap();

        assert!(head.contains(r#"href="https://www.redditstatic.com/a.css""#));
        assert!(!head.contains("=\"//"));
        assert!(head.contains("<title>top</title>"));
    }

    #[tokio::test]
    async fn test_literal_css_files_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.css");
        let second = dir.path().join("second.css");
        std::fs::write(&first, "p{margin:0}").unwrap();
        std::fs::write(&second, "a{color:#369}").unwrap();

        let single = StylePolicy::LiteralCssFile(first.clone())
            .build_head(&source(), PAGE, &StaticFetcher::new())
            .await
            .unwrap();
        assert_eq!(
            single,
            format!("<head>{}\n<style>\np{{margin:0}}\n</style>\n</head>", CHARSET_META)
        );

        let both = StylePolicy::LiteralCssFiles(vec![first, second])
            .build_head(&source(), PAGE, &StaticFetcher::new())
            .await
            .unwrap();
        assert_eq!(both.matches("<style>").count(), 2);
        assert!(both.find("p{margin:0}").unwrap() < both.find("a{color:#369}").unwrap());
    }

    #[tokio::test]
    async fn test_literal_css_missing_file() {
        let err = StylePolicy::LiteralCssFile(PathBuf::from("/nonexistent/reddit.css"))
            .build_head(&source(), PAGE, &StaticFetcher::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DigestError::Style { .. }));
    }

    #[test]
    fn test_default_is_bundled_stylesheet() {
        assert_eq!(
            StylePolicy::default(),
            StylePolicy::LiteralCssFile(PathBuf::from("css/reddit.css"))
        );
        assert!(BUNDLED_STYLESHEET.contains("a.title"));
    }

    #[test]
    fn test_resolve_paths() {
        let base = Path::new("/etc/reddit-daily");
        assert_eq!(
            StylePolicy::default().resolve_paths(base),
            StylePolicy::LiteralCssFile(PathBuf::from("/etc/reddit-daily/css/reddit.css"))
        );
        assert_eq!(
            StylePolicy::LiteralCssFiles(vec![
                PathBuf::from("/abs/a.css"),
                PathBuf::from("b.css")
            ])
            .resolve_paths(base),
            StylePolicy::LiteralCssFiles(vec![
                PathBuf::from("/abs/a.css"),
                PathBuf::from("/etc/reddit-daily/b.css")
            ])
        );
        assert_eq!(StylePolicy::KeepExternal.resolve_paths(base), StylePolicy::KeepExternal);
    }

    #[tokio::test]
    async fn test_none_policy() {
        let head = StylePolicy::None
            .build_head(&source(), PAGE, &StaticFetcher::new())
            .await
            .unwrap();
        assert_eq!(head, format!("<head>{}</head>", CHARSET_META));
    }
}
