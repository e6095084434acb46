//! CSS inlining for email clients.
//!
//! Most mail clients ignore `<style>` blocks, so every rule that matches an
//! element is copied into that element's `style` attribute and the blocks
//! themselves are dropped.

pub mod css;
mod serialize;

use std::collections::HashMap;

use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::app::{DigestError, Result};
use css::{parse_declarations, parse_stylesheet, specificity, Declaration, Specificity};

/// Attributes holding links that get resolved against the base URL.
const URL_ATTRIBUTES: &[&str] = &["href", "src", "background"];

#[derive(Debug, Clone)]
pub struct CssInliner {
    base_url: Url,
}

/// One stylesheet declaration waiting to be applied to an element.
struct Pending {
    important: bool,
    specificity: Specificity,
    order: usize,
    declaration: Declaration,
}

impl CssInliner {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| DigestError::Config(format!("Invalid render base URL {}: {}", base_url, e)))?;
        Ok(Self { base_url })
    }

    /// Move every matching `<style>` rule onto the elements it targets.
    ///
    /// Rules that match nothing, and rules that cannot be expressed inline
    /// (at-rules, pseudo-elements), are dropped along with the blocks.
    pub fn inline_css(&self, fragment: &str) -> Result<String> {
        if fragment.trim().is_empty() {
            return Err(DigestError::Render("empty document".into()));
        }
        if !fragment.to_ascii_lowercase().contains("<body") {
            return Err(DigestError::Render("document has no <body>".into()));
        }

        let document = Html::parse_document(fragment);
        if !document.errors.is_empty() {
            tracing::debug!("{} HTML parse errors recovered", document.errors.len());
        }

        let style_selector = Selector::parse("style").expect("static selector");
        let stylesheet: String = document
            .select(&style_selector)
            .flat_map(|style| style.text())
            .collect::<Vec<_>>()
            .join("\n");

        let mut pending = HashMap::new();
        let mut order = 0;
        for rule in parse_stylesheet(&stylesheet) {
            for selector_text in &rule.selectors {
                let Ok(selector) = Selector::parse(selector_text) else {
                    tracing::trace!("Dropping unsupported selector {}", selector_text);
                    continue;
                };
                let spec = specificity(selector_text);
                for element in document.select(&selector).filter(in_body) {
                    let entries = pending.entry(element.id()).or_insert_with(Vec::new);
                    for declaration in &rule.declarations {
                        entries.push(Pending {
                            important: declaration.important,
                            specificity: spec,
                            order,
                            declaration: declaration.clone(),
                        });
                        order += 1;
                    }
                }
            }
        }

        let style_for = |element: ElementRef<'_>| -> Option<String> {
            let entries = pending.get(&element.id());
            let inline = element.value().attr("style");
            if entries.is_none() && inline.is_none() {
                return None;
            }
            let inline = inline.map(parse_declarations).unwrap_or_default();
            let merged = merge(entries.map(Vec::as_slice).unwrap_or(&[]), inline);
            Some(
                merged
                    .iter()
                    .map(|(property, value, _)| format!("{}:{}", property, value))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };

        let resolve = |name: &str, value: &str| -> Option<String> {
            if URL_ATTRIBUTES.contains(&name) {
                self.resolve_url(value)
            } else {
                None
            }
        };

        Ok(serialize::document(&document, &style_for, &resolve))
    }

    /// Absolute form of a relative link, or `None` to keep it unchanged.
    fn resolve_url(&self, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() || value.starts_with('#') {
            return None;
        }
        match Url::parse(value) {
            Ok(_) => None,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base_url.join(value).ok().map(String::from)
            }
            Err(_) => None,
        }
    }
}

fn in_body(element: &ElementRef<'_>) -> bool {
    element.value().name() == "body"
        || element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|a| a.value().name() == "body")
}

/// Cascade stylesheet declarations then the element's own `style`.
///
/// Returns `(property, value, important)` in first-seen property order.
fn merge(entries: &[Pending], inline: Vec<Declaration>) -> Vec<(String, String, bool)> {
    let mut sorted: Vec<&Pending> = entries.iter().collect();
    sorted.sort_by_key(|p| (p.important, p.specificity, p.order));

    let mut merged: Vec<(String, String, bool)> = Vec::new();
    let mut set = |declaration: &Declaration, inline: bool| {
        match merged.iter_mut().find(|(p, _, _)| *p == declaration.property) {
            Some(existing) => {
                // Stylesheet !important beats a plain inline declaration.
                if inline && existing.2 && !declaration.important {
                    return;
                }
                existing.1 = declaration.value.clone();
                existing.2 = declaration.important;
            }
            None => merged.push((
                declaration.property.clone(),
                declaration.value.clone(),
                declaration.important,
            )),
        }
    };

    for pending in sorted {
        set(&pending.declaration, false);
    }
    for declaration in &inline {
        set(declaration, true);
    }

    merged
}
