use html_escape::{encode_double_quoted_attribute, encode_text};
use scraper::{ElementRef, Html, Node};

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "xmp", "iframe", "noembed", "noframes", "noscript"];

/// Serialize `document`, dropping `<style>` elements.
///
/// `style_for` supplies the replacement `style` attribute of an element;
/// `resolve` may rewrite any other attribute value.
pub(super) fn document(
    document: &Html,
    style_for: &dyn Fn(ElementRef<'_>) -> Option<String>,
    resolve: &dyn Fn(&str, &str) -> Option<String>,
) -> String {
    let mut out = String::new();

    for child in document.tree.root().children() {
        match child.value() {
            Node::Doctype(doctype) => {
                out.push_str("<!DOCTYPE ");
                out.push_str(doctype.name());
                out.push('>');
            }
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(element) = ElementRef::wrap(child) {
                    write_element(&mut out, element, style_for, resolve);
                }
            }
            _ => {}
        }
    }

    out
}

fn write_element(
    out: &mut String,
    element: ElementRef<'_>,
    style_for: &dyn Fn(ElementRef<'_>) -> Option<String>,
    resolve: &dyn Fn(&str, &str) -> Option<String>,
) {
    let name = element.value().name();
    if name == "style" {
        return;
    }

    out.push('<');
    out.push_str(name);

    let style = style_for(element);
    for (attr, value) in element.value().attrs() {
        if attr == "style" && style.is_some() {
            continue;
        }
        let value = resolve(attr, value).unwrap_or_else(|| value.to_string());
        push_attr(out, attr, &value);
    }
    if let Some(style) = style.filter(|s| !s.is_empty()) {
        push_attr(out, "style", &style);
    }
    out.push('>');

    if VOID_ELEMENTS.contains(&name) {
        return;
    }

    let raw = RAW_TEXT_ELEMENTS.contains(&name);
    for child in element.children() {
        match child.value() {
            Node::Text(text) => {
                if raw {
                    out.push_str(text);
                } else {
                    out.push_str(&encode_text(&**text));
                }
            }
            Node::Comment(comment) => {
                out.push_str("<!--");
                out.push_str(comment);
                out.push_str("-->");
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    write_element(out, child, style_for, resolve);
                }
            }
            _ => {}
        }
    }

    out.push_str("</");
    out.push_str(name);
    out.push('>');
}

fn push_attr(out: &mut String, name: &str, value: &str) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    out.push_str(&encode_double_quoted_attribute(value));
    out.push('"');
}
