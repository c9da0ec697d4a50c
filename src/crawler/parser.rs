//! HTML parsing for the link extractor
//!
//! This module handles:
//! - Extracting crawlable links from `<a href>` tags
//! - Serializing the parsed tree into the normalized, indented form that is
//!   stored next to the raw body

use crate::url::{clean_link, is_asset_path, same_authority};
use ego_tree::iter::Edge;
use scraper::node::{Element, Node};
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

const INDENT: &str = "  ";

/// Deeper nesting is written at this indent
const MAX_INDENT_DEPTH: usize = 32;

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: &[&str] = &["script", "style"];

/// Extracts the links a crawl may follow from a parsed page
///
/// # Link Rules
///
/// - Every `<a>` with a non-blank `href` is considered
/// - Relative hrefs are resolved against `page_url`
/// - Only links with exactly the authority of `base` are kept
/// - Paths ending in a binary or document extension are dropped
/// - Fragments are stripped, query strings are kept
///
/// The result is deduplicated and keeps first-seen document order.
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use seo_crawler::crawler::extract_links;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<a href="/next#top">Next</a><a href="https://other.com/">Out</a>"#);
/// let page = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(&html, &page, &page);
/// assert_eq!(links, vec![Url::parse("https://example.com/next").unwrap()]);
/// ```
pub fn extract_links(document: &Html, page_url: &Url, base: &Url) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let a_selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(e) => {
            tracing::error!("Invalid anchor selector: {:?}", e);
            return links;
        }
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        if let Some(link) = resolve_link(href, page_url, base) {
            if seen.insert(link.as_str().to_string()) {
                links.push(link);
            }
        }
    }

    links
}

/// Resolves an href and applies the crawl-scope and asset filters
fn resolve_link(href: &str, page_url: &Url, base: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let absolute = page_url.join(href).ok()?;
    if !same_authority(&absolute, base) || is_asset_path(absolute.path()) {
        return None;
    }

    Some(clean_link(absolute))
}

/// Serializes a parsed document as indented HTML
///
/// Each tag, text run, comment and doctype sits on its own line, indented two
/// spaces per nesting level up to `MAX_INDENT_DEPTH` levels. Whitespace-only
/// text is dropped. Text and attribute values are escaped, except the bodies
/// of `script` and `style`.
///
/// The tree is walked without recursion, so arbitrarily deep markup is safe.
pub fn normalize_document(document: &Html) -> String {
    let mut out = String::new();
    let mut depth = 0usize;

    for edge in document.tree.root().traverse() {
        match edge {
            Edge::Open(node) => match node.value() {
                Node::Element(element) => {
                    write_open_tag(element, depth, &mut out);
                    if !is_void(element) {
                        depth += 1;
                    }
                }
                leaf => {
                    let raw_text = node
                        .parent()
                        .and_then(|parent| parent.value().as_element())
                        .is_some_and(|parent| RAW_TEXT_ELEMENTS.contains(&parent.name()));
                    write_leaf(leaf, depth, raw_text, &mut out);
                }
            },
            Edge::Close(node) => {
                if let Node::Element(element) = node.value() {
                    if !is_void(element) {
                        depth = depth.saturating_sub(1);
                        push_indent(depth, &mut out);
                        out.push_str("</");
                        out.push_str(element.name());
                        out.push_str(">\n");
                    }
                }
            }
        }
    }

    out
}

fn is_void(element: &Element) -> bool {
    VOID_ELEMENTS.contains(&element.name())
}

fn write_open_tag(element: &Element, depth: usize, out: &mut String) {
    push_indent(depth, out);
    out.push('<');
    out.push_str(element.name());
    for (attr, value) in element.attrs() {
        out.push(' ');
        out.push_str(attr);
        out.push_str("=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(value));
        out.push('"');
    }
    out.push_str(">\n");
}

fn write_leaf(node: &Node, depth: usize, raw_text: bool, out: &mut String) {
    match node {
        Node::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return;
            }
            push_indent(depth, out);
            if raw_text {
                out.push_str(trimmed);
            } else {
                out.push_str(&html_escape::encode_text(trimmed));
            }
            out.push('\n');
        }
        Node::Comment(comment) => {
            push_indent(depth, out);
            out.push_str("<!--");
            out.push_str(comment);
            out.push_str("-->\n");
        }
        Node::Doctype(doctype) => {
            push_indent(depth, out);
            out.push_str("<!DOCTYPE ");
            out.push_str(doctype.name());
            out.push_str(">\n");
        }
        _ => {}
    }
}

fn push_indent(depth: usize, out: &mut String) {
    for _ in 0..depth.min(MAX_INDENT_DEPTH) {
        out.push_str(INDENT);
    }
}
