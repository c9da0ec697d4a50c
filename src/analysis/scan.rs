//! Single-pass extraction of SEO signals from a parsed document
//!
//! Each tag family is scanned once. Counters only ever increment, and every
//! field keeps its default when the document has nothing to report.

use crate::analysis::record::{
    AnalysisRecord, Heading, HreflangTag, JavascriptUsage, StructuredData,
};
use crate::url::same_authority;
use scraper::{ElementRef, Html, Selector};
use url::Url;

const JSON_LD_PREVIEW_CHARS: usize = 200;

/// DOM-derived part of an [`AnalysisRecord`]
///
/// The scan owns no reference to the parsed tree, so it can be carried
/// across the network probes that complete the record.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentScan {
    record: AnalysisRecord,
}

impl DocumentScan {
    /// The fields filled in so far
    pub fn record(&self) -> &AnalysisRecord {
        &self.record
    }

    pub fn into_record(self) -> AnalysisRecord {
        self.record
    }
}

/// Scans a parsed document for technical SEO signals
///
/// Link internality is judged against the authority of `page_url`, not the
/// crawl's seed: a page reached through a redirect-free link on the same
/// site always classifies its own links relative to itself.
///
/// # Example
///
/// ```
/// use scraper::Html;
/// use seo_crawler::analysis::scan_document;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<img src="a.png"><img src="b.png" alt="x">"#);
/// let url = Url::parse("https://example.com/").unwrap();
/// let scan = scan_document(&url, &html);
/// assert_eq!(scan.record().image_count, 2);
/// assert_eq!(scan.record().images_without_alt, 1);
/// ```
pub fn scan_document(page_url: &Url, document: &Html) -> DocumentScan {
    let mut record = AnalysisRecord::new(page_url.as_str());

    record.title = select(document, "title").first().map(element_text);
    scan_meta(document, &mut record);
    scan_link_tags(document, &mut record);
    scan_headings(document, &mut record);
    scan_anchors(document, page_url, &mut record);
    scan_images(document, &mut record);
    record.javascript_usage_indicators = scan_scripts(document);
    record.structured_data_scripts = scan_structured_data(document);
    record.wai_aria_attributes_found = count_aria_tags(document);

    DocumentScan { record }
}

/// Returns true if a viewport declaration is mobile friendly
///
/// Both `width=device-width` and `initial-scale` must appear literally.
pub fn is_mobile_friendly_viewport(content: &str) -> bool {
    content.contains("width=device-width") && content.contains("initial-scale")
}

fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(e) => {
            tracing::error!("Invalid selector {}: {:?}", css, e);
            Vec::new()
        }
    }
}

/// Concatenates the trimmed text runs of an element
fn element_text(element: &ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_attr<'a>(element: &ElementRef<'a>, name: &str) -> Option<&'a str> {
    element.value().attr(name).filter(|v| !v.is_empty())
}

fn has_rel(element: &ElementRef<'_>, token: &str) -> bool {
    element
        .value()
        .attr("rel")
        .map(|rel| {
            rel.split_ascii_whitespace()
                .any(|t| t.eq_ignore_ascii_case(token))
        })
        .unwrap_or(false)
}

fn scan_meta(document: &Html, record: &mut AnalysisRecord) {
    for meta in select(document, "meta") {
        let name = meta.value().attr("name").unwrap_or("").to_lowercase();
        let content = meta.value().attr("content").map(str::to_string);

        match name.as_str() {
            "description" => record.meta_description = content,
            "robots" => record.meta_robots = content,
            "viewport" => {
                if content.as_deref().is_some_and(is_mobile_friendly_viewport) {
                    record.mobile_friendly_meta_tags = true;
                }
                record.viewport = content;
            }
            _ => {}
        }
    }
}

fn scan_link_tags(document: &Html, record: &mut AnalysisRecord) {
    let links = select(document, "link");

    // Only the first canonical declaration counts
    if let Some(canonical) = links.iter().find(|link| has_rel(link, "canonical")) {
        record.canonical_url = non_empty_attr(canonical, "href").map(str::to_string);
    }

    for link in links.iter().filter(|link| has_rel(link, "alternate")) {
        if let (Some(hreflang), Some(href)) = (
            non_empty_attr(link, "hreflang"),
            non_empty_attr(link, "href"),
        ) {
            record.hreflang_tags.push(HreflangTag {
                hreflang: hreflang.to_string(),
                href: href.to_string(),
            });
        }
    }
}

fn scan_headings(document: &Html, record: &mut AnalysisRecord) {
    record.h1_tags = select(document, "h1").iter().map(element_text).collect();
    record.h2_tags = select(document, "h2").iter().map(element_text).collect();
    record.h3_h6_tags = select(document, "h3, h4, h5, h6")
        .iter()
        .map(|heading| Heading {
            level: heading_level(heading.value().name()),
            text: element_text(heading),
        })
        .collect();
}

fn heading_level(name: &str) -> u8 {
    name.strip_prefix('h')
        .and_then(|level| level.parse().ok())
        .unwrap_or(0)
}

fn scan_anchors(document: &Html, page_url: &Url, record: &mut AnalysisRecord) {
    for anchor in select(document, "a[href]") {
        let Some(href) = non_empty_attr(&anchor, "href") else {
            continue;
        };

        let internal = page_url
            .join(href.trim())
            .map(|target| same_authority(&target, page_url))
            .unwrap_or(false);

        if internal {
            record.internal_links_count += 1;
        } else {
            record.external_links_count += 1;
        }
    }
}

fn scan_images(document: &Html, record: &mut AnalysisRecord) {
    for img in select(document, "img") {
        let attrs = img.value();
        record.image_count += 1;

        if non_empty_attr(&img, "alt").is_none() {
            record.images_without_alt += 1;
        }

        let lazy = attrs.attr("loading") == Some("lazy")
            || attrs.attr("data-src").is_some()
            || attrs.attr("data-srcset").is_some();
        if lazy {
            record.lazy_loaded_images_count += 1;
        }
    }
}

fn scan_scripts(document: &Html) -> JavascriptUsage {
    let mut usage = JavascriptUsage::default();

    for script in select(document, "script") {
        if non_empty_attr(&script, "src").is_some() {
            usage.external_scripts += 1;
        } else {
            usage.inline_scripts += 1;
        }
    }
    usage.noscript_tag_present = !select(document, "noscript").is_empty();

    usage
}

fn scan_structured_data(document: &Html) -> Vec<StructuredData> {
    select(document, "script")
        .into_iter()
        .filter(|script| {
            script
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case("application/ld+json"))
        })
        .map(|script| {
            let body: String = script.text().collect();
            match serde_json::from_str::<serde_json::Value>(body.trim()) {
                Ok(value) => StructuredData::preview(json_ld_preview(&value)),
                Err(e) => {
                    tracing::debug!("Invalid JSON-LD block: {}", e);
                    StructuredData::invalid()
                }
            }
        })
        .collect()
}

fn json_ld_preview(value: &serde_json::Value) -> String {
    let mut preview: String = value
        .to_string()
        .chars()
        .take(JSON_LD_PREVIEW_CHARS)
        .collect();
    preview.push_str("...");
    preview
}

/// Counts elements carrying at least one `aria-*` attribute
fn count_aria_tags(document: &Html) -> u32 {
    let tagged = select(document, "*")
        .into_iter()
        .filter(|el| el.value().attrs().any(|(name, _)| name.starts_with("aria-")))
        .count();
    u32::try_from(tagged).unwrap_or(u32::MAX)
}
