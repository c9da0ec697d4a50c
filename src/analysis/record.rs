//! Shape of the per-page technical SEO record
//!
//! Every field has a default so a record is complete even when a probe fails.
//! Field names are the JSON keys the reporting stage reads.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel written to `http_status` when the status probe cannot connect
pub const NETWORK_ERROR_SENTINEL: &str = "Network error";

/// Error marker recorded for a JSON-LD block that does not parse
pub const INVALID_JSON_LD: &str = "Invalid JSON-LD format";

/// Result of an auxiliary HTTP probe: a status code or an error sentinel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeStatus {
    Code(u16),
    Error(String),
}

impl ProbeStatus {
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Code(code) => Some(*code),
            Self::Error(_) => None,
        }
    }
}

impl fmt::Display for ProbeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Error(message) => f.write_str(message),
        }
    }
}

/// An `<link rel="alternate" hreflang=...>` pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HreflangTag {
    pub hreflang: String,
    pub href: String,
}

/// Text of an `h3`..`h6` heading with its level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: u8,
    pub text: String,
}

/// Script usage counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JavascriptUsage {
    pub inline_scripts: u32,
    pub external_scripts: u32,
    pub noscript_tag_present: bool,
}

/// One `application/ld+json` block: a preview when it parses, an error otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredData {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_preview: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StructuredData {
    const JSON_LD: &'static str = "JSON-LD";

    pub fn preview(preview: String) -> Self {
        Self {
            kind: Self::JSON_LD.to_string(),
            content_preview: Some(preview),
            error: None,
        }
    }

    pub fn invalid() -> Self {
        Self {
            kind: Self::JSON_LD.to_string(),
            content_preview: None,
            error: Some(INVALID_JSON_LD.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Technical SEO signals for a single page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisRecord {
    pub url: String,
    pub http_status: Option<ProbeStatus>,
    pub final_url_after_redirects: Option<String>,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub meta_robots: Option<String>,
    pub viewport: Option<String>,
    pub canonical_url: Option<String>,
    pub hreflang_tags: Vec<HreflangTag>,
    pub h1_tags: Vec<String>,
    pub h2_tags: Vec<String>,
    pub h3_h6_tags: Vec<Heading>,
    pub internal_links_count: u32,
    pub external_links_count: u32,
    pub image_count: u32,
    pub images_without_alt: u32,
    pub lazy_loaded_images_count: u32,
    pub javascript_usage_indicators: JavascriptUsage,
    pub structured_data_scripts: Vec<StructuredData>,
    pub wai_aria_attributes_found: u32,
    pub mobile_friendly_meta_tags: bool,
    pub sitemap_links: Vec<String>,
    pub robots_txt_status: Option<ProbeStatus>,
    pub robots_txt_content: Option<String>,
}

impl AnalysisRecord {
    /// Creates an empty record for `url`
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_probe_status_serializes_untagged() {
        assert_eq!(serde_json::to_value(ProbeStatus::Code(404)).unwrap(), json!(404));
        assert_eq!(
            serde_json::to_value(ProbeStatus::Error(NETWORK_ERROR_SENTINEL.into())).unwrap(),
            json!("Network error")
        );
    }

    #[test]
    fn test_default_record_has_complete_shape() {
        let value = serde_json::to_value(AnalysisRecord::new("https://example.com/")).unwrap();
        let object = value.as_object().unwrap();

        for key in [
            "url",
            "http_status",
            "final_url_after_redirects",
            "title",
            "meta_description",
            "meta_robots",
            "viewport",
            "canonical_url",
            "hreflang_tags",
            "h1_tags",
            "h2_tags",
            "h3_h6_tags",
            "internal_links_count",
            "external_links_count",
            "image_count",
            "images_without_alt",
            "lazy_loaded_images_count",
            "javascript_usage_indicators",
            "structured_data_scripts",
            "wai_aria_attributes_found",
            "mobile_friendly_meta_tags",
            "sitemap_links",
            "robots_txt_status",
            "robots_txt_content",
        ] {
            assert!(object.contains_key(key), "missing key {}", key);
        }
        assert_eq!(object["image_count"], json!(0));
        assert_eq!(object["mobile_friendly_meta_tags"], json!(false));
        assert_eq!(object["sitemap_links"], json!([]));
    }

    #[test]
    fn test_structured_data_shapes() {
        assert_eq!(
            serde_json::to_value(StructuredData::invalid()).unwrap(),
            json!({"type": "JSON-LD", "error": "Invalid JSON-LD format"})
        );
        assert_eq!(
            serde_json::to_value(StructuredData::preview("{}...".into())).unwrap(),
            json!({"type": "JSON-LD", "content_preview": "{}..."})
        );
    }

    #[test]
    fn test_record_reads_back_from_partial_json() {
        let record: AnalysisRecord =
            serde_json::from_value(json!({"url": "https://example.com/", "http_status": 200}))
                .unwrap();
        assert_eq!(record.http_status, Some(ProbeStatus::Code(200)));
        assert!(record.h1_tags.is_empty());
    }
}
