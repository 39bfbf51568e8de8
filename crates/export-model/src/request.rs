//! Export request types.

use serde::{Deserialize, Serialize};

use framecast_common::geometry::Dimensions;

/// A job description as submitted by a caller.
///
/// Every field is optional at this stage; the validator decides what is
/// required. Both the descriptive field names and the short names used by
/// existing browser clients (`url`, `timeline`, `fps`, ...) are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExportRequest {
    #[serde(default, alias = "url")]
    pub page_url: Option<String>,

    #[serde(default, alias = "timeline")]
    pub timeline_name: Option<String>,

    #[serde(default, alias = "selector")]
    pub capture_selector: Option<String>,

    #[serde(default, alias = "viewport")]
    pub viewport_size: Option<Dimensions>,

    #[serde(default, alias = "resolution")]
    pub output_resolution: Option<Dimensions>,

    /// Signed so that negative values reach validation instead of failing
    /// body parsing with a generic message.
    #[serde(default, alias = "fps")]
    pub frame_rate: Option<i64>,

    #[serde(default, alias = "filename")]
    pub output_filename: Option<String>,

    #[serde(default)]
    pub hide_selector: Option<String>,

    #[serde(default, alias = "script")]
    pub script_reference: Option<String>,
}

impl RawExportRequest {
    /// Parse a JSON request body.
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// A request carrying only the page URL.
    pub fn for_page(url: impl Into<String>) -> Self {
        Self {
            page_url: Some(url.into()),
            ..Self::default()
        }
    }
}

/// A validated request with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Absolute page URL (`http`, `https` or `file`).
    pub page_url: String,

    /// Global variable the page assigns its timeline to.
    pub timeline_name: String,

    pub capture_selector: String,

    pub viewport_size: Dimensions,

    pub output_resolution: Dimensions,

    pub frame_rate: u32,

    /// Sanitized download name; never used for server-side paths.
    pub output_filename: String,

    /// Element removed from the page before capture.
    pub hide_selector: Option<String>,

    /// Timeline script location, relative to `page_url` or absolute.
    pub script_reference: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptive_names() {
        let raw = RawExportRequest::from_json(
            br##"{
                "pageUrl": "https://example.com/anim/",
                "timelineName": "master",
                "captureSelector": "#stage",
                "viewportSize": {"width": 720, "height": 1280},
                "outputResolution": "1080x1920",
                "frameRate": 24,
                "outputFilename": "out.mp4",
                "hideSelector": "#exportBtn",
                "scriptReference": "js/timeline.js"
            }"##,
        )
        .unwrap();
        assert_eq!(raw.page_url.as_deref(), Some("https://example.com/anim/"));
        assert_eq!(raw.timeline_name.as_deref(), Some("master"));
        assert_eq!(raw.viewport_size, Some(Dimensions::new(720, 1280)));
        assert_eq!(raw.output_resolution, Some(Dimensions::new(1080, 1920)));
        assert_eq!(raw.frame_rate, Some(24));
        assert_eq!(raw.script_reference.as_deref(), Some("js/timeline.js"));
    }

    #[test]
    fn test_short_client_names() {
        let raw = RawExportRequest::from_json(
            br##"{
                "url": "https://example.com/anim/",
                "timeline": "tl",
                "selector": ".container",
                "viewport": "720x1280",
                "resolution": "720x1280",
                "fps": 24,
                "filename": "gsap-animation-9-16.mp4",
                "hideSelector": "#exportBtn"
            }"##,
        )
        .unwrap();
        assert_eq!(raw.page_url.as_deref(), Some("https://example.com/anim/"));
        assert_eq!(raw.capture_selector.as_deref(), Some(".container"));
        assert_eq!(raw.viewport_size, Some(Dimensions::new(720, 1280)));
        assert_eq!(raw.output_filename.as_deref(), Some("gsap-animation-9-16.mp4"));
        assert_eq!(raw.hide_selector.as_deref(), Some("#exportBtn"));
    }

    #[test]
    fn test_empty_object_is_all_none() {
        let raw = RawExportRequest::from_json(b"{}").unwrap();
        assert_eq!(raw, RawExportRequest::default());
    }

    #[test]
    fn test_malformed_viewport_fails_parse() {
        assert!(RawExportRequest::from_json(br#"{"url":"x","viewport":"wide"}"#).is_err());
    }
}
