//! Page and script URL resolution.

use url::Url;

use framecast_common::error::{FramecastError, FramecastResult};
use framecast_export_model::ExportRequest;

const SUPPORTED_SCHEMES: [&str; 3] = ["http", "https", "file"];

/// URLs handed to the capture engine for one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureTargets {
    pub capture_url: String,
    pub script_url: Option<String>,
}

/// Parse a caller's `pageUrl`. Only absolute `http`, `https` and `file`
/// URLs are accepted; web URLs must name a host.
pub fn parse_page_url(raw: &str) -> FramecastResult<Url> {
    let url = Url::parse(raw).map_err(|e| {
        FramecastError::validation(format!("pageUrl is not a valid absolute URL: {e}"))
    })?;
    if !is_supported(&url) {
        return Err(FramecastError::validation(
            "pageUrl must be an absolute http, https or file URL",
        ));
    }
    Ok(url)
}

/// Whether `url` would pass [`parse_page_url`].
pub fn has_supported_scheme(url: &str) -> bool {
    parse_page_url(url).is_ok()
}

fn is_supported(url: &Url) -> bool {
    SUPPORTED_SCHEMES.contains(&url.scheme()) && (url.scheme() == "file" || url.host().is_some())
}

/// URL handed to the capture engine.
///
/// A directory-style URL (path ending in `/`) gets `capture_document`
/// joined onto it; query and fragment are kept.
pub fn resolve_capture_url(page: &Url, capture_document: &str) -> FramecastResult<Url> {
    if capture_document.is_empty() || !page.path().ends_with('/') {
        return Ok(page.clone());
    }
    let mut url = page.join(capture_document).map_err(|e| {
        FramecastError::config(format!(
            "capture document {capture_document:?} is not a relative URL: {e}"
        ))
    })?;
    url.set_query(page.query());
    url.set_fragment(page.fragment());
    Ok(url)
}

/// Resolve a timeline script reference against the page URL.
pub fn resolve_script_url(page: &Url, reference: &str) -> FramecastResult<Url> {
    let url = page.join(reference).map_err(|e| {
        FramecastError::validation(format!("scriptReference {reference:?} is not a valid URL: {e}"))
    })?;
    if !is_supported(&url) {
        return Err(FramecastError::validation(
            "scriptReference must resolve to an http, https or file URL",
        ));
    }
    Ok(url)
}

/// Capture and script URLs for a validated request.
pub fn resolve_targets(
    request: &ExportRequest,
    capture_document: &str,
) -> FramecastResult<CaptureTargets> {
    let page = parse_page_url(&request.page_url)?;
    let script_url = request
        .script_reference
        .as_deref()
        .map(|reference| resolve_script_url(&page, reference))
        .transpose()?;
    Ok(CaptureTargets {
        capture_url: resolve_capture_url(&page, capture_document)?.into(),
        script_url: script_url.map(Into::into),
    })
}
