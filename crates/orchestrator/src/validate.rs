//! Request validation and default filling.

use framecast_common::config::RequestDefaults;
use framecast_common::error::{FramecastError, FramecastResult};
use framecast_export_model::{ExportRequest, RawExportRequest};

use crate::urls::{parse_page_url, resolve_script_url};

/// Upper bound accepted for `frameRate`.
pub const MAX_FRAME_RATE: i64 = 240;

/// Normalize a caller's request. Pure; performs no I/O.
pub fn validate_request(
    raw: &RawExportRequest,
    defaults: &RequestDefaults,
) -> FramecastResult<ExportRequest> {
    let page = non_empty(raw.page_url.as_deref())
        .ok_or_else(|| FramecastError::validation("pageUrl required"))
        .and_then(parse_page_url)?;

    let script_reference = non_empty(raw.script_reference.as_deref());
    if let Some(reference) = script_reference {
        resolve_script_url(&page, reference)?;
    }

    let frame_rate = match raw.frame_rate {
        None => defaults.fps,
        Some(fps) if fps <= 0 => {
            return Err(FramecastError::validation(
                "frameRate must be a positive integer",
            ))
        }
        Some(fps) if fps > MAX_FRAME_RATE => {
            return Err(FramecastError::validation(format!(
                "frameRate must be at most {MAX_FRAME_RATE}"
            )))
        }
        Some(fps) => fps as u32,
    };

    Ok(ExportRequest {
        page_url: page.into(),
        timeline_name: non_empty(raw.timeline_name.as_deref())
            .unwrap_or(&defaults.timeline)
            .to_string(),
        capture_selector: non_empty(raw.capture_selector.as_deref())
            .unwrap_or(&defaults.selector)
            .to_string(),
        viewport_size: raw.viewport_size.unwrap_or(defaults.viewport),
        output_resolution: raw.output_resolution.unwrap_or(defaults.resolution),
        frame_rate,
        output_filename: sanitize_filename(raw.output_filename.as_deref(), &defaults.filename),
        hide_selector: non_empty(raw.hide_selector.as_deref()).map(str::to_string),
        script_reference: script_reference.map(str::to_string),
    })
}

/// Reduce a caller-supplied download name to a safe basename.
///
/// Directory components are dropped, anything outside `[A-Za-z0-9._-]`
/// becomes `_`, leading dots are removed and `.mp4` is appended when the
/// name has no extension. An empty result falls back to `default`.
pub fn sanitize_filename(name: Option<&str>, default: &str) -> String {
    let base = name
        .map(|n| n.rsplit(['/', '\\']).next().unwrap_or(""))
        .unwrap_or("");

    let cleaned: String = base
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        return default.to_string();
    }
    if cleaned.contains('.') && !cleaned.ends_with('.') {
        cleaned.to_string()
    } else {
        format!("{}.mp4", cleaned.trim_end_matches('.'))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
