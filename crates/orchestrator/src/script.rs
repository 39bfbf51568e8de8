//! Page-preparation script synthesis.
//!
//! The generated script runs inside the target page before capture. It
//! waits (bounded) for the timeline global to appear and removes the
//! element matched by the hide selector, re-removing it whenever the DOM
//! changes.
//!
//! Caller-supplied values never become script source. They are encoded as
//! one JSON object literal and passed as the argument of a fixed function,
//! so a selector or timeline name can only ever be a string value.

use framecast_common::config::EngineConfig;
use serde_json::json;

/// Prefix of the error thrown when the timeline never appears.
pub const PAGE_NOT_READY_MARKER: &str = "FRAMECAST_PAGE_NOT_READY";

/// Bounds for the in-page readiness poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessOptions {
    pub timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl ReadinessOptions {
    pub fn from_engine_config(config: &EngineConfig) -> Self {
        Self {
            timeout_ms: config.ready_timeout_ms,
            poll_interval_ms: config.ready_poll_interval_ms,
        }
    }
}

impl Default for ReadinessOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            poll_interval_ms: 100,
        }
    }
}

const PREPARE_BODY: &str = r#"await (async (params) => {
  const deadline = Date.now() + params.readyTimeoutMs;
  while (typeof window[params.timeline] === "undefined") {
    if (Date.now() >= deadline) {
      throw new Error(
        params.notReadyMarker + ": timeline \"" + params.timeline +
        "\" was not found on window after " + params.readyTimeoutMs + "ms"
      );
    }
    await new Promise((resolve) => setTimeout(resolve, params.pollIntervalMs));
  }
  if (params.hideSelector !== null) {
    const strip = () => {
      for (const el of document.querySelectorAll(params.hideSelector)) {
        el.remove();
      }
    };
    strip();
    new MutationObserver(strip).observe(document.documentElement, {
      childList: true,
      subtree: true,
    });
  }
})("#;

/// Build the preparation script for one job.
pub fn build_preparation_script(
    timeline: &str,
    hide_selector: Option<&str>,
    readiness: &ReadinessOptions,
) -> String {
    let params = json!({
        "timeline": timeline,
        "hideSelector": hide_selector,
        "readyTimeoutMs": readiness.timeout_ms,
        "pollIntervalMs": readiness.poll_interval_ms,
        "notReadyMarker": PAGE_NOT_READY_MARKER,
    });
    format!("{PREPARE_BODY}{});\n", script_literal(&params))
}

/// JSON text that is also safe as a JavaScript expression in any context.
fn script_literal(value: &serde_json::Value) -> String {
    value
        .to_string()
        .replace('<', "\\u003c")
        .replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// If `message` comes from the readiness guard, return the human part.
pub fn page_not_ready_reason(message: &str) -> Option<String> {
    let idx = message.find(PAGE_NOT_READY_MARKER)?;
    let rest = &message[idx + PAGE_NOT_READY_MARKER.len()..];
    let reason = rest.trim_start_matches(':').trim();
    Some(if reason.is_empty() {
        "timeline was not found on the page".to_string()
    } else {
        reason.to_string()
    })
}
