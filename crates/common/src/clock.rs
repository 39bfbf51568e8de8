//! Timestamps and per-job unique tokens.
//!
//! Temporary output paths are derived from a token that combines the
//! wall-clock millisecond, the process id and a process-wide sequence
//! number. Two calls in the same process never return the same token,
//! even within the same millisecond.

use std::sync::atomic::{AtomicU64, Ordering};

static JOB_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Current wall-clock time as an RFC 3339 string.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// A process-unique job token, e.g. `1729350000123-4242-7`.
pub fn next_job_token() -> String {
    let seq = JOB_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}-{}-{}",
        chrono::Utc::now().timestamp_millis(),
        std::process::id(),
        seq
    )
}
