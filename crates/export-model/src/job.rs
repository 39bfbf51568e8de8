//! Per-request export job record.

use std::path::PathBuf;

use serde::Serialize;

use crate::request::ExportRequest;

/// Lifecycle of a single export job.
///
/// ```text
/// Validating ─▶ Preparing ─▶ Capturing ─▶ Streaming ─▶ Done
///     │             │            │            │
///     └─────────────┴────────────┴────────────┴──────▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Validating,
    Preparing,
    Capturing,
    Streaming,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (from, Failed) => !from.is_terminal(),
            (Validating, Preparing)
            | (Preparing, Capturing)
            | (Capturing, Streaming)
            | (Streaming, Done) => true,
            _ => false,
        }
    }
}

/// One request's normalized input plus everything derived for it.
///
/// Owned by the orchestrator for the duration of the request. The output
/// path is unique per job; the file behind it is removed before the
/// request completes.
#[derive(Debug, Clone)]
pub struct ExportJob {
    /// Unique job token, also embedded in `output_path`.
    pub id: String,

    pub request: ExportRequest,

    /// Server-side temporary output file.
    pub output_path: PathBuf,

    /// URL actually handed to the engine. Empty until prepared.
    pub capture_url: String,

    /// Resolved timeline script location, if the page loads it externally.
    pub script_url: Option<String>,

    /// Page-preparation script text.
    pub preparation_script: String,

    state: JobState,
}

impl ExportJob {
    /// A job for a request that has just passed validation.
    ///
    /// Starts in [`JobState::Validating`]; nothing is derived from the
    /// request until [`ExportJob::prepare`] runs.
    pub fn new(id: String, request: ExportRequest, output_path: PathBuf) -> Self {
        Self {
            id,
            request,
            output_path,
            capture_url: String::new(),
            script_url: None,
            preparation_script: String::new(),
            state: JobState::Validating,
        }
    }

    /// Record the capture targets and page script, entering `Preparing`.
    pub fn prepare(
        &mut self,
        capture_url: String,
        script_url: Option<String>,
        preparation_script: String,
    ) -> bool {
        if !self.advance(JobState::Preparing) {
            return false;
        }
        self.capture_url = capture_url;
        self.script_url = script_url;
        self.preparation_script = preparation_script;
        true
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Move to `next`. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: JobState) -> bool {
        if self.state.can_advance_to(next) {
            tracing::debug!(job_id = %self.id, from = ?self.state, to = ?next, "Job state change");
            self.state = next;
            true
        } else {
            tracing::warn!(job_id = %self.id, from = ?self.state, to = ?next, "Ignoring illegal job state change");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecast_common::geometry::Dimensions;

    fn sample_job() -> ExportJob {
        ExportJob::new(
            "1-2-3".to_string(),
            ExportRequest {
                page_url: "https://example.com/".to_string(),
                timeline_name: "tl".to_string(),
                capture_selector: ".container".to_string(),
                viewport_size: Dimensions::portrait_hd(),
                output_resolution: Dimensions::portrait_hd(),
                frame_rate: 30,
                output_filename: "animation.mp4".to_string(),
                hide_selector: None,
                script_reference: None,
            },
            PathBuf::from("/tmp/framecast-1-2-3.mp4"),
        )
    }

    #[test]
    fn test_happy_path_transitions() {
        let mut job = sample_job();
        assert_eq!(job.state(), JobState::Validating);
        assert!(job.prepare(
            "https://example.com/index4capture.html".to_string(),
            None,
            "/* prepare */".to_string(),
        ));
        assert_eq!(job.state(), JobState::Preparing);
        assert_eq!(job.capture_url, "https://example.com/index4capture.html");
        assert!(job.advance(JobState::Capturing));
        assert!(job.advance(JobState::Streaming));
        assert!(job.advance(JobState::Done));
        assert!(job.state().is_terminal());
    }

    #[test]
    fn test_failed_reachable_from_every_non_terminal_state() {
        for state in [
            JobState::Validating,
            JobState::Preparing,
            JobState::Capturing,
            JobState::Streaming,
        ] {
            assert!(state.can_advance_to(JobState::Failed), "{state:?}");
        }
        assert!(!JobState::Done.can_advance_to(JobState::Failed));
        assert!(!JobState::Failed.can_advance_to(JobState::Failed));
    }

    #[test]
    fn test_cannot_skip_capture() {
        let mut job = sample_job();
        assert!(!job.advance(JobState::Capturing));
        job.prepare(String::new(), None, String::new());
        assert!(!job.advance(JobState::Streaming));
        assert_eq!(job.state(), JobState::Preparing);
    }

    #[test]
    fn test_prepare_after_failure_changes_nothing() {
        let mut job = sample_job();
        assert!(job.advance(JobState::Failed));
        assert!(!job.prepare("https://example.com/".to_string(), None, "x".to_string()));
        assert!(job.capture_url.is_empty());
        assert_eq!(job.state(), JobState::Failed);
    }
}
