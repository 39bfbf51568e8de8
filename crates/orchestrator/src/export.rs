//! Export orchestration: one request in, one streamed artifact out.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::Instrument;

use framecast_capture_engine::{CaptureConfig, CaptureEngine};
use framecast_common::config::{EngineConfig, RequestDefaults, ServiceConfig};
use framecast_common::error::{FramecastError, FramecastResult};
use framecast_export_model::{ExportJob, ExportRequest, JobState, RawExportRequest};

use crate::script::{build_preparation_script, page_not_ready_reason, ReadinessOptions};
use crate::temp::TempOutput;
use crate::urls::{resolve_targets, CaptureTargets};
use crate::validate::validate_request;

/// A finished video waiting to be streamed.
///
/// The file is deleted when the artifact is dropped, so the transport
/// keeps it alive exactly as long as the response body is being sent.
#[derive(Debug)]
pub struct ExportArtifact {
    job: ExportJob,
    temp: Option<TempOutput>,
    size_bytes: u64,
    started: Instant,
    failed: bool,
}

impl ExportArtifact {
    pub fn path(&self) -> &Path {
        &self.job.output_path
    }

    /// Sanitized name for the `Content-Disposition` header.
    pub fn filename(&self) -> &str {
        &self.job.request.output_filename
    }

    pub fn job_id(&self) -> &str {
        &self.job.id
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// MIME type matching the file extension.
    pub fn content_type(&self) -> &'static str {
        content_type_for(self.filename())
    }

    /// Record that the artifact could not be delivered.
    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// State the job ends in once the artifact is dropped.
    pub fn final_state(&self) -> JobState {
        if self.failed {
            JobState::Failed
        } else {
            JobState::Done
        }
    }
}

impl Drop for ExportArtifact {
    fn drop(&mut self) {
        if let Some(temp) = self.temp.take() {
            temp.release();
        }
        let state = self.final_state();
        self.job.advance(state);
        let elapsed_ms = self.started.elapsed().as_millis() as u64;
        if state == JobState::Failed {
            tracing::warn!(job_id = %self.job.id, elapsed_ms, "Export job failed while streaming");
        } else {
            tracing::info!(job_id = %self.job.id, elapsed_ms, "Export job finished");
        }
    }
}

/// Sequences validation, admission, preparation, capture and cleanup.
pub struct ExportOrchestrator {
    engine: Arc<dyn CaptureEngine>,
    defaults: RequestDefaults,
    engine_config: EngineConfig,
    readiness: ReadinessOptions,
    admission: Arc<Semaphore>,
}

impl ExportOrchestrator {
    pub fn new(engine: Arc<dyn CaptureEngine>, config: &ServiceConfig) -> Self {
        Self {
            engine,
            defaults: config.defaults.clone(),
            engine_config: config.engine.clone(),
            readiness: ReadinessOptions::from_engine_config(&config.engine),
            admission: Arc::new(Semaphore::new(config.engine.max_concurrent_jobs.max(1))),
        }
    }

    /// Name of the underlying engine.
    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Run one export job to completion.
    ///
    /// Exactly one engine invocation happens for a request that passes
    /// validation and admission; none otherwise. On error, any partial
    /// output has already been deleted when this returns.
    pub async fn run(&self, raw: &RawExportRequest) -> FramecastResult<ExportArtifact> {
        let request = validate_request(raw, &self.defaults)?;
        let targets = resolve_targets(&request, &self.defaults.capture_document)?;
        let permit = self.acquire_slot().await?;

        let extension = extension_for(&request.output_filename);
        let (token, temp) = TempOutput::allocate(&self.engine_config.effective_temp_dir(), extension)?;
        let span = tracing::info_span!("export_job", job_id = %token);

        self.run_job(token, request, targets, temp, permit)
            .instrument(span)
            .await
    }

    async fn run_job(
        &self,
        token: String,
        request: ExportRequest,
        targets: CaptureTargets,
        temp: TempOutput,
        permit: OwnedSemaphorePermit,
    ) -> FramecastResult<ExportArtifact> {
        let started = Instant::now();

        let script = build_preparation_script(
            &request.timeline_name,
            request.hide_selector.as_deref(),
            &self.readiness,
        );

        let mut job = ExportJob::new(token, request, temp.path().to_path_buf());
        job.prepare(targets.capture_url, targets.script_url, script);
        let config = CaptureConfig::for_job(&job, &self.engine_config);

        tracing::info!(
            url = %config.url,
            output = %config.output.display(),
            viewport = %config.viewport,
            resolution = %config.resolution,
            fps = config.fps,
            selector = %config.selector,
            timeline = %config.timeline,
            engine = self.engine.name(),
            "Starting capture"
        );

        job.advance(JobState::Capturing);
        let timeout = Duration::from_secs(self.engine_config.job_timeout_secs);
        let outcome = tokio::time::timeout(timeout, self.engine.capture(&config)).await;
        drop(permit);

        let result = match outcome {
            Err(_) => Err(FramecastError::CaptureTimeout {
                timeout_secs: self.engine_config.job_timeout_secs,
            }),
            Ok(Err(e)) => Err(classify_engine_error(e)),
            Ok(Ok(produced)) => {
                if produced != job.output_path {
                    tracing::warn!(
                        produced = %produced.display(),
                        "Engine reported a different output path; using the allocated one"
                    );
                }
                output_size(&job.output_path).await
            }
        };

        match result {
            Ok(size_bytes) => {
                job.advance(JobState::Streaming);
                tracing::info!(
                    size_bytes,
                    capture_ms = started.elapsed().as_millis() as u64,
                    "Capture complete"
                );
                Ok(ExportArtifact {
                    job,
                    temp: Some(temp),
                    size_bytes,
                    started,
                    failed: false,
                })
            }
            Err(e) => {
                job.advance(JobState::Failed);
                temp.release();
                tracing::error!(error = %e, "Export job failed");
                Err(e)
            }
        }
    }

    async fn acquire_slot(&self) -> FramecastResult<OwnedSemaphorePermit> {
        let wait = Duration::from_secs(self.engine_config.queue_timeout_secs);
        match tokio::time::timeout(wait, self.admission.clone().acquire_owned()).await {
            Ok(Ok(permit)) => Ok(permit),
            Ok(Err(_)) => Err(FramecastError::service_busy("capture queue is closed")),
            Err(_) => {
                tracing::warn!(
                    max_concurrent_jobs = self.engine_config.max_concurrent_jobs,
                    "No capture slot became free in time"
                );
                Err(FramecastError::service_busy(format!(
                    "all {} capture slots are busy; retry later",
                    self.engine_config.max_concurrent_jobs
                )))
            }
        }
    }
}

/// Map engine failures carrying the readiness marker to `PageNotReady`.
fn classify_engine_error(err: FramecastError) -> FramecastError {
    match err {
        FramecastError::CaptureEngine { message, details } => {
            let reason = page_not_ready_reason(&message)
                .or_else(|| details.as_deref().and_then(page_not_ready_reason));
            match reason {
                Some(reason) => FramecastError::page_not_ready(reason),
                None => FramecastError::CaptureEngine { message, details },
            }
        }
        other => other,
    }
}

async fn output_size(path: &Path) -> FramecastResult<u64> {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > 0 => Ok(meta.len()),
        Ok(_) => Err(FramecastError::capture_engine(
            "capture engine produced an empty output file",
        )),
        Err(_) => Err(FramecastError::capture_engine(
            "capture engine did not write the output file",
        )),
    }
}

fn extension_for(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "webm" => "webm",
        Some(ext) if ext == "mov" => "mov",
        _ => "mp4",
    }
}

fn content_type_for(filename: &str) -> &'static str {
    match extension_for(filename) {
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        _ => "video/mp4",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_page_not_ready() {
        let err = FramecastError::capture_engine(format!(
            "Error: {}: timeline \"tl\" was not found on window after 10000ms",
            crate::script::PAGE_NOT_READY_MARKER
        ));
        match classify_engine_error(err) {
            FramecastError::PageNotReady { message } => {
                assert!(message.contains("timeline \"tl\" was not found"))
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_classify_marker_in_details() {
        let err = FramecastError::capture_engine_with_details(
            "capture engine exited with exit status: 1",
            format!("{}: timeline \"main\" missing", crate::script::PAGE_NOT_READY_MARKER),
        );
        assert!(matches!(
            classify_engine_error(err),
            FramecastError::PageNotReady { .. }
        ));
    }

    #[test]
    fn test_other_engine_errors_pass_through() {
        let err = FramecastError::capture_engine("net::ERR_NAME_NOT_RESOLVED");
        assert!(matches!(
            classify_engine_error(err),
            FramecastError::CaptureEngine { .. }
        ));
    }

    fn streaming_artifact(dir: &Path) -> ExportArtifact {
        let request = crate::validate::validate_request(
            &RawExportRequest::for_page("https://example.com/anim/"),
            &RequestDefaults::default(),
        )
        .unwrap();
        let (token, temp) = TempOutput::allocate(dir, "mp4").unwrap();
        let mut job = ExportJob::new(token, request, temp.path().to_path_buf());
        job.prepare(String::new(), None, String::new());
        job.advance(JobState::Capturing);
        job.advance(JobState::Streaming);
        ExportArtifact {
            job,
            temp: Some(temp),
            size_bytes: 0,
            started: Instant::now(),
            failed: false,
        }
    }

    #[test]
    fn test_delivered_artifact_ends_done() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = streaming_artifact(dir.path());
        assert_eq!(artifact.final_state(), JobState::Done);
    }

    #[test]
    fn test_undeliverable_artifact_ends_failed_and_is_removed() {
        let dir = tempfile::tempdir().unwrap();
        let mut artifact = streaming_artifact(dir.path());
        let path = artifact.path().to_path_buf();
        artifact.mark_failed();
        assert_eq!(artifact.final_state(), JobState::Failed);
        drop(artifact);
        assert!(!path.exists());
    }

    #[test]
    fn test_extension_and_content_type() {
        assert_eq!(extension_for("out.mp4"), "mp4");
        assert_eq!(extension_for("clip.WEBM"), "webm");
        assert_eq!(extension_for("noext"), "mp4");
        assert_eq!(content_type_for("a.webm"), "video/webm");
        assert_eq!(content_type_for("a.gif"), "video/mp4");
    }
}
