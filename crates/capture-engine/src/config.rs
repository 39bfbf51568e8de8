//! The configuration handed to a capture engine for one job.

use std::path::PathBuf;

use serde::Serialize;

use framecast_common::config::EngineConfig;
use framecast_common::geometry::Dimensions;
use framecast_export_model::ExportJob;

/// Everything the engine needs to render one animation.
///
/// Serialized as the JSON object the engine bridge reads from stdin.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureConfig {
    /// Page to load.
    pub url: String,

    /// Where the encoded video must be written.
    pub output: PathBuf,

    pub viewport: Dimensions,

    pub resolution: Dimensions,

    pub fps: u32,

    /// CSS selector of the recorded subtree.
    pub selector: String,

    /// Global timeline variable name.
    pub timeline: String,

    /// External timeline script.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,

    pub scale: u32,

    pub verbose: bool,

    /// Settle delay in milliseconds before capture starts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<u64>,

    /// Script evaluated in the page before capture.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prepare_page: Option<String>,
}

impl CaptureConfig {
    /// Build the engine configuration for a prepared job.
    pub fn for_job(job: &ExportJob, engine: &EngineConfig) -> Self {
        let request = &job.request;
        Self {
            url: job.capture_url.clone(),
            output: job.output_path.clone(),
            viewport: request.viewport_size,
            resolution: request.output_resolution,
            fps: request.frame_rate,
            selector: request.capture_selector.clone(),
            timeline: request.timeline_name.clone(),
            script: job.script_url.clone(),
            scale: engine.scale,
            verbose: engine.verbose,
            wait: (engine.settle_delay_ms > 0).then_some(engine.settle_delay_ms),
            prepare_page: (!job.preparation_script.is_empty())
                .then(|| job.preparation_script.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framecast_export_model::ExportRequest;

    fn job() -> ExportJob {
        let mut job = ExportJob::new(
            "42".to_string(),
            ExportRequest {
                page_url: "https://example.com/anim/".to_string(),
                timeline_name: "master".to_string(),
                capture_selector: "#stage".to_string(),
                viewport_size: Dimensions::new(720, 1280),
                output_resolution: Dimensions::new(1080, 1920),
                frame_rate: 24,
                output_filename: "out.mp4".to_string(),
                hide_selector: Some("#exportBtn".to_string()),
                script_reference: Some("timeline.js".to_string()),
            },
            PathBuf::from("/tmp/framecast-42.mp4"),
        );
        job.prepare(
            "https://example.com/anim/index4capture.html".to_string(),
            Some("https://example.com/anim/timeline.js".to_string()),
            "/* prepare */".to_string(),
        );
        job
    }

    #[test]
    fn test_every_field_reaches_the_engine() {
        let config = CaptureConfig::for_job(&job(), &EngineConfig::default());
        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(value["url"], "https://example.com/anim/index4capture.html");
        assert_eq!(value["output"], "/tmp/framecast-42.mp4");
        assert_eq!(value["viewport"], "720x1280");
        assert_eq!(value["resolution"], "1080x1920");
        assert_eq!(value["fps"], 24);
        assert_eq!(value["selector"], "#stage");
        assert_eq!(value["timeline"], "master");
        assert_eq!(value["script"], "https://example.com/anim/timeline.js");
        assert_eq!(value["scale"], 1);
        assert_eq!(value["verbose"], true);
        assert_eq!(value["wait"], 5000);
        assert_eq!(value["preparePage"], "/* prepare */");
    }

    #[test]
    fn test_optional_keys_are_omitted() {
        let mut job = job();
        job.script_url = None;
        job.preparation_script.clear();
        let engine = EngineConfig {
            settle_delay_ms: 0,
            ..EngineConfig::default()
        };

        let value = serde_json::to_value(CaptureConfig::for_job(&job, &engine)).unwrap();
        let object = value.as_object().unwrap();
        assert!(!object.contains_key("script"));
        assert!(!object.contains_key("wait"));
        assert!(!object.contains_key("preparePage"));
    }
}
