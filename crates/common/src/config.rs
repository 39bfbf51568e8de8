//! Service configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{FramecastError, FramecastResult};
use crate::geometry::Dimensions;

/// Global service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Values applied to export requests that omit optional fields.
    pub defaults: RequestDefaults,

    /// Capture engine invocation and job limits.
    pub engine: EngineConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Deployment mode. Controls whether diagnostic details reach callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Self::Production
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Some(Self::Production),
            "development" | "dev" => Some(Self::Development),
            _ => None,
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
}

/// Defaults for optional request fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestDefaults {
    /// Global variable name of the timeline.
    pub timeline: String,

    /// CSS selector of the subtree to record.
    pub selector: String,

    /// Rendering surface.
    pub viewport: Dimensions,

    /// Output frame size.
    pub resolution: Dimensions,

    pub fps: u32,

    /// Suggested download name.
    pub filename: String,

    /// Document appended to directory-style page URLs.
    pub capture_document: String,
}

/// How the capture engine is launched and bounded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine executable.
    pub program: String,

    /// Arguments passed before the engine reads its JSON job from stdin.
    pub args: Vec<String>,

    /// Delay before the first frame is captured, letting fonts and images load.
    pub settle_delay_ms: u64,

    /// Upper bound on waiting for the page timeline to appear.
    pub ready_timeout_ms: u64,

    pub ready_poll_interval_ms: u64,

    /// Hard limit for a single engine invocation.
    pub job_timeout_secs: u64,

    /// Concurrent engine invocations allowed.
    pub max_concurrent_jobs: usize,

    /// How long a request may wait for a free capture slot.
    pub queue_timeout_secs: u64,

    /// Directory for temporary output files. System temp dir when unset.
    pub temp_dir: Option<PathBuf>,

    pub scale: u32,

    pub verbose: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "framecast=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: Environment::Development,
        }
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self {
            timeline: "tl".to_string(),
            selector: ".container".to_string(),
            viewport: Dimensions::portrait_hd(),
            resolution: Dimensions::portrait_hd(),
            fps: 30,
            filename: "animation.mp4".to_string(),
            capture_document: "index4capture.html".to_string(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            args: vec!["scripts/capture-bridge.mjs".to_string()],
            settle_delay_ms: 5_000,
            ready_timeout_ms: 10_000,
            ready_poll_interval_ms: 100,
            job_timeout_secs: 300,
            max_concurrent_jobs: 2,
            queue_timeout_secs: 30,
            temp_dir: None,
            scale: 1,
            verbose: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl EngineConfig {
    /// Directory where temporary outputs are written.
    pub fn effective_temp_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

impl ServiceConfig {
    /// Load config from the standard location, falling back to defaults.
    ///
    /// Called before logging is set up, so problems are returned as
    /// warnings for the caller to log once a subscriber exists.
    pub fn load() -> (Self, Vec<String>) {
        Self::load_or_default(&config_file_path())
    }

    fn load_or_default(config_path: &Path) -> (Self, Vec<String>) {
        if !config_path.exists() {
            return (Self::default(), Vec::new());
        }
        match Self::load_from(config_path) {
            Ok(config) => (config, Vec::new()),
            Err(e) => (
                Self::default(),
                vec![format!("Ignoring config at {}: {e}", config_path.display())],
            ),
        }
    }

    /// Load config from an explicit path. Errors are not swallowed.
    pub fn load_from(path: &Path) -> FramecastResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            FramecastError::config(format!("Failed to read {}: {e}", path.display()))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            FramecastError::config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// Apply `PORT`, `FRAMECAST_*` and `NODE_ENV` overrides.
    ///
    /// Returns warnings about overrides that were ignored.
    pub fn apply_env_overrides(&mut self) -> FramecastResult<Vec<String>> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> FramecastResult<Vec<String>> {
        let mut warnings = Vec::new();
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| FramecastError::config(format!("PORT is not a valid port: {port}")))?;
        }
        if let Some(host) = lookup("FRAMECAST_HOST") {
            self.server.host = host;
        }
        if let Some(env) = lookup("FRAMECAST_ENV").or_else(|| lookup("NODE_ENV")) {
            match Environment::parse(&env) {
                Some(parsed) => self.server.environment = parsed,
                None => warnings.push(format!(
                    "Unknown environment {env:?}, keeping {:?}",
                    self.server.environment
                )),
            }
        }
        if let Some(program) = lookup("FRAMECAST_ENGINE_PROGRAM") {
            self.engine.program = program;
        }
        if let Some(max) = lookup("FRAMECAST_MAX_JOBS") {
            self.engine.max_concurrent_jobs = max.parse().map_err(|_| {
                FramecastError::config(format!("FRAMECAST_MAX_JOBS is not a number: {max}"))
            })?;
        }
        Ok(warnings)
    }

    /// Reject settings that would make every export fail or hang.
    pub fn validate(&self) -> FramecastResult<()> {
        if self.defaults.fps == 0 {
            return Err(FramecastError::config("defaults.fps must be positive"));
        }
        if !self.defaults.viewport.is_valid() || !self.defaults.resolution.is_valid() {
            return Err(FramecastError::config("default dimensions must be positive"));
        }
        if self.defaults.timeline.trim().is_empty() {
            return Err(FramecastError::config("defaults.timeline must not be empty"));
        }
        if self.engine.max_concurrent_jobs == 0 {
            return Err(FramecastError::config("engine.max_concurrent_jobs must be at least 1"));
        }
        if self.engine.job_timeout_secs == 0 || self.engine.ready_timeout_ms == 0 {
            return Err(FramecastError::config("engine timeouts must be positive"));
        }
        if self.engine.ready_poll_interval_ms == 0 {
            return Err(FramecastError::config("engine.ready_poll_interval_ms must be positive"));
        }
        if self.engine.program.trim().is_empty() {
            return Err(FramecastError::config("engine.program must not be empty"));
        }
        Ok(())
    }
}

/// Standard config file location.
fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("framecast").join("config.json")
}
