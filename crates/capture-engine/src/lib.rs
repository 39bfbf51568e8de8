//! Framecast Capture Engine
//!
//! Contract for the component that loads a page in a headless browser,
//! steps its animation timeline frame by frame and encodes the frames to
//! a video file. The engine is slow (seconds to tens of seconds), may fail
//! and may hang; callers bound it from the outside.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   CaptureConfig (JSON)   ┌──────────────────────┐
//! │ Orchestrator │ ───────────────────────▶ │ CommandEngine        │
//! │              │                          │  stdin ▶ bridge ▶    │
//! │              │ ◀─────────────────────── │  headless browser    │
//! └──────────────┘   output path / error    └──────────┬───────────┘
//!                                                      ▼
//!                                             /tmp/framecast-<id>.mp4
//! ```

pub mod config;
pub mod process;

use std::path::PathBuf;

use framecast_common::error::FramecastResult;

pub use config::CaptureConfig;
pub use process::CommandEngine;

/// Abstract interface for a frame-capture/encode backend.
#[async_trait::async_trait]
pub trait CaptureEngine: Send + Sync {
    /// Render the animation described by `config` into `config.output`.
    ///
    /// Returns the path of the produced file. Dropping the returned future
    /// must abort the render.
    async fn capture(&self, config: &CaptureConfig) -> FramecastResult<PathBuf>;

    /// Check if this engine can run on the current host.
    fn is_available(&self) -> bool;

    /// Engine name for logs.
    fn name(&self) -> &str;
}
