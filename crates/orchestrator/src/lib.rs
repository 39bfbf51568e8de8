//! Framecast Orchestrator
//!
//! Turns one export request into one video file and guarantees that the
//! temporary file is gone when the request is over.
//!
//! # Pipeline
//!
//! ```text
//! RawExportRequest
//!        │ validate (defaults, sanitised filename)
//!        ▼
//!   ExportRequest ── admission slot (bounded) ──┐
//!                                               ▼
//!                         temp path + capture URL + preparation script
//!                                               │
//!                                               ▼
//!                              CaptureEngine::capture (job timeout)
//!                                               │
//!                          ┌────────────────────┴───────────────┐
//!                          ▼                                    ▼
//!                   ExportArtifact                        FramecastError
//!              (file removed on drop)                (file already removed)
//! ```

pub mod export;
pub mod script;
pub mod temp;
pub mod urls;
pub mod validate;

pub use export::*;
