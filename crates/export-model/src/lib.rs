//! Framecast Export Model
//!
//! Data types exchanged between the transport layer, the orchestrator and
//! the capture engine:
//! - [`RawExportRequest`]: the job description exactly as a caller sent it
//! - [`ExportRequest`]: the normalized request with defaults applied
//! - [`ExportJob`]: one request's ephemeral lifecycle record

pub mod job;
pub mod request;

pub use framecast_common::geometry::Dimensions;
pub use job::{ExportJob, JobState};
pub use request::{ExportRequest, RawExportRequest};
