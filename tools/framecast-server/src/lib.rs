//! Framecast HTTP transport.
//!
//! # Endpoints
//! - `POST /export-video`: render the described animation and stream the video back.
//! - `GET /health`: liveness probe; never touches the capture engine.
//! - `OPTIONS *`: always `200` with permissive CORS headers.

pub mod response;
pub mod routes;

pub use routes::{router, AppState};
