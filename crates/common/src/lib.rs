//! Framecast Common Utilities
//!
//! Shared infrastructure for all Framecast crates:
//! - Error types and result aliases
//! - Timestamps and unique job tokens
//! - Frame geometry (`WIDTHxHEIGHT` pairs)
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod error;
pub mod geometry;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use geometry::*;
