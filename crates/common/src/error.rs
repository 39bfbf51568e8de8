//! Error types shared across Framecast crates.

use std::path::PathBuf;

/// Top-level error type for Framecast operations.
#[derive(Debug, thiserror::Error)]
pub enum FramecastError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Page not ready: {message}")]
    PageNotReady { message: String },

    #[error("Capture engine error: {message}")]
    CaptureEngine {
        message: String,
        /// Extra diagnostic output (engine stderr tail, source chain).
        details: Option<String>,
    },

    #[error("Capture timed out after {timeout_secs}s")]
    CaptureTimeout { timeout_secs: u64 },

    #[error("Service busy: {message}")]
    ServiceBusy { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to remove temporary file {path}: {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using FramecastError.
pub type FramecastResult<T> = Result<T, FramecastError>;

impl FramecastError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn page_not_ready(msg: impl Into<String>) -> Self {
        Self::PageNotReady {
            message: msg.into(),
        }
    }

    pub fn capture_engine(msg: impl Into<String>) -> Self {
        Self::CaptureEngine {
            message: msg.into(),
            details: None,
        }
    }

    pub fn capture_engine_with_details(msg: impl Into<String>, details: impl Into<String>) -> Self {
        Self::CaptureEngine {
            message: msg.into(),
            details: Some(details.into()),
        }
    }

    pub fn service_busy(msg: impl Into<String>) -> Self {
        Self::ServiceBusy {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Diagnostic text suitable for non-production error bodies.
    pub fn details(&self) -> Option<String> {
        match self {
            Self::CaptureEngine { details, .. } => details.clone(),
            Self::Validation { .. } | Self::ServiceBusy { .. } => None,
            other => {
                let mut chain = Vec::new();
                let mut source = std::error::Error::source(other);
                while let Some(err) = source {
                    chain.push(err.to_string());
                    source = err.source();
                }
                if chain.is_empty() {
                    Some(format!("{other:?}"))
                } else {
                    Some(chain.join("\ncaused by: "))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_validation_is_client_error() {
        assert!(FramecastError::validation("pageUrl required").is_client_error());
        assert!(!FramecastError::page_not_ready("tl missing").is_client_error());
        assert!(!FramecastError::service_busy("full").is_client_error());
        assert!(!FramecastError::CaptureTimeout { timeout_secs: 5 }.is_client_error());
    }

    #[test]
    fn test_engine_details_are_passed_through() {
        let err = FramecastError::capture_engine_with_details("exit 1", "stderr tail");
        assert_eq!(err.details().as_deref(), Some("stderr tail"));
        assert_eq!(err.to_string(), "Capture engine error: exit 1");
    }

    #[test]
    fn test_validation_has_no_details() {
        assert!(FramecastError::validation("bad").details().is_none());
    }
}
