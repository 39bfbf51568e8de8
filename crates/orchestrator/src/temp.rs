//! Scoped temporary output files.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;

use framecast_common::clock::next_job_token;
use framecast_common::error::{FramecastError, FramecastResult};

/// A temporary output file that is deleted when the guard goes away.
///
/// Allocation atomically creates an empty file under a fresh name, so two
/// jobs can never be handed the same path. The engine overwrites it.
/// Whatever is at the path when the guard is released or dropped is
/// removed, on every exit path (error, panic unwinding, cancelled request).
#[derive(Debug)]
pub struct TempOutput {
    path: PathBuf,
    guard: Option<TempPath>,
}

impl TempOutput {
    /// Create `<dir>/framecast-<token>-<random>.<extension>`.
    ///
    /// Returns the job token alongside the guard so callers can correlate logs.
    pub fn allocate(dir: &Path, extension: &str) -> FramecastResult<(String, Self)> {
        std::fs::create_dir_all(dir)?;
        let token = next_job_token();
        let guard = tempfile::Builder::new()
            .prefix(&format!("framecast-{token}-"))
            .suffix(&format!(".{extension}"))
            .tempfile_in(dir)?
            .into_temp_path();

        Ok((
            token,
            Self {
                path: guard.to_path_buf(),
                guard: Some(guard),
            },
        ))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now. Failures are logged, never returned.
    pub fn release(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        match close_temp_path(guard) {
            Ok(true) => tracing::debug!(path = %self.path.display(), "Temporary output removed"),
            Ok(false) => {}
            Err(e) => tracing::warn!(error = %e, "Temporary output cleanup failed"),
        }
    }
}

impl Drop for TempOutput {
    fn drop(&mut self) {
        self.remove();
    }
}

/// Delete the file behind `guard`. `Ok(false)` when it was already gone.
fn close_temp_path(guard: TempPath) -> FramecastResult<bool> {
    let path = guard.to_path_buf();
    match guard.close() {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(FramecastError::Cleanup { path, source }),
    }
}
