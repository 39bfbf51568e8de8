//! Capture engine backed by an external process.
//!
//! The process receives one [`CaptureConfig`] as JSON on stdin, renders the
//! animation, writes the video to `config.output` and exits. A non-zero exit
//! status is a capture failure; the last line the process printed to stderr
//! is taken as the failure message.
//!
//! On unix the engine leads its own process group. When the capture ends,
//! succeeds or is abandoned, every process still in that group (browsers,
//! encoders) is killed before control returns to the caller.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::process::{Command as StdCommand, Stdio};
use std::time::{Duration, Instant};

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};

use framecast_common::config::EngineConfig;
use framecast_common::error::{FramecastError, FramecastResult};

use crate::config::CaptureConfig;
use crate::CaptureEngine;

/// Stderr lines kept for error reports.
const STDERR_TAIL_LINES: usize = 40;

/// Upper bound on waiting for a killed process group to disappear.
const GROUP_EXIT_WAIT: Duration = Duration::from_secs(2);

/// Runs a capture bridge program (by default `node capture-bridge.mjs`).
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.program.clone(), config.args.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command(&self) -> Command {
        let mut std_cmd = StdCommand::new(&self.program);
        std_cmd
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            std_cmd.process_group(0);
        }
        let mut cmd = Command::from(std_cmd);
        cmd.kill_on_drop(true);
        cmd
    }
}

#[async_trait::async_trait]
impl CaptureEngine for CommandEngine {
    async fn capture(&self, config: &CaptureConfig) -> FramecastResult<PathBuf> {
        let payload = serde_json::to_vec(config)?;

        tracing::debug!(program = %self.program, args = ?self.args, "Running capture engine");
        let start = Instant::now();
        let mut engine = EngineProcess::spawn(self.command()).map_err(|e| {
            FramecastError::capture_engine(format!("Failed to start {}: {e}", self.program))
        })?;

        tracing::info!(
            pid = engine.child.id(),
            url = %config.url,
            output = %config.output.display(),
            "Capture engine process started"
        );

        let mut stdin = engine
            .child
            .stdin
            .take()
            .ok_or_else(|| FramecastError::capture_engine("Failed to open engine stdin"))?;
        let stdout = engine
            .child
            .stdout
            .take()
            .ok_or_else(|| FramecastError::capture_engine("Failed to capture engine stdout"))?;
        let stderr = engine
            .child
            .stderr
            .take()
            .ok_or_else(|| FramecastError::capture_engine("Failed to capture engine stderr"))?;

        // Drain both pipes concurrently so the engine never blocks on a full pipe.
        let stdout_task = tokio::spawn(drain_lines(stdout, |line| {
            tracing::debug!(target: "framecast::engine", "{line}");
        }));
        let stderr_task = tokio::spawn(async move {
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            drain_lines(stderr, |line| {
                tracing::debug!(target: "framecast::engine", "{line}");
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            })
            .await;
            tail
        });

        // A bridge that exits before reading its input surfaces as a broken
        // pipe here; the exit status below carries the real failure.
        if let Err(e) = stdin.write_all(&payload).await {
            tracing::warn!(error = %e, "Failed writing job to engine stdin");
        }
        drop(stdin);

        let status = engine
            .child
            .wait()
            .await
            .map_err(|e| FramecastError::capture_engine(format!("Failed to wait on engine: {e}")))?;

        // Stragglers would keep the pipes open and could still touch the output.
        drop(engine);
        let _ = stdout_task.await;
        let stderr_tail = stderr_task.await.unwrap_or_default();

        tracing::info!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            %status,
            "Capture engine process exited"
        );

        if !status.success() {
            let message = stderr_tail
                .iter()
                .rev()
                .map(|line| line.trim())
                .find(|line| !line.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("capture engine exited with {status}"));
            let details = Vec::from(stderr_tail).join("\n");
            return Err(FramecastError::capture_engine_with_details(message, details));
        }

        match tokio::fs::metadata(&config.output).await {
            Ok(meta) if meta.len() > 0 => Ok(config.output.clone()),
            Ok(_) => Err(FramecastError::capture_engine(
                "capture engine produced an empty output file",
            )),
            Err(_) => Err(FramecastError::capture_engine(format!(
                "capture engine reported success but {} was not written",
                config.output.display()
            ))),
        }
    }

    fn is_available(&self) -> bool {
        command_exists(&self.program)
    }

    fn name(&self) -> &str {
        "command"
    }
}

/// A spawned engine and, on unix, the process group it leads.
///
/// Dropping the handle kills the whole group and blocks until no member
/// is left or [`GROUP_EXIT_WAIT`] has passed.
struct EngineProcess {
    child: Child,
    #[cfg(unix)]
    pgid: Option<libc::pid_t>,
}

impl EngineProcess {
    fn spawn(mut cmd: Command) -> std::io::Result<Self> {
        let child = cmd.spawn()?;
        Ok(Self {
            #[cfg(unix)]
            pgid: child.id().and_then(|pid| libc::pid_t::try_from(pid).ok()),
            child,
        })
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid.take() {
            terminate_process_group(pgid, &mut self.child);
        }
    }
}

#[cfg(unix)]
fn terminate_process_group(pgid: libc::pid_t, leader: &mut Child) {
    // SAFETY: killpg only sends a signal to the group this engine leads.
    if unsafe { libc::killpg(pgid, libc::SIGKILL) } != 0 {
        return;
    }
    tracing::debug!(pgid, "Killed capture engine process group");

    let deadline = Instant::now() + GROUP_EXIT_WAIT;
    loop {
        let _ = leader.try_wait();
        // SAFETY: signal 0 only checks whether any group member still exists.
        if unsafe { libc::killpg(pgid, 0) } != 0 {
            return;
        }
        if Instant::now() >= deadline {
            tracing::warn!(pgid, "Capture engine process group still present after kill");
            return;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}

/// Read `pipe` line by line until EOF. Invalid UTF-8 is replaced, never fatal.
async fn drain_lines<R>(pipe: R, mut on_line: impl FnMut(String))
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                on_line(line.trim_end_matches(['\n', '\r']).to_string());
            }
            Err(e) => {
                tracing::debug!(error = %e, "Engine output pipe failed");
                break;
            }
        }
    }
}

fn command_exists(binary: &str) -> bool {
    if binary.contains(std::path::MAIN_SEPARATOR) {
        return std::path::Path::new(binary).is_file();
    }
    StdCommand::new("sh")
        .args(["-c", "command -v \"$1\" >/dev/null 2>&1", "sh", binary])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}
