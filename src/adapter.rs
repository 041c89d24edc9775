//! Client for the external test-adapter protocol.
//!
//! The parser under test is an opaque executable (the "adapter") invoked
//! once per input file as `<adapter> --version <lang-version> <input>`. Its
//! exit code selects the stdout decoder: 0 means a Pass document, 1 means a
//! Fail document with exactly one error class. Anything else, a timeout, or
//! undecodable stdout is a protocol violation surfaced as an error - the
//! orchestrator converts those into per-case failures without aborting the
//! batch.
//!
//! Each call spawns its own child process and shares no state, so one
//! runner can be used concurrently from multiple workers.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::outcome::Outcome;
use crate::outcome::codec::{self, DecodeError};

/// Hard per-invocation timeout; an expired adapter is killed, not retried.
pub const ADAPTER_TIMEOUT: Duration = Duration::from_secs(10);

/// Interval between child exit-status polls.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Minimal document every conformant parser must accept, used by the
/// self-test.
const SELF_TEST_DOCUMENT: &str = "[main]\nvalue: 123\n";

/// Errors raised while invoking the adapter or decoding its verdict.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("couldn't find the test adapter executable at this path: {}", .0.display())]
    NotFound(PathBuf),

    #[error("failed to run the test adapter: {0}")]
    Io(#[from] std::io::Error),

    #[error("test adapter timed out after {} seconds", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    #[error("test adapter returned unexpected exit code: {code}")]
    ExitStatus { code: i32 },

    #[error("test adapter was terminated by a signal")]
    Terminated,

    #[error("test adapter returned {count} error classes, instead of one")]
    ErrorClassCount { count: usize },

    #[error("failed to decode test adapter output: {0}")]
    Stdout(#[from] DecodeError),

    #[error("test adapter failed the sanity test: returned FAIL on a valid test file")]
    SelfTestFailed,
}

/// Runs the test adapter and decodes its verdicts.
#[derive(Debug, Clone)]
pub struct AdapterRunner {
    executable: PathBuf,
    lang_version: String,
    timeout: Duration,
}

impl AdapterRunner {
    /// Create a runner for the adapter at `executable`.
    ///
    /// Fails fast when the path does not point at an existing file; the
    /// path is made absolute so invocations are independent of the working
    /// directory.
    pub fn new(executable: &Path, lang_version: &str) -> Result<Self, AdapterError> {
        if !executable.is_file() {
            return Err(AdapterError::NotFound(executable.to_path_buf()));
        }
        let executable = executable
            .canonicalize()
            .map_err(|_| AdapterError::NotFound(executable.to_path_buf()))?;
        Ok(Self {
            executable,
            lang_version: lang_version.to_string(),
            timeout: ADAPTER_TIMEOUT,
        })
    }

    /// Override the invocation timeout. Intended for maintenance tooling
    /// and tests; conformance runs use [`ADAPTER_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the adapter once for `input` and decode its verdict.
    pub fn run(&self, input: &Path) -> Result<Outcome, AdapterError> {
        let mut child = Command::new(&self.executable)
            .arg("--version")
            .arg(&self.lang_version)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout_reader = spawn_pipe_reader(child.stdout.take());
        let stderr_reader = spawn_pipe_reader(child.stderr.take());

        let status = match self.wait_with_deadline(&mut child) {
            Ok(status) => status,
            Err(error) => {
                // Drain the pipes so the reader threads finish.
                drop(stdout_reader.join());
                drop(stderr_reader.join());
                return Err(error);
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        if !stderr.trim().is_empty() {
            tracing::debug!(input = %input.display(), stderr = %stderr.trim(), "adapter wrote to stderr");
        }

        match status.code() {
            Some(0) => Ok(codec::decode_pass(&stdout)?),
            Some(1) => {
                let outcome = codec::decode_fail(&stdout)?;
                if let Outcome::Fail { classes, .. } = &outcome {
                    if classes.len() != 1 {
                        return Err(AdapterError::ErrorClassCount {
                            count: classes.len(),
                        });
                    }
                }
                Ok(outcome)
            }
            Some(code) => Err(AdapterError::ExitStatus { code }),
            None => Err(AdapterError::Terminated),
        }
    }

    /// Verify the adapter functions at all: a minimal known-valid document
    /// must produce a Pass outcome. Values are not inspected.
    pub fn self_test(&self) -> Result<(), AdapterError> {
        let mut test_file = tempfile::Builder::new()
            .prefix("elcl-selftest-")
            .suffix(".elcl")
            .tempfile()?;
        test_file.write_all(SELF_TEST_DOCUMENT.as_bytes())?;
        test_file.flush()?;
        let outcome = self.run(test_file.path())?;
        if outcome.is_pass() {
            Ok(())
        } else {
            Err(AdapterError::SelfTestFailed)
        }
    }

    /// Poll the child until it exits or the deadline passes; an expired
    /// child is killed and reported as a timeout.
    fn wait_with_deadline(&self, child: &mut Child) -> Result<ExitStatus, AdapterError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AdapterError::Timeout {
                    timeout: self.timeout,
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

/// Read a child pipe to the end on a separate thread, so a chatty adapter
/// can never dead-lock against a full pipe buffer while we poll its status.
fn spawn_pipe_reader<R: Read + Send + 'static>(
    pipe: Option<R>,
) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut text = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut text);
        }
        text
    })
}
