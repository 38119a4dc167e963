use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, SubmergeError};

/// Which pipe a streamed line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Everything a finished tool run left behind
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn exit_code_text(&self) -> &'static str {
        exit_code_text(&self.status)
    }
}

/// Abstract external tool invocation
#[derive(Debug, Clone)]
pub struct ToolCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
}

impl ToolCommand {
    /// Create a new tool command
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
        }
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add a path argument
    pub fn path<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Shell-style rendering, for display only
    pub fn command_line(&self) -> String {
        std::iter::once(&self.binary_path)
            .chain(self.args.iter())
            .map(|part| quote(part))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn build(&self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }

    fn launch_error(&self, source: std::io::Error) -> SubmergeError {
        SubmergeError::Launch {
            tool: self.binary_path.clone(),
            source,
        }
    }

    /// Run to completion and capture both pipes
    pub async fn run_captured(&self, timeout: Duration) -> Result<ToolOutput> {
        debug!("Executing {}: {}", self.description, self.command_line());

        let child = self.build().spawn().map_err(|e| self.launch_error(e))?;

        // Dropping the pending future on timeout kills the child
        let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(output) => output.map_err(|e| self.launch_error(e))?,
            Err(_) => {
                return Err(SubmergeError::Timeout(
                    self.description.clone(),
                    timeout.as_secs(),
                ));
            }
        };

        Ok(ToolOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    /// Run to completion, handing every output line to `on_line` as it arrives.
    ///
    /// Lines are split on both `\n` and `\r` so progress meters that rewrite
    /// a single terminal line still arrive one update at a time.
    pub async fn run_streaming<F>(&self, timeout: Duration, mut on_line: F) -> Result<ToolOutput>
    where
        F: FnMut(OutputStream, &str) + Send,
    {
        debug!("Executing {}: {}", self.description, self.command_line());

        let mut child = self.build().spawn().map_err(|e| self.launch_error(e))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| SubmergeError::Launch {
                tool: self.binary_path.clone(),
                source: std::io::Error::other("stdout not captured"),
            })?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| SubmergeError::Launch {
                tool: self.binary_path.clone(),
                source: std::io::Error::other("stderr not captured"),
            })?;

        let mut stdout_segments = BufReader::new(stdout).split(b'\n');
        let mut stderr_segments = BufReader::new(stderr).split(b'\n');
        let mut captured_stdout = String::new();
        let mut captured_stderr = String::new();

        let streaming = async {
            let mut stdout_done = false;
            let mut stderr_done = false;

            while !(stdout_done && stderr_done) {
                tokio::select! {
                    segment = stdout_segments.next_segment(), if !stdout_done => match segment? {
                        Some(bytes) => emit(OutputStream::Stdout, &bytes, &mut captured_stdout, &mut on_line),
                        None => stdout_done = true,
                    },
                    segment = stderr_segments.next_segment(), if !stderr_done => match segment? {
                        Some(bytes) => emit(OutputStream::Stderr, &bytes, &mut captured_stderr, &mut on_line),
                        None => stderr_done = true,
                    },
                }
            }

            child.wait().await
        };

        let finished = tokio::time::timeout(timeout, streaming).await;
        let status = match finished {
            Ok(status) => status.map_err(|e| self.launch_error(e))?,
            Err(_) => {
                if let Err(e) = child.start_kill() {
                    debug!("Failed to kill {}: {}", self.binary_path, e);
                }
                return Err(SubmergeError::Timeout(
                    self.description.clone(),
                    timeout.as_secs(),
                ));
            }
        };

        Ok(ToolOutput {
            status,
            stdout: captured_stdout,
            stderr: captured_stderr,
        })
    }
}

fn emit<F>(stream: OutputStream, bytes: &[u8], captured: &mut String, on_line: &mut F)
where
    F: FnMut(OutputStream, &str),
{
    let text = String::from_utf8_lossy(bytes);
    for line in text.split('\r') {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        captured.push_str(line);
        captured.push('\n');
        on_line(stream, line);
    }
}

fn quote(part: &str) -> String {
    if !part.is_empty()
        && part
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@".contains(c))
    {
        part.to_string()
    } else {
        format!("'{}'", part.replace('\'', r"'\''"))
    }
}

/// Conventional description of a process exit status.
///
/// Processes killed by a signal are reported as 128 + signal number, the
/// way a shell would.
pub fn exit_code_text(status: &ExitStatus) -> &'static str {
    match exit_code(status) {
        Some(code) => describe_exit_code(code),
        None => "Unknown error",
    }
}

#[cfg(unix)]
fn exit_code(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.code().or_else(|| status.signal().map(|signal| 128 + signal))
}

#[cfg(not(unix))]
fn exit_code(status: &ExitStatus) -> Option<i32> {
    status.code()
}

pub fn describe_exit_code(code: i32) -> &'static str {
    match code {
        0 => "OK",
        1 => "General error",
        2 => "Misuse of shell builtins",
        126 => "Invoked command cannot execute",
        127 => "Command not found",
        128 => "Invalid exit argument",
        129 => "Hangup",
        130 => "Interrupt",
        131 => "Quit and dump core",
        132 => "Illegal instruction",
        133 => "Trace/breakpoint trap",
        134 => "Process aborted",
        135 => "Bus error: \"access to undefined portion of memory object\"",
        136 => "Floating point exception: \"erroneous arithmetic operation\"",
        137 => "Kill (terminate immediately)",
        138 => "User-defined 1",
        139 => "Segmentation violation",
        140 => "User-defined 2",
        141 => "Write to pipe with no one reading",
        142 => "Signal raised by alarm",
        143 => "Termination (request to terminate)",
        _ => "Unknown error",
    }
}
