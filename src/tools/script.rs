//! Script execution tool.
//!
//! Runs a script inside the working root through the configured interpreter,
//! with the working root as the current directory and a hard timeout.
//!
//! On unix the script gets its own process group. Once the script exits, or
//! when it times out, the whole group is killed, so background processes it
//! started cannot outlive the call or hold its output pipes open.

use std::io;
use std::path::Path;
use std::process::ExitStatus;
use std::time::Duration;
use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::security::{ToolExecutionPolicy, WorkingRoot};
use crate::error::{ToolError, ToolOutcome};

/// How long output is still collected after the script has exited.
const PIPE_GRACE: Duration = Duration::from_millis(500);

/// Runs `file_path` with `args` and reports its output.
///
/// The report contains a `STDOUT:` section if stdout is non-empty, a
/// `STDERR:` section if stderr is non-empty, and an exit code line if the
/// process failed. A silent successful run reports `No output produced.`
///
/// # Errors
///
/// - `PathViolation` if the script is outside the root
/// - `NotFound` if it does not exist
/// - `ExecutionFailure` if it lacks the script extension, the interpreter
///   cannot be started, or the process exits unsuccessfully (the error
///   message then carries the full report)
/// - `Timeout` if it runs past `policy.script_timeout`
pub async fn run_script(
    root: &WorkingRoot,
    file_path: &str,
    args: &[String],
    policy: &ToolExecutionPolicy,
) -> ToolOutcome<String> {
    let path = root.resolve(file_path, "execute")?;

    if fs::metadata(&path).await.is_err() {
        return Err(ToolError::not_found(format!("File \"{file_path}\" not found")));
    }

    if !has_extension(file_path, &policy.script_extension) {
        return Err(ToolError::execution_failure(format!(
            "\"{file_path}\" is not a .{} script file",
            policy.script_extension
        )));
    }

    let mut cmd = policy.interpreter.build_command(&path, args);
    cmd.current_dir(root.path());

    let mut child = cmd.spawn().map_err(|e| {
        warn!(interpreter = %policy.interpreter.program, error = %e, "Failed to spawn interpreter");
        ToolError::execution_failure(format!(
            "Failed to start {}: {e}",
            policy.interpreter.program
        ))
    })?;
    let pid = child.id();

    let stdout = tokio::spawn(read_pipe(child.stdout.take()));
    let stderr = tokio::spawn(read_pipe(child.stderr.take()));

    let status = match tokio::time::timeout(policy.script_timeout, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(e)) => {
            reap(&mut child, pid).await;
            return Err(ToolError::execution_failure(e.to_string()));
        }
        Err(_) => {
            warn!(
                script = %file_path,
                timeout_secs = policy.script_timeout.as_secs(),
                "Script timed out and was killed"
            );
            reap(&mut child, pid).await;
            return Err(ToolError::timeout(policy.script_timeout));
        }
    };

    // Leftover background processes would keep the pipes open.
    kill_process_group(pid);
    let out = collect(stdout, "stdout").await;
    let err = collect(stderr, "stderr").await;

    debug!(script = %file_path, status = %status, "Script finished");
    let report = format_report(
        &String::from_utf8_lossy(&out),
        &String::from_utf8_lossy(&err),
        status,
    );
    if status.success() {
        Ok(report)
    } else {
        Err(ToolError::execution_failure(report))
    }
}

/// Checks the extension of the path as given, not of what it resolves to.
fn has_extension(file_path: &str, extension: &str) -> bool {
    Path::new(file_path).extension().and_then(|e| e.to_str()) == Some(extension)
}

async fn read_pipe<R: AsyncRead + Unpin>(pipe: Option<R>) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if let Some(mut pipe) = pipe {
        pipe.read_to_end(&mut buf).await?;
    }
    Ok(buf)
}

/// Waits up to [`PIPE_GRACE`] for a pipe reader. Output that does not arrive
/// in time is dropped.
async fn collect(mut reader: JoinHandle<io::Result<Vec<u8>>>, stream: &str) -> Vec<u8> {
    match tokio::time::timeout(PIPE_GRACE, &mut reader).await {
        Ok(Ok(Ok(buf))) => buf,
        Ok(Ok(Err(e))) => {
            debug!(stream, error = %e, "Failed to read script output");
            Vec::new()
        }
        Ok(Err(e)) => {
            debug!(stream, error = %e, "Output reader task failed");
            Vec::new()
        }
        Err(_) => {
            reader.abort();
            warn!(stream, "Script output still open after exit, dropping it");
            Vec::new()
        }
    }
}

/// Kills the script's process group and the script itself, then waits for
/// it so no process outlives the call.
async fn reap(child: &mut Child, pid: Option<u32>) {
    kill_process_group(pid);
    if let Err(e) = child.kill().await {
        warn!(error = %e, "Failed to kill script process");
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    let Some(pgid) = pid.and_then(|p| libc::pid_t::try_from(p).ok()) else {
        return;
    };
    // SAFETY: kill(2) takes plain integers. A negative pid addresses the
    // group the script leads, created by `process_group(0)` at spawn.
    let rc = unsafe { libc::kill(-pgid, libc::SIGKILL) };
    if rc != 0 {
        // ESRCH: the group is already gone.
        debug!(pgid, error = %io::Error::last_os_error(), "Process group not signalled");
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

fn format_report(stdout: &str, stderr: &str, status: ExitStatus) -> String {
    let mut parts = Vec::new();

    let stdout = stdout.trim();
    if !stdout.is_empty() {
        parts.push(format!("STDOUT:\n{stdout}"));
    }

    let stderr = stderr.trim();
    if !stderr.is_empty() {
        parts.push(format!("STDERR:\n{stderr}"));
    }

    if !status.success() {
        parts.push(match status.code() {
            Some(code) => format!("Process failed with exit code {code}"),
            None => "Process terminated by signal".to_string(),
        });
    }

    if parts.is_empty() {
        return "No output produced.".to_string();
    }
    parts.join("\n")
}
