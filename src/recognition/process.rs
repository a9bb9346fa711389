//! Child process helper shared by the process-backed collaborators.

use std::io;
use std::process::{Output, Stdio};
use std::time::Duration;

use tokio::process::Command;

/// How a captured child process ended.
#[derive(Debug)]
pub(crate) enum ProcessRun {
    Finished(Output),
    TimedOut,
}

/// Run `argv` with stdout/stderr captured, killing it at `deadline`.
pub(crate) async fn run_captured(argv: &[String], deadline: Duration) -> io::Result<ProcessRun> {
    let Some((program, args)) = argv.split_first() else {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
    };

    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    match tokio::time::timeout(deadline, child.wait_with_output()).await {
        Ok(output) => Ok(ProcessRun::Finished(output?)),
        Err(_) => Ok(ProcessRun::TimedOut),
    }
}

/// Substitute `{timeout_ms}` and `{timeout_secs}` in each argument.
pub(crate) fn render_timeout(argv: &[String], timeout: Duration) -> Vec<String> {
    let ms = timeout.as_millis().to_string();
    let secs = timeout.as_secs().max(1).to_string();
    argv.iter()
        .map(|a| a.replace("{timeout_ms}", &ms).replace("{timeout_secs}", &secs))
        .collect()
}
