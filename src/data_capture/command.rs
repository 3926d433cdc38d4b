use std::io;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::{debug, trace};
use tokio::process::Command;

/// Placeholder replaced by the image path in configured commands.
pub const PATH_PLACEHOLDER: &str = "{path}";

#[derive(Debug)]
pub(crate) enum CommandFailure {
    Spawn(io::Error),
    TimedOut,
    Status(String),
}

/// Runs `template` with every `{path}` replaced by `path` and returns stdout.
///
/// The child is killed if it outlives `timeout`.
pub(crate) async fn run_command(
    template: &[String],
    path: &Path,
    timeout: Duration,
) -> Result<Vec<u8>, CommandFailure> {
    let path = path.to_string_lossy();
    let args: Vec<String> = template
        .iter()
        .map(|a| a.replace(PATH_PLACEHOLDER, &path))
        .collect();
    let Some((program, rest)) = args.split_first() else {
        return Err(CommandFailure::Status("empty command".to_string()));
    };
    debug!("Running {} {:?}", program, rest);

    let child = Command::new(program)
        .args(rest)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    let output = match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return Err(CommandFailure::Spawn(e)),
        Err(_) => return Err(CommandFailure::TimedOut),
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandFailure::Status(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            stderr.trim()
        )));
    }
    trace!("{} wrote {} byte(s) to stdout", program, output.stdout.len());
    Ok(output.stdout)
}
