use crate::models::PlatformProfile;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// What happened when trying to close the running application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminationOutcome {
    /// The termination command reported success
    Terminated,

    /// The application could not be closed; it may simply not be running
    NotTerminated { reason: String },
}

impl TerminationOutcome {
    pub fn is_terminated(&self) -> bool {
        matches!(self, TerminationOutcome::Terminated)
    }
}

/// Close every running instance of the target application.
///
/// Best-effort: a non-zero exit status, a command that cannot be spawned or a
/// command that outlives `timeout_duration` is logged as a warning and reported
/// as [`TerminationOutcome::NotTerminated`]. This never fails.
pub async fn terminate_application(
    profile: &PlatformProfile,
    timeout_duration: Duration,
) -> TerminationOutcome {
    let command = profile.termination_command();
    tracing::info!(
        "Closing {} processes: {}",
        profile.process_name(),
        command
    );

    let start = Instant::now();

    let child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn();

    let child = match child {
        Ok(child) => child,
        Err(e) => {
            return not_terminated(format!("failed to run {}: {}", command.program, e));
        }
    };

    let output = match timeout(timeout_duration, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            return not_terminated(format!("failed to wait for {}: {}", command.program, e));
        }
        Err(_) => {
            return not_terminated(format!(
                "{} did not finish within {:?}",
                command.program, timeout_duration
            ));
        }
    };

    tracing::debug!(
        "{} finished in {:.2}s with {}",
        command.program,
        start.elapsed().as_secs_f32(),
        output.status
    );

    if output.status.success() {
        tracing::info!("{} processes terminated successfully", profile.process_name());
        TerminationOutcome::Terminated
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.trim();
        if detail.is_empty() {
            not_terminated(format!("{} exited with {}", command.program, output.status))
        } else {
            not_terminated(format!(
                "{} exited with {}: {}",
                command.program, output.status, detail
            ))
        }
    }
}

fn not_terminated(reason: String) -> TerminationOutcome {
    tracing::warn!(
        "Could not terminate the Guilded process, it may not be running ({})",
        reason
    );
    TerminationOutcome::NotTerminated { reason }
}
