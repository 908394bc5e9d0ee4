use async_trait::async_trait;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, warn};

/// Implementations never fail: a command that cannot be spawned, exits
/// non-zero or runs past its deadline yields an empty string.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct ShellRunner {
    timeout: Duration,
}

impl ShellRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

/// SIGKILLs a whole process group when dropped. `sh -c` forks the real
/// command instead of exec'ing it, so killing only the shell would orphan it.
struct GroupKill(Option<u32>);

impl Drop for GroupKill {
    fn drop(&mut self) {
        if let Some(pgid) = self.0.and_then(|id| i32::try_from(id).ok()) {
            // ESRCH just means everything already exited.
            let _ = killpg(Pid::from_raw(pgid), Signal::SIGKILL);
        }
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &str) -> String {
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .process_group(0)
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(child) => child,
            Err(err) => {
                debug!(command = %command, error = %err, "command could not be started");
                return String::new();
            }
        };
        let _group = GroupKill(child.id());

        match time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) if output.status.success() => decode_cmd_stdout(&output.stdout),
            Ok(Ok(output)) => {
                debug!(command = %command, status = %output.status, "command exited with failure");
                String::new()
            }
            Ok(Err(err)) => {
                debug!(command = %command, error = %err, "failed to collect command output");
                String::new()
            }
            Err(_elapsed) => {
                warn!(
                    command = %command,
                    timeout = %humantime::format_duration(self.timeout),
                    "command timed out"
                );
                String::new()
            }
        }
    }
}

fn decode_cmd_stdout(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => String::from_utf8_lossy(bytes).to_string(),
    }
}
