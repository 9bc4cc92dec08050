// Process probe runner
// reason: tokio::process so both pipes drain concurrently with the wait
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use pingproc_core::application::CancelToken;
use pingproc_core::domain::{PingError, RawOutput};
use pingproc_core::port::ProbeRunner;
use pingproc_core::PingConfig;

type PipeReader = JoinHandle<std::io::Result<Vec<u8>>>;

/// Spawns the probe utility with the target as its last argument
///
/// stdin is closed, stdout and stderr are piped and read by their own tasks
/// while the child runs. The child is killed when the run is cancelled or its
/// future is dropped.
pub struct ProcessProbeRunner {
    program: String,
    base_args: Vec<String>,
    kill_grace: Duration,
    working_dir: Option<PathBuf>,
}

impl ProcessProbeRunner {
    /// Create a runner from configuration
    ///
    /// # Example
    /// ```ignore
    /// let runner = ProcessProbeRunner::new(&PingConfig::default());
    /// let raw = runner.run("localhost", &CancelToken::never()).await?;
    /// ```
    pub fn new(config: &PingConfig) -> Self {
        Self {
            program: config.program.clone(),
            base_args: config.base_args.clone(),
            kill_grace: config.kill_grace,
            working_dir: config.working_dir.clone(),
        }
    }

    fn command(&self, target: &str) -> Command {
        let mut command = Command::new(&self.program);
        command
            .args(&self.base_args)
            .arg(target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &self.working_dir {
            command.current_dir(dir);
        }

        #[cfg(windows)]
        {
            const CREATE_NO_WINDOW: u32 = 0x0800_0000;
            command.creation_flags(CREATE_NO_WINDOW);
        }

        command
    }

    /// Spawn child process, drain both pipes and wait for exit or cancellation
    async fn spawn_and_wait(
        &self,
        target: &str,
        cancel: &CancelToken,
    ) -> Result<RawOutput, PingError> {
        let mut child = self
            .command(target)
            .spawn()
            .map_err(|e| PingError::launch(&self.program, e))?;
        let pid = child.id();

        info!(
            program = %self.program,
            args = ?self.base_args,
            host = %target,
            pid = ?pid,
            "Probe process started"
        );

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let mut cancel = cancel.clone();
        let status = tokio::select! {
            status = child.wait() => status,
            _ = cancel.cancelled() => {
                stdout.abort();
                stderr.abort();
                self.terminate(&mut child).await;
                warn!(host = %target, pid = ?pid, "Probe process killed on cancellation");
                return Err(PingError::Cancelled);
            }
        };

        let status = status.map_err(|e| PingError::Io(e.to_string()))?;
        let stdout = collect(stdout).await?;
        let stderr = collect(stderr).await?;
        let exit_code = exit_code_of(status)?;

        info!(
            host = %target,
            pid = ?pid,
            exit_code = exit_code,
            stdout_bytes = stdout.len(),
            stderr_bytes = stderr.len(),
            "Probe process exited"
        );

        Ok(RawOutput {
            exit_code,
            stdout,
            stderr,
        })
    }

    /// SIGTERM first, then SIGKILL after the grace period; always reaps
    async fn terminate(&self, child: &mut Child) {
        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            // A zero grace period skips straight to the forced kill
            let pid = child
                .id()
                .and_then(|id| i32::try_from(id).ok())
                .filter(|_| !self.kill_grace.is_zero());
            if let Some(pid) = pid {
                match kill(Pid::from_raw(pid), Signal::SIGTERM) {
                    Ok(()) => {
                        debug!(pid = %pid, "Sent SIGTERM to probe process");
                        if let Ok(Ok(status)) =
                            tokio::time::timeout(self.kill_grace, child.wait()).await
                        {
                            debug!(pid = %pid, status = %status, "Probe process exited after SIGTERM");
                            return;
                        }
                        warn!(pid = %pid, "Probe process ignored SIGTERM, sending SIGKILL");
                    }
                    Err(e) => warn!(pid = %pid, error = %e, "SIGTERM failed"),
                }
            }
        }

        // kill() sends SIGKILL / TerminateProcess and waits; on failure the
        // child has already exited and only needs reaping
        if let Err(e) = child.kill().await {
            debug!(error = %e, "Kill failed, reaping exited probe process");
            let _ = child.wait().await;
        }
    }
}

#[async_trait]
impl ProbeRunner for ProcessProbeRunner {
    async fn run(&self, target: &str, cancel: &CancelToken) -> Result<RawOutput, PingError> {
        if cancel.is_cancelled() {
            return Err(PingError::Cancelled);
        }
        self.spawn_and_wait(target, cancel).await
    }

    fn program(&self) -> &str {
        &self.program
    }
}

/// Read a pipe to the end on its own task
fn drain<R>(pipe: Option<R>) -> PipeReader
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            pipe.read_to_end(&mut buf).await?;
        }
        Ok::<_, std::io::Error>(buf)
    })
}

async fn collect(reader: PipeReader) -> Result<String, PingError> {
    let bytes = reader
        .await
        .map_err(|e| PingError::Io(e.to_string()))?
        .map_err(|e| PingError::Io(e.to_string()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn exit_code_of(status: ExitStatus) -> Result<i32, PingError> {
    if let Some(code) = status.code() {
        return Ok(code);
    }

    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return Err(PingError::Terminated(format!("killed by signal {}", signal)));
        }
    }

    Err(PingError::Terminated(status.to_string()))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pingproc_core::application::cancel_channel;
    use tokio_test::assert_ok;

    /// Runner executing `script` through sh, with the target as `$1`
    fn script_runner(script: &str) -> ProcessProbeRunner {
        ProcessProbeRunner::new(
            &PingConfig::for_program("sh").with_base_args(["-c", script, "probe"]),
        )
    }

    #[tokio::test]
    async fn test_captures_stdout_and_exit_code() {
        let runner = script_runner(r#"echo "Reply from $1""#);

        let raw = assert_ok!(runner.run("localhost", &CancelToken::never()).await);

        assert_eq!(raw.exit_code, 0);
        assert_eq!(raw.stdout, "Reply from localhost\n");
        assert_eq!(raw.stderr, "");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_a_normal_result() {
        let runner = script_runner(r#"echo "could not find host $1"; exit 1"#);

        let raw = assert_ok!(runner.run("badaddress", &CancelToken::never()).await);

        assert_eq!(raw.exit_code, 1);
        assert_eq!(raw.stdout.trim(), "could not find host badaddress");
    }

    #[tokio::test]
    async fn test_stderr_captured_separately() {
        let runner = script_runner("echo out; echo err >&2; exit 2");

        let raw = runner.run("x", &CancelToken::never()).await.unwrap();

        assert_eq!(raw.exit_code, 2);
        assert_eq!(raw.stdout, "out\n");
        assert_eq!(raw.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_large_output_on_both_pipes_does_not_deadlock() {
        let runner = script_runner("seq 1 100000; seq 1 100000 >&2");

        let raw = tokio::time::timeout(
            Duration::from_secs(20),
            runner.run("x", &CancelToken::never()),
        )
        .await
        .expect("run should not deadlock on full pipes")
        .unwrap();

        assert_eq!(raw.stdout.lines().count(), 100000);
        assert_eq!(raw.stderr.lines().count(), 100000);
        assert_eq!(raw.stdout.lines().last(), Some("100000"));
    }

    #[tokio::test]
    async fn test_missing_program_is_launch_failure() {
        let runner = ProcessProbeRunner::new(&PingConfig::for_program("pingproc-no-such-program"));

        let err = runner.run("localhost", &CancelToken::never()).await.unwrap_err();

        assert!(err.is_launch_failure());
        assert!(err.to_string().contains("pingproc-no-such-program"));
    }

    #[tokio::test]
    async fn test_cancelled_before_run_does_not_spawn() {
        // A missing program would otherwise surface as a launch failure
        let runner = ProcessProbeRunner::new(&PingConfig::for_program("pingproc-no-such-program"));
        let (source, token) = cancel_channel();
        source.cancel();

        let err = runner.run("localhost", &token).await.unwrap_err();
        assert_eq!(err, PingError::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_kills_running_child() {
        let runner = script_runner("exec sleep 30");
        let (source, token) = cancel_channel();

        let run = tokio::spawn(async move { runner.run("x", &token).await });
        tokio::time::sleep(Duration::from_millis(200)).await;
        source.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("cancelled child should be killed promptly")
            .unwrap();
        assert_eq!(result, Err(PingError::Cancelled));
    }

    #[tokio::test]
    async fn test_sigkill_after_grace_when_sigterm_ignored() {
        let runner = ProcessProbeRunner::new(
            &PingConfig::for_program("sh")
                .with_base_args(["-c", "trap '' TERM; while :; do sleep 1; done", "probe"])
                .with_kill_grace(Duration::from_millis(200)),
        );
        let (source, token) = cancel_channel();

        let run = tokio::spawn(async move { runner.run("x", &token).await });
        tokio::time::sleep(Duration::from_millis(200)).await;
        source.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), run)
            .await
            .expect("SIGKILL should follow the grace period")
            .unwrap();
        assert_eq!(result, Err(PingError::Cancelled));
    }

    #[tokio::test]
    async fn test_killed_by_outside_signal_is_terminated() {
        let runner = script_runner("kill -9 $$");

        let err = runner.run("x", &CancelToken::never()).await.unwrap_err();
        assert!(matches!(err, PingError::Terminated(_)));
    }

    #[test]
    fn test_program_name_from_config() {
        let runner = ProcessProbeRunner::new(&PingConfig::default());
        assert_eq!(runner.program(), "ping");
    }
}
