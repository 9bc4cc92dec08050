// Probe Runner Port
// Abstraction for running the external probe against one target

use crate::application::cancel::CancelToken;
use crate::domain::{PingError, RawOutput};
use async_trait::async_trait;

/// Runs the probe utility for a single target
///
/// Implementations:
/// - ProcessProbeRunner (infra-system): spawns the OS `ping` utility
/// - ScriptedProbeRunner (mocks): canned replies for tests
#[async_trait]
pub trait ProbeRunner: Send + Sync {
    /// Run the probe once and capture its exit code and both streams
    ///
    /// A target that cannot be resolved or does not answer is reported through
    /// `RawOutput::exit_code`, never as an error.
    ///
    /// # Errors
    /// - PingError::Launch if the executable cannot be found or spawned
    /// - PingError::Cancelled if `cancel` fired before spawning (nothing is
    ///   spawned) or while the child ran (the child is killed and reaped)
    /// - PingError::Terminated if the child exited without an exit code
    async fn run(&self, target: &str, cancel: &CancelToken) -> Result<RawOutput, PingError>;

    /// Name of the executable, for logs and launch errors
    fn program(&self) -> &str;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Report shaped like the Windows utility answering on loopback
    pub const LOOPBACK_REPLY: &str = concat!(
        "\r\n",
        "Pinging localhost [::1] with 32 bytes of data:\r\n",
        "Reply from ::1: time<1ms\r\n",
        "Reply from ::1: time<1ms\r\n",
        "Reply from ::1: time<1ms\r\n",
        "Reply from ::1: time<1ms\r\n",
        "\r\n",
        "Ping statistics for ::1:\r\n",
        "    Packets: Sent = 4, Received = 4, Lost = 0 (0% loss),\r\n",
        "Approximate round trip times in milli-seconds:\r\n",
        "    Minimum = 0ms, Maximum = 0ms, Average = 0ms\r\n",
    );

    /// Scripted behavior for one target
    #[derive(Debug, Clone)]
    pub enum ScriptedReply {
        /// Child "runs" and produces this output
        Output(RawOutput),
        /// Child cannot be launched
        LaunchFailure(String),
    }

    #[derive(Debug, Clone)]
    struct Script {
        reply: ScriptedReply,
        delay: Duration,
    }

    /// Mock ProbeRunner with per-target replies and delays
    pub struct ScriptedProbeRunner {
        fallback: Script,
        scripts: HashMap<String, Script>,
        spawn_count: Arc<Mutex<usize>>,
        killed_count: Arc<Mutex<usize>>,
    }

    impl ScriptedProbeRunner {
        /// Every target replies like loopback unless scripted otherwise
        pub fn new() -> Self {
            Self {
                fallback: Script {
                    reply: ScriptedReply::Output(RawOutput::new(0, LOOPBACK_REPLY, "")),
                    delay: Duration::ZERO,
                },
                scripts: HashMap::new(),
                spawn_count: Arc::new(Mutex::new(0)),
                killed_count: Arc::new(Mutex::new(0)),
            }
        }

        pub fn with_reply(mut self, target: impl Into<String>, output: RawOutput) -> Self {
            self.script_mut(target.into()).reply = ScriptedReply::Output(output);
            self
        }

        pub fn with_launch_failure(
            mut self,
            target: impl Into<String>,
            reason: impl Into<String>,
        ) -> Self {
            self.script_mut(target.into()).reply = ScriptedReply::LaunchFailure(reason.into());
            self
        }

        pub fn with_delay(mut self, target: impl Into<String>, delay: Duration) -> Self {
            self.script_mut(target.into()).delay = delay;
            self
        }

        /// Delay applied to targets without their own script
        pub fn with_default_delay(mut self, delay: Duration) -> Self {
            self.fallback.delay = delay;
            self
        }

        /// Number of (simulated) child processes started
        pub fn spawn_count(&self) -> usize {
            *self.spawn_count.lock().unwrap()
        }

        /// Number of (simulated) child processes killed by cancellation
        pub fn killed_count(&self) -> usize {
            *self.killed_count.lock().unwrap()
        }

        fn script_mut(&mut self, target: String) -> &mut Script {
            let fallback = self.fallback.clone();
            self.scripts.entry(target).or_insert(fallback)
        }
    }

    impl Default for ScriptedProbeRunner {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl ProbeRunner for ScriptedProbeRunner {
        async fn run(&self, target: &str, cancel: &CancelToken) -> Result<RawOutput, PingError> {
            if cancel.is_cancelled() {
                return Err(PingError::Cancelled);
            }

            let script = self.scripts.get(target).unwrap_or(&self.fallback).clone();
            let output = match script.reply {
                ScriptedReply::LaunchFailure(reason) => {
                    return Err(PingError::launch(self.program(), reason));
                }
                ScriptedReply::Output(output) => output,
            };

            *self.spawn_count.lock().unwrap() += 1;

            let mut cancel = cancel.clone();
            tokio::select! {
                _ = tokio::time::sleep(script.delay) => Ok(output),
                _ = cancel.cancelled() => {
                    *self.killed_count.lock().unwrap() += 1;
                    Err(PingError::Cancelled)
                }
            }
        }

        fn program(&self) -> &str {
            "scripted-ping"
        }
    }
}
