// Execution adapters: blocking, deferred, auto-started and cancellable runs
//
// All shapes funnel into `run_single`, which yields one `RunOutcome`.
// Presentation differs only at observation time:
// - await (`PingHandle` as a Future, `PingTask::result`) -> Err(PingError)
// - blocking (`PingHandle::wait`, `PingTask::wait`) -> Err(AggregateError)

use super::aggregator::aggregate;
use super::batch::run_batch;
use super::cancel::CancelToken;
use super::constants::DEFAULT_MAX_CONCURRENCY;
use crate::domain::{PingError, PingResult, RunOutcome, UsageError};
use crate::error::AggregateError;
use crate::port::ProbeRunner;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

/// Run the probe once and classify what happened
pub(crate) async fn run_single(
    runner: &dyn ProbeRunner,
    target: &str,
    cancel: &CancelToken,
) -> RunOutcome {
    if cancel.is_cancelled() {
        debug!(host = %target, "Cancelled before spawn, nothing started");
        return RunOutcome::Cancelled;
    }

    let outcome = RunOutcome::from(runner.run(target, cancel).await.map(aggregate));

    match &outcome {
        RunOutcome::Replied(_) => debug!(host = %target, "Target replied"),
        RunOutcome::Unreachable(result) => info!(
            host = %target,
            exit_code = result.exit_code(),
            "Probe finished with failing exit code"
        ),
        RunOutcome::Cancelled => warn!(host = %target, "Probe cancelled"),
        RunOutcome::Faulted(e) => warn!(host = %target, error = %e, "Probe could not run"),
    }
    outcome
}

/// Entry point for single-target and batch runs
///
/// Background work is spawned onto the given tokio runtime. The blocking
/// observers (`run`, `wait`) must not be called from a current-thread
/// runtime's own thread.
#[derive(Clone)]
pub struct PingProcess {
    runner: Arc<dyn ProbeRunner>,
    runtime: Handle,
    max_concurrency: usize,
}

impl PingProcess {
    /// Create a ping process facade
    ///
    /// # Example
    /// ```ignore
    /// let runtime = tokio::runtime::Runtime::new()?;
    /// let process = PingProcess::new(Arc::new(runner), runtime.handle().clone());
    /// let result = process.run("localhost")?;
    /// ```
    pub fn new(runner: Arc<dyn ProbeRunner>, runtime: Handle) -> Self {
        Self {
            runner,
            runtime,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
        }
    }

    /// Bound on concurrently running sub-runs of a batch (at least 1)
    pub fn with_max_concurrency(mut self, max: usize) -> Self {
        self.max_concurrency = max.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    /// Blocking single-target run
    ///
    /// Target-side failures come back as `Ok` with a non-zero exit code; only
    /// launch failures are errors. Refused with
    /// `UsageError::BlockingOnCurrentThread` on a current-thread runtime's own
    /// thread, before anything is spawned.
    pub fn run(&self, target: &str) -> Result<PingResult, PingError> {
        block_on_observer(|| self.run_async(target))?
    }

    /// Async single-target run in the caller's task, with cancellation
    pub async fn run_outcome(&self, target: &str, cancel: &CancelToken) -> RunOutcome {
        run_single(self.runner.as_ref(), target, cancel).await
    }

    /// Deferred run: nothing happens until `PingTask::start`
    pub fn run_task(&self, target: impl Into<String>) -> PingTask {
        let runner = Arc::clone(&self.runner);
        let target = target.into();
        let job = async move { run_single(runner.as_ref(), &target, &CancelToken::never()).await };
        PingTask::new(self.runtime.clone(), job.boxed())
    }

    /// Run already scheduled in the background
    pub fn run_async(&self, target: impl Into<String>) -> PingHandle {
        self.run_async_with_cancel(target, CancelToken::never())
    }

    /// Background run that kills its child when `cancel` fires
    pub fn run_async_with_cancel(
        &self,
        target: impl Into<String>,
        cancel: CancelToken,
    ) -> PingHandle {
        let runner = Arc::clone(&self.runner);
        let target = target.into();
        PingHandle::new(
            self.runtime
                .spawn(async move { run_single(runner.as_ref(), &target, &cancel).await }),
        )
    }

    /// Background batch over `targets`; output follows input order
    pub fn run_batch<I, S>(&self, targets: I, cancel: CancelToken) -> PingHandle
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let targets: Vec<String> = targets.into_iter().map(Into::into).collect();
        let runner = Arc::clone(&self.runner);
        let max_concurrency = self.max_concurrency;
        PingHandle::new(
            self.runtime
                .spawn(async move { run_batch(runner, targets, cancel, max_concurrency).await }),
        )
    }
}

/// Handle to a run that is already executing in the background
///
/// Awaiting it yields `Result<PingResult, PingError>`; `wait` blocks and
/// wraps failures in `AggregateError`.
#[derive(Debug)]
pub struct PingHandle {
    inner: JoinHandle<RunOutcome>,
}

impl PingHandle {
    fn new(inner: JoinHandle<RunOutcome>) -> Self {
        Self { inner }
    }

    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// Block the calling thread until the run completes
    pub fn wait(self) -> Result<PingResult, AggregateError> {
        block_on_observer(move || self)
            .unwrap_or_else(|usage| Err(usage.into()))
            .map_err(AggregateError::from)
    }

    /// Await the raw tagged outcome instead of a `Result`
    pub async fn outcome(self) -> RunOutcome {
        outcome_of(self.inner.await)
    }
}

impl Future for PingHandle {
    type Output = Result<PingResult, PingError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.inner)
            .poll(cx)
            .map(|joined| outcome_of(joined).into_result())
    }
}

/// Drive the future built by `make` to completion from synchronous code
///
/// On a multi-thread runtime the worker hands its other tasks off via
/// `block_in_place`. A current-thread runtime's own thread could never poll
/// the spawned run, so blocking there is refused before `make` is called.
fn block_on_observer<F, Fut>(make: F) -> Result<Fut::Output, UsageError>
where
    F: FnOnce() -> Fut,
    Fut: Future,
{
    match Handle::try_current() {
        Ok(current) if current.runtime_flavor() == RuntimeFlavor::CurrentThread => {
            warn!("Blocking wait refused on a current-thread runtime");
            Err(UsageError::BlockingOnCurrentThread)
        }
        Ok(_) => Ok(tokio::task::block_in_place(|| {
            futures::executor::block_on(make())
        })),
        Err(_) => Ok(futures::executor::block_on(make())),
    }
}

fn outcome_of(joined: Result<RunOutcome, JoinError>) -> RunOutcome {
    match joined {
        Ok(outcome) => outcome,
        Err(e) if e.is_cancelled() => RunOutcome::Cancelled,
        Err(e) => RunOutcome::Faulted(PingError::Panicked(panic_message(e))),
    }
}

pub(crate) fn panic_message(error: JoinError) -> String {
    match error.try_into_panic() {
        Ok(payload) => {
            if let Some(s) = payload.downcast_ref::<&str>() {
                s.to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "Unknown panic".to_string()
            }
        }
        Err(e) => e.to_string(),
    }
}

/// Run created but not yet started
///
/// `start` schedules it; `result`/`wait` observe it. The first finished
/// result is cached and returned on every later observation.
pub struct PingTask {
    runtime: Handle,
    job: Option<BoxFuture<'static, RunOutcome>>,
    running: Option<PingHandle>,
    finished: Option<Result<PingResult, PingError>>,
}

impl PingTask {
    fn new(runtime: Handle, job: BoxFuture<'static, RunOutcome>) -> Self {
        Self {
            runtime,
            job: Some(job),
            running: None,
            finished: None,
        }
    }

    /// Schedule the run; a second call is a usage error
    pub fn start(&mut self) -> Result<(), PingError> {
        let job = self.job.take().ok_or(UsageError::AlreadyStarted)?;
        self.running = Some(PingHandle::new(self.runtime.spawn(job)));
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.job.is_none()
    }

    pub fn is_completed(&self) -> bool {
        self.finished.is_some()
    }

    /// Await the result; observing before `start` is a usage error
    pub async fn result(&mut self) -> Result<PingResult, PingError> {
        if let Some(done) = &self.finished {
            return done.clone();
        }
        let handle = self.running.as_mut().ok_or(UsageError::NotStarted)?;
        let result = handle.await;

        self.running = None;
        self.finished = Some(result.clone());
        result
    }

    /// Block until the result is available
    pub fn wait(&mut self) -> Result<PingResult, AggregateError> {
        block_on_observer(move || self.result())
            .unwrap_or_else(|usage| Err(usage.into()))
            .map_err(AggregateError::from)
    }
}

impl std::fmt::Debug for PingTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PingTask")
            .field("started", &self.is_started())
            .field("completed", &self.is_completed())
            .finish()
    }
}
