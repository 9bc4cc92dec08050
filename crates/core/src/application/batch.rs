// Multi-host batch: concurrent sub-runs merged back into input order

use super::adapter::{panic_message, run_single};
use super::aggregator::concat;
use super::cancel::{cancel_channel, CancelToken};
use crate::domain::{PingError, PingResult, RunOutcome};
use crate::port::ProbeRunner;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Run every target and merge the results in input order
///
/// - Sub-runs own their buffers; results land in a slot per input index, so
///   completion order never affects the merged output.
/// - Cancellation is all-or-nothing: once `cancel` fires, running children
///   are killed, pending ones never start, and the batch is `Cancelled` even
///   if some sub-runs had already finished.
/// - The first sub-run that cannot run (e.g. launch failure) stops the rest;
///   the batch reports the earliest such failure in input order.
pub(crate) async fn run_batch(
    runner: Arc<dyn ProbeRunner>,
    targets: Vec<String>,
    mut cancel: CancelToken,
    max_concurrency: usize,
) -> RunOutcome {
    if cancel.is_cancelled() {
        info!(targets = targets.len(), "Batch cancelled before start");
        return RunOutcome::Cancelled;
    }

    let total = targets.len();
    info!(targets = total, max_concurrency, "Starting batch");

    // Internal abort signal shared by every sub-run of this batch
    let (abort, sub_token) = cancel_channel();
    let limiter = Arc::new(Semaphore::new(max_concurrency.clamp(1, Semaphore::MAX_PERMITS)));
    let mut sub_runs = JoinSet::new();

    for (index, target) in targets.into_iter().enumerate() {
        let runner = Arc::clone(&runner);
        let limiter = Arc::clone(&limiter);
        let mut token = sub_token.clone();

        sub_runs.spawn(async move {
            let permit = tokio::select! {
                permit = limiter.acquire_owned() => permit.ok(),
                _ = token.cancelled() => None,
            };
            let outcome = match permit {
                Some(_permit) => run_single(runner.as_ref(), &target, &token).await,
                None => RunOutcome::Cancelled,
            };
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<RunOutcome>> = vec![None; total];
    let mut stopping = false;

    loop {
        tokio::select! {
            joined = sub_runs.join_next() => {
                let Some(joined) = joined else { break };
                match joined {
                    Ok((index, outcome)) => {
                        if !stopping && matches!(outcome, RunOutcome::Faulted(_) | RunOutcome::Cancelled) {
                            warn!(index, "Sub-run failed, stopping remaining sub-runs");
                            stopping = true;
                            abort.cancel();
                        }
                        slots[index] = Some(outcome);
                    }
                    Err(e) => {
                        abort.cancel();
                        drain(&mut sub_runs).await;
                        return RunOutcome::Faulted(PingError::Panicked(panic_message(e)));
                    }
                }
            }
            _ = cancel.cancelled(), if !stopping => {
                warn!(targets = total, "Batch cancelled, killing running sub-runs");
                abort.cancel();
                drain(&mut sub_runs).await;
                return RunOutcome::Cancelled;
            }
        }
    }

    if cancel.is_cancelled() {
        return RunOutcome::Cancelled;
    }

    if stopping {
        return slots
            .into_iter()
            .flatten()
            .find(|outcome| matches!(outcome, RunOutcome::Faulted(_)))
            .unwrap_or(RunOutcome::Cancelled);
    }

    let results: Vec<PingResult> = slots
        .into_iter()
        .flatten()
        .filter_map(|outcome| outcome.into_result().ok())
        .collect();
    let merged = concat(&results);

    info!(
        targets = total,
        exit_code = merged.exit_code(),
        "Batch completed"
    );
    RunOutcome::from_result(merged)
}

/// Wait for every remaining sub-run so each child is reaped
async fn drain(sub_runs: &mut JoinSet<(usize, RunOutcome)>) {
    while sub_runs.join_next().await.is_some() {}
}
