//! Fail-fast job scheduler.
//!
//! Jobs come from a lazy iterator and are executed either inline (`concurrency == 1`) or by a
//! bounded pool of scoped worker threads fed through a bounded channel. A single shared
//! `AtomicBool` is the abort signal:
//!
//! ```text
//! Running ──(a job fails)──▶ AbortRequested ──(pool drains)──▶ Terminated(Failure)
//!    └──────(sequence ends)──▶ Draining ──(pool drains)──▶ Terminated(Success)
//! ```
//!
//! Once the signal is set, the dispatcher stops pulling from the sequence, and workers drop
//! whatever is still queued without running it. In-flight jobs are never interrupted.
//!
//! The sequence may also yield errors (a container that failed to parse). Those are fatal to
//! that file only: they are logged and counted, the run continues, but the final outcome is
//! still a failure.

use std::fmt::Display;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, error, info};

use crate::{Error, Result};

/// Counters for a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs that ran to completion.
    pub completed: usize,
    /// Jobs that were handed to a worker but dropped because the run was aborting.
    pub dropped: usize,
    /// Jobs that failed.
    pub failed: usize,
    /// Errors yielded by the job sequence itself.
    pub enumeration_errors: usize,
}

/// Pool-wide abort flag. Only ever goes `false -> true`.
#[derive(Debug, Default)]
pub struct AbortSignal(AtomicBool);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Execute `jobs` with at most `concurrency` running at once.
///
/// `exec` is called once per executed job, from whichever thread runs it.
/// Returns `Error::Aborted` carrying the first failure if any job failed or the sequence
/// yielded an error.
pub fn run<I, T, F>(jobs: I, concurrency: usize, exec: F) -> Result<RunSummary>
where
    I: IntoIterator<Item = Result<T>>,
    T: Display + Send,
    F: Fn(&T) -> Result<()> + Sync,
{
    if concurrency == 0 {
        return Err(Error::Usage("concurrency must be at least 1".to_owned()));
    }

    let state = RunState::default();
    if concurrency == 1 {
        run_serial(jobs, &exec, &state);
    } else {
        run_parallel(jobs, concurrency, &exec, &state);
    }
    state.finish()
}

fn run_serial<I, T, F>(jobs: I, exec: &F, state: &RunState)
where
    I: IntoIterator<Item = Result<T>>,
    T: Display,
    F: Fn(&T) -> Result<()>,
{
    for item in jobs {
        let Some(job) = state.accept(item) else {
            continue;
        };
        if !state.execute(&job, exec) {
            // First failure ends a serial run on the spot.
            return;
        }
    }
}

fn run_parallel<I, T, F>(jobs: I, concurrency: usize, exec: &F, state: &RunState)
where
    I: IntoIterator<Item = Result<T>>,
    T: Display + Send,
    F: Fn(&T) -> Result<()> + Sync,
{
    std::thread::scope(|s| {
        // Capacity == pool size: the dispatcher runs at most one batch ahead of the workers.
        let (tx, rx) = crossbeam_channel::bounded::<T>(concurrency);

        for worker in 0..concurrency {
            let rx = rx.clone();
            s.spawn(move || {
                for job in rx {
                    // Re-check right before starting; the flag may have flipped while queued.
                    if state.abort.is_requested() {
                        state.dropped.fetch_add(1, Ordering::Relaxed);
                        debug!(worker, job = %job, "dropped job after abort");
                        continue;
                    }
                    state.execute(&job, exec);
                }
            });
        }
        drop(rx);

        let mut jobs = jobs.into_iter();
        while !state.abort.is_requested() {
            let Some(item) = jobs.next() else {
                break;
            };
            let Some(job) = state.accept(item) else {
                continue;
            };
            if tx.send(job).is_err() {
                break;
            }
        }
        if state.abort.is_requested() {
            debug!("abort requested; no further jobs will be dispatched");
        }
        // Closing the channel lets the workers drain and exit.
        drop(tx);
    });
}

#[derive(Default)]
struct RunState {
    abort: AbortSignal,
    completed: AtomicUsize,
    dropped: AtomicUsize,
    failed: AtomicUsize,
    enumeration_errors: AtomicUsize,
    first_failure: OnceLock<(String, Error)>,
    first_enumeration_error: OnceLock<Error>,
}

impl RunState {
    /// Unwrap a sequence item, recording enumeration errors.
    fn accept<T>(&self, item: Result<T>) -> Option<T> {
        match item {
            Ok(job) => Some(job),
            Err(err) => {
                self.enumeration_errors.fetch_add(1, Ordering::Relaxed);
                error!(error = %err, "failed to enumerate jobs; skipping file");
                let _ = self.first_enumeration_error.set(err);
                None
            }
        }
    }

    /// Run one job. Returns whether it succeeded.
    fn execute<T: Display, F: Fn(&T) -> Result<()>>(&self, job: &T, exec: &F) -> bool {
        match exec(job) {
            Ok(()) => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(err) => {
                self.abort.request();
                self.failed.fetch_add(1, Ordering::Relaxed);
                error!(job = %job, error = %err, "job failed; aborting run");
                let _ = self.first_failure.set((job.to_string(), err));
                false
            }
        }
    }

    fn finish(self) -> Result<RunSummary> {
        let summary = RunSummary {
            completed: self.completed.into_inner(),
            dropped: self.dropped.into_inner(),
            failed: self.failed.into_inner(),
            enumeration_errors: self.enumeration_errors.into_inner(),
        };

        let first = match (
            self.first_failure.into_inner(),
            self.first_enumeration_error.into_inner(),
        ) {
            (Some((job, err)), _) => Some((job, err)),
            (None, Some(err)) => Some(("job enumeration".to_owned(), err)),
            (None, None) => None,
        };

        match first {
            None => {
                info!(
                    completed = summary.completed,
                    "all jobs completed"
                );
                Ok(summary)
            }
            Some((job, first)) => {
                error!(
                    completed = summary.completed,
                    dropped = summary.dropped,
                    failed = summary.failed,
                    enumeration_errors = summary.enumeration_errors,
                    "run failed"
                );
                Err(Error::Aborted {
                    job,
                    first: Box::new(first),
                    failed: summary.failed,
                    enumeration_errors: summary.enumeration_errors,
                })
            }
        }
    }
}
