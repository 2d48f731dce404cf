//! Bounded execution engine - runs per-item remote calls with a fixed number
//! of workers, stop-on-error and partial accounting

use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::cancel::CancelToken;
use crate::context::ProgressCallback;
use crate::error::{Aborted, Error};
use crate::types::{ExecuteOptions, Summary};

/// Thread-safe counters plus the stop cutoff.
///
/// Once `stopped` is set no new item starts; items already running still
/// record their outcome.
#[derive(Debug, Default)]
pub(crate) struct Tally {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    stopped: AtomicBool,
    first_error: Mutex<Option<Error>>,
}

impl Tally {
    pub(crate) fn succeed(&self) {
        self.succeeded.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn fail(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Stop new work and remember `error` unless an earlier one is kept
    pub(crate) fn stop(&self, error: Error) {
        self.stopped.store(true, Ordering::SeqCst);
        let mut slot = self
            .first_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(error);
        }
    }

    pub(crate) fn summary(&self) -> Summary {
        Summary::new(
            self.succeeded.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
        )
    }

    pub(crate) fn finish(self) -> Result<Summary, Aborted> {
        let summary = self.summary();
        let error = self
            .first_error
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        match error {
            Some(error) => Err(Aborted::new(summary, error)),
            None => Ok(summary),
        }
    }
}

/// Run `op` over `items` with at most `opts.max_concurrency` calls in flight.
///
/// - dry run: every item counts as succeeded and `op` is never called;
/// - stop-on-error: the first failure stops new items from starting and is
///   returned with the counts reached;
/// - otherwise every item is attempted and failures are only counted;
/// - cancellation stops new items and returns [`Error::Cancelled`].
pub(crate) fn run_bounded<T, I, F>(
    label: &str,
    items: &[T],
    id: I,
    opts: &ExecuteOptions,
    cancel: &CancelToken,
    progress: &dyn ProgressCallback,
    op: F,
) -> Result<Summary, Aborted>
where
    T: Sync,
    I: Fn(&T) -> String + Sync,
    F: Fn(&T) -> Result<(), Error> + Sync,
{
    if items.is_empty() {
        return Ok(Summary::default());
    }

    if opts.dry_run {
        for item in items {
            log::info!("[dry-run] {label} {}", id(item));
        }
        return Ok(Summary::new(items.len(), 0));
    }

    let tally = Tally::default();
    let jobs = opts.max_concurrency.max(1);
    progress.on_batch_start(label, items.len());

    let apply = |item: &T| {
        if tally.is_stopped() {
            return;
        }
        if let Err(e) = cancel.check() {
            tally.stop(e);
            return;
        }

        let item_id = id(item);
        log::debug!("{label} {item_id}");
        match op(item) {
            Ok(()) => {
                tally.succeed();
                progress.on_item_complete(&item_id, None);
            }
            Err(e) => {
                tally.fail();
                progress.on_item_complete(&item_id, Some(&e));
                if opts.stop_on_error {
                    tally.stop(e);
                } else {
                    log::warn!("{label} {item_id} failed: {e}");
                }
            }
        }
    };

    if jobs == 1 || items.len() == 1 {
        items.iter().for_each(apply);
    } else {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .map_err(|e| Aborted::from(Error::Config(format!("cannot create worker pool: {e}"))))?;
        pool.install(|| items.par_iter().for_each(apply));
    }

    progress.on_batch_complete();
    tally.finish()
}
