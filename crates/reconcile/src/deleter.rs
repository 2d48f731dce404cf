//! Bulk deletion of remote objects

use std::sync::Arc;

use crate::backend::ObjectApi;
use crate::cancel::CancelToken;
use crate::context::{NoProgress, ProgressCallback};
use crate::descriptor::Registry;
use crate::error::{Aborted, Error};
use crate::executor::run_bounded;
use crate::object::Object;
use crate::resources::Resources;
use crate::types::{DEFAULT_MAX_CONCURRENCY, ExecuteOptions, Summary};

/// Objects to delete and how
#[derive(Debug, Clone, Copy)]
pub struct DeleteRequest<'a> {
    pub resources: &'a Resources,
    /// Upper bound on deletes in flight; values below 1 mean 1
    pub max_concurrency: usize,
    pub stop_on_error: bool,
    pub dry_run: bool,
}

impl<'a> DeleteRequest<'a> {
    pub fn new(resources: &'a Resources) -> Self {
        Self {
            resources,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            stop_on_error: false,
            dry_run: false,
        }
    }

    fn options(&self) -> ExecuteOptions {
        ExecuteOptions {
            dry_run: self.dry_run,
            stop_on_error: self.stop_on_error,
            max_concurrency: self.max_concurrency,
        }
    }
}

/// Deletes objects through the generic object API
pub struct Deleter<'a, A: ObjectApi + ?Sized> {
    api: &'a A,
    registry: &'a Registry,
    cancel: CancelToken,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a, A: ObjectApi + ?Sized> Deleter<'a, A> {
    pub fn new(api: &'a A, registry: &'a Registry) -> Self {
        Self {
            api,
            registry,
            cancel: CancelToken::new(),
            progress: Arc::new(NoProgress),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// Delete every object in the request.
    ///
    /// Objects whose kind has no descriptor count as failed. With
    /// `stop_on_error` the first failure stops the run and is returned with
    /// the counts reached so far.
    pub fn delete(&self, req: &DeleteRequest<'_>) -> Result<Summary, Aborted> {
        let summary = run_bounded(
            "delete",
            req.resources.as_list(),
            |obj: &Object| obj.id().to_string(),
            &req.options(),
            &self.cancel,
            self.progress.as_ref(),
            |obj| self.delete_one(obj),
        )?;

        log::info!(
            "deleted {} objects ({} failed)",
            summary.succeeded,
            summary.failed
        );
        Ok(summary)
    }

    fn delete_one(&self, obj: &Object) -> crate::Result<()> {
        let desc = self
            .registry
            .get(obj.kind())
            .ok_or_else(|| Error::UnknownKind(obj.kind().to_string()))?;
        self.api.delete(desc, obj.name())
    }
}
