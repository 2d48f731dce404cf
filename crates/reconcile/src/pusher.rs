//! Uploading local objects (replace-or-create)

use std::sync::Arc;

use crate::backend::ObjectApi;
use crate::cancel::CancelToken;
use crate::context::{NoProgress, ProgressCallback};
use crate::descriptor::Registry;
use crate::error::{Aborted, Error, Result};
use crate::executor::run_bounded;
use crate::object::Object;
use crate::resources::Resources;
use crate::types::{DEFAULT_MAX_CONCURRENCY, ExecuteOptions, Summary};

/// Objects to push and how
#[derive(Debug, Clone, Copy)]
pub struct PushRequest<'a> {
    pub resources: &'a Resources,
    pub max_concurrency: usize,
    pub stop_on_error: bool,
    pub dry_run: bool,
}

impl<'a> PushRequest<'a> {
    pub fn new(resources: &'a Resources) -> Self {
        Self {
            resources,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            stop_on_error: false,
            dry_run: false,
        }
    }
}

/// Upserts objects through the generic object API
pub struct Pusher<'a, A: ObjectApi + ?Sized> {
    api: &'a A,
    registry: &'a Registry,
    cancel: CancelToken,
    progress: Arc<dyn ProgressCallback>,
}

impl<'a, A: ObjectApi + ?Sized> Pusher<'a, A> {
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

    /// Replace every object on the server, creating the ones that don't exist
    pub fn push(&self, req: &PushRequest<'_>) -> std::result::Result<Summary, Aborted> {
        let opts = ExecuteOptions {
            dry_run: req.dry_run,
            stop_on_error: req.stop_on_error,
            max_concurrency: req.max_concurrency,
        };

        let summary = run_bounded(
            "push",
            req.resources.as_list(),
            |obj: &Object| obj.id().to_string(),
            &opts,
            &self.cancel,
            self.progress.as_ref(),
            |obj| self.upsert(obj),
        )?;

        log::info!(
            "pushed {} objects ({} failed)",
            summary.succeeded,
            summary.failed
        );
        Ok(summary)
    }

    fn upsert(&self, obj: &Object) -> Result<()> {
        let desc = self
            .registry
            .get(obj.kind())
            .ok_or_else(|| Error::UnknownKind(obj.kind().to_string()))?;

        match self.api.get(desc, obj.name()) {
            Ok(existing) => {
                let mut replacement = obj.clone();
                if let Some(version) = existing.resource_version() {
                    replacement.set_resource_version(version);
                }
                self.api.update(desc, &replacement).map(|_| ())
            }
            Err(e) if e.is_not_found() => self.api.create(desc, obj).map(|_| ()),
            Err(e) => Err(e),
        }
    }
}
