//! Fetching the remote inventory

use crate::backend::ObjectApi;
use crate::cancel::CancelToken;
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::filter::{FilterType, Filters};
use crate::object::Object;
use crate::resources::Resources;

/// What to pull
#[derive(Debug, Clone, Copy)]
pub struct PullRequest<'a> {
    pub filters: &'a Filters,
    /// Skip objects owned by another tool
    pub exclude_managed: bool,
    pub stop_on_error: bool,
}

/// Reads remote objects into a [`Resources`] set
pub struct Puller<'a, A: ObjectApi + ?Sized> {
    api: &'a A,
    cancel: CancelToken,
}

impl<'a, A: ObjectApi + ?Sized> Puller<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self {
            api,
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Pull every object selected by the filters into `out`.
    ///
    /// Named objects that don't exist are treated as absent. Other fetch
    /// errors abort with `stop_on_error` and are logged otherwise.
    pub fn pull(&self, req: &PullRequest<'_>, out: &mut Resources) -> Result<()> {
        let before = out.len();

        for filter in req.filters {
            let fetched = match &filter.filter_type {
                FilterType::All => self.list(&filter.descriptor, req),
                FilterType::Named(names) => self.get_each(&filter.descriptor, names, req),
            }?;

            for obj in fetched {
                if req.exclude_managed && obj.is_managed() {
                    log::debug!(
                        "skipping {} (managed by {})",
                        obj.id(),
                        obj.manager().unwrap_or_default()
                    );
                    continue;
                }
                out.add(obj);
            }
        }

        log::info!("pulled {} objects", out.len() - before);
        Ok(())
    }

    fn list(&self, desc: &Descriptor, req: &PullRequest<'_>) -> Result<Vec<Object>> {
        self.cancel.check()?;
        log::debug!("listing {}", desc.plural);
        match self.api.list(desc) {
            Ok(objects) => Ok(objects),
            Err(e) => absorb(e, &desc.plural, req.stop_on_error).map(|()| Vec::new()),
        }
    }

    fn get_each(
        &self,
        desc: &Descriptor,
        names: &[String],
        req: &PullRequest<'_>,
    ) -> Result<Vec<Object>> {
        let mut objects = Vec::with_capacity(names.len());

        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            self.cancel.check()?;
            log::debug!("getting {}/{name}", desc.plural);
            match self.api.get(desc, name) {
                Ok(obj) => objects.push(obj),
                Err(e) if e.is_not_found() => {
                    log::debug!("{}/{name} does not exist", desc.plural);
                }
                Err(e) => absorb(e, &format!("{}/{name}", desc.plural), req.stop_on_error)?,
            }
        }

        Ok(objects)
    }
}

fn absorb(error: Error, what: &str, stop_on_error: bool) -> Result<()> {
    if stop_on_error {
        return Err(error);
    }
    log::warn!("failed to pull {what}: {error}");
    Ok(())
}
