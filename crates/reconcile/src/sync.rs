//! Sync-delete: remove remote objects that no longer exist locally

use crate::backend::ObjectApi;
use crate::cancel::CancelToken;
use crate::deleter::{DeleteRequest, Deleter};
use crate::descriptor::Registry;
use crate::error::Aborted;
use crate::filter::{Filter, Filters};
use crate::puller::{PullRequest, Puller};
use crate::resources::Resources;
use crate::types::{DEFAULT_MAX_CONCURRENCY, Summary};

/// Options for [`sync_delete`]
#[derive(Debug, Clone)]
pub struct SyncRequest {
    /// Kinds to sync; empty means the kinds found in the local inventory
    pub filters: Filters,
    pub max_concurrency: usize,
    pub stop_on_error: bool,
    pub dry_run: bool,
    /// Also delete objects owned by other tools
    pub include_managed: bool,
    pub cancel: CancelToken,
}

impl Default for SyncRequest {
    fn default() -> Self {
        Self {
            filters: Filters::new(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            stop_on_error: false,
            dry_run: false,
            include_managed: false,
            cancel: CancelToken::new(),
        }
    }
}

/// Match-all filters for the kinds a sync covers.
///
/// With filters, their distinct kinds in order. Without, the distinct kinds of
/// `local` in first-seen order that the registry can serve.
pub fn sync_kinds(filters: &Filters, local: &Resources, registry: &Registry) -> Filters {
    if !filters.is_empty() {
        return filters
            .iter()
            .map(|f| Filter::all(f.descriptor.clone()))
            .collect::<Vec<_>>()
            .into();
    }

    local
        .kinds()
        .into_iter()
        .filter_map(|kind| match registry.get(kind) {
            Some(desc) if !desc.is_synthetic() => Some(Filter::all(desc.clone())),
            Some(_) => None,
            None => {
                log::warn!("no descriptor for local kind {kind}, not syncing it");
                None
            }
        })
        .collect::<Vec<_>>()
        .into()
}

/// Delete every remote object of the synced kinds that is absent from `local`.
///
/// Returns a zero summary without contacting the server when there is no
/// kind to sync. Running it twice without changes deletes nothing the second
/// time.
pub fn sync_delete<A: ObjectApi + ?Sized>(
    req: &SyncRequest,
    local: &Resources,
    registry: &Registry,
    api: &A,
) -> Result<Summary, Aborted> {
    let kinds = sync_kinds(&req.filters, local, registry);
    if kinds.is_empty() {
        log::debug!("no kinds to sync");
        return Ok(Summary::default());
    }

    let mut remote = Resources::new();
    Puller::new(api).with_cancel(req.cancel.clone()).pull(
        &PullRequest {
            filters: &kinds,
            exclude_managed: !req.include_managed,
            stop_on_error: req.stop_on_error,
        },
        &mut remote,
    )?;

    let orphans: Resources = remote
        .into_iter()
        .filter(|obj| !local.contains(obj.id()))
        .collect();
    log::info!("{} remote objects missing locally", orphans.len());

    Deleter::new(api, registry)
        .with_cancel(req.cancel.clone())
        .delete(&DeleteRequest {
            resources: &orphans,
            max_concurrency: req.max_concurrency,
            stop_on_error: req.stop_on_error,
            dry_run: req.dry_run,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MockBackend, Op};
    use crate::descriptor::append_synthetic_descriptors;
    use crate::testutil::{
        dashboard, dashboards_descriptor, folder, folders_descriptor, managed, object,
    };

    fn registry() -> Registry {
        Registry::new(append_synthetic_descriptors(&[
            dashboards_descriptor(),
            folders_descriptor(),
        ]))
    }

    fn server() -> MockBackend {
        let mock = MockBackend::new();
        for name in ["a", "b", "c"] {
            mock.add_object(object(dashboard(name)));
        }
        mock.add_object(managed(dashboard("tf")));
        mock.add_object(object(folder("f")));
        mock
    }

    fn local(names: &[&str]) -> Resources {
        names.iter().map(|n| object(dashboard(n))).collect()
    }

    #[test]
    fn test_deletes_only_orphans() {
        let mock = server();
        let summary = sync_delete(&SyncRequest::default(), &local(&["a"]), &registry(), &mock).unwrap();
        assert_eq!(summary, Summary::new(2, 0));
        // managed objects and unsynced kinds are untouched
        assert_eq!(mock.object_names(), vec!["a", "tf", "f"]);
    }

    #[test]
    fn test_second_run_deletes_nothing() {
        let mock = server();
        let registry = registry();
        let local = local(&["a", "b"]);
        let req = SyncRequest::default();

        assert_eq!(sync_delete(&req, &local, &registry, &mock).unwrap(), Summary::new(1, 0));
        let deletes = mock.count(Op::Delete);
        assert_eq!(sync_delete(&req, &local, &registry, &mock).unwrap(), Summary::default());
        assert_eq!(mock.count(Op::Delete), deletes);
    }

    #[test]
    fn test_no_kinds_makes_no_calls() {
        let mock = server();
        let summary = sync_delete(&SyncRequest::default(), &Resources::new(), &registry(), &mock).unwrap();
        assert_eq!(summary, Summary::default());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_filters_choose_kinds() {
        let mock = server();
        let req = SyncRequest {
            filters: Filters::from(vec![Filter::named(folders_descriptor(), vec!["x".into()])]),
            ..SyncRequest::default()
        };
        let summary = sync_delete(&req, &local(&["a"]), &registry(), &mock).unwrap();
        assert_eq!(summary, Summary::new(1, 0));
        assert_eq!(mock.object_names(), vec!["a", "b", "c", "tf"]);
    }

    #[test]
    fn test_include_managed() {
        let mock = server();
        let req = SyncRequest {
            include_managed: true,
            ..SyncRequest::default()
        };
        let summary = sync_delete(&req, &local(&["a", "b", "c"]), &registry(), &mock).unwrap();
        assert_eq!(summary, Summary::new(1, 0));
        assert!(!mock.object_names().contains(&"tf".to_string()));
    }

    #[test]
    fn test_dry_run_counts_candidates() {
        let mock = server();
        let req = SyncRequest {
            dry_run: true,
            ..SyncRequest::default()
        };
        let summary = sync_delete(&req, &local(&[]), &registry(), &mock);
        // empty local inventory means no kinds
        assert_eq!(summary.unwrap(), Summary::default());

        let summary = sync_delete(&req, &local(&["z"]), &registry(), &mock).unwrap();
        assert_eq!(summary, Summary::new(3, 0));
        assert_eq!(mock.count(Op::Delete), 0);
    }

    #[test]
    fn test_pull_failure_aborts_with_zero_summary() {
        let mock = server();
        mock.fail_on(Op::List, "dashboards");
        let req = SyncRequest {
            stop_on_error: true,
            ..SyncRequest::default()
        };
        let aborted = sync_delete(&req, &local(&["a"]), &registry(), &mock).unwrap_err();
        assert_eq!(aborted.summary, Summary::default());
        assert_eq!(mock.count(Op::Delete), 0);
    }
}
