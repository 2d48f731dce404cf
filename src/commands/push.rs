//! `dashsync push` - upload local files, optionally deleting remote leftovers

use anyhow::Result;
use dialoguer::Confirm;
use reconcile::alerts::{self, ALERTS_DIR_NAME};
use reconcile::{
    ExecuteOptions, Filters, FsReader, PushRequest, Pusher, Resources, Summary, SyncRequest,
    split_alert_selectors, sync_delete,
};
use std::path::PathBuf;
use std::sync::Arc;

use super::{Session, finish, report};
use crate::Context;
use crate::cli::PushArgs;
use crate::progress::BarProgress;
use crate::ui;

pub fn run(ctx: &Context, args: PushArgs) -> Result<()> {
    let selection = split_alert_selectors(&args.selectors);
    let everything = selection.is_empty();
    let session = Session::open(ctx)?;
    let sync = args.sync && confirm_sync(&args)?;

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        stop_on_error: args.stop_on_error,
        max_concurrency: args.max_concurrent,
    };
    let mut total = Summary::default();

    if everything || !selection.other.is_empty() {
        let backend = session.connect()?;
        let registry = session.registry(&backend)?;
        let filters = Filters::parse(&selection.other, &registry)?;

        let mut local = Resources::new();
        FsReader::new().read(&mut local, &filters, &args.path)?;
        ui::info(&format!(
            "Read {} resources from {}",
            local.len(),
            display_paths(&args.path)
        ));

        let pushed = Pusher::new(&backend, &registry)
            .with_cancel(ctx.cancel.clone())
            .with_progress(Arc::new(BarProgress::new(ctx.quiet)))
            .push(&PushRequest {
                resources: &local,
                max_concurrency: opts.max_concurrency,
                stop_on_error: opts.stop_on_error,
                dry_run: opts.dry_run,
            });
        total.merge(&report("Pushed", "resources", pushed, opts.dry_run)?);

        if sync {
            let req = SyncRequest {
                filters,
                max_concurrency: opts.max_concurrency,
                stop_on_error: opts.stop_on_error,
                dry_run: opts.dry_run,
                include_managed: args.include_managed,
                cancel: ctx.cancel.clone(),
            };
            let deleted = sync_delete(&req, &local, &registry, &backend);
            total.merge(&report("Deleted", "remote resources", deleted, opts.dry_run)?);
        }
    }

    if everything || selection.requested {
        if !selection.uids.is_empty() {
            ui::warn("Alert rule UIDs are ignored by push; every file under Alerts/ is pushed");
        }

        let pushed = alerts::push_alerts(&args.path, &opts, &ctx.cancel, || session.connect());
        total.merge(&report("Pushed", "alert rules", pushed, opts.dry_run)?);

        // Without an explicit selector, only sync alert rules kept locally
        if sync && (selection.requested || has_alerts_dir(&args.path)) {
            let deleted =
                alerts::sync_delete_alerts(&args.path, &opts, &ctx.cancel, || session.connect());
            total.merge(&report("Deleted", "remote alert rules", deleted, opts.dry_run)?);
        }
    }

    finish(&total)
}

fn confirm_sync(args: &PushArgs) -> Result<bool> {
    if args.yes || args.dry_run {
        return Ok(true);
    }

    let confirmed = Confirm::new()
        .with_prompt("Delete remote resources that don't exist locally?")
        .default(false)
        .interact()?;

    if !confirmed {
        ui::warn("Skipping deletion");
    }
    Ok(confirmed)
}

fn has_alerts_dir(paths: &[PathBuf]) -> bool {
    paths.iter().any(|p| p.join(ALERTS_DIR_NAME).is_dir())
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_alerts_dir() {
        let root = tempfile::tempdir().unwrap();
        let paths = vec![root.path().to_path_buf()];
        assert!(!has_alerts_dir(&paths));
        std::fs::create_dir(root.path().join(ALERTS_DIR_NAME)).unwrap();
        assert!(has_alerts_dir(&paths));
    }

    #[test]
    fn test_display_paths() {
        let paths = vec![PathBuf::from("a"), PathBuf::from("b/c")];
        assert_eq!(display_paths(&paths), "a, b/c");
    }
}
