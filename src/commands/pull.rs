//! `dashsync pull` - write remote resources to local files

use anyhow::Result;
use reconcile::alerts::{self, AlertPullRequest};
use reconcile::{
    Filters, Format, FsWriter, PullRequest, Puller, Resources, Summary, split_alert_selectors,
};

use super::{Session, finish, report};
use crate::Context;
use crate::cli::PullArgs;
use crate::progress;
use crate::ui;

pub fn run(ctx: &Context, args: PullArgs) -> Result<()> {
    let selection = split_alert_selectors(&args.selectors);
    let everything = selection.is_empty();

    // Checked before anything is sent
    let format: Format = args.output.parse()?;
    let session = Session::open(ctx)?;
    let mut total = Summary::default();

    if everything || !selection.other.is_empty() {
        let backend = session.connect()?;
        let registry = session.registry(&backend)?;
        let filters = if selection.other.is_empty() {
            Filters::all_kinds(&registry)
        } else {
            Filters::parse(&selection.other, &registry)?
        };

        let pb = progress::spinner(&format!("Pulling {} kinds...", filters.len()));
        let mut resources = Resources::new();
        let pulled = Puller::new(&backend).with_cancel(ctx.cancel.clone()).pull(
            &PullRequest {
                filters: &filters,
                exclude_managed: !args.include_managed,
                stop_on_error: args.stop_on_error,
            },
            &mut resources,
        );
        if let Err(e) = pulled {
            progress::finish_error(&pb, "Pull failed");
            return Err(e.into());
        }
        progress::finish_success(&pb, &format!("Pulled {} resources", resources.len()));

        FsWriter::new(&args.path, format).write(&resources)?;
        ui::dim(&format!("written to {}", args.path.display()));
        total.succeeded += resources.len();
    }

    if everything || selection.requested {
        let req = AlertPullRequest {
            out_dir: args.path.clone(),
            format: args.output.clone(),
            uids: selection.uids.clone(),
        };
        let result = alerts::pull_alerts(&req, || session.connect(), &ctx.cancel);
        total.merge(&report("Pulled", "alert rules", result, false)?);
    }

    finish(&total)
}
