//! Pull, push and sync-delete for alert rules over the provisioning API

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::files::read_alert_rule_files;
use super::{ALERTS_DIR_NAME, AlertRule};
use crate::backend::AlertRuleApi;
use crate::cancel::CancelToken;
use crate::codec::Format;
use crate::context::LogProgress;
use crate::error::{Aborted, Error, Result};
use crate::executor::run_bounded;
use crate::types::{ExecuteOptions, Summary};

/// What to pull
#[derive(Debug, Clone, Default)]
pub struct AlertPullRequest {
    /// Rules are written to `<out_dir>/Alerts/`
    pub out_dir: PathBuf,
    /// Requested output format, as given on the command line
    pub format: String,
    /// Restrict to these UIDs; empty means every rule
    pub uids: Vec<String>,
}

/// Write remote alert rules to `<out_dir>/Alerts/<uid>.<ext>`.
///
/// The format is validated before `connect` is called. Each listed rule is
/// fetched again by UID since list payloads may be incomplete. Listed rules
/// without a UID are skipped. The first remote or write error aborts.
pub fn pull_alerts<C, F>(
    req: &AlertPullRequest,
    connect: F,
    cancel: &CancelToken,
) -> std::result::Result<Summary, Aborted>
where
    C: AlertRuleApi,
    F: FnOnce() -> Result<C>,
{
    let format = req
        .format
        .parse::<Format>()
        .map_err(|_| Error::UnsupportedFormat {
            operation: "alert pull",
            format: req.format.clone(),
        })?;

    let client = connect()?;
    cancel.check()?;
    let listed = client.list_alert_rules()?;
    log::debug!("server has {} alert rules", listed.len());

    let dir = req.out_dir.join(ALERTS_DIR_NAME);
    std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;

    let wanted: HashSet<&str> = req
        .uids
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect();

    let mut summary = Summary::default();
    for rule in &listed {
        let uid = rule.trimmed_uid();
        if uid.is_empty() {
            log::debug!("skipping listed alert rule without uid");
            continue;
        }
        if !wanted.is_empty() && !wanted.contains(uid) {
            continue;
        }

        if let Err(error) = pull_one(&client, uid, &dir, format, cancel) {
            summary.failed += 1;
            return Err(Aborted::new(summary, error));
        }
        summary.succeeded += 1;
    }

    log::info!("pulled {} alert rules", summary.succeeded);
    Ok(summary)
}

fn pull_one<C: AlertRuleApi>(
    client: &C,
    uid: &str,
    dir: &Path,
    format: Format,
    cancel: &CancelToken,
) -> Result<()> {
    cancel.check()?;
    let rule = client.get_alert_rule(uid)?;
    let path = rule_path(dir, uid, format)?;
    format.encode_file(&path, &rule)?;
    log::debug!("wrote alert rule {uid} to {}", path.display());
    Ok(())
}

fn rule_path(dir: &Path, uid: &str, format: Format) -> Result<PathBuf> {
    if uid.contains(['/', '\\']) || uid == ".." {
        return Err(Error::InvalidObject(format!(
            "alert rule uid {uid:?} cannot be used as a file name"
        )));
    }
    Ok(dir.join(format!("{uid}.{}", format.extension())))
}

/// Collapse rules sharing a UID: the last one read wins, keeping the slot of
/// the first. Rules with a blank UID are kept as they are.
fn dedupe_by_uid(rules: Vec<AlertRule>) -> Vec<AlertRule> {
    let mut out: Vec<AlertRule> = Vec::with_capacity(rules.len());
    let mut slots: HashMap<String, usize> = HashMap::new();

    for mut rule in rules {
        let uid = rule.trimmed_uid().to_string();
        if uid.is_empty() {
            out.push(rule);
            continue;
        }
        rule.uid.clone_from(&uid);
        match slots.get(&uid) {
            Some(&slot) => {
                log::warn!("alert rule {uid} defined more than once, using the last file");
                out[slot] = rule;
            }
            None => {
                slots.insert(uid, out.len());
                out.push(rule);
            }
        }
    }
    out
}

/// Push every alert rule file under `<root>/Alerts/` of each root.
///
/// Unreadable files abort before anything is sent. Without rules, or in a
/// dry run, `connect` is never called. Each rule is updated by UID and
/// created when the server doesn't have it.
pub fn push_alerts<P, C, F>(
    roots: &[P],
    opts: &ExecuteOptions,
    cancel: &CancelToken,
    connect: F,
) -> std::result::Result<Summary, Aborted>
where
    P: AsRef<Path>,
    C: AlertRuleApi,
    F: FnOnce() -> Result<C>,
{
    let rules = dedupe_by_uid(read_alert_rule_files(roots)?);
    if rules.is_empty() {
        log::info!("no alert rule files found");
        return Ok(Summary::default());
    }

    if opts.dry_run {
        return dry_run_push(&rules, opts.stop_on_error);
    }

    let client = connect()?;
    let run_opts = ExecuteOptions {
        dry_run: false,
        ..opts.clone()
    };

    let summary = run_bounded(
        "push alert rule",
        &rules,
        |rule: &AlertRule| rule.uid.clone(),
        &run_opts,
        cancel,
        &LogProgress,
        |rule| push_one(&client, rule),
    )?;

    log::info!(
        "pushed {} alert rules ({} failed)",
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}

fn dry_run_push(rules: &[AlertRule], stop_on_error: bool) -> std::result::Result<Summary, Aborted> {
    let mut summary = Summary::default();
    for rule in rules {
        if rule.trimmed_uid().is_empty() {
            summary.failed += 1;
            if stop_on_error {
                return Err(Aborted::new(summary, Error::MissingUid));
            }
            continue;
        }
        log::info!("[dry-run] push alert rule {}", rule.uid);
        summary.succeeded += 1;
    }
    Ok(summary)
}

fn push_one<C: AlertRuleApi>(client: &C, rule: &AlertRule) -> Result<()> {
    let uid = rule.trimmed_uid();
    if uid.is_empty() {
        return Err(Error::MissingUid);
    }

    match client.update_alert_rule(uid, rule) {
        Err(e) if e.is_not_found() => {
            log::debug!("alert rule {uid} does not exist, creating it");
            client.create_alert_rule(rule)
        }
        other => other,
    }
}

/// Delete every remote alert rule whose UID has no local file.
///
/// Local files are read the same way as [`push_alerts`]; a dry run lists the
/// remote rules but only counts the candidates.
pub fn sync_delete_alerts<P, C, F>(
    roots: &[P],
    opts: &ExecuteOptions,
    cancel: &CancelToken,
    connect: F,
) -> std::result::Result<Summary, Aborted>
where
    P: AsRef<Path>,
    C: AlertRuleApi,
    F: FnOnce() -> Result<C>,
{
    let local: HashSet<String> = read_alert_rule_files(roots)?
        .iter()
        .map(|r| r.trimmed_uid().to_string())
        .filter(|u| !u.is_empty())
        .collect();

    let client = connect()?;
    cancel.check()?;

    let mut seen = HashSet::new();
    let candidates: Vec<String> = client
        .list_alert_rules()?
        .iter()
        .map(|r| r.trimmed_uid().to_string())
        .filter(|u| !u.is_empty() && !local.contains(u) && seen.insert(u.clone()))
        .collect();
    log::info!("{} remote alert rules missing locally", candidates.len());

    let summary = run_bounded(
        "delete alert rule",
        &candidates,
        String::clone,
        opts,
        cancel,
        &LogProgress,
        |uid| client.delete_alert_rule(uid),
    )?;

    log::info!(
        "deleted {} alert rules ({} failed)",
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}
