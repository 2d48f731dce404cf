//! Splitting alert rule selectors from generic selectors
//!
//! Alert rules are not part of the generic descriptor/filter machinery, so
//! their selectors are recognized and removed before generic resolution.

/// Spellings that select alert rules
pub const ALERT_SELECTOR_SPELLINGS: &[&str] = &[
    "alerts",
    "alert",
    "alert-rules",
    "alert-rule",
    "alertrules",
    "alertrule",
];

/// Result of splitting a selector list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertSelection {
    /// Whether any token selected alert rules
    pub requested: bool,
    /// UID restriction, in token order then list order; empty means all rules
    pub uids: Vec<String>,
    /// Remaining tokens for generic filter resolution, in original order
    pub other: Vec<String>,
}

impl AlertSelection {
    /// Whether no selector was given at all
    pub fn is_empty(&self) -> bool {
        !self.requested && self.other.is_empty()
    }
}

/// Split alert rule selectors (`alerts`, `alerts/uid1,uid2`, ...) from the rest.
///
/// Tokens are trimmed and empty ones dropped. UID lists accumulate across
/// tokens and keep duplicates.
pub fn split_alert_selectors<S: AsRef<str>>(args: &[S]) -> AlertSelection {
    let mut selection = AlertSelection::default();

    for arg in args {
        let token = arg.as_ref().trim();
        if token.is_empty() {
            continue;
        }

        if ALERT_SELECTOR_SPELLINGS.contains(&token) {
            selection.requested = true;
            continue;
        }

        let uid_list = ALERT_SELECTOR_SPELLINGS.iter().find_map(|spelling| {
            token
                .strip_prefix(spelling)
                .and_then(|rest| rest.strip_prefix('/'))
        });

        match uid_list {
            Some(csv) => {
                selection.requested = true;
                append_csv_non_empty(&mut selection.uids, csv);
            }
            None => selection.other.push(token.to_string()),
        }
    }

    selection
}

/// Append each trimmed, non-empty entry of a comma-separated list
pub(crate) fn append_csv_non_empty(dst: &mut Vec<String>, csv: &str) {
    dst.extend(
        csv.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string),
    );
}
