//! Alert rules, reached through the provisioning API
//!
//! Alert rules are not exposed through the generic object API on most
//! servers. They get their own pull/push/sync-delete implementation with the
//! same result shape as the generic engine ([`Summary`](crate::Summary) or
//! [`Aborted`](crate::Aborted)), stop-on-error and dry-run semantics.
//!
//! Files live in the reserved `Alerts/` subdirectory of each resource root,
//! one rule per file, named `<uid>.json` or `<uid>.yaml`.

mod adapter;
mod files;

pub use adapter::{AlertPullRequest, pull_alerts, push_alerts, sync_delete_alerts};
pub use files::read_alert_rule_files;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::KindId;

/// Selector (and plural alias) for alert rules
pub const ALERTS_SELECTOR: &str = "alerts";

/// Reserved subdirectory holding alert rule files
pub const ALERTS_DIR_NAME: &str = "Alerts";

/// Identity used for the synthetic alert rule descriptor
pub fn alert_rules_kind() -> KindId {
    KindId::new("provisioning.alerting.grafana", "v1", "AlertRules")
}

/// A provisioned alert rule.
///
/// Only the UID is interpreted; the rest of the payload is passed through
/// verbatim between files and the provisioning API.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    #[serde(default)]
    pub uid: String,
    #[serde(flatten)]
    pub rest: Map<String, Value>,
}

impl AlertRule {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            rest: Map::new(),
        }
    }

    /// Builder: set an opaque payload field
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.rest.insert(key.to_string(), value.into());
        self
    }

    /// The UID with surrounding whitespace removed
    pub fn trimmed_uid(&self) -> &str {
        self.uid.trim()
    }
}
