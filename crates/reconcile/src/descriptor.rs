//! Kind descriptors and the registry built from them
//!
//! Descriptors come from live discovery, plus a fixed table of synthetic
//! descriptors for kinds the server does not expose through the generic
//! object API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::alerts::{ALERTS_SELECTOR, alert_rules_kind};
use crate::identity::KindId;

/// Describes one kind and the aliases selectors may use for it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Descriptor {
    pub kind: KindId,
    /// Plural resource name, also the URL path segment (e.g. "dashboards")
    pub plural: String,
    /// Singular alias (e.g. "dashboard")
    pub singular: String,
}

impl Descriptor {
    pub fn new(kind: KindId, plural: impl Into<String>, singular: impl Into<String>) -> Self {
        Self {
            kind,
            plural: plural.into(),
            singular: singular.into(),
        }
    }

    /// Whether `alias` names this descriptor.
    ///
    /// Plural and singular match exactly, the kind name case-insensitively.
    pub fn matches_alias(&self, alias: &str) -> bool {
        self.plural == alias || self.singular == alias || self.kind.kind.eq_ignore_ascii_case(alias)
    }

    /// Whether this descriptor is served outside the generic object API
    pub fn is_synthetic(&self) -> bool {
        SYNTHETIC_DESCRIPTORS.iter().any(|d| d.kind == self.kind)
    }
}

/// An ordered list of descriptors
pub type Descriptors = Vec<Descriptor>;

/// Kinds that discovery never reports but that the tool still manages
pub static SYNTHETIC_DESCRIPTORS: LazyLock<Descriptors> = LazyLock::new(|| {
    vec![Descriptor::new(
        alert_rules_kind(),
        ALERTS_SELECTOR,
        ALERTS_SELECTOR,
    )]
});

/// Append the synthetic descriptors after the discovered ones.
///
/// Returns a new list; entries with an identity equal to a discovered one are
/// kept as separate entries.
pub fn append_synthetic_descriptors(discovered: &[Descriptor]) -> Descriptors {
    let mut out = Vec::with_capacity(discovered.len() + SYNTHETIC_DESCRIPTORS.len());
    out.extend_from_slice(discovered);
    out.extend(SYNTHETIC_DESCRIPTORS.iter().cloned());
    out
}

/// Read-only lookup over the descriptors of one run
#[derive(Debug, Clone, Default)]
pub struct Registry {
    descriptors: Descriptors,
    by_kind: HashMap<KindId, usize>,
}

impl Registry {
    /// Index `descriptors`; for duplicate identities the first entry wins
    pub fn new(descriptors: Descriptors) -> Self {
        let mut by_kind = HashMap::with_capacity(descriptors.len());
        for (slot, desc) in descriptors.iter().enumerate() {
            by_kind.entry(desc.kind.clone()).or_insert(slot);
        }
        Self {
            descriptors,
            by_kind,
        }
    }

    pub fn get(&self, kind: &KindId) -> Option<&Descriptor> {
        self.by_kind.get(kind).map(|&slot| &self.descriptors[slot])
    }

    pub fn contains(&self, kind: &KindId) -> bool {
        self.by_kind.contains_key(kind)
    }

    /// Resolve an alias, optionally qualified by group (`dashboards.dashboard.grafana.app`)
    pub fn lookup(&self, selector: &str) -> Option<&Descriptor> {
        let find = |alias: &str, group: Option<&str>| {
            self.descriptors.iter().find(|d| {
                d.matches_alias(alias) && group.is_none_or(|g| d.kind.group == g)
            })
        };

        find(selector, None).or_else(|| {
            let (alias, group) = selector.split_once('.')?;
            find(alias, Some(group))
        })
    }

    /// All descriptors, in registration order
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// Descriptors served by the generic object API, without duplicates
    pub fn generic(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors
            .iter()
            .enumerate()
            .filter(|(slot, d)| self.by_kind.get(&d.kind) == Some(slot) && !d.is_synthetic())
            .map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
