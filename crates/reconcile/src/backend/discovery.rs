//! Kind discovery from the server's `/apis` endpoints
//!
//! Only the preferred version of each group is used. Subresources,
//! cluster-scoped resources and resources that can't be listed are skipped.

use serde::Deserialize;

use crate::descriptor::{Descriptor, Descriptors};
use crate::error::Result;
use crate::identity::KindId;

/// API groups never offered as resource kinds.
///
/// Alert notification resources (`notifications.alerting.grafana.app`) must
/// stay discoverable, so that group is not listed here.
pub const IGNORED_RESOURCE_GROUPS: &[&str] = &[
    "apiregistration.k8s.io",
    "featuretoggle.grafana.app",
    "service.grafana.app",
    "userstorage.grafana.app",
];

/// Response of `GET /apis`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiGroupList {
    #[serde(default)]
    pub groups: Vec<ApiGroup>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGroup {
    pub name: String,
    #[serde(default)]
    pub versions: Vec<GroupVersion>,
    pub preferred_version: Option<GroupVersion>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupVersion {
    pub group_version: String,
    pub version: String,
}

/// Response of `GET /apis/{group}/{version}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiResourceList {
    #[serde(default)]
    pub resources: Vec<ApiResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResource {
    pub name: String,
    #[serde(default)]
    pub singular_name: String,
    #[serde(default)]
    pub namespaced: bool,
    pub kind: String,
    #[serde(default)]
    pub verbs: Vec<String>,
}

impl ApiGroup {
    /// The preferred version, falling back to the first listed one
    fn preferred(&self) -> Option<&GroupVersion> {
        self.preferred_version.as_ref().or_else(|| self.versions.first())
    }
}

impl ApiResource {
    fn is_syncable(&self) -> bool {
        !self.name.contains('/') && self.namespaced && self.verbs.iter().any(|v| v == "list")
    }
}

/// Build descriptors from a group list, fetching each group's resources
/// with `fetch_resources(group_version)`.
///
/// Output is sorted by group, then plural name.
pub fn build_descriptors<F>(groups: &ApiGroupList, mut fetch_resources: F) -> Result<Descriptors>
where
    F: FnMut(&str) -> Result<ApiResourceList>,
{
    let mut descriptors = Descriptors::new();

    for group in &groups.groups {
        if IGNORED_RESOURCE_GROUPS.contains(&group.name.as_str()) {
            log::trace!("ignoring API group {}", group.name);
            continue;
        }
        let Some(version) = group.preferred() else {
            continue;
        };

        let resources = fetch_resources(&version.group_version)?;
        for resource in resources.resources.iter().filter(|r| r.is_syncable()) {
            let singular = if resource.singular_name.is_empty() {
                resource.kind.to_ascii_lowercase()
            } else {
                resource.singular_name.clone()
            };
            descriptors.push(Descriptor::new(
                KindId::new(&group.name, &version.version, &resource.kind),
                &resource.name,
                singular,
            ));
        }
    }

    descriptors.sort_by(|a, b| {
        a.kind
            .group
            .cmp(&b.kind.group)
            .then_with(|| a.plural.cmp(&b.plural))
    });
    log::debug!("discovered {} resource kinds", descriptors.len());
    Ok(descriptors)
}
