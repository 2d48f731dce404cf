//! HTTP backend for Grafana-compatible servers.
//!
//! Generic kinds are served under
//! `/apis/{group}/{version}/namespaces/{namespace}/{plural}`, alert rules
//! under `/api/v1/provisioning/alert-rules`.

use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::discovery::{ApiGroupList, ApiResourceList, build_descriptors};
use super::{AlertRuleApi, DiscoveryApi, ObjectApi};
use crate::alerts::AlertRule;
use crate::descriptor::{Descriptor, Descriptors};
use crate::error::{Error, Result};
use crate::object::Object;

/// Page size for list requests.
const LIST_LIMIT: &str = "500";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const ALERT_RULES_PATH: &str = "/api/v1/provisioning/alert-rules";

/// Connection settings for [`HttpBackend`]
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL, e.g. `https://grafana.example.com`
    pub server: String,
    /// Bearer token (service account token or API key)
    pub token: Option<String>,
    /// Namespace for generic objects (`default`, `org-2`, `stacks-123`)
    pub namespace: String,
    pub timeout: Duration,
}

impl HttpConfig {
    pub fn new(server: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            token: None,
            namespace: namespace.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

/// Blocking HTTP client implementing every backend trait
pub struct HttpBackend {
    agent: ureq::Agent,
    base: String,
    token: Option<String>,
    namespace: String,
}

impl HttpBackend {
    /// Validate the configuration and build the agent.
    ///
    /// No request is made here.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let base = config.server.trim().trim_end_matches('/').to_string();
        if base.is_empty() {
            return Err(Error::Config("no server URL configured".to_string()));
        }
        if !base.starts_with("http://") && !base.starts_with("https://") {
            return Err(Error::Config(format!(
                "server URL must start with http:// or https:// (got {base:?})"
            )));
        }
        if config.namespace.trim().is_empty() {
            return Err(Error::Config("namespace must not be empty".to_string()));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(config.timeout))
            .build()
            .into();

        Ok(Self {
            agent,
            base,
            token: config.token.filter(|t| !t.trim().is_empty()),
            namespace: config.namespace,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    fn collection_url(&self, desc: &Descriptor) -> String {
        format!(
            "{}/apis/{}/{}/namespaces/{}/{}",
            self.base, desc.kind.group, desc.kind.version, self.namespace, desc.plural
        )
    }

    fn object_url(&self, desc: &Descriptor, name: &str) -> String {
        format!("{}/{}", self.collection_url(desc), urlencoding::encode(name))
    }

    fn alert_rule_url(&self, uid: &str) -> String {
        format!("{}{ALERT_RULES_PATH}/{}", self.base, urlencoding::encode(uid))
    }

    fn auth(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {t}"))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        log::trace!("GET {url}");
        let mut request = self.agent.get(url).header("Accept", "application/json");
        if let Some(auth) = self.auth() {
            request = request.header("Authorization", auth);
        }
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        Ok(request.call()?.body_mut().read_json()?)
    }

    fn send_json<T: DeserializeOwned>(&self, method: &str, url: &str, body: &impl serde::Serialize) -> Result<T> {
        log::trace!("{method} {url}");
        let mut request = match method {
            "POST" => self.agent.post(url),
            _ => self.agent.put(url),
        }
        .header("Accept", "application/json")
        .header("X-Disable-Provenance", "true");
        if let Some(auth) = self.auth() {
            request = request.header("Authorization", auth);
        }
        Ok(request.send_json(body)?.body_mut().read_json()?)
    }

    fn delete_url(&self, url: &str) -> Result<()> {
        log::trace!("DELETE {url}");
        let mut request = self.agent.delete(url);
        if let Some(auth) = self.auth() {
            request = request.header("Authorization", auth);
        }
        request.call()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ObjectList {
    #[serde(default)]
    metadata: ListMeta,
    #[serde(default)]
    items: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ListMeta {
    #[serde(default, rename = "continue")]
    continue_token: Option<String>,
}

/// Fill in `apiVersion`/`kind` that list responses may omit on items
fn to_object(desc: &Descriptor, mut value: Value) -> Result<Object> {
    if let Some(map) = value.as_object_mut() {
        map.entry("apiVersion")
            .or_insert_with(|| Value::String(desc.kind.api_version()));
        map.entry("kind")
            .or_insert_with(|| Value::String(desc.kind.kind.clone()));
    }
    Object::from_value(value)
}

impl ObjectApi for HttpBackend {
    fn list(&self, desc: &Descriptor) -> Result<Vec<Object>> {
        let url = self.collection_url(desc);
        let mut objects = Vec::new();
        let mut token: Option<String> = None;

        loop {
            let mut query = vec![("limit", LIST_LIMIT)];
            if let Some(t) = token.as_deref() {
                query.push(("continue", t));
            }
            let page: ObjectList = self.get_json(&url, &query)?;

            for item in page.items {
                match to_object(desc, item) {
                    Ok(obj) => objects.push(obj),
                    Err(e) => log::warn!("skipping {} item: {e}", desc.plural),
                }
            }

            match page.metadata.continue_token.filter(|t| !t.is_empty()) {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        Ok(objects)
    }

    fn get(&self, desc: &Descriptor, name: &str) -> Result<Object> {
        let value: Value = self.get_json(&self.object_url(desc, name), &[])?;
        to_object(desc, value)
    }

    fn create(&self, desc: &Descriptor, obj: &Object) -> Result<Object> {
        let value: Value = self.send_json("POST", &self.collection_url(desc), obj)?;
        to_object(desc, value)
    }

    fn update(&self, desc: &Descriptor, obj: &Object) -> Result<Object> {
        let value: Value = self.send_json("PUT", &self.object_url(desc, obj.name()), obj)?;
        to_object(desc, value)
    }

    fn delete(&self, desc: &Descriptor, name: &str) -> Result<()> {
        self.delete_url(&self.object_url(desc, name))
    }
}

impl AlertRuleApi for HttpBackend {
    fn list_alert_rules(&self) -> Result<Vec<AlertRule>> {
        self.get_json(&format!("{}{ALERT_RULES_PATH}", self.base), &[])
    }

    fn get_alert_rule(&self, uid: &str) -> Result<AlertRule> {
        self.get_json(&self.alert_rule_url(uid), &[])
    }

    fn update_alert_rule(&self, uid: &str, rule: &AlertRule) -> Result<()> {
        let _: Value = self.send_json("PUT", &self.alert_rule_url(uid), rule)?;
        Ok(())
    }

    fn create_alert_rule(&self, rule: &AlertRule) -> Result<()> {
        let _: Value = self.send_json("POST", &format!("{}{ALERT_RULES_PATH}", self.base), rule)?;
        Ok(())
    }

    fn delete_alert_rule(&self, uid: &str) -> Result<()> {
        self.delete_url(&self.alert_rule_url(uid))
    }
}

impl DiscoveryApi for HttpBackend {
    fn discover(&self) -> Result<Descriptors> {
        let groups: ApiGroupList = self.get_json(&format!("{}/apis", self.base), &[])?;
        build_descriptors(&groups, |group_version| {
            self.get_json::<ApiResourceList>(&format!("{}/apis/{group_version}", self.base), &[])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::dashboards_descriptor;
    use serde_json::json;

    fn backend() -> HttpBackend {
        HttpBackend::new(HttpConfig::new("https://grafana.example.com/", "org-2")).unwrap()
    }

    #[test]
    fn test_config_validation() {
        assert!(matches!(
            HttpBackend::new(HttpConfig::new("  ", "default")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            HttpBackend::new(HttpConfig::new("grafana.local", "default")),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            HttpBackend::new(HttpConfig::new("http://grafana.local", "")),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_urls() {
        let backend = backend();
        assert_eq!(backend.base_url(), "https://grafana.example.com");
        assert_eq!(
            backend.object_url(&dashboards_descriptor(), "abc"),
            "https://grafana.example.com/apis/dashboard.grafana.app/v1beta1/namespaces/org-2/dashboards/abc"
        );
        assert_eq!(
            backend.alert_rule_url("cpu"),
            "https://grafana.example.com/api/v1/provisioning/alert-rules/cpu"
        );
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let backend = backend();
        let url = backend.alert_rule_url("a?b/c#d");
        assert_eq!(
            url,
            "https://grafana.example.com/api/v1/provisioning/alert-rules/a%3Fb%2Fc%23d"
        );
        let uri: ureq::http::Uri = url.parse().unwrap();
        assert_eq!(uri.path(), "/api/v1/provisioning/alert-rules/a%3Fb%2Fc%23d");
        assert!(uri.query().is_none());

        assert!(
            backend
                .object_url(&dashboards_descriptor(), "x y")
                .ends_with("/dashboards/x%20y")
        );
    }

    #[test]
    fn test_blank_token_is_dropped() {
        let backend =
            HttpBackend::new(HttpConfig::new("http://localhost:3000", "default").with_token(" ")).unwrap();
        assert!(backend.auth().is_none());
    }

    #[test]
    fn test_list_item_gets_kind_from_descriptor() {
        let obj = to_object(
            &dashboards_descriptor(),
            json!({"metadata": {"name": "a"}, "spec": {}}),
        )
        .unwrap();
        assert_eq!(obj.kind(), &dashboards_descriptor().kind);
        assert_eq!(obj.body()["apiVersion"], "dashboard.grafana.app/v1beta1");
    }

    #[test]
    fn test_list_page_continue_token() {
        let page: ObjectList = serde_json::from_value(json!({
            "metadata": {"continue": "abc"},
            "items": [{"metadata": {"name": "a"}}]
        }))
        .unwrap();
        assert_eq!(page.metadata.continue_token.as_deref(), Some("abc"));
        assert_eq!(page.items.len(), 1);
    }
}
