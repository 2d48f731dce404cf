//! Unstructured remote objects
//!
//! Generic kinds are handled as opaque JSON documents carrying the usual
//! `apiVersion`, `kind` and `metadata.name` fields. Everything else is passed
//! through untouched.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::identity::{KindId, ObjectId};

/// Annotation naming the tool that owns an object on the server.
pub const MANAGED_BY_ANNOTATION: &str = "grafana.app/managedBy";

/// Manager identity written by this tool.
pub const MANAGER_ID: &str = "dashsync";

/// Metadata fields assigned by the server, stripped before writing to disk.
const SERVER_METADATA_FIELDS: &[&str] = &[
    "resourceVersion",
    "uid",
    "creationTimestamp",
    "generation",
    "managedFields",
    "namespace",
];

/// A single remote object with a validated identity
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    id: ObjectId,
    body: Value,
}

impl Object {
    /// Validate and wrap a decoded document.
    ///
    /// Requires `apiVersion`, `kind` and a non-blank `metadata.name`.
    pub fn from_value(body: Value) -> Result<Self> {
        let api_version = str_field(&body, &["apiVersion"])
            .ok_or_else(|| Error::InvalidObject("missing apiVersion".to_string()))?;
        let kind = str_field(&body, &["kind"])
            .ok_or_else(|| Error::InvalidObject("missing kind".to_string()))?;
        let name = str_field(&body, &["metadata", "name"]).unwrap_or_default();
        if name.trim().is_empty() {
            return Err(Error::InvalidObject(format!(
                "{kind} object has an empty metadata.name"
            )));
        }

        let id = ObjectId::new(KindId::from_api_version(api_version, kind), name);
        Ok(Self { id, body })
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn kind(&self) -> &KindId {
        &self.id.kind
    }

    pub fn name(&self) -> &str {
        &self.id.name
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    /// `metadata.resourceVersion`, if the server assigned one
    pub fn resource_version(&self) -> Option<&str> {
        str_field(&self.body, &["metadata", "resourceVersion"])
    }

    /// Replace `metadata.resourceVersion` (used for optimistic-concurrency updates)
    pub fn set_resource_version(&mut self, version: &str) {
        if let Some(meta) = self.metadata_mut() {
            meta.insert(
                "resourceVersion".to_string(),
                Value::String(version.to_string()),
            );
        }
    }

    /// Name of the tool managing this object, if any
    pub fn manager(&self) -> Option<&str> {
        self.body
            .get("metadata")
            .and_then(|m| m.get("annotations"))
            .and_then(|a| a.get(MANAGED_BY_ANNOTATION))
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
    }

    /// Whether the object is owned by something other than this tool
    pub fn is_managed(&self) -> bool {
        self.manager().is_some_and(|m| m != MANAGER_ID)
    }

    /// Copy with server-assigned metadata and status removed, for writing to disk
    pub fn without_server_fields(&self) -> Self {
        let mut cleaned = self.clone();
        if let Some(meta) = cleaned.metadata_mut() {
            for field in SERVER_METADATA_FIELDS {
                meta.remove(*field);
            }
        }
        if let Some(obj) = cleaned.body.as_object_mut() {
            obj.remove("status");
        }
        cleaned
    }

    fn metadata_mut(&mut self) -> Option<&mut Map<String, Value>> {
        self.body.get_mut("metadata").and_then(Value::as_object_mut)
    }
}

fn str_field<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    let mut current = value;
    for key in path {
        current = current.get(*key)?;
    }
    current.as_str()
}

impl Serialize for Object {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.body.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Object {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let body = Value::deserialize(deserializer)?;
        Object::from_value(body).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::testutil::dashboard;

    #[test]
    fn test_from_value_extracts_identity() {
        let obj = Object::from_value(dashboard("home")).unwrap();
        assert_eq!(obj.name(), "home");
        assert_eq!(obj.kind().group, "dashboard.grafana.app");
        assert_eq!(obj.kind().kind, "Dashboard");
    }

    #[test]
    fn test_from_value_rejects_blank_name() {
        let err = Object::from_value(dashboard("   ")).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(_)));

        let err = Object::from_value(json!({"apiVersion": "v1", "kind": "X"})).unwrap_err();
        assert!(matches!(err, Error::InvalidObject(_)));
    }

    #[test]
    fn test_from_value_requires_kind() {
        let err = Object::from_value(json!({"apiVersion": "v1", "metadata": {"name": "a"}}))
            .unwrap_err();
        assert!(err.to_string().contains("missing kind"));
    }

    #[test]
    fn test_managed_detection() {
        let mut body = dashboard("a");
        assert!(!Object::from_value(body.clone()).unwrap().is_managed());

        body["metadata"]["annotations"][MANAGED_BY_ANNOTATION] = json!("terraform");
        assert!(Object::from_value(body.clone()).unwrap().is_managed());

        body["metadata"]["annotations"][MANAGED_BY_ANNOTATION] = json!(MANAGER_ID);
        assert!(!Object::from_value(body.clone()).unwrap().is_managed());

        body["metadata"]["annotations"][MANAGED_BY_ANNOTATION] = json!(" ");
        assert!(!Object::from_value(body).unwrap().is_managed());
    }

    #[test]
    fn test_without_server_fields() {
        let mut body = dashboard("a");
        body["metadata"]["resourceVersion"] = json!("42");
        body["metadata"]["namespace"] = json!("default");
        body["metadata"]["labels"] = json!({"team": "core"});
        body["status"] = json!({"ok": true});

        let cleaned = Object::from_value(body).unwrap().without_server_fields();
        assert!(cleaned.resource_version().is_none());
        assert!(cleaned.body().get("status").is_none());
        assert!(cleaned.body()["metadata"].get("namespace").is_none());
        assert_eq!(cleaned.body()["metadata"]["labels"]["team"], "core");
        assert_eq!(cleaned.name(), "a");
    }

    #[test]
    fn test_set_resource_version() {
        let mut obj = Object::from_value(dashboard("a")).unwrap();
        obj.set_resource_version("7");
        assert_eq!(obj.resource_version(), Some("7"));
    }
}
