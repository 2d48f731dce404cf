//! Shared test fixtures

use serde_json::{Value, json};

use crate::descriptor::Descriptor;
use crate::identity::KindId;
use crate::object::Object;

pub fn dashboard(name: &str) -> Value {
    json!({
        "apiVersion": "dashboard.grafana.app/v1beta1",
        "kind": "Dashboard",
        "metadata": {"name": name},
        "spec": {"title": format!("Dashboard {name}")},
    })
}

pub fn folder(name: &str) -> Value {
    json!({
        "apiVersion": "folder.grafana.app/v1",
        "kind": "Folder",
        "metadata": {"name": name},
        "spec": {"title": format!("Folder {name}")},
    })
}

pub fn object(body: Value) -> Object {
    Object::from_value(body).unwrap()
}

/// An object claimed by another tool
pub fn managed(mut body: Value) -> Object {
    body["metadata"]["annotations"] = json!({"grafana.app/managedBy": "terraform"});
    object(body)
}

pub fn dashboards_descriptor() -> Descriptor {
    Descriptor::new(
        KindId::new("dashboard.grafana.app", "v1beta1", "Dashboard"),
        "dashboards",
        "dashboard",
    )
}

pub fn folders_descriptor() -> Descriptor {
    Descriptor::new(
        KindId::new("folder.grafana.app", "v1", "Folder"),
        "folders",
        "folder",
    )
}
