//! Transport traits and implementations.
//!
//! The reconciliation engine talks to the server only through these traits:
//!
//! - [`ObjectApi`]: the generic typed-object API (list/get/create/update/delete)
//! - [`AlertRuleApi`]: the provisioning API for alert rules
//! - [`DiscoveryApi`]: enumeration of the kinds the server exposes
//!
//! [`http::HttpBackend`] implements all three against a live server.
//!
//! # Testing
//!
//! Use [`MockBackend`] for testing without network access:
//!
//! ```
//! use reconcile::backend::{AlertRuleApi, MockBackend};
//! use reconcile::alerts::AlertRule;
//!
//! let mock = MockBackend::new();
//! mock.add_alert_rule(AlertRule::new("cpu-high"));
//!
//! let rules = mock.list_alert_rules().unwrap();
//! assert_eq!(rules.len(), 1);
//! ```

pub mod discovery;
pub mod http;

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::alerts::AlertRule;
use crate::descriptor::{Descriptor, Descriptors};
use crate::error::{Error, Result};
use crate::identity::ObjectId;
use crate::object::Object;

/// Generic typed-object API
pub trait ObjectApi: Send + Sync {
    /// List every instance of a kind
    fn list(&self, desc: &Descriptor) -> Result<Vec<Object>>;

    /// Fetch one instance.
    ///
    /// # Errors
    ///
    /// Returns an error for which [`Error::is_not_found`] holds if it doesn't exist.
    fn get(&self, desc: &Descriptor, name: &str) -> Result<Object>;

    /// Create a new instance
    fn create(&self, desc: &Descriptor, obj: &Object) -> Result<Object>;

    /// Replace an existing instance
    fn update(&self, desc: &Descriptor, obj: &Object) -> Result<Object>;

    /// Delete an instance
    fn delete(&self, desc: &Descriptor, name: &str) -> Result<()>;
}

/// Alert rule provisioning API
pub trait AlertRuleApi: Send + Sync {
    /// List all alert rules (payloads may be incomplete)
    fn list_alert_rules(&self) -> Result<Vec<AlertRule>>;

    /// Fetch the full rule
    fn get_alert_rule(&self, uid: &str) -> Result<AlertRule>;

    /// Replace the rule with this UID
    fn update_alert_rule(&self, uid: &str, rule: &AlertRule) -> Result<()>;

    /// Create a new rule
    fn create_alert_rule(&self, rule: &AlertRule) -> Result<()>;

    /// Delete the rule with this UID
    fn delete_alert_rule(&self, uid: &str) -> Result<()>;
}

/// Kind discovery
pub trait DiscoveryApi: Send + Sync {
    /// Descriptors for every kind the server exposes generically
    fn discover(&self) -> Result<Descriptors>;
}

impl<T: ObjectApi + ?Sized> ObjectApi for Arc<T> {
    fn list(&self, desc: &Descriptor) -> Result<Vec<Object>> {
        (**self).list(desc)
    }
    fn get(&self, desc: &Descriptor, name: &str) -> Result<Object> {
        (**self).get(desc, name)
    }
    fn create(&self, desc: &Descriptor, obj: &Object) -> Result<Object> {
        (**self).create(desc, obj)
    }
    fn update(&self, desc: &Descriptor, obj: &Object) -> Result<Object> {
        (**self).update(desc, obj)
    }
    fn delete(&self, desc: &Descriptor, name: &str) -> Result<()> {
        (**self).delete(desc, name)
    }
}

impl<T: AlertRuleApi + ?Sized> AlertRuleApi for Arc<T> {
    fn list_alert_rules(&self) -> Result<Vec<AlertRule>> {
        (**self).list_alert_rules()
    }
    fn get_alert_rule(&self, uid: &str) -> Result<AlertRule> {
        (**self).get_alert_rule(uid)
    }
    fn update_alert_rule(&self, uid: &str, rule: &AlertRule) -> Result<()> {
        (**self).update_alert_rule(uid, rule)
    }
    fn create_alert_rule(&self, rule: &AlertRule) -> Result<()> {
        (**self).create_alert_rule(rule)
    }
    fn delete_alert_rule(&self, uid: &str) -> Result<()> {
        (**self).delete_alert_rule(uid)
    }
}

/// Remote operation, used by [`MockBackend`] for call recording and failure injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    List,
    Get,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct MockState {
    descriptors: Descriptors,
    objects: BTreeMap<ObjectId, Object>,
    alert_rules: BTreeMap<String, AlertRule>,
    failures: HashSet<(Op, String)>,
    calls: Vec<(Op, String)>,
}

/// In-memory backend for testing without network access.
///
/// Stores objects and alert rules in memory, records every call and can be
/// told to fail specific operations. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    latency: Option<Duration>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl MockBackend {
    /// Create a new empty mock backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every call, so concurrency becomes observable
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a descriptor returned by discovery
    pub fn add_descriptor(&self, desc: Descriptor) {
        self.state().descriptors.push(desc);
    }

    /// Store an object on the "server"
    pub fn add_object(&self, obj: Object) {
        self.state().objects.insert(obj.id().clone(), obj);
    }

    /// Store an alert rule on the "server"
    pub fn add_alert_rule(&self, rule: AlertRule) {
        self.state().alert_rules.insert(rule.uid.clone(), rule);
    }

    /// Make `op` fail for the object name or alert UID `key`
    pub fn fail_on(&self, op: Op, key: impl Into<String>) {
        self.state().failures.insert((op, key.into()));
    }

    /// Names of all stored objects, sorted by identity
    pub fn object_names(&self) -> Vec<String> {
        self.state().objects.keys().map(|id| id.name.clone()).collect()
    }

    pub fn object(&self, id: &ObjectId) -> Option<Object> {
        self.state().objects.get(id).cloned()
    }

    /// UIDs of all stored alert rules, sorted
    pub fn alert_uids(&self) -> Vec<String> {
        self.state().alert_rules.keys().cloned().collect()
    }

    pub fn alert_rule(&self, uid: &str) -> Option<AlertRule> {
        self.state().alert_rules.get(uid).cloned()
    }

    /// Every call made so far, as (operation, key)
    pub fn calls(&self) -> Vec<(Op, String)> {
        self.state().calls.clone()
    }

    /// Number of calls of one operation
    pub fn count(&self, op: Op) -> usize {
        self.state().calls.iter().filter(|(o, _)| *o == op).count()
    }

    /// Number of mutating calls (create, update, delete)
    pub fn mutations(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|(o, _)| matches!(o, Op::Create | Op::Update | Op::Delete))
            .count()
    }

    /// Highest number of calls observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn begin(&self, op: Op, key: &str) -> Result<InFlight<'_>> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let guard = InFlight(&self.in_flight);

        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }

        let mut state = self.state();
        state.calls.push((op, key.to_string()));
        if state.failures.contains(&(op, key.to_string())) {
            return Err(Error::http(format!("injected {op:?} failure for {key}"), Some(500)));
        }
        Ok(guard)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl ObjectApi for MockBackend {
    fn list(&self, desc: &Descriptor) -> Result<Vec<Object>> {
        let _call = self.begin(Op::List, &desc.plural)?;
        Ok(self
            .state()
            .objects
            .values()
            .filter(|o| *o.kind() == desc.kind)
            .cloned()
            .collect())
    }

    fn get(&self, desc: &Descriptor, name: &str) -> Result<Object> {
        let _call = self.begin(Op::Get, name)?;
        self.state()
            .objects
            .get(&ObjectId::new(desc.kind.clone(), name))
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("{}/{name}", desc.plural)))
    }

    fn create(&self, desc: &Descriptor, obj: &Object) -> Result<Object> {
        let _call = self.begin(Op::Create, obj.name())?;
        let mut state = self.state();
        if state.objects.contains_key(obj.id()) {
            return Err(Error::http(
                format!("{}/{} already exists", desc.plural, obj.name()),
                Some(409),
            ));
        }
        state.objects.insert(obj.id().clone(), obj.clone());
        Ok(obj.clone())
    }

    fn update(&self, desc: &Descriptor, obj: &Object) -> Result<Object> {
        let _call = self.begin(Op::Update, obj.name())?;
        let mut state = self.state();
        match state.objects.get_mut(obj.id()) {
            Some(existing) => {
                *existing = obj.clone();
                Ok(obj.clone())
            }
            None => Err(Error::NotFound(format!("{}/{}", desc.plural, obj.name()))),
        }
    }

    fn delete(&self, desc: &Descriptor, name: &str) -> Result<()> {
        let _call = self.begin(Op::Delete, name)?;
        self.state()
            .objects
            .remove(&ObjectId::new(desc.kind.clone(), name))
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("{}/{name}", desc.plural)))
    }
}

impl AlertRuleApi for MockBackend {
    fn list_alert_rules(&self) -> Result<Vec<AlertRule>> {
        let _call = self.begin(Op::List, crate::alerts::ALERTS_SELECTOR)?;
        Ok(self.state().alert_rules.values().cloned().collect())
    }

    fn get_alert_rule(&self, uid: &str) -> Result<AlertRule> {
        let _call = self.begin(Op::Get, uid)?;
        self.state()
            .alert_rules
            .get(uid)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("alert rule {uid}")))
    }

    fn update_alert_rule(&self, uid: &str, rule: &AlertRule) -> Result<()> {
        let _call = self.begin(Op::Update, uid)?;
        match self.state().alert_rules.get_mut(uid) {
            Some(existing) => {
                *existing = rule.clone();
                Ok(())
            }
            None => Err(Error::NotFound(format!("alert rule {uid}"))),
        }
    }

    fn create_alert_rule(&self, rule: &AlertRule) -> Result<()> {
        let _call = self.begin(Op::Create, &rule.uid)?;
        let mut state = self.state();
        if state.alert_rules.contains_key(&rule.uid) {
            return Err(Error::http(
                format!("alert rule {} already exists", rule.uid),
                Some(409),
            ));
        }
        state.alert_rules.insert(rule.uid.clone(), rule.clone());
        Ok(())
    }

    fn delete_alert_rule(&self, uid: &str) -> Result<()> {
        let _call = self.begin(Op::Delete, uid)?;
        self.state()
            .alert_rules
            .remove(uid)
            .map(|_| ())
            .ok_or_else(|| Error::NotFound(format!("alert rule {uid}")))
    }
}

impl DiscoveryApi for MockBackend {
    fn discover(&self) -> Result<Descriptors> {
        Ok(self.state().descriptors.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{dashboard, dashboards_descriptor, object};

    #[test]
    fn test_mock_backend_new() {
        let mock = MockBackend::new();
        assert!(mock.list(&dashboards_descriptor()).unwrap().is_empty());
        assert!(mock.list_alert_rules().unwrap().is_empty());
    }

    #[test]
    fn test_mock_object_crud() {
        let mock = MockBackend::new();
        let desc = dashboards_descriptor();
        let obj = object(dashboard("a"));

        assert!(mock.get(&desc, "a").unwrap_err().is_not_found());
        assert!(mock.update(&desc, &obj).unwrap_err().is_not_found());
        mock.create(&desc, &obj).unwrap();
        assert!(mock.create(&desc, &obj).is_err());
        assert_eq!(mock.get(&desc, "a").unwrap(), obj);
        mock.delete(&desc, "a").unwrap();
        assert!(mock.delete(&desc, "a").unwrap_err().is_not_found());
        assert_eq!(mock.mutations(), 5);
    }

    #[test]
    fn test_mock_failure_injection() {
        let mock = MockBackend::new();
        mock.add_alert_rule(AlertRule::new("a"));
        mock.fail_on(Op::Delete, "a");

        let err = mock.delete_alert_rule("a").unwrap_err();
        assert!(!err.is_not_found());
        assert_eq!(mock.alert_uids(), vec!["a"]);
        assert_eq!(mock.calls(), vec![(Op::Delete, "a".to_string())]);
    }
}
