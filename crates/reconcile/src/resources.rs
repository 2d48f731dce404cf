//! Resource set keyed by object identity

use std::collections::{HashMap, HashSet};

use crate::identity::{KindId, ObjectId};
use crate::object::Object;

/// A collection of objects with at most one member per [`ObjectId`].
///
/// Members keep the slot of their first insertion, so [`Resources::as_list`]
/// is stable for as long as the set is not modified.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    items: Vec<Object>,
    index: HashMap<ObjectId, usize>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `obj`, replacing the whole member with the same identity
    pub fn add(&mut self, obj: Object) {
        match self.index.get(obj.id()) {
            Some(&slot) => self.items[slot] = obj,
            None => {
                self.index.insert(obj.id().clone(), self.items.len());
                self.items.push(obj);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot of all members
    pub fn as_list(&self) -> &[Object] {
        &self.items
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Object> {
        self.index.get(id).map(|&slot| &self.items[slot])
    }

    pub fn contains(&self, id: &ObjectId) -> bool {
        self.index.contains_key(id)
    }

    /// Identity index of every member
    pub fn ids(&self) -> HashSet<&ObjectId> {
        self.index.keys().collect()
    }

    /// Distinct kinds in first-seen order
    pub fn kinds(&self) -> Vec<&KindId> {
        let mut seen = HashSet::new();
        self.items
            .iter()
            .map(Object::kind)
            .filter(|kind| seen.insert(*kind))
            .collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.items.iter()
    }
}

impl FromIterator<Object> for Resources {
    fn from_iter<I: IntoIterator<Item = Object>>(iter: I) -> Self {
        let mut resources = Self::new();
        resources.extend(iter);
        resources
    }
}

impl Extend<Object> for Resources {
    fn extend<I: IntoIterator<Item = Object>>(&mut self, iter: I) {
        for obj in iter {
            self.add(obj);
        }
    }
}

impl IntoIterator for Resources {
    type Item = Object;
    type IntoIter = std::vec::IntoIter<Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Resources {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{dashboard, folder, object};

    #[test]
    fn test_add_replaces_same_identity() {
        let mut set = Resources::new();
        let mut first = dashboard("home");
        first["spec"]["title"] = "first".into();
        let mut second = dashboard("home");
        second["spec"]["title"] = "second".into();

        set.add(object(first));
        set.add(object(second));

        assert_eq!(set.len(), 1);
        assert_eq!(set.as_list()[0].body()["spec"]["title"], "second");
    }

    #[test]
    fn test_replacement_is_whole_object() {
        let mut set = Resources::new();
        let mut first = dashboard("home");
        first["spec"]["extra"] = "only-in-first".into();
        set.add(object(first));
        set.add(object(dashboard("home")));

        assert!(set.as_list()[0].body()["spec"].get("extra").is_none());
    }

    #[test]
    fn test_same_name_different_kind_are_distinct() {
        let set: Resources = [object(dashboard("a")), object(folder("a"))]
            .into_iter()
            .collect();
        assert_eq!(set.len(), 2);
        assert_eq!(set.kinds().len(), 2);
    }

    #[test]
    fn test_replacement_keeps_slot() {
        let mut set: Resources = ["a", "b", "c"]
            .into_iter()
            .map(|n| object(dashboard(n)))
            .collect();
        set.add(object(dashboard("a")));

        let names: Vec<_> = set.iter().map(Object::name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_kinds_first_seen_order() {
        let set: Resources = [
            object(folder("f")),
            object(dashboard("a")),
            object(folder("g")),
        ]
        .into_iter()
        .collect();

        let kinds: Vec<_> = set.kinds().into_iter().map(|k| k.kind.as_str()).collect();
        assert_eq!(kinds, vec!["Folder", "Dashboard"]);
    }

    #[test]
    fn test_contains_and_get() {
        let set: Resources = [object(dashboard("a"))].into_iter().collect();
        let id = set.as_list()[0].id().clone();
        assert!(set.contains(&id));
        assert_eq!(set.get(&id).map(Object::name), Some("a"));
        assert_eq!(set.ids().len(), 1);
    }
}
