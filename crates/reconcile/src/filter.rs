//! Kind filters resolved from selector strings

use crate::descriptor::{Descriptor, Registry};
use crate::error::{Error, Result};
use crate::identity::{KindId, ObjectId};
use crate::selector::append_csv_non_empty;

/// Which instances of a kind a filter selects
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterType {
    /// Every instance of the kind
    All,
    /// Only the named instances
    Named(Vec<String>),
}

/// A kind restriction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub filter_type: FilterType,
    pub descriptor: Descriptor,
}

impl Filter {
    pub fn all(descriptor: Descriptor) -> Self {
        Self {
            filter_type: FilterType::All,
            descriptor,
        }
    }

    pub fn named(descriptor: Descriptor, names: Vec<String>) -> Self {
        Self {
            filter_type: FilterType::Named(names),
            descriptor,
        }
    }

    pub fn kind(&self) -> &KindId {
        &self.descriptor.kind
    }

    /// Whether the object identity is selected by this filter
    pub fn matches(&self, id: &ObjectId) -> bool {
        if id.kind != self.descriptor.kind {
            return false;
        }
        match &self.filter_type {
            FilterType::All => true,
            FilterType::Named(names) => names.iter().any(|n| *n == id.name),
        }
    }
}

/// Ordered filter list; empty means "no kind restriction"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters(Vec<Filter>);

impl Filters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve generic selectors (`<alias>` or `<alias>/<name>,<name>`).
    ///
    /// Selectors for the same kind are merged: `All` absorbs any name list,
    /// name lists are concatenated without duplicates.
    pub fn parse<S: AsRef<str>>(selectors: &[S], registry: &Registry) -> Result<Self> {
        let mut filters = Self::new();

        for selector in selectors {
            let selector = selector.as_ref().trim();
            if selector.is_empty() {
                continue;
            }

            let (alias, names) = match selector.split_once('/') {
                Some((alias, csv)) => {
                    let mut names = Vec::new();
                    append_csv_non_empty(&mut names, csv);
                    (alias, Some(names))
                }
                None => (selector, None),
            };

            let descriptor = registry
                .lookup(alias)
                .ok_or_else(|| Error::UnknownSelector(selector.to_string()))?;
            if descriptor.is_synthetic() {
                return Err(Error::UnknownSelector(format!(
                    "{selector} (not served by the generic object API)"
                )));
            }

            let filter = match names {
                Some(names) if !names.is_empty() => Filter::named(descriptor.clone(), names),
                _ => Filter::all(descriptor.clone()),
            };
            filters.push(filter);
        }

        Ok(filters)
    }

    /// Add a filter, merging with an existing filter of the same kind
    pub fn push(&mut self, filter: Filter) {
        let Some(existing) = self.0.iter_mut().find(|f| f.kind() == filter.kind()) else {
            self.0.push(filter);
            return;
        };

        match filter.filter_type {
            FilterType::All => existing.filter_type = FilterType::All,
            FilterType::Named(more) => {
                if let FilterType::Named(have) = &mut existing.filter_type {
                    for name in more {
                        if !have.contains(&name) {
                            have.push(name);
                        }
                    }
                }
            }
        }
    }

    /// Match-all filters for every generic kind in the registry
    pub fn all_kinds(registry: &Registry) -> Self {
        Self(registry.generic().cloned().map(Filter::all).collect())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Filter> {
        self.0.iter()
    }

    /// Whether an object passes the filters (always true when empty)
    pub fn matches(&self, id: &ObjectId) -> bool {
        self.0.is_empty() || self.0.iter().any(|f| f.matches(id))
    }
}

impl From<Vec<Filter>> for Filters {
    fn from(filters: Vec<Filter>) -> Self {
        let mut out = Self::new();
        for filter in filters {
            out.push(filter);
        }
        out
    }
}

impl<'a> IntoIterator for &'a Filters {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::append_synthetic_descriptors;
    use crate::testutil::{dashboards_descriptor, folders_descriptor};

    fn registry() -> Registry {
        Registry::new(append_synthetic_descriptors(&[
            dashboards_descriptor(),
            folders_descriptor(),
        ]))
    }

    #[test]
    fn test_parse_all_and_named() {
        let filters = Filters::parse(&["dashboards", "folders/a, b"], &registry()).unwrap();
        assert_eq!(filters.len(), 2);

        let mut iter = filters.iter();
        assert_eq!(iter.next().unwrap().filter_type, FilterType::All);
        assert_eq!(
            iter.next().unwrap().filter_type,
            FilterType::Named(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_parse_unknown_selector() {
        let err = Filters::parse(&["playlists"], &registry()).unwrap_err();
        assert!(matches!(err, Error::UnknownSelector(s) if s == "playlists"));
    }

    #[test]
    fn test_parse_rejects_synthetic_kind() {
        let err = Filters::parse(&["alerts"], &registry()).unwrap_err();
        assert!(matches!(err, Error::UnknownSelector(_)));
    }

    #[test]
    fn test_merge_same_kind() {
        let filters =
            Filters::parse(&["dashboard/a", "dashboards/b,a", "folders/x"], &registry()).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters.iter().next().unwrap().filter_type,
            FilterType::Named(vec!["a".into(), "b".into()])
        );

        let filters = Filters::parse(&["dashboards/a", "dashboards"], &registry()).unwrap();
        assert_eq!(filters.iter().next().unwrap().filter_type, FilterType::All);
    }

    #[test]
    fn test_empty_name_list_means_all() {
        let filters = Filters::parse(&["dashboards/"], &registry()).unwrap();
        assert_eq!(filters.iter().next().unwrap().filter_type, FilterType::All);
    }

    #[test]
    fn test_matches() {
        let filters = Filters::parse(&["dashboards/a"], &registry()).unwrap();
        let kind = dashboards_descriptor().kind;
        assert!(filters.matches(&ObjectId::new(kind.clone(), "a")));
        assert!(!filters.matches(&ObjectId::new(kind, "b")));
        assert!(!filters.matches(&ObjectId::new(folders_descriptor().kind, "a")));
        assert!(Filters::new().matches(&ObjectId::new(folders_descriptor().kind, "a")));
    }

    #[test]
    fn test_all_kinds_excludes_synthetic() {
        let filters = Filters::all_kinds(&registry());
        let plurals: Vec<_> = filters.iter().map(|f| f.descriptor.plural.as_str()).collect();
        assert_eq!(plurals, vec!["dashboards", "folders"]);
    }
}
