//! Group Registry
//!
//! Name -> group lookup shared by the peer server and application code.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::group::{Getter, Group, GroupOptions};

// == Group Registry ==
/// Registry of named groups.
///
/// There is no implicit global instance: the process entry point creates one
/// and hands it to the peer router. Creating a group under a name that is
/// already taken replaces the previous group.
#[derive(Debug, Default)]
pub struct GroupRegistry {
    groups: RwLock<HashMap<String, Arc<Group>>>,
}

impl GroupRegistry {
    // == Constructors ==
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // == Create Group ==
    /// Creates and registers a group with default options.
    pub fn create_group<G>(&self, name: &str, cache_bytes: i64, getter: G) -> Arc<Group>
    where
        G: Getter + 'static,
    {
        self.create_group_with_options(name, cache_bytes, getter, GroupOptions::default())
    }

    /// Creates and registers a group.
    pub fn create_group_with_options<G>(
        &self,
        name: &str,
        cache_bytes: i64,
        getter: G,
        options: GroupOptions,
    ) -> Arc<Group>
    where
        G: Getter + 'static,
    {
        let group = Arc::new(Group::new(name, cache_bytes, Arc::new(getter), options));
        let previous = self
            .groups
            .write()
            .insert(name.to_string(), group.clone());

        if previous.is_some() {
            info!(group = name, "replaced existing group");
        } else {
            info!(group = name, cache_bytes, "created group");
        }
        group
    }

    // == Get Group ==
    /// Looks up a group by name.
    pub fn get_group(&self, name: &str) -> Option<Arc<Group>> {
        self.groups.read().get(name).cloned()
    }

    /// Names of all registered groups, sorted.
    pub fn group_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.groups.read().keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo(key: &str) -> anyhow::Result<Vec<u8>> {
        Ok(key.as_bytes().to_vec())
    }

    #[test]
    fn test_create_and_lookup() {
        let registry = GroupRegistry::new();
        let group = registry.create_group("scores", 2048, echo);

        let found = registry.get_group("scores").unwrap();
        assert!(Arc::ptr_eq(&group, &found));
        assert!(registry.get_group("missing").is_none());
    }

    #[test]
    fn test_same_name_replaces() {
        let registry = GroupRegistry::new();
        let first = registry.create_group("scores", 2048, echo);
        let second = registry.create_group("scores", 4096, echo);

        let found = registry.get_group("scores").unwrap();
        assert!(Arc::ptr_eq(&second, &found));
        assert!(!Arc::ptr_eq(&first, &found));
        assert_eq!(registry.group_names(), vec!["scores"]);
    }

    #[test]
    fn test_registries_are_independent() {
        let first = GroupRegistry::new();
        let second = GroupRegistry::new();
        first.create_group("scores", 0, echo);

        assert!(first.get_group("scores").is_some());
        assert!(second.get_group("scores").is_none());
        assert!(second.group_names().is_empty());
    }
}
