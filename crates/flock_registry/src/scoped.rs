//! Shared two-scope storage for named catalog entries.

use flock_core::Scope;
use flock_error::{FlockResult, RegistryError, RegistryErrorKind};
use std::collections::HashMap;
use std::sync::RwLock;

/// A catalog entry addressable by name and scope.
pub(crate) trait Named: Clone {
    fn entry_name(&self) -> &str;
    fn entry_scope(&self) -> Scope;
}

/// Two-scope map with shadowing resolution.
///
/// Locking note: the registries are read-mostly during query execution; DDL
/// and concurrent execution on the same name are externally synchronized.
pub(crate) struct Scoped<T> {
    inner: RwLock<Maps<T>>,
}

struct Maps<T> {
    local: HashMap<String, T>,
    global: HashMap<String, T>,
}

impl<T> Maps<T> {
    fn map_mut(&mut self, scope: Scope) -> &mut HashMap<String, T> {
        match scope {
            Scope::Local => &mut self.local,
            Scope::Global => &mut self.global,
        }
    }
}

impl<T: Named> Scoped<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Maps {
                local: HashMap::new(),
                global: HashMap::new(),
            }),
        }
    }

    /// Insert a new entry; a duplicate name in the same scope fails.
    pub fn create(&self, entry: T) -> FlockResult<()> {
        let mut maps = self.inner.write().expect("registry lock poisoned");
        let map = maps.map_mut(entry.entry_scope());
        if map.contains_key(entry.entry_name()) {
            return Err(RegistryError::new(RegistryErrorKind::DuplicateName(
                entry.entry_name().to_string(),
            )))?;
        }
        map.insert(entry.entry_name().to_string(), entry);
        Ok(())
    }

    /// Replace an existing entry, possibly moving it between scopes.
    pub fn update(&self, entry: T) -> FlockResult<()> {
        let mut maps = self.inner.write().expect("registry lock poisoned");
        let name = entry.entry_name().to_string();
        let existed = maps.local.remove(&name).is_some() || maps.global.remove(&name).is_some();
        if !existed {
            return Err(RegistryError::new(RegistryErrorKind::MissingEntry(name)))?;
        }
        maps.map_mut(entry.entry_scope()).insert(name, entry);
        Ok(())
    }

    /// Remove an entry by name; removing a missing name is a no-op.
    pub fn delete(&self, name: &str) {
        let mut maps = self.inner.write().expect("registry lock poisoned");
        if maps.local.remove(name).is_none() {
            maps.global.remove(name);
        }
    }

    /// Look up an entry; local scope shadows global.
    pub fn get(&self, name: &str) -> Option<T> {
        let maps = self.inner.read().expect("registry lock poisoned");
        maps.local.get(name).or_else(|| maps.global.get(name)).cloned()
    }

    /// All entries, local scope first, sorted by name within each scope.
    pub fn list(&self) -> Vec<T> {
        let maps = self.inner.read().expect("registry lock poisoned");
        let mut local: Vec<T> = maps.local.values().cloned().collect();
        let mut global: Vec<T> = maps.global.values().cloned().collect();
        local.sort_by(|a, b| a.entry_name().cmp(b.entry_name()));
        global.sort_by(|a, b| a.entry_name().cmp(b.entry_name()));
        local.extend(global);
        local
    }
}
