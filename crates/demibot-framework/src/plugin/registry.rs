//! The live module registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::core::PluginModule;
use super::source::ModuleSource;
use crate::error::LoadResult;

/// Name → module map shared by the dispatcher and rehash.
///
/// Each entry is an `Arc<PluginModule>`. Replacing an entry is a single swap
/// under the write lock, so a dispatch sees either the old or the new module,
/// never a mix; tasks already running keep their own `Arc` to the old one.
#[derive(Default)]
pub struct PluginRegistry {
    modules: RwLock<BTreeMap<String, Arc<PluginModule>>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a module, returning the previous one.
    pub fn insert(&self, module: PluginModule) -> Option<Arc<PluginModule>> {
        let name = module.name().to_string();
        self.modules.write().insert(name, Arc::new(module))
    }

    /// Removes a module.
    pub fn remove(&self, name: &str) -> Option<Arc<PluginModule>> {
        self.modules.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<PluginModule>> {
        self.modules.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.read().contains_key(name)
    }

    /// Names of the loaded modules, sorted.
    pub fn names(&self) -> Vec<String> {
        self.modules.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.modules.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.read().is_empty()
    }

    /// Every loaded module, in name order.
    ///
    /// A dispatch works off one snapshot; a concurrent reload does not affect it.
    pub fn snapshot(&self) -> Vec<Arc<PluginModule>> {
        self.modules.read().values().cloned().collect()
    }

    /// Drops every module whose name is not in `available`.
    ///
    /// Returns the names that were dropped.
    pub fn retain_available(&self, available: &[String]) -> Vec<String> {
        let mut modules = self.modules.write();
        let removed: Vec<String> = modules
            .keys()
            .filter(|name| !available.contains(name))
            .cloned()
            .collect();
        for name in &removed {
            modules.remove(name);
            info!(module = %name, "Unloaded module");
        }
        removed
    }

    /// Loads every available module from `source` and swaps each one in.
    ///
    /// `settings` maps module names to config sections; modules without one
    /// get an empty object. Stops at the first failure, leaving the modules
    /// already swapped in place. Returns the names loaded.
    pub fn reload_from(
        &self,
        source: &dyn ModuleSource,
        settings: &HashMap<String, Value>,
    ) -> LoadResult<Vec<String>> {
        let names = source.available()?;
        for name in &names {
            let config = settings
                .get(name)
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            let module = source.load(name, Arc::new(config))?;
            let version = module.metadata().version;
            match self.insert(module) {
                Some(_) => info!(module = %name, version, "Reloaded module"),
                None => info!(module = %name, version, "Loaded module"),
            }
        }
        debug!(count = names.len(), "Module reload finished");
        Ok(names)
    }
}

impl std::fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("modules", &self.names())
            .finish()
    }
}
