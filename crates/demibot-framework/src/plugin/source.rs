//! Where modules come from.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::core::PluginModule;
use super::descriptor::ModuleDescriptor;
use crate::error::{LoadError, LoadResult};

/// A provider of plugin modules.
///
/// Rehash asks the source which modules should currently be loaded, drops the
/// rest from the registry, then loads every available module afresh.
pub trait ModuleSource: Send + Sync {
    /// Names of the modules that should be loaded, in load order.
    fn available(&self) -> LoadResult<Vec<String>>;

    /// Builds a fresh instance of `name` bound to `config`.
    fn load(&self, name: &str, config: Arc<Value>) -> LoadResult<PluginModule>;

    /// Applies the configured enabled list (`None` means everything).
    /// Sources without a notion of enabling ignore it.
    fn configure(&self, _enabled: Option<&[String]>) {}
}

/// The built-in [`ModuleSource`]: a set of statically linked descriptors,
/// optionally narrowed to an enabled list.
///
/// ```rust,ignore
/// let catalog = ModuleCatalog::new().with(&GREET).with(&TOOLS);
/// catalog.set_enabled(Some(vec!["greet".into()]));
/// ```
#[derive(Default)]
pub struct ModuleCatalog {
    descriptors: RwLock<BTreeMap<&'static str, ModuleDescriptor>>,
    enabled: RwLock<Option<BTreeSet<String>>>,
}

impl ModuleCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a descriptor, builder style.
    pub fn with(self, descriptor: &ModuleDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    /// Adds a descriptor. A descriptor with the same name is replaced.
    pub fn register(&self, descriptor: &ModuleDescriptor) {
        self.descriptors.write().insert(descriptor.name, *descriptor);
    }

    /// Removes a descriptor. Returns `true` if it was present.
    pub fn unregister(&self, name: &str) -> bool {
        self.descriptors.write().remove(name).is_some()
    }

    /// Restricts [`available`](ModuleSource::available) to the given names.
    /// `None` makes every registered module available.
    pub fn set_enabled(&self, enabled: Option<Vec<String>>) {
        *self.enabled.write() = enabled.map(|names| names.into_iter().collect());
    }

    /// Names of every registered descriptor, enabled or not.
    pub fn registered(&self) -> Vec<&'static str> {
        self.descriptors.read().keys().copied().collect()
    }
}

impl ModuleSource for ModuleCatalog {
    fn available(&self) -> LoadResult<Vec<String>> {
        let descriptors = self.descriptors.read();
        match self.enabled.read().as_ref() {
            None => Ok(descriptors.keys().map(|name| name.to_string()).collect()),
            Some(enabled) => {
                let unknown = enabled
                    .iter()
                    .find(|name| !descriptors.contains_key(name.as_str()));
                if let Some(name) = unknown {
                    return Err(LoadError::NotFound(name.clone()));
                }
                Ok(enabled.iter().cloned().collect())
            }
        }
    }

    fn load(&self, name: &str, config: Arc<Value>) -> LoadResult<PluginModule> {
        let descriptor = self
            .descriptors
            .read()
            .get(name)
            .copied()
            .ok_or_else(|| LoadError::NotFound(name.to_string()))?;
        descriptor.instantiate(config)
    }

    fn configure(&self, enabled: Option<&[String]>) {
        self.set_enabled(enabled.map(<[String]>::to_vec));
    }
}

impl std::fmt::Debug for ModuleCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleCatalog")
            .field("registered", &self.registered())
            .field("enabled", &*self.enabled.read())
            .finish()
    }
}
