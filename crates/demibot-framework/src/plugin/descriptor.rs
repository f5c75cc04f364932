//! Module descriptor: the static, `Copy` handle to a module.

use std::sync::Arc;

use serde_json::Value;
use tower::BoxError;

use super::core::{ModuleMetadata, PluginModule};
use crate::error::{LoadError, LoadResult};

// ─── ModuleLoadContext ────────────────────────────────────────────────────────

/// Context passed to a module factory.
///
/// Carries the module's config section (`[plugins.settings.<name>]`, or an
/// empty object when the section is absent).
#[derive(Clone, Debug)]
pub struct ModuleLoadContext {
    name: &'static str,
    config: Arc<Value>,
}

impl ModuleLoadContext {
    pub(crate) fn new(name: &'static str, config: Arc<Value>) -> Self {
        Self { name, config }
    }

    /// Name of the module being loaded.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Deserialises the config section into `T`.
    pub fn get_config<T>(&self) -> serde_json::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        T::deserialize(self.config.as_ref())
    }
}

/// Factory building a live module.
pub type ModuleFactory = fn(&ModuleLoadContext) -> Result<PluginModule, BoxError>;

// ─── ModuleDescriptor ─────────────────────────────────────────────────────────

/// A static descriptor that identifies and instantiates a module.
///
/// Usually produced by [`define_module!`](crate::define_module) and stored in a
/// `static`, then registered with a [`ModuleCatalog`](super::ModuleCatalog).
#[derive(Debug, Clone, Copy)]
pub struct ModuleDescriptor {
    /// Module name (used in logs, as registry key and as config lookup key).
    pub name: &'static str,

    /// Factory function that builds the live [`PluginModule`].
    pub create: ModuleFactory,

    /// Static metadata snapshot.
    pub metadata: ModuleMetadata,
}

impl ModuleDescriptor {
    /// Builds a fresh module instance bound to `config`.
    ///
    /// The returned module always carries this descriptor's name and metadata,
    /// whatever the factory set.
    pub fn instantiate(&self, config: Arc<Value>) -> LoadResult<PluginModule> {
        let ctx = ModuleLoadContext::new(self.name, Arc::clone(&config));
        let module = (self.create)(&ctx).map_err(|source| LoadError::Init {
            module: self.name.to_string(),
            source,
        })?;
        if module.name() != self.name {
            return Err(LoadError::Init {
                module: self.name.to_string(),
                source: format!("factory built a module named '{}'", module.name()).into(),
            });
        }
        Ok(module.bind(config, self.metadata))
    }
}
