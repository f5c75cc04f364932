use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::handler::BoxedHandler;
use crate::router::CommandMatching;
use demibot_core::EventKind;

// ─── ModuleMetadata ───────────────────────────────────────────────────────────

/// Descriptive metadata attached to every module.
///
/// Populated by [`define_module!`](crate::define_module); `version` defaults
/// to the defining crate's `CARGO_PKG_VERSION`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleMetadata {
    /// Semver version string of the module.
    pub version: &'static str,
    /// One-line description shown in logs.
    pub desc: &'static str,
}

impl Default for ModuleMetadata {
    fn default() -> Self {
        Self {
            version: "0.0.0",
            desc: "",
        }
    }
}

// ─── PluginModule ─────────────────────────────────────────────────────────────

/// A loaded plugin module: a fixed command table, a fixed event table and the
/// module's config section.
///
/// Modules are immutable once built. Reloading a module builds a new instance
/// and swaps it into the [`PluginRegistry`](super::PluginRegistry); tasks that
/// already hold the old `Arc<PluginModule>` finish against it.
pub struct PluginModule {
    name: Cow<'static, str>,
    commands: BTreeMap<String, BoxedHandler>,
    events: BTreeMap<EventKind, Vec<BoxedHandler>>,
    config: Arc<Value>,
    metadata: ModuleMetadata,
}

impl PluginModule {
    /// Starts building a module.
    pub fn builder(name: impl Into<Cow<'static, str>>) -> PluginModuleBuilder {
        PluginModuleBuilder {
            module: PluginModule {
                name: name.into(),
                commands: BTreeMap::new(),
                events: BTreeMap::new(),
                config: Arc::new(Value::Object(Map::default())),
                metadata: ModuleMetadata::default(),
            },
        }
    }

    /// Module name (registry key).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Module metadata.
    pub fn metadata(&self) -> &ModuleMetadata {
        &self.metadata
    }

    /// The module's config section (an empty object when none was configured).
    pub fn config(&self) -> &Arc<Value> {
        &self.config
    }

    /// Names of all commands this module defines, sorted.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands.keys().map(String::as_str)
    }

    /// Commands answering to `typed` under the given matching mode.
    ///
    /// Exact matching yields at most one entry; case-insensitive matching can
    /// yield several when a module registers names differing only in case.
    pub fn commands_matching<'a>(
        &'a self,
        typed: &str,
        matching: CommandMatching,
    ) -> Vec<(&'a str, &'a BoxedHandler)> {
        match matching {
            CommandMatching::Exact => self
                .commands
                .get_key_value(typed)
                .map(|(name, handler)| (name.as_str(), handler))
                .into_iter()
                .collect(),
            CommandMatching::CaseInsensitive => self
                .commands
                .iter()
                .filter(|(name, _)| matching.matches(name, typed))
                .map(|(name, handler)| (name.as_str(), handler))
                .collect(),
        }
    }

    /// Every handler registered for `kind`, in registration order.
    pub fn handlers_for(&self, kind: EventKind) -> &[BoxedHandler] {
        self.events.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Binds the module to its config section and descriptor metadata.
    pub(crate) fn bind(mut self, config: Arc<Value>, metadata: ModuleMetadata) -> Self {
        self.config = config;
        self.metadata = metadata;
        self
    }
}

impl std::fmt::Debug for PluginModule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginModule")
            .field("name", &self.name)
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field("metadata", &self.metadata)
            .finish()
    }
}

// ─── PluginModuleBuilder ─────────────────────────────────────────────────────

/// Builder for [`PluginModule`].
///
/// ```rust,ignore
/// let module = PluginModule::builder("greet")
///     .command("hello", handler(hello))
///     .on(EventKind::Message, handler(log_message))
///     .build();
/// ```
pub struct PluginModuleBuilder {
    module: PluginModule,
}

impl PluginModuleBuilder {
    /// Registers a command. A later registration under the same name replaces
    /// the earlier one.
    pub fn command(mut self, name: impl Into<String>, handler: BoxedHandler) -> Self {
        self.module.commands.insert(name.into(), handler);
        self
    }

    /// Adds a handler for an event kind. Several handlers per kind are allowed.
    pub fn on(mut self, kind: EventKind, handler: BoxedHandler) -> Self {
        self.module.events.entry(kind).or_default().push(handler);
        self
    }

    /// Sets the module's config section.
    pub fn config(mut self, config: Arc<Value>) -> Self {
        self.module.config = config;
        self
    }

    /// Sets the module's metadata.
    pub fn metadata(mut self, metadata: ModuleMetadata) -> Self {
        self.module.metadata = metadata;
        self
    }

    /// Finishes the module.
    pub fn build(self) -> PluginModule {
        self.module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::HandlerContext;
    use crate::handler::handler;
    use tower::BoxError;

    fn noop() -> BoxedHandler {
        handler(|_ctx: HandlerContext| async { Ok::<_, BoxError>(()) })
    }

    #[test]
    fn test_exact_command_lookup() {
        let module = PluginModule::builder("m")
            .command("foo", noop())
            .command("Foo", noop())
            .build();

        let hits: Vec<&str> = module
            .commands_matching("foo", CommandMatching::Exact)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(hits, vec!["foo"]);
        assert!(module.commands_matching("FOO", CommandMatching::Exact).is_empty());
    }

    #[test]
    fn test_case_insensitive_command_lookup() {
        let module = PluginModule::builder("m")
            .command("Foo", noop())
            .command("bar", noop())
            .build();

        let hits: Vec<&str> = module
            .commands_matching("FOO", CommandMatching::CaseInsensitive)
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(hits, vec!["Foo"]);
    }

    #[test]
    fn test_event_handlers_accumulate() {
        let module = PluginModule::builder("m")
            .on(EventKind::Message, noop())
            .on(EventKind::Message, noop())
            .on(EventKind::Notice, noop())
            .build();

        assert_eq!(module.handlers_for(EventKind::Message).len(), 2);
        assert_eq!(module.handlers_for(EventKind::Notice).len(), 1);
        assert!(module.handlers_for(EventKind::Action).is_empty());
    }
}
