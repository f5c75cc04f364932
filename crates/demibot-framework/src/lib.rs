//! # demibot Framework
//!
//! The dispatch half of demibot: everything between "a line of text arrived"
//! and "a handler's reply went out".
//!
//! This layer provides:
//! - The plugin system: immutable [`PluginModule`]s held in a hot-swappable
//!   [`PluginRegistry`], loaded from a [`ModuleSource`]
//! - Handlers as boxed tower services ([`BoxedHandler`]), built from async or
//!   blocking functions
//! - Command line parsing ([`CommandLine`]) and the [`Dispatcher`] that fans a
//!   command or event out to every matching handler
//! - The [`Executor`], which runs every handler as its own task and isolates
//!   failures
//! - The [`ReplyFormatter`], which wraps long replies into protocol-safe chunks
//!
//! ```text
//!                 ┌──────────────┐  one task per handler  ┌──────────────┐
//! Invocation ───▶ │  Dispatcher  │───────────────────────▶│   Executor   │──▶ Outbox
//!                 └──────┬───────┘                        └──────────────┘
//!                        │ snapshot
//!                 ┌──────▼───────┐
//!                 │PluginRegistry│◀── atomic per-module swap (rehash)
//!                 └──────────────┘
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod executor;
pub mod handler;
pub mod plugin;
pub mod reply;
pub mod router;

pub use context::{HandlerContext, Invocation, Outbox, Trigger};
pub use dispatcher::Dispatcher;
pub use error::{LoadError, LoadResult, ParseError};
pub use executor::{Executor, HandlerTask, TaskOutcome, TaskReport};
pub use handler::{BoxedHandler, IntoReply, blocking, handler};
pub use plugin::{
    ModuleCatalog, ModuleDescriptor, ModuleLoadContext, ModuleMetadata, ModuleSource,
    PluginModule, PluginModuleBuilder, PluginRegistry,
};
pub use reply::ReplyFormatter;
pub use router::{CommandLine, CommandMatching};

/// Error type produced by failing handlers and module factories.
pub use tower::BoxError;

#[doc(hidden)]
pub use demibot_core::EventKind as __EventKind;
