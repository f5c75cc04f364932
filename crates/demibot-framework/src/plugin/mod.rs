//! Plugin system.
//!
//! # Architecture
//!
//! A plugin module is a named, immutable bundle of:
//!
//! - a **command table**: command name → handler, at most one handler per name;
//! - an **event table**: event kind → ordered list of handlers;
//! - its **config section** (`[plugins.settings.<name>]`).
//!
//! A [`ModuleDescriptor`] is the static, `Copy` handle to a module: a name,
//! metadata and a factory function pointer. Descriptors are collected in a
//! [`ModuleCatalog`], which is the default [`ModuleSource`]. The
//! [`PluginRegistry`] holds the live modules and swaps them one at a time on
//! reload.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use demibot::prelude::*;
//!
//! async fn hello(ctx: HandlerContext) -> Result<String, BoxError> {
//!     Ok(format!("{}, hello!", ctx.nick()))
//! }
//!
//! async fn count(ctx: HandlerContext) -> Result<(), BoxError> {
//!     tracing::debug!(text = ctx.text(), "saw a message");
//!     Ok(())
//! }
//!
//! pub static GREET: ModuleDescriptor = define_module! {
//!     name: "greet",
//!     desc: "Says hello",
//!     commands: { "hello" => handler(hello) },
//!     events: { Message => handler(count) },
//! };
//! ```

pub mod core;
pub mod descriptor;
pub mod macros;
pub mod registry;
pub mod source;

pub use core::{ModuleMetadata, PluginModule, PluginModuleBuilder};
pub use descriptor::{ModuleDescriptor, ModuleFactory, ModuleLoadContext};
pub use registry::PluginRegistry;
pub use source::{ModuleCatalog, ModuleSource};
