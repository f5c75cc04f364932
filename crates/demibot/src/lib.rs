//! # demibot
//!
//! A modular IRC bot engine: a connection's inbound messages are normalized,
//! parsed into commands, and fanned out to plugin handlers that each run in
//! their own task.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌────────────┐     ┌──────────────────────────────────────┐
//! │  Transport  │────▶│   Client   │────▶│ built-ins (inline)                   │
//! │ (external)  │     │ (session)  │     └──────────────────────────────────────┘
//! └─────────────┘     └─────┬──────┘     ┌──────────────────────────────────────┐
//!                           └───────────▶│ Dispatcher ──▶ one task per handler  │──▶ replies
//!                                        └──────────────────────────────────────┘
//! ```
//!
//! - **Transport**: the wire protocol, supplied by the embedding application
//! - **Client**: session state, addressing rules, built-in commands and rehash
//! - **Modules**: named groups of command and event handlers, hot-reloadable
//! - **Handlers**: async or blocking functions returning an optional reply
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use demibot::prelude::*;
//!
//! async fn hello(ctx: HandlerContext) -> Result<String, BoxError> {
//!     Ok(format!("{}, hello!", ctx.nick()))
//! }
//!
//! static GREET: ModuleDescriptor = define_module! {
//!     name: "greet",
//!     desc: "Says hello",
//!     commands: { "hello" => handler(hello) },
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config()?;
//!     let client = Client::builder(transport, config)
//!         .modules(ModuleCatalog::new().with(&GREET))
//!         .build()?;
//!     client.connect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config`: TOML configuration files (default)
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use demibot_core as core;
pub use demibot_framework as framework;
pub use demibot_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use demibot::prelude::*;
/// ```
pub mod prelude {
    // Client - main entry point
    pub use demibot_runtime::{
        BotConfig, Client, FileConfigSource, load_config, load_config_from_file,
    };

    // Module system
    pub use demibot_framework::{
        ModuleCatalog, ModuleDescriptor, ModuleLoadContext, ModuleSource, PluginModule,
        define_module,
    };

    // Handlers
    pub use demibot_framework::{BoxError, HandlerContext, blocking, handler};

    // Transport and events, for custom implementations
    pub use demibot_core::{
        BoxedTransport, ConnectionHandler, EventKind, Identity, Transport, TransportError,
        TransportResult,
    };
}
