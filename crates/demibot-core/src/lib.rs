//! # demibot Core
//!
//! Foundation types for the demibot dispatch engine.
//!
//! This crate holds the pieces every other layer agrees on:
//!
//! - **Transport**: the abstract outbound interface ([`Transport`]) and the
//!   inbound callback interface ([`ConnectionHandler`]). The wire protocol
//!   itself lives outside this workspace.
//! - **Identity**: nickname/username/realname and hostmask helpers.
//! - **Events**: the [`EventKind`]s plugins can subscribe to.
//! - **Chat log**: the minimal append-only log interface ([`ChatLogBackend`])
//!   plus a plain file implementation.
//!
//! ```text
//! ┌────────────┐  callbacks   ┌────────────┐  send/join  ┌────────────┐
//! │ Transport  │─────────────▶│   Client   │────────────▶│ Transport  │
//! │ (external) │              │ (runtime)  │             │ (external) │
//! └────────────┘              └────────────┘             └────────────┘
//! ```

pub mod chatlog;
pub mod error;
pub mod event;
pub mod identity;
pub mod transport;

pub use chatlog::{ChatLogBackend, ChatLogWriter, FileChatLog, timestamp};
pub use error::{ChatLogError, ChatLogResult, TransportError, TransportResult};
pub use event::EventKind;
pub use identity::{Identity, nick_of, strip_mention};
pub use transport::{BoxedTransport, ConnectionHandler, Transport};
