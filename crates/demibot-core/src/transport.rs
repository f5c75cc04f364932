//! Transport abstraction.
//!
//! The wire protocol (framing, registration handshake, keep-alive) is an
//! external concern. demibot only consumes two interfaces:
//!
//! | Trait | Implemented by | Called by |
//! |---|---|---|
//! | [`Transport`] | the protocol library | the client, to send and join |
//! | [`ConnectionHandler`] | the client | the protocol library, for inbound events |
//!
//! Implementations must preserve send order per target: chunks of one reply are
//! sent with successive `send` calls and must arrive in that order.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportResult;
use crate::identity::Identity;

/// Outbound side of a connection.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Establishes the connection and registers `identity` with the server.
    async fn connect(&self, identity: &Identity) -> TransportResult<()>;

    /// Joins a channel.
    async fn join(&self, channel: &str) -> TransportResult<()>;

    /// Sends one line of text to a user or channel.
    async fn send(&self, target: &str, text: &str) -> TransportResult<()>;

    /// Requests a nickname change (used to resubmit after a collision).
    async fn set_nick(&self, nickname: &str) -> TransportResult<()>;
}

/// A shared transport trait object.
pub type BoxedTransport = Arc<dyn Transport>;

/// Inbound side of a connection.
///
/// The protocol library calls these from a single control flow, one event at a
/// time. Implementations must return quickly; slow work is expected to be
/// offloaded.
#[async_trait]
pub trait ConnectionHandler: Send + Sync {
    /// The connection has been established.
    async fn on_connected(&self);

    /// Registration finished; the client may now join channels.
    async fn on_signed_on(&self);

    /// The connection was lost or closed.
    async fn on_disconnected(&self, reason: &str);

    /// A message from `user` (a `nick!user@host` mask) to `target`.
    async fn on_message(&self, user: &str, target: &str, text: &str);

    /// A notice from `user` to `target`.
    async fn on_notice(&self, user: &str, target: &str, text: &str);

    /// An action (`/me`) from `user` to `target`.
    async fn on_action(&self, user: &str, target: &str, text: &str);

    /// The server rejected the current nickname because it is in use.
    async fn on_nickname_collision(&self);

    /// `old` is now known as `new`.
    async fn on_nick_changed(&self, old: &str, new: &str);
}
