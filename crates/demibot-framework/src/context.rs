//! Invocation and handler context.
//!
//! - [`Invocation`]: what triggered a dispatch: the user, the reply target and
//!   either a command (name + argument string) or an event kind (+ text). One
//!   `Arc<Invocation>` is shared by every handler of the same dispatch.
//!
//! - [`HandlerContext`]: what one handler receives: the shared invocation,
//!   its own module's config section, and an [`Outbox`] for sending replies.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use demibot_core::{EventKind, TransportResult, nick_of};

// =============================================================================
// Outbox
// =============================================================================

/// Where handler replies go.
///
/// Implemented by the runtime on top of the live session: `say` wraps the text
/// into protocol-safe chunks and sends them in order.
#[async_trait]
pub trait Outbox: Send + Sync {
    /// The client's current nickname.
    fn nickname(&self) -> String;

    /// Sends `text` to `target`, splitting it as needed.
    async fn say(&self, target: &str, text: &str) -> TransportResult<()>;
}

// =============================================================================
// Invocation
// =============================================================================

/// What caused a handler to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A command addressed to the client.
    Command {
        /// Command name, exactly as typed (prefix stripped).
        name: String,
    },
    /// A broadcast event.
    Event(EventKind),
}

/// One parsed inbound command or event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// The issuing user, usually a `nick!user@host` mask.
    pub user: String,
    /// Where replies go: the user for private messages, the channel otherwise.
    pub target: String,
    /// Argument string for commands, message text for events.
    pub text: String,
    /// The command or event that triggered the dispatch.
    pub trigger: Trigger,
}

impl Invocation {
    /// Creates a command invocation.
    pub fn command(
        user: impl Into<String>,
        target: impl Into<String>,
        name: impl Into<String>,
        args: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            target: target.into(),
            text: args.into(),
            trigger: Trigger::Command { name: name.into() },
        }
    }

    /// Creates an event invocation.
    pub fn event(
        kind: EventKind,
        user: impl Into<String>,
        target: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            target: target.into(),
            text: text.into(),
            trigger: Trigger::Event(kind),
        }
    }

    /// The issuing user's nickname.
    pub fn nick(&self) -> &str {
        nick_of(&self.user)
    }
}

// =============================================================================
// HandlerContext
// =============================================================================

/// The context handed to a single handler invocation.
///
/// Cheap to clone; all fields are shared.
///
/// # Example
///
/// ```rust,ignore
/// async fn greet(ctx: HandlerContext) -> Result<String, BoxError> {
///     Ok(format!("{}, hello!", ctx.nick()))
/// }
/// ```
#[derive(Clone)]
pub struct HandlerContext {
    module: Arc<str>,
    config: Arc<Value>,
    invocation: Arc<Invocation>,
    outbox: Arc<dyn Outbox>,
}

impl HandlerContext {
    /// Creates a new context.
    pub fn new(
        module: Arc<str>,
        config: Arc<Value>,
        invocation: Arc<Invocation>,
        outbox: Arc<dyn Outbox>,
    ) -> Self {
        Self {
            module,
            config,
            invocation,
            outbox,
        }
    }

    /// Name of the module this handler belongs to.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The invocation that triggered this handler.
    pub fn invocation(&self) -> &Invocation {
        &self.invocation
    }

    /// The issuing user, as received.
    pub fn user(&self) -> &str {
        &self.invocation.user
    }

    /// The issuing user's nickname.
    pub fn nick(&self) -> &str {
        self.invocation.nick()
    }

    /// The reply target.
    pub fn target(&self) -> &str {
        &self.invocation.target
    }

    /// Argument string (commands) or message text (events).
    pub fn text(&self) -> &str {
        &self.invocation.text
    }

    /// The client's current nickname.
    pub fn bot_nickname(&self) -> String {
        self.outbox.nickname()
    }

    /// The raw config section of this handler's module.
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Deserialises the module's config section into `T`.
    ///
    /// Use `#[serde(default)]` on `T` to tolerate a missing section.
    pub fn get_config<T>(&self) -> serde_json::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        T::deserialize(self.config.as_ref())
    }

    /// Sends `text` to an arbitrary target.
    pub async fn say(&self, target: &str, text: &str) -> TransportResult<()> {
        self.outbox.say(target, text).await
    }

    /// Sends `text` to the reply target of this invocation.
    pub async fn reply(&self, text: &str) -> TransportResult<()> {
        self.outbox.say(&self.invocation.target, text).await
    }

    pub(crate) fn outbox(&self) -> Arc<dyn Outbox> {
        Arc::clone(&self.outbox)
    }
}

impl std::fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerContext")
            .field("module", &self.module)
            .field("invocation", &self.invocation)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Outbox recording every `say` call.
    #[derive(Default)]
    pub(crate) struct RecordingOutbox {
        pub(crate) sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl Outbox for RecordingOutbox {
        fn nickname(&self) -> String {
            "demibot".to_string()
        }

        async fn say(&self, target: &str, text: &str) -> TransportResult<()> {
            self.sent.lock().push((target.to_string(), text.to_string()));
            Ok(())
        }
    }

    #[derive(serde::Deserialize, Default, Debug, PartialEq)]
    #[serde(default)]
    struct GreetConfig {
        greeting: String,
    }

    #[tokio::test]
    async fn test_reply_goes_to_invocation_target() {
        let outbox = Arc::new(RecordingOutbox::default());
        let ctx = HandlerContext::new(
            Arc::from("greet"),
            Arc::new(serde_json::json!({ "greeting": "hi" })),
            Arc::new(Invocation::command("alice!a@host", "#x", "greet", "")),
            outbox.clone(),
        );

        assert_eq!(ctx.nick(), "alice");
        assert_eq!(
            ctx.get_config::<GreetConfig>().unwrap().greeting,
            "hi".to_string()
        );
        ctx.reply("hello").await.unwrap();
        assert_eq!(
            outbox.sent.lock().as_slice(),
            &[("#x".to_string(), "hello".to_string())]
        );
    }
}
