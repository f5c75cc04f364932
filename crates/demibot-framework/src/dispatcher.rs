//! Command and event fan-out.
//!
//! The [`Dispatcher`] turns one [`Invocation`] into one [`HandlerTask`] per
//! matching handler across every loaded module, and hands them all to the
//! [`Executor`]. There is no first-match-wins: if three modules define `foo`,
//! a `foo` command runs three handlers.
//!
//! Built-in commands are not routed here; the runtime answers them before a
//! command ever reaches the dispatcher.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Level, debug, span};

use crate::context::{HandlerContext, Invocation, Outbox, Trigger};
use crate::executor::{Executor, HandlerTask};
use crate::plugin::PluginRegistry;
use crate::router::CommandMatching;

/// Routes invocations to plugin handlers.
pub struct Dispatcher {
    registry: Arc<PluginRegistry>,
    executor: Executor,
    matching: RwLock<CommandMatching>,
}

impl Dispatcher {
    /// Creates a dispatcher over `registry`, running handlers on `executor`.
    pub fn new(registry: Arc<PluginRegistry>, executor: Executor) -> Self {
        Self {
            registry,
            executor,
            matching: RwLock::new(CommandMatching::default()),
        }
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    pub fn executor(&self) -> &Executor {
        &self.executor
    }

    /// Current command matching mode.
    pub fn matching(&self) -> CommandMatching {
        *self.matching.read()
    }

    /// Changes the command matching mode (takes effect on the next dispatch).
    pub fn set_matching(&self, matching: CommandMatching) {
        *self.matching.write() = matching;
    }

    /// Submits one task per handler matching `invocation`.
    ///
    /// Commands go to every module command answering to the typed name;
    /// events go to every handler registered for the kind. Returns the number
    /// of tasks submitted.
    pub fn dispatch(&self, outbox: &Arc<dyn Outbox>, invocation: Invocation) -> usize {
        let span = span!(Level::DEBUG, "dispatch", trigger = ?invocation.trigger);
        let _enter = span.enter();

        let invocation = Arc::new(invocation);
        let matching = self.matching();
        let mut submitted = 0;

        for module in self.registry.snapshot() {
            let module_name: Arc<str> = Arc::from(module.name());
            let handlers = match &invocation.trigger {
                Trigger::Command { name } => module
                    .commands_matching(name, matching)
                    .into_iter()
                    .map(|(registered, handler)| (format!("command_{registered}"), handler.clone()))
                    .collect::<Vec<_>>(),
                Trigger::Event(kind) => module
                    .handlers_for(*kind)
                    .iter()
                    .map(|handler| (format!("handle_{kind}"), handler.clone()))
                    .collect(),
            };

            for (handler_name, handler) in handlers {
                let context = HandlerContext::new(
                    Arc::clone(&module_name),
                    Arc::clone(module.config()),
                    Arc::clone(&invocation),
                    Arc::clone(outbox),
                );
                self.executor.submit(HandlerTask {
                    module: Arc::clone(&module),
                    handler_name,
                    handler,
                    context,
                });
                submitted += 1;
            }
        }

        debug!(submitted, "Dispatch finished");
        submitted
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .field("executor", &self.executor)
            .field("matching", &self.matching())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoxError;
    use crate::context::tests::RecordingOutbox;
    use crate::executor::TaskOutcome;
    use crate::handler::handler;
    use crate::plugin::PluginModule;
    use demibot_core::EventKind;

    fn named(reply: &'static str) -> crate::BoxedHandler {
        handler(move |_ctx: HandlerContext| async move { Ok::<_, BoxError>(reply) })
    }

    fn setup() -> (Dispatcher, Arc<dyn Outbox>, Arc<RecordingOutbox>) {
        let registry = Arc::new(PluginRegistry::new());
        let recording = Arc::new(RecordingOutbox::default());
        let outbox: Arc<dyn Outbox> = recording.clone();
        (Dispatcher::new(registry, Executor::new()), outbox, recording)
    }

    #[tokio::test]
    async fn test_command_runs_in_every_module() {
        let (dispatcher, outbox, recording) = setup();
        for (module, reply) in [("a", "from a"), ("b", "from b"), ("c", "from c")] {
            dispatcher.registry().insert(
                PluginModule::builder(module)
                    .command("foo", named(reply))
                    .build(),
            );
        }
        dispatcher
            .registry()
            .insert(PluginModule::builder("d").command("bar", named("bar")).build());

        let n = dispatcher.dispatch(&outbox, Invocation::command("alice", "#x", "foo", ""));
        assert_eq!(n, 3);

        dispatcher.executor().wait_idle().await;
        let mut replies: Vec<String> = recording.sent.lock().iter().map(|(_, t)| t.clone()).collect();
        replies.sort();
        assert_eq!(replies, vec!["from a", "from b", "from c"]);
    }

    #[tokio::test]
    async fn test_matching_mode_applies_to_commands() {
        let (dispatcher, outbox, _) = setup();
        dispatcher
            .registry()
            .insert(PluginModule::builder("a").command("Foo", named("x")).build());

        assert_eq!(
            dispatcher.dispatch(&outbox, Invocation::command("alice", "#x", "foo", "")),
            0
        );
        dispatcher.set_matching(CommandMatching::CaseInsensitive);
        assert_eq!(
            dispatcher.dispatch(&outbox, Invocation::command("alice", "#x", "foo", "")),
            1
        );
        dispatcher.executor().wait_idle().await;
    }

    #[tokio::test]
    async fn test_event_reaches_every_handler() {
        let registry = Arc::new(PluginRegistry::new());
        let (executor, mut reports) = Executor::with_reports();
        let dispatcher = Dispatcher::new(Arc::clone(&registry), executor);
        let outbox: Arc<dyn Outbox> = Arc::new(RecordingOutbox::default());

        registry.insert(
            PluginModule::builder("a")
                .on(EventKind::Message, named("a1"))
                .on(EventKind::Message, named("a2"))
                .build(),
        );
        registry.insert(
            PluginModule::builder("b")
                .on(EventKind::Message, named("b1"))
                .on(EventKind::Notice, named("notice"))
                .build(),
        );

        let n = dispatcher.dispatch(
            &outbox,
            Invocation::event(EventKind::Message, "alice", "#x", "hi all"),
        );
        assert_eq!(n, 3);
        dispatcher.executor().wait_idle().await;

        let mut handled = Vec::new();
        while let Ok(report) = reports.try_recv() {
            assert_eq!(report.handler, "handle_privmsg");
            if let TaskOutcome::Completed { reply: Some(r) } = report.outcome {
                handled.push(r);
            }
        }
        handled.sort();
        assert_eq!(handled, vec!["a1", "a2", "b1"]);
    }
}
