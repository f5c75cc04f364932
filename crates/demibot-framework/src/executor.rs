//! Handler execution.
//!
//! Every handler invocation becomes its own tokio task. A handler that fails
//! or panics is logged and reported; its siblings and the session never notice.
//! A successful reply is sent through the invocation's [`Outbox`] to the
//! invocation's reply target.
//!
//! [`Outbox`]: crate::context::Outbox

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tower::ServiceExt;
use tracing::{Instrument, debug, debug_span, error, warn};

use crate::context::HandlerContext;
use crate::handler::BoxedHandler;
use crate::plugin::PluginModule;

/// One unit of work: a handler bound to its context.
pub struct HandlerTask {
    /// The module the handler came from. Held for the task's lifetime, so a
    /// module swapped out by a reload stays alive until its tasks finish.
    pub module: Arc<PluginModule>,
    /// Name used in logs and reports, e.g. `command_ping` or `handle_privmsg`.
    pub handler_name: String,
    pub handler: BoxedHandler,
    pub context: HandlerContext,
}

/// How a handler task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The handler returned normally.
    Completed {
        /// The reply it produced, if any.
        reply: Option<String>,
    },
    /// The handler returned an error or panicked.
    Failed {
        /// Rendered error or panic message.
        cause: String,
    },
}

/// Completion record delivered to the report channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub module: String,
    pub handler: String,
    pub outcome: TaskOutcome,
}

/// Runs handler tasks concurrently and tracks them.
#[derive(Clone, Default)]
pub struct Executor {
    tracker: TaskTracker,
    reports: Option<mpsc::UnboundedSender<TaskReport>>,
}

impl Executor {
    /// Creates an executor without a report channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor that sends a [`TaskReport`] for every finished task.
    pub fn with_reports() -> (Self, mpsc::UnboundedReceiver<TaskReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let executor = Self {
            tracker: TaskTracker::new(),
            reports: Some(tx),
        };
        (executor, rx)
    }

    /// Spawns `task`. Must be called from within a tokio runtime.
    pub fn submit(&self, task: HandlerTask) {
        let reports = self.reports.clone();
        self.tracker.spawn(run(task, reports));
    }

    /// Number of tasks still running.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }

    /// Waits until every task submitted so far has finished.
    pub async fn wait_idle(&self) {
        self.tracker.close();
        self.tracker.wait().await;
        self.tracker.reopen();
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("in_flight", &self.tracker.len())
            .field("reports", &self.reports.is_some())
            .finish()
    }
}

async fn run(task: HandlerTask, reports: Option<mpsc::UnboundedSender<TaskReport>>) {
    let HandlerTask {
        module,
        handler_name,
        handler,
        context,
    } = task;

    let span = debug_span!("handler", module = module.name(), handler = %handler_name);
    let outcome = execute(handler, context).instrument(span).await;

    if let Some(reports) = reports {
        // A dropped receiver only means nobody is listening any more.
        let _ = reports.send(TaskReport {
            module: module.name().to_string(),
            handler: handler_name,
            outcome,
        });
    }
}

async fn execute(handler: BoxedHandler, context: HandlerContext) -> TaskOutcome {
    let outbox = context.outbox();
    let target = context.target().to_string();

    match AssertUnwindSafe(handler.oneshot(context)).catch_unwind().await {
        Ok(Ok(reply)) => {
            debug!(has_reply = reply.is_some(), "Handler completed");
            if let Some(text) = &reply
                && let Err(e) = outbox.say(&target, text).await
            {
                warn!(target = %target, error = %e, "Failed to send handler reply");
            }
            TaskOutcome::Completed { reply }
        }
        Ok(Err(e)) => {
            warn!(error = %e, "Handler failed");
            TaskOutcome::Failed {
                cause: e.to_string(),
            }
        }
        Err(panic) => {
            let message = panic_message(panic.as_ref());
            error!(panic = %message, "Handler panicked");
            TaskOutcome::Failed {
                cause: format!("panicked: {message}"),
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Invocation;
    use crate::context::tests::RecordingOutbox;
    use crate::handler::handler;
    use crate::BoxError;

    fn task(outbox: &Arc<RecordingOutbox>, name: &str, h: BoxedHandler) -> HandlerTask {
        let module = Arc::new(PluginModule::builder("m").build());
        HandlerTask {
            context: HandlerContext::new(
                Arc::from("m"),
                Arc::clone(module.config()),
                Arc::new(Invocation::command("alice!a@host", "#x", "foo", "")),
                outbox.clone(),
            ),
            module,
            handler_name: name.to_string(),
            handler: h,
        }
    }

    #[tokio::test]
    async fn test_failures_do_not_affect_siblings() {
        let outbox = Arc::new(RecordingOutbox::default());
        let (executor, mut reports) = Executor::with_reports();

        executor.submit(task(
            &outbox,
            "fails",
            handler(|_ctx: HandlerContext| async { Err::<(), BoxError>("nope".into()) }),
        ));
        executor.submit(task(
            &outbox,
            "panics",
            handler(|_ctx: HandlerContext| async {
                if true {
                    panic!("kaboom");
                }
                Ok::<(), BoxError>(())
            }),
        ));
        executor.submit(task(
            &outbox,
            "replies",
            handler(|ctx: HandlerContext| async move {
                Ok::<_, BoxError>(format!("{}, done", ctx.nick()))
            }),
        ));
        executor.wait_idle().await;

        let mut seen = Vec::new();
        while let Ok(report) = reports.try_recv() {
            seen.push(report);
        }
        seen.sort_by(|a, b| a.handler.cmp(&b.handler));

        assert_eq!(seen.len(), 3);
        assert_eq!(
            seen[0].outcome,
            TaskOutcome::Failed {
                cause: "nope".to_string()
            }
        );
        assert_eq!(
            seen[1].outcome,
            TaskOutcome::Failed {
                cause: "panicked: kaboom".to_string()
            }
        );
        assert_eq!(
            seen[2].outcome,
            TaskOutcome::Completed {
                reply: Some("alice, done".to_string())
            }
        );
        assert_eq!(
            outbox.sent.lock().as_slice(),
            &[("#x".to_string(), "alice, done".to_string())]
        );
        assert_eq!(executor.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_slow_handler_does_not_block_others() {
        let outbox = Arc::new(RecordingOutbox::default());
        let executor = Executor::new();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let release_rx = Arc::new(tokio::sync::Mutex::new(Some(release_rx)));

        executor.submit(task(
            &outbox,
            "slow",
            handler(move |_ctx: HandlerContext| {
                let release_rx = Arc::clone(&release_rx);
                async move {
                    if let Some(rx) = release_rx.lock().await.take() {
                        let _ = rx.await;
                    }
                    Ok::<_, BoxError>("slow")
                }
            }),
        ));
        executor.submit(task(
            &outbox,
            "fast",
            handler(|_ctx: HandlerContext| async { Ok::<_, BoxError>("fast") }),
        ));

        // The fast reply lands while the slow handler is still parked.
        for _ in 0..100 {
            if !outbox.sent.lock().is_empty() {
                break;
            }
            tokio::task::yield_now().await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(outbox.sent.lock()[0].1, "fast");

        release_tx.send(()).unwrap();
        executor.wait_idle().await;
        assert_eq!(outbox.sent.lock().len(), 2);
    }
}
