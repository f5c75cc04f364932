//! Handlers as boxed tower services.
//!
//! Every command or event handler is stored as a [`BoxedHandler`]: a
//! cloneable, `Sync` tower service from [`HandlerContext`] to an optional reply.
//! Build one from an async function with [`handler`], or from plain blocking
//! code with [`blocking`] (which runs on tokio's blocking pool so it never
//! stalls the dispatch loop or other handlers).
//!
//! ```rust,ignore
//! use demibot_framework::{BoxError, HandlerContext, blocking, handler};
//!
//! async fn echo(ctx: HandlerContext) -> Result<String, BoxError> {
//!     Ok(ctx.text().to_string())
//! }
//!
//! fn slow_lookup(ctx: HandlerContext) -> Result<String, BoxError> {
//!     std::thread::sleep(std::time::Duration::from_secs(2));
//!     Ok(format!("{}: done", ctx.nick()))
//! }
//!
//! let echo = handler(echo);
//! let lookup = blocking(slow_lookup);
//! ```

use std::future::Future;

use tower::BoxError;
use tower::service_fn;
use tower::util::BoxCloneSyncService;

use crate::context::HandlerContext;

/// A type-erased handler.
pub type BoxedHandler = BoxCloneSyncService<HandlerContext, Option<String>, BoxError>;

/// Conversion from a handler's success value into an optional reply.
pub trait IntoReply {
    /// Returns the reply text, or `None` when there is nothing to say.
    fn into_reply(self) -> Option<String>;
}

impl IntoReply for () {
    fn into_reply(self) -> Option<String> {
        None
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Option<String> {
        Some(self)
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Option<String> {
        Some(self.to_string())
    }
}

impl IntoReply for Option<String> {
    fn into_reply(self) -> Option<String> {
        self
    }
}

/// Boxes an async function into a [`BoxedHandler`].
pub fn handler<F, Fut, R, E>(f: F) -> BoxedHandler
where
    F: Fn(HandlerContext) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: IntoReply,
    E: Into<BoxError>,
{
    BoxCloneSyncService::new(service_fn(move |ctx: HandlerContext| {
        let fut = f(ctx);
        async move { fut.await.map(IntoReply::into_reply).map_err(Into::into) }
    }))
}

/// Boxes a blocking function into a [`BoxedHandler`].
///
/// The function runs on the blocking thread pool; the returned task only
/// awaits its completion.
pub fn blocking<F, R, E>(f: F) -> BoxedHandler
where
    F: Fn(HandlerContext) -> Result<R, E> + Clone + Send + Sync + 'static,
    R: IntoReply + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    handler(move |ctx: HandlerContext| {
        let f = f.clone();
        async move {
            match tokio::task::spawn_blocking(move || f(ctx)).await {
                Ok(outcome) => outcome.map(IntoReply::into_reply).map_err(Into::into),
                Err(join) => Err(BoxError::from(join)),
            }
        }
    })
}
