//! Rehash: hot reload of configuration and plugin modules.
//!
//! ```text
//!          begin()                    ticket dropped
//!   Idle ───────────▶ Reloading ──────────────────────▶ Idle (last outcome kept)
//!     ▲                   │ begin() again
//!     └───────────────────┘ "rehash already in progress"
//! ```
//!
//! The steps themselves are driven by the client (see `Client::rehash`); this
//! module holds the state machine and the error type.

use parking_lot::Mutex;
use thiserror::Error;

/// A rehash step, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehashStep {
    /// Gate: refused because another rehash is running.
    Begin,
    /// Step 1: re-apply the current configuration to the session.
    RefreshSession,
    /// Step 2: re-read the configuration (`rehash conf` only).
    ReloadConfig,
    /// Step 3: drop modules that are no longer available.
    UnloadRemoved,
    /// Step 4: load every available module afresh.
    ReloadModules,
}

impl RehashStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::RefreshSession => "refresh_session",
            Self::ReloadConfig => "reload_config",
            Self::UnloadRemoved => "unload_removed",
            Self::ReloadModules => "reload_modules",
        }
    }
}

impl std::fmt::Display for RehashStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed rehash. Displays as the bare cause, which is what the invoking
/// user sees after `Rehash error: `.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{cause}")]
pub struct RehashError {
    pub step: RehashStep,
    pub cause: String,
}

impl RehashError {
    pub fn new(step: RehashStep, cause: impl std::fmt::Display) -> Self {
        Self {
            step,
            cause: cause.to_string(),
        }
    }

    pub(crate) fn in_progress() -> Self {
        Self::new(RehashStep::Begin, "rehash already in progress")
    }
}

/// Result type for rehash.
pub type RehashResult<T> = Result<T, RehashError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RehashState {
    Idle,
    Reloading,
}

#[derive(Debug)]
struct Inner {
    state: RehashState,
    last: Option<RehashResult<()>>,
}

/// The rehash state machine.
#[derive(Debug)]
pub struct Rehasher {
    inner: Mutex<Inner>,
}

impl Default for Rehasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Rehasher {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: RehashState::Idle,
                last: None,
            }),
        }
    }

    pub fn state(&self) -> RehashState {
        self.inner.lock().state
    }

    /// Outcome of the most recent finished rehash.
    pub fn last_outcome(&self) -> Option<RehashResult<()>> {
        self.inner.lock().last.clone()
    }

    /// Moves to `Reloading`. Fails if a rehash is already running.
    pub fn begin(&self) -> RehashResult<RehashTicket<'_>> {
        let mut inner = self.inner.lock();
        if inner.state == RehashState::Reloading {
            return Err(RehashError::in_progress());
        }
        inner.state = RehashState::Reloading;
        Ok(RehashTicket {
            rehasher: self,
            outcome: None,
        })
    }
}

/// Proof that a rehash is running. Dropping it returns the machine to `Idle`.
#[derive(Debug)]
pub struct RehashTicket<'a> {
    rehasher: &'a Rehasher,
    outcome: Option<RehashResult<()>>,
}

impl RehashTicket<'_> {
    /// Records the outcome and returns it.
    pub fn finish(mut self, outcome: RehashResult<()>) -> RehashResult<()> {
        self.outcome = Some(outcome.clone());
        outcome
    }
}

impl Drop for RehashTicket<'_> {
    fn drop(&mut self) {
        let mut inner = self.rehasher.inner.lock();
        inner.state = RehashState::Idle;
        if let Some(outcome) = self.outcome.take() {
            inner.last = Some(outcome);
        }
    }
}
