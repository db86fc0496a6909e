//! Error handling funnel for user-code invocations.
//!
//! Three taxonomies are distinguished (see module docs on `compiler::errors`
//! for the first one):
//!
//! - compile-time diagnostics (never thrown; collected via `onError`)
//! - runtime errors captured from user code, funneled through
//!   [`invoke_with_error_handling`] and the component error-capture chain
//! - internal invariants (dev-only warnings, best-effort recovery in prod)

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The site at which a captured error originated, used for diagnostics and
/// by `errorCaptured` hooks that branch on provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSource {
    Setup,
    Render,
    Watcher,
    LifecycleHook,
    EventHandler,
    Directive,
    Transition,
    AsyncComponentLoader,
    SchedulerJob,
    RefFunction,
}

impl fmt::Display for ErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorSource::Setup => "setup function",
            ErrorSource::Render => "render function",
            ErrorSource::Watcher => "watcher callback",
            ErrorSource::LifecycleHook => "lifecycle hook",
            ErrorSource::EventHandler => "event handler",
            ErrorSource::Directive => "directive hook",
            ErrorSource::Transition => "transition hook",
            ErrorSource::AsyncComponentLoader => "async component loader",
            ErrorSource::SchedulerJob => "scheduler job",
            ErrorSource::RefFunction => "ref function",
        };
        f.write_str(name)
    }
}

/// An error captured from user code, tagged with the call site that produced it.
#[derive(Debug, Clone)]
pub struct CapturedError {
    pub source: ErrorSource,
    pub message: String,
}

impl fmt::Display for CapturedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error in {}: {}", self.source, self.message)
    }
}

impl std::error::Error for CapturedError {}

/// A single link in the error-capture chain: an `errorCaptured` hook.
/// Returning `true` halts propagation up the parent chain.
pub type ErrorCapturedHook = Rc<RefCell<dyn FnMut(&CapturedError) -> bool>>;

/// The app-wide fallback error handler, invoked when the capture chain is
/// exhausted without any hook claiming the error.
pub type AppErrorHandler = Rc<dyn Fn(&CapturedError)>;

//--------------------------------------------------------------------------------------------------
// Errors returned from host/backend boundaries (not part of the user-code funnel)
//--------------------------------------------------------------------------------------------------

/// Errors surfaced by host backend operations (I/O, terminal setup, etc).
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("host I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("host backend does not support operation: {0}")]
    Unsupported(&'static str),
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Runs `f`, catching a returned `Err` and funneling it through `chain` (the
/// ordered list of ancestor `errorCaptured` hooks, nearest first), then the
/// app-wide handler if no hook in the chain claims it.
///
/// Mirrors the spec's `invokeWithErrorHandling`: every invocation of user
/// code (setup, render, watcher callback, lifecycle hook, event handler,
/// directive hook, transition hook, async component loader, scheduler job,
/// ref function) passes through this funnel.
pub fn invoke_with_error_handling<T>(
    source: ErrorSource,
    chain: &[ErrorCapturedHook],
    app_handler: Option<&AppErrorHandler>,
    f: impl FnOnce() -> Result<T, String>,
) -> Option<T> {
    match f() {
        Ok(v) => Some(v),
        Err(message) => {
            let error = CapturedError { source, message };
            let claimed = chain.iter().any(|hook| (hook.borrow_mut())(&error));
            if !claimed {
                if let Some(handler) = app_handler {
                    handler(&error);
                } else if cfg!(debug_assertions) {
                    crate::diagnostics::log_error!(%error, "unhandled error, no errorCaptured hook or app handler");
                } else {
                    crate::diagnostics::log_warn!(%error, "unhandled error suppressed in release build");
                }
            }
            None
        }
    }
}

/// Logs an internal-invariant violation. Dev builds warn loudly; release
/// builds degrade to a quiet warning since the caller is expected to have
/// already chosen a best-effort recovery path.
pub fn internal_invariant_violation(message: impl fmt::Display) {
    if cfg!(debug_assertions) {
        crate::diagnostics::log_error!(%message, "internal invariant violated");
    } else {
        crate::diagnostics::log_warn!(%message, "internal invariant violated, recovering");
    }
}
