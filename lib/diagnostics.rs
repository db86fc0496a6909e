//! Thin `tracing` shim. The rest of the crate calls `log_warn!`/`log_error!`
//! unconditionally; whether that reaches a real subscriber is gated by the
//! `diagnostics` cargo feature, the same way `effects`/`terminal` gate their
//! own dependencies (SPEC_FULL §1).

#[cfg(feature = "diagnostics")]
macro_rules! log_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}
#[cfg(not(feature = "diagnostics"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "diagnostics")]
macro_rules! log_error {
    ($($arg:tt)*) => { tracing::error!($($arg)*) };
}
#[cfg(not(feature = "diagnostics"))]
macro_rules! log_error {
    ($($arg:tt)*) => {{}};
}

pub(crate) use log_error;
pub(crate) use log_warn;
