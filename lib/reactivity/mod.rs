//! The tracked-state layer (§4.2): effects, tracked containers, computed
//! cells, and watchers. Everything above this module treats reactivity as a
//! black box exposing `track`/`trigger` through these handle types.

pub mod computed;
pub mod effect;
pub mod signal;
pub mod store;
pub mod watch;

pub use computed::Computed;
pub use effect::{Dep, Effect, EffectOptions, EffectId, RawEffect};
pub use signal::Signal;
pub use store::{Store, Value};
pub use watch::{untracked, watch, watch_effect, FlushTiming, OnInvalidate, WatchHandle, WatchOptions};
