//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use vireo::prelude::*;
//! ```

// Application shell
pub use crate::app::{App, RenderConfig};

// Component descriptor and setup plumbing
pub use crate::component::{ComponentDescriptor, PropOption, PropsOptions, SetupContext, SetupResult};

// Reactivity core
pub use crate::reactivity::{watch, watch_effect, Computed, Effect, Signal, Store, Value, WatchOptions};

// Template compiler
pub use crate::compiler::{compile, CompileOptions};

// Virtual node model
pub use crate::vnode::{Children, PatchFlags, Props, PropValue, ShapeFlags, VKey, VNode, VNodeRef, VNodeType};

// Host backends
#[cfg(feature = "terminal")]
pub use crate::backends::terminal::TerminalBackend;
pub use crate::backends::test::TestBackend;
pub use crate::renderer::{HostBackend, HostHandle};

// Dependency injection
pub use crate::di::ProvideScope;

// Error handling
pub use crate::error::{AppErrorHandler, CapturedError, ErrorSource};
