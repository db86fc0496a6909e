//! The Renderer/Reconciler (§4.4): patch dispatch, component lifecycle, and
//! the host-backend boundary the rest of the crate targets.

pub mod block;
pub mod children;
pub mod component_patch;
pub mod context_proxy;
pub mod host;
pub mod instance;
pub mod patch;
pub mod props;

pub use context_proxy::{AccessType, ContextProxy};
pub use host::{HostBackend, HostHandle};
pub use instance::{AppContext, ComponentInstance, Hook};
pub use patch::{mount_root, Renderer};
