//! The host-backend interface (§6.1) consumed by the renderer.
//!
//! The spec asks for a reconciler "parametric in a host-node type `N` and a
//! host-element type `E`". Threading two generic parameters through every
//! VNode/Children/ComponentDescriptor in the tree would infect the entire
//! public API for no behavioral benefit, so the parametrization happens one
//! level down: the tree itself only ever holds an opaque `HostHandle` (a
//! `u64` id, the same indirection real DOM-less renderers such as Dioxus use
//! for `ElementId`), and each `HostBackend` implementation owns its own
//! internal arena mapping handles to its real node/element representation.
//! `HostBackend` is the thing that is actually parametric per-backend; the
//! handle is just its address space.

use crate::vnode::PropValue;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An opaque reference to a host node or element, valid only for calls back
/// into the same `HostBackend` instance that produced it.
pub type HostHandle = u64;

/// The contract a host tree (DOM, terminal buffer, test harness, ...) must
/// satisfy for the renderer to mount/patch/unmount against it (§6.1).
pub trait HostBackend {
    fn create_element(&mut self, tag: &str, is_svg: bool) -> HostHandle;
    fn create_text(&mut self, s: &str) -> HostHandle;
    fn create_comment(&mut self, s: &str) -> HostHandle;

    fn set_text(&mut self, node: HostHandle, s: &str);
    fn set_element_text(&mut self, el: HostHandle, s: &str);

    /// Insert `node` as a child of `parent`, immediately before `anchor` if
    /// given, else append.
    fn insert(&mut self, node: HostHandle, parent: HostHandle, anchor: Option<HostHandle>);
    fn remove(&mut self, node: HostHandle);

    fn parent_node(&self, node: HostHandle) -> Option<HostHandle>;
    fn next_sibling(&self, node: HostHandle) -> Option<HostHandle>;

    /// Apply a single prop diff: `old`/`new` of `None` mean "absent before"
    /// / "absent after" respectively (covers both mount, where `old` is
    /// always `None`, and unmount-time cleanup, where `new` is `None`).
    fn patch_prop(&mut self, el: HostHandle, key: &str, old: Option<&PropValue>, new: Option<&PropValue>);

    /// Mount-time root resolution only (§6.1).
    fn query_selector(&self, _sel: &str) -> Option<HostHandle> {
        None
    }

    /// The backend's top-level container handle, mounted into by
    /// `app::App::mount`. Every shipped backend reserves handle `0` for it.
    fn root(&self) -> HostHandle {
        0
    }

    fn set_scope_id(&mut self, _el: HostHandle, _id: &str) {}

    /// Optional fast path for the `HOISTED` patch flag. The default clones
    /// by re-issuing `create_element`-equivalent state through the caller,
    /// so a backend with no cheap clone primitive is still correct, just
    /// not faster than a fresh mount.
    fn clone_node(&mut self, _node: HostHandle) -> Option<HostHandle> {
        None
    }

    /// Optional: materialize a `Static` vnode's pre-rendered markup in one
    /// call. Backends without a native "parse this markup" primitive can
    /// leave the default, which signals the caller to fall back to the
    /// vnode's structured representation instead.
    fn insert_static_content(
        &mut self,
        _html: &str,
        _parent: HostHandle,
        _anchor: Option<HostHandle>,
        _is_svg: bool,
    ) -> Option<HostHandle> {
        None
    }
}
