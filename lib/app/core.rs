//! The application shell (§0 ADDED): wires the scheduler, reactivity core,
//! template compiler, and renderer together into a runnable program,
//! grounded in the teacher's `app/core.rs` event loop (terminal init/raw
//! mode/alternate screen, poll-driven main loop, render-on-demand).
//!
//! Unlike the teacher's Elm-style model (explicit `update`/`view` methods
//! driven by a message queue), state changes here flow entirely through
//! [`crate::reactivity`]: writing a `Signal`/`Store` schedules a render
//! effect via [`crate::scheduler`], which re-renders and re-patches without
//! the host loop's involvement. The host loop's only job is pumping input
//! events and flushing frames to the terminal.

use crate::component::ComponentDescriptor;
use crate::di::ProvideScope;
use crate::renderer::host::HostBackend;
use crate::renderer::patch::{mount_root, Renderer};
use crate::vnode::{Props, PropValue, ShapeFlags, VNode, VNodeType};
use std::rc::Rc;

#[cfg(feature = "terminal")]
use crate::backends::terminal::TerminalBackend;
#[cfg(feature = "terminal")]
use crossterm::{
    cursor,
    event::{self, Event, KeyEvent, MouseEvent},
    terminal, ExecutableCommand,
};
#[cfg(feature = "terminal")]
use std::io;
#[cfg(feature = "terminal")]
use std::time::Duration;

use super::config::RenderConfig;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A running application over some [`HostBackend`] `B`. Construct with
/// [`App::with_backend`] for an arbitrary backend (e.g. `backends::test`
/// for headless testing of a view's reactive behavior), or [`App::new`] for
/// the bundled terminal backend.
pub struct App<B: HostBackend + 'static> {
    renderer: Rc<Renderer<B>>,
    config: RenderConfig,
    #[cfg(feature = "terminal")]
    on_key: Option<Rc<dyn Fn(KeyEvent)>>,
    #[cfg(feature = "terminal")]
    on_mouse: Option<Rc<dyn Fn(MouseEvent)>>,
}

//--------------------------------------------------------------------------------------------------
// Methods: any backend
//--------------------------------------------------------------------------------------------------

impl<B: HostBackend + 'static> App<B> {
    /// Wraps an already-constructed backend. Most callers building a
    /// terminal app should use [`App::new`] instead; this is the entry
    /// point for headless hosts (tests, embedding in another event loop).
    pub fn with_backend(backend: B) -> Self {
        Self {
            renderer: Renderer::new(backend),
            config: RenderConfig::default(),
            #[cfg(feature = "terminal")]
            on_key: None,
            #[cfg(feature = "terminal")]
            on_mouse: None,
        }
    }

    pub fn render_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a component under `name` in the app-wide registry
    /// consulted by template compilation for `<PascalCase>`/`<kebab-case>`
    /// tags (§4.1.1), in addition to whatever local registry an individual
    /// `compile` call supplies.
    pub fn component(self, name: impl Into<String>, descriptor: Rc<ComponentDescriptor>) -> Self {
        self.renderer.app_context.register_component(name, descriptor);
        self
    }

    /// App-level `provide(key, value)` (§4.5): visible to `inject` calls
    /// anywhere in the tree that don't find a closer override.
    pub fn provide(self, key: impl Into<String>, value: PropValue) -> Self {
        self.renderer.app_context.root_provides.provide(key, value);
        self
    }

    /// Registers a global key-event handler. There is no per-element focus
    /// or hit-testing system in this core (document-order stacking only,
    /// §6 Non-goals on visual layout) — event routing to specific elements
    /// is left to the host integration; this is the one app-wide hook this
    /// core provides directly.
    #[cfg(feature = "terminal")]
    pub fn on_key(mut self, handler: impl Fn(KeyEvent) + 'static) -> Self {
        self.on_key = Some(Rc::new(handler));
        self
    }

    #[cfg(feature = "terminal")]
    pub fn on_mouse(mut self, handler: impl Fn(MouseEvent) + 'static) -> Self {
        self.on_mouse = Some(Rc::new(handler));
        self
    }

    /// Mounts `root` at the backend's root container. Call once, before
    /// driving the host's own event loop (tests typically stop here and
    /// inspect the backend directly instead of calling `run`).
    pub fn mount(&self, root: Rc<ComponentDescriptor>) {
        let container = self.renderer.backend.borrow().root();
        let node = VNode::new(VNodeType::Component(root), ShapeFlags::STATEFUL_COMPONENT);
        mount_root(&self.renderer, node, container);
    }

    /// Mounts `root` with initial props, as above.
    pub fn mount_with_props(&self, root: Rc<ComponentDescriptor>, props: Props) {
        let container = self.renderer.backend.borrow().root();
        let mut node = VNode::new(VNodeType::Component(root), ShapeFlags::STATEFUL_COMPONENT);
        node.props = props;
        mount_root(&self.renderer, node, container);
    }

    pub fn root_provides(&self) -> &Rc<ProvideScope> {
        &self.renderer.app_context.root_provides
    }

    /// Direct access to the backend, for headless hosts that need to
    /// inspect the mounted tree (tests) or drive I/O the host loop in
    /// `run` doesn't cover.
    pub fn backend(&self) -> std::cell::Ref<'_, B> {
        self.renderer.backend.borrow()
    }
}

//--------------------------------------------------------------------------------------------------
// Methods: terminal backend
//--------------------------------------------------------------------------------------------------

#[cfg(feature = "terminal")]
impl App<TerminalBackend> {
    /// Creates a new terminal application: enables raw mode, switches to
    /// the alternate screen, hides the cursor, and enables mouse capture.
    /// Terminal state is restored on `Drop`.
    pub fn new() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(terminal::EnterAlternateScreen)?;
        stdout.execute(cursor::Hide)?;
        stdout.execute(event::EnableMouseCapture)?;

        let (width, height) = terminal::size()?;
        Ok(Self::with_backend(TerminalBackend::new(width, height)))
    }

    /// Runs the poll/render loop until `running` observes a request to
    /// stop (an `on_key`/`on_mouse` handler typically flips a `Signal<bool>`
    /// the caller also reads; this loop itself has no opinion on exit
    /// conditions beyond the `should_continue` predicate it's given).
    pub fn run(&mut self, mut should_continue: impl FnMut() -> bool) -> io::Result<()> {
        self.renderer.backend.borrow_mut().flush()?;
        while should_continue() {
            if event::poll(Duration::from_millis(self.config.poll_duration_ms))? {
                match event::read()? {
                    Event::Key(key) => {
                        if let Some(handler) = &self.on_key {
                            handler(key);
                        }
                    }
                    Event::Mouse(mouse) => {
                        if let Some(handler) = &self.on_mouse {
                            handler(mouse);
                        }
                    }
                    Event::Resize(w, h) => {
                        self.renderer.backend.borrow_mut().resize(w, h);
                    }
                    _ => {}
                }
            }
            crate::scheduler::flush_now();
            self.renderer.backend.borrow_mut().flush()?;
        }
        Ok(())
    }
}

#[cfg(feature = "terminal")]
impl Drop for App<TerminalBackend> {
    fn drop(&mut self) {
        let mut stdout = io::stdout();
        let _ = stdout.execute(event::DisableMouseCapture);
        let _ = stdout.execute(cursor::Show);
        let _ = stdout.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
