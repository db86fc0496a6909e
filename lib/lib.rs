//! # vireo - A Reactive UI Framework Core
//!
//! A client-side reactive UI framework core: a template compiler, a
//! fine-grained reactivity system, and a block-aware virtual DOM
//! reconciler, parametric over a host backend.
//!
//! ## Architecture Overview
//!
//! ```text
//!     ┌────────────┐     ┌─────────────┐     ┌─────────────┐
//!     │  Template  │────▶│  compiler   │────▶│RenderProgram│
//!     │  (string)  │     │(parse/xform)│     │   (data)    │
//!     └────────────┘     └─────────────┘     └──────┬──────┘
//!                                                    │
//!                                                    ▼
//!     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//!     │  reactivity │◀───▶│  component  │────▶│   program   │
//!     │ Signal/Store│     │  instance   │     │  ::execute  │
//!     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                     │
//!                                                     ▼
//!     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//!     │  scheduler  │◀────│   renderer  │────▶│ HostBackend │
//!     │ (job queue) │     │   (patch)   │     │ (terminal)  │
//!     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! Writing a `Signal`/`Store` schedules a render effect through the
//! scheduler, which re-renders the owning component and patches the result
//! into whichever `HostBackend` the app is running against — there is no
//! explicit message-passing update loop to wire up.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vireo::prelude::*;
//! use std::collections::HashMap;
//!
//! fn main() -> std::io::Result<()> {
//!     let counter = ComponentDescriptor::new("Counter", |_props, _ctx| {
//!         let mut state = HashMap::new();
//!         state.insert("count".to_string(), PropValue::Int(0));
//!         SetupResult::State(state)
//!     })
//!     .with_template("<div>{{ count }}</div>");
//!
//!     let mut app = App::new()?;
//!     app.mount(counter);
//!     app.run(|| true)
//! }
//! ```

//--------------------------------------------------------------------------------------------------
// Modules: Reactivity & Scheduling
//--------------------------------------------------------------------------------------------------

/// The tracked-state layer: signals, stores, effects, computed values,
/// watchers.
pub mod reactivity;

/// Process-wide cooperative job scheduler driving render effects.
pub mod scheduler;

//--------------------------------------------------------------------------------------------------
// Modules: Template Compiler
//--------------------------------------------------------------------------------------------------

/// The template compiler: parser, AST, transforms, hoisting, and the
/// render-program data the renderer interprets.
pub mod compiler;

//--------------------------------------------------------------------------------------------------
// Modules: Virtual Node Model & Renderer
//--------------------------------------------------------------------------------------------------

/// The virtual node model: tagged-union tree nodes, shape/patch flags.
pub mod vnode;

/// Component descriptor, props/slots plumbing consumed by the renderer.
pub mod component;

/// The reconciler: patch dispatch, keyed diffing, host backend trait,
/// render effect, render-context proxy, props update.
pub mod renderer;

/// Dependency injection: `provide`/`inject` over the instance tree.
pub mod di;

/// Error-handling taxonomies: compile diagnostics, captured runtime
/// errors, internal invariants.
pub mod error;

/// Thin `tracing` shim gated behind the `diagnostics` feature.
pub mod diagnostics;

//--------------------------------------------------------------------------------------------------
// Modules: Host Backends
//--------------------------------------------------------------------------------------------------

/// Concrete `HostBackend` implementations (terminal, in-memory test host).
pub mod backends;

//--------------------------------------------------------------------------------------------------
// Modules: Application
//--------------------------------------------------------------------------------------------------

/// The application shell wiring scheduler, reactivity, compiler, and
/// renderer together into a runnable program.
pub mod app;

//--------------------------------------------------------------------------------------------------
// Modules: Styling & Terminal Drawing
//--------------------------------------------------------------------------------------------------

/// Styling types (colors, spacing, borders) consumed by the terminal
/// backend's prop resolution.
pub mod style;

/// Double buffering and cell-level diffing for flicker-free terminal
/// rendering, used by `backends::terminal`.
#[cfg(feature = "terminal")]
mod buffer;

/// Optimized terminal command emission.
#[cfg(feature = "terminal")]
mod terminal;

/// Unicode display-width helpers used by `buffer`.
#[cfg(feature = "terminal")]
mod utils;

//--------------------------------------------------------------------------------------------------
// Modules: Prelude
//--------------------------------------------------------------------------------------------------

/// Prelude module for convenient imports.
pub mod prelude;
