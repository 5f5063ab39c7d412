#![allow(
    clippy::missing_docs_in_private_items,
    reason = "Internal implementation details don't need public documentation"
)]
#![allow(
    clippy::missing_inline_in_public_items,
    reason = "Inlining decisions left to compiler for this crate"
)]

//! Incremental tree reconciler.
//!
//! Components describe their output as immutable [`Element`] trees. A
//! [`Renderer`] turns each render request into a pass over a tree of fibers,
//! one unit of work at a time, diffing every fiber's children against the
//! last committed tree by position. Once a pass has walked the whole tree the
//! changes are committed to a [`HostAdapter`] in one go; per-component state
//! lives in positional hook slots reached through [`Hooks`].
//!
//! ```ignore
//! use reconciler::{DomHost, Element, Hooks, Props, Renderer, handler};
//!
//! fn counter(hooks: &mut Hooks<'_>, _props: &Props) -> anyhow::Result<Element> {
//!     let (count, set_count) = hooks.use_state(1)?;
//!     let on_click = hooks.use_callback(handler!([set_count], |_ctx| set_count.update(|n| n + 1)), ())?;
//!     Ok(Element::host("div")
//!         .child(Element::host("p").child(format!("Count: {count}")))
//!         .child(Element::host("button").on("click", on_click).child("+1")))
//! }
//!
//! let mut renderer = Renderer::new(DomHost::new());
//! renderer.render(Element::component(counter), dom::NodeKey::ROOT)?;
//! renderer.flush_sync()?;
//! ```

mod macros;

mod commit;
pub mod config;
pub mod driver;
pub mod element;
pub mod error;
mod fiber;
pub mod hooks;
pub mod host;
pub mod props;
mod reconcile;
pub mod scheduler;
pub mod telemetry;

pub use config::RendererConfig;
pub use element::{Child, ComponentFn, Element, ElementType, create_element};
pub use error::RenderError;
pub use fiber::EffectTag;
pub use hooks::{HookKind, Hooks, RenderSignal, StateSetter};
pub use host::{DomHost, HostAdapter, HostKind};
pub use props::{EventContext, EventHandler, PropValue, Props, PropsDiff, diff};
pub use scheduler::{Deadline, FrameDeadline, LoopStatus, Renderer, UnitDeadline, Unbounded};
pub use telemetry::{CommitSummary, RenderStats};
