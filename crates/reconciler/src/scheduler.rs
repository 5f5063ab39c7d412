//! Cooperative work loop.
//!
//! A [`Renderer`] owns the fiber arena and walks the work-in-progress tree one
//! unit at a time. After each unit it asks a [`Deadline`] how much time is
//! left and hands control back with [`LoopStatus::Yielded`] once the budget
//! runs low. The walk resumes from `next_unit` on the next call; host
//! mutations only happen in the commit that follows the last unit.

use core::cell::Cell;
use core::mem;
use core::time::Duration;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context as _, Error};
use dom::NodeKey;
use indextree::{Arena, NodeId};
use log::{debug, trace, warn};

use crate::config::RendererConfig;
use crate::element::{ComponentFn, Element, ElementType};
use crate::error::RenderError;
use crate::fiber::{EffectTag, Fiber, fiber, fiber_mut, next_unit};
use crate::hooks::{Hooks, PendingEffect, RenderSignal};
use crate::host::HostAdapter;
use crate::props::Props;
use crate::telemetry::RenderStats;

/// Remaining time in the current slice, queried once per unit of work.
pub trait Deadline {
    fn time_remaining(&self) -> Duration;
}

/// Wall-clock budget starting when the deadline is created.
#[derive(Debug, Clone, Copy)]
pub struct FrameDeadline {
    started: Instant,
    budget: Duration,
}

impl FrameDeadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(config.frame_budget())
    }

    /// Return the configured frame budget duration.
    pub const fn budget(&self) -> Duration {
        self.budget
    }
}

impl Deadline for FrameDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

/// Deterministic budget of a fixed number of units per slice.
#[derive(Debug)]
pub struct UnitDeadline {
    remaining: Cell<usize>,
}

impl UnitDeadline {
    /// A slice of `units` units of work (at least one).
    pub fn new(units: usize) -> Self {
        Self {
            remaining: Cell::new(units.max(1)),
        }
    }
}

impl Deadline for UnitDeadline {
    fn time_remaining(&self) -> Duration {
        let left = self.remaining.get().saturating_sub(1);
        self.remaining.set(left);
        if left == 0 { Duration::ZERO } else { Duration::MAX }
    }
}

/// A deadline that never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Outcome of one slice of the work loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    /// The budget ran out with work left.
    Yielded,
    /// A pass finished and was applied to the host.
    Committed,
    /// Nothing to do.
    Idle,
}

/// Renders element trees onto a host, incrementally.
pub struct Renderer<H: HostAdapter> {
    pub(crate) host: H,
    pub(crate) arena: Arena<Fiber>,
    pub(crate) current_root: Option<NodeId>,
    pub(crate) wip_root: Option<NodeId>,
    pub(crate) next_unit: Option<NodeId>,
    pub(crate) deletions: Vec<NodeId>,
    pub(crate) pending_effects: Vec<PendingEffect>,
    pub(crate) config: RendererConfig,
    pub(crate) stats: RenderStats,
    /// Latest `render` request; restarts rebuild from it.
    root_element: Option<(Element, NodeKey)>,
    signal: Rc<RenderSignal>,
}

impl<H: HostAdapter> Renderer<H> {
    pub fn new(host: H) -> Self {
        Self::with_config(host, RendererConfig::default())
    }

    pub fn with_config(host: H, config: RendererConfig) -> Self {
        Self {
            host,
            arena: Arena::new(),
            current_root: None,
            wip_root: None,
            next_unit: None,
            deletions: Vec::new(),
            pending_effects: Vec::new(),
            config,
            stats: RenderStats::default(),
            root_element: None,
            signal: Rc::new(RenderSignal::default()),
        }
    }

    pub const fn host(&self) -> &H {
        &self.host
    }

    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub const fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub const fn stats(&self) -> &RenderStats {
        &self.stats
    }

    /// The signal setters of this renderer raise.
    pub fn signal(&self) -> Rc<RenderSignal> {
        Rc::clone(&self.signal)
    }

    /// Whether a pass is in flight or has been requested.
    pub fn has_pending_work(&self) -> bool {
        self.wip_root.is_some() || self.signal.is_requested()
    }

    /// Number of fibers alive in the arena (committed and in progress).
    pub fn fiber_count(&self) -> usize {
        self.arena.count() - self.arena.iter().filter(|node| node.is_removed()).count()
    }

    /// Start rendering `element` into `container`, superseding any pass that
    /// has not committed yet. Work happens in [`Renderer::work_loop`].
    ///
    /// # Errors
    /// Returns `RenderError::InvalidTarget` if the host does not know `container`.
    pub fn render(&mut self, element: Element, container: NodeKey) -> Result<(), Error> {
        if !self.host.contains(container) {
            return Err(RenderError::InvalidTarget { container }.into());
        }
        self.root_element = Some((element, container));
        self.start_pass();
        Ok(())
    }

    /// Run units of work until the deadline runs low, the pass commits, or
    /// there is nothing to do.
    ///
    /// A render requested through a state setter restarts the walk at the
    /// next unit boundary.
    ///
    /// # Errors
    /// Returns the first error raised by a component, a hook check or the
    /// host. The failed pass is discarded; the committed tree stays in place.
    pub fn work_loop<D: Deadline + ?Sized>(&mut self, deadline: &D) -> Result<LoopStatus, Error> {
        let threshold = self.config.yield_threshold();
        loop {
            if self.signal.take() {
                debug!("State update requested, restarting from the committed tree");
                self.start_pass();
            }
            let Some(unit) = self.next_unit else {
                break;
            };
            match self.perform_unit_of_work(unit) {
                Ok(next) => self.next_unit = next,
                Err(err) => {
                    warn!("Render pass failed: {err:#}");
                    self.discard_work_in_progress();
                    return Err(err);
                }
            }
            self.stats.units_performed += 1;
            if self.next_unit.is_some() && deadline.time_remaining() < threshold {
                self.stats.yields += 1;
                trace!("Yielding with work left");
                return Ok(LoopStatus::Yielded);
            }
        }
        if self.wip_root.is_some() {
            self.commit_root()?;
            return Ok(LoopStatus::Committed);
        }
        Ok(LoopStatus::Idle)
    }

    /// Drive the loop without a budget until nothing is left to do, including
    /// passes requested by effects. Returns the number of commits.
    ///
    /// # Errors
    /// Same as [`Renderer::work_loop`].
    pub fn flush_sync(&mut self) -> Result<usize, Error> {
        let mut commits = 0;
        loop {
            match self.work_loop(&Unbounded)? {
                LoopStatus::Committed => commits += 1,
                LoopStatus::Yielded => {}
                LoopStatus::Idle => return Ok(commits),
            }
        }
    }

    fn start_pass(&mut self) {
        self.discard_work_in_progress();
        let Some((element, container)) = self.root_element.clone() else {
            return;
        };
        let root = self
            .arena
            .new_node(Fiber::root(container, element, self.current_root));
        self.wip_root = Some(root);
        self.next_unit = Some(root);
        self.stats.passes_started += 1;
        debug!("Starting render pass #{}", self.stats.passes_started);
    }

    /// Free the work-in-progress tree and everything queued for it.
    pub(crate) fn discard_work_in_progress(&mut self) {
        self.next_unit = None;
        self.pending_effects.clear();
        for id in mem::take(&mut self.deletions) {
            if let Ok(node) = fiber_mut(&mut self.arena, id) {
                node.effect_tag = EffectTag::None;
            }
        }
        if let Some(root) = self.wip_root.take() {
            root.remove_subtree(&mut self.arena);
            self.stats.passes_abandoned += 1;
            debug!("Abandoned uncommitted render pass");
        }
    }

    fn perform_unit_of_work(&mut self, id: NodeId) -> Result<Option<NodeId>, Error> {
        let (ty, props) = {
            let node = fiber(&self.arena, id)?;
            trace!("Performing unit {}", node.describe());
            (node.ty.clone(), Rc::clone(&node.props))
        };
        match ty {
            Some(ElementType::Component(component)) => self.update_component(id, &component, &props)?,
            Some(ElementType::Text) => {}
            Some(ElementType::Host(_)) | None => self.reconcile_children(id, props.children())?,
        }
        let root = self.wip_root.ok_or(RenderError::MissingFiber)?;
        Ok(next_unit(&self.arena, id, root))
    }

    fn update_component(&mut self, id: NodeId, component: &ComponentFn, props: &Props) -> Result<(), Error> {
        let previous = match fiber(&self.arena, id)?.alternate {
            Some(alternate) => Some(fiber(&self.arena, alternate)?.hooks.clone()),
            None => None,
        };
        let mut hooks = Hooks::new(
            component.name(),
            previous.as_deref(),
            &self.signal,
            &mut self.pending_effects,
        );
        let child = component
            .render(&mut hooks, props)
            .with_context(|| format!("Failed to render {}", component.name()))?;
        let slots = hooks.finish()?;
        fiber_mut(&mut self.arena, id)?.hooks = slots;
        self.reconcile_children(id, &[child])
    }
}
