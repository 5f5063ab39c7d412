//! Positional per-component state.
//!
//! Every component render receives a [`Hooks`] context. Each `use_*` call
//! takes the next slot and pairs it with the slot at the same index from the
//! component's previous pass, so hook calls must be unconditional and keep
//! their order. Any drift is reported as
//! [`RenderError::HookOrderViolation`](crate::RenderError::HookOrderViolation)
//! instead of reading a neighbour's state.

use core::any::Any;
use core::fmt;
use std::rc::Rc;

use anyhow::Error;

use crate::error::RenderError;

mod effect;
mod memo;
mod reference;
mod state;

pub(crate) use effect::PendingEffect;
pub use state::{RenderSignal, StateSetter};
pub(crate) use state::StateSlot;

/// The kind of a hook slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    State,
    Memo,
    Effect,
    Ref,
}

impl fmt::Display for HookKind {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::State => "state hook",
            Self::Memo => "memo hook",
            Self::Effect => "effect hook",
            Self::Ref => "ref hook",
        };
        out.write_str(name)
    }
}

/// One retained hook value. Values are type-erased; each hook downcasts on
/// read and reports a changed type as an order violation.
#[derive(Clone)]
pub(crate) enum HookSlot {
    State(StateSlot),
    Memo { value: Rc<dyn Any>, deps: Rc<dyn Any> },
    Effect { deps: Rc<dyn Any> },
    Ref(Rc<dyn Any>),
}

impl HookSlot {
    pub(crate) const fn kind(&self) -> HookKind {
        match self {
            Self::State(_) => HookKind::State,
            Self::Memo { .. } => HookKind::Memo,
            Self::Effect { .. } => HookKind::Effect,
            Self::Ref(_) => HookKind::Ref,
        }
    }
}

impl fmt::Debug for HookSlot {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "HookSlot({})", self.kind())
    }
}

/// Hook context for a single component render.
pub struct Hooks<'render> {
    component: &'static str,
    /// Slots of the previous pass; `None` on the first render of an instance.
    previous: Option<&'render [HookSlot]>,
    slots: Vec<HookSlot>,
    signal: &'render Rc<RenderSignal>,
    effects: &'render mut Vec<PendingEffect>,
}

impl<'render> Hooks<'render> {
    pub(crate) fn new(
        component: &'static str,
        previous: Option<&'render [HookSlot]>,
        signal: &'render Rc<RenderSignal>,
        effects: &'render mut Vec<PendingEffect>,
    ) -> Self {
        Self {
            component,
            previous,
            slots: Vec::new(),
            signal,
            effects,
        }
    }

    /// Name of the component being rendered.
    pub const fn component(&self) -> &'static str {
        self.component
    }

    /// Number of hooks called so far in this render.
    pub fn index(&self) -> usize {
        self.slots.len()
    }

    /// Whether this is the first render of the component instance.
    pub const fn is_first_render(&self) -> bool {
        self.previous.is_none()
    }

    /// Slot at the current index from the previous pass, checked against `kind`.
    fn previous_slot(&self, kind: HookKind) -> Result<Option<&'render HookSlot>, Error> {
        let Some(previous) = self.previous else {
            return Ok(None);
        };
        match previous.get(self.slots.len()) {
            Some(slot) if slot.kind() == kind => Ok(Some(slot)),
            Some(slot) => Err(self.violation(Some(slot.kind()), Some(kind))),
            None => Err(self.violation(None, Some(kind))),
        }
    }

    fn violation(&self, expected: Option<HookKind>, found: Option<HookKind>) -> Error {
        RenderError::HookOrderViolation {
            component: self.component,
            index: self.slots.len(),
            expected,
            found,
        }
        .into()
    }

    fn type_changed(&self, kind: HookKind) -> Error {
        self.violation(Some(kind), Some(kind))
    }

    fn push(&mut self, slot: HookSlot) {
        self.slots.push(slot);
    }

    /// Close the render, checking that no hook from the previous pass was skipped.
    pub(crate) fn finish(self) -> Result<Vec<HookSlot>, Error> {
        if let Some(missing) = self
            .previous
            .and_then(|previous| previous.get(self.slots.len()))
        {
            return Err(self.violation(Some(missing.kind()), None));
        }
        Ok(self.slots)
    }
}
