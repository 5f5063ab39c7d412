use core::fmt;
use std::rc::Rc;

use anyhow::Error;

use super::{HookKind, HookSlot, Hooks};

/// An effect queued during a render, run after the pass commits.
pub(crate) struct PendingEffect {
    component: &'static str,
    callback: Box<dyn FnOnce()>,
}

impl PendingEffect {
    pub(crate) const fn component(&self) -> &'static str {
        self.component
    }

    pub(crate) fn run(self) {
        (self.callback)();
    }
}

impl fmt::Debug for PendingEffect {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "PendingEffect({})", self.component)
    }
}

impl Hooks<'_> {
    /// Run `effect` after the next commit if this is the first render or
    /// `deps` changed. Effects of a pass that never commits are dropped.
    ///
    /// # Errors
    /// Returns `HookOrderViolation` if the slot held a different hook or deps type.
    pub fn use_effect<F, D>(&mut self, effect: F, deps: D) -> Result<(), Error>
    where
        F: FnOnce() + 'static,
        D: PartialEq + 'static,
    {
        let changed = match self.previous_slot(HookKind::Effect)? {
            Some(HookSlot::Effect { deps: old }) => {
                let old = old
                    .downcast_ref::<D>()
                    .ok_or_else(|| self.type_changed(HookKind::Effect))?;
                *old != deps
            }
            Some(_) => return Err(self.type_changed(HookKind::Effect)),
            None => true,
        };
        if changed {
            self.effects.push(PendingEffect {
                component: self.component,
                callback: Box::new(effect),
            });
        }
        self.push(HookSlot::Effect {
            deps: Rc::new(deps),
        });
        Ok(())
    }
}
