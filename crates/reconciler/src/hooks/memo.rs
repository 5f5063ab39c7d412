use core::any::Any;
use std::rc::Rc;

use anyhow::Error;

use super::{HookKind, HookSlot, Hooks};

impl Hooks<'_> {
    /// Cache the result of `compute` until `deps` changes.
    ///
    /// # Errors
    /// Returns `HookOrderViolation` if the slot held a different hook, value
    /// type or deps type.
    pub fn use_memo<T, D, F>(&mut self, compute: F, deps: D) -> Result<T, Error>
    where
        T: Clone + 'static,
        D: PartialEq + 'static,
        F: FnOnce() -> T,
    {
        let cached = match self.previous_slot(HookKind::Memo)? {
            Some(HookSlot::Memo { value, deps: old }) => {
                let old = old
                    .downcast_ref::<D>()
                    .ok_or_else(|| self.type_changed(HookKind::Memo))?;
                let value = Rc::clone(value)
                    .downcast::<T>()
                    .map_err(|_| self.type_changed(HookKind::Memo))?;
                (*old == deps).then_some(value)
            }
            Some(_) => return Err(self.type_changed(HookKind::Memo)),
            None => None,
        };
        let value = cached.unwrap_or_else(|| Rc::new(compute()));
        let result = T::clone(&value);
        let erased: Rc<dyn Any> = value;
        self.push(HookSlot::Memo {
            value: erased,
            deps: Rc::new(deps),
        });
        Ok(result)
    }

    /// Keep `callback` stable while `deps` are equal: the first callback seen
    /// for the current deps is returned, later ones are dropped.
    ///
    /// # Errors
    /// Same as [`Hooks::use_memo`].
    pub fn use_callback<F, D>(&mut self, callback: F, deps: D) -> Result<F, Error>
    where
        F: Clone + 'static,
        D: PartialEq + 'static,
    {
        self.use_memo(move || callback, deps)
    }
}
