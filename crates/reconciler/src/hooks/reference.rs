use core::any::Any;
use core::cell::RefCell;
use std::rc::Rc;

use anyhow::Error;

use super::{HookKind, HookSlot, Hooks};

impl Hooks<'_> {
    /// A mutable box created on first render and returned unchanged afterwards.
    ///
    /// # Errors
    /// Returns `HookOrderViolation` if the slot held a different hook or type.
    pub fn use_ref<T: 'static>(&mut self, initial: T) -> Result<Rc<RefCell<T>>, Error> {
        let cell = match self.previous_slot(HookKind::Ref)? {
            Some(HookSlot::Ref(cell)) => Rc::clone(cell)
                .downcast::<RefCell<T>>()
                .map_err(|_| self.type_changed(HookKind::Ref))?,
            Some(_) => return Err(self.type_changed(HookKind::Ref)),
            None => Rc::new(RefCell::new(initial)),
        };
        let erased: Rc<dyn Any> = Rc::<RefCell<T>>::clone(&cell);
        self.push(HookSlot::Ref(erased));
        Ok(cell)
    }
}

#[cfg(test)]
mod tests {
    use super::super::RenderSignal;
    use super::*;

    #[test]
    fn ref_keeps_identity_and_ignores_later_initials() -> Result<(), Error> {
        let signal = Rc::new(RenderSignal::default());
        let mut effects = Vec::new();
        let mut hooks = Hooks::new("Ref", None, &signal, &mut effects);
        let first = hooks.use_ref(vec![1i32])?;
        let slots = hooks.finish()?;
        first.borrow_mut().push(2);

        let mut again = Hooks::new("Ref", Some(&slots), &signal, &mut effects);
        let second = again.use_ref(Vec::new())?;
        again.finish()?;
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(*second.borrow(), vec![1, 2]);
        Ok(())
    }
}
