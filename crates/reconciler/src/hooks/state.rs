use core::any::Any;
use core::cell::{Cell, RefCell};
use core::fmt;
use std::rc::Rc;

use anyhow::Error;
use tokio::sync::Notify;

use super::{HookKind, HookSlot, Hooks};

/// Render request flag shared between a renderer and every setter it handed
/// out. Setters raise it; the work loop consumes it at the next unit boundary.
#[derive(Debug, Default)]
pub struct RenderSignal {
    requested: Cell<bool>,
    notify: Notify,
}

impl RenderSignal {
    /// Ask for a fresh render pass.
    pub fn request(&self) {
        self.requested.set(true);
        self.notify.notify_one();
    }

    pub fn is_requested(&self) -> bool {
        self.requested.get()
    }

    pub(crate) fn take(&self) -> bool {
        self.requested.replace(false)
    }

    /// Resolve once a render has been requested. A request made before the
    /// call is not missed.
    pub async fn requested(&self) {
        if self.is_requested() {
            return;
        }
        self.notify.notified().await;
    }
}

type Update<T> = Rc<dyn Fn(&T) -> T>;

/// Pending updates of one state hook, shared by every pass of its component
/// instance and by all setters.
pub(crate) struct UpdateQueue<T> {
    pending: RefCell<Vec<Update<T>>>,
}

impl<T> Default for UpdateQueue<T> {
    fn default() -> Self {
        Self {
            pending: RefCell::new(Vec::new()),
        }
    }
}

impl<T> UpdateQueue<T> {
    fn push(&self, update: Update<T>) {
        self.pending.borrow_mut().push(update);
    }

    fn snapshot(&self) -> Vec<Update<T>> {
        self.pending.borrow().iter().map(Rc::clone).collect()
    }

    fn len(&self) -> usize {
        self.pending.borrow().len()
    }
}

/// Type-erased view of a queue used by the committer.
pub(crate) trait Acknowledge {
    /// Drop the first `folded` updates; they are part of committed state now.
    fn acknowledge(&self, folded: usize);
}

impl<T> Acknowledge for UpdateQueue<T> {
    fn acknowledge(&self, folded: usize) {
        let mut pending = self.pending.borrow_mut();
        let count = folded.min(pending.len());
        pending.drain(..count);
    }
}

/// Retained state of a `use_state` call.
#[derive(Clone)]
pub(crate) struct StateSlot {
    value: Rc<dyn Any>,
    queue: Rc<dyn Any>,
    ack: Rc<dyn Acknowledge>,
    /// How many queued updates `value` already includes.
    folded: usize,
}

impl StateSlot {
    fn new<T: 'static>(value: T, queue: &Rc<UpdateQueue<T>>, folded: usize) -> Self {
        let erased: Rc<dyn Any> = Rc::<UpdateQueue<T>>::clone(queue);
        let ack: Rc<dyn Acknowledge> = Rc::<UpdateQueue<T>>::clone(queue);
        Self {
            value: Rc::new(value),
            queue: erased,
            ack,
            folded,
        }
    }

    pub(crate) fn acknowledge(&self) {
        self.ack.acknowledge(self.folded);
    }
}

/// Handle for updating a state hook. Stable across renders: every pass of the
/// same component instance hands out setters that compare equal.
pub struct StateSetter<T> {
    queue: Rc<UpdateQueue<T>>,
    signal: Rc<RenderSignal>,
}

impl<T: 'static> StateSetter<T> {
    /// Queue `update` and request a new render pass.
    pub fn update<F>(&self, update: F)
    where
        F: Fn(&T) -> T + 'static,
    {
        self.queue.push(Rc::new(update));
        self.signal.request();
    }

    /// Queue a constant update.
    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        self.update(move |_| value.clone());
    }

    /// Updates queued but not yet part of a commit.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
            signal: Rc::clone(&self.signal),
        }
    }
}

impl<T> PartialEq for StateSetter<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.queue, &other.queue)
    }
}

impl<T> fmt::Debug for StateSetter<T> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(out, "StateSetter({:p})", Rc::as_ptr(&self.queue))
    }
}

impl Hooks<'_> {
    /// State that survives re-renders.
    ///
    /// Returns the current value, folding every queued update over the last
    /// committed value (or `initial` on first render), and a setter.
    ///
    /// # Errors
    /// Returns `HookOrderViolation` if the slot held a different hook or type.
    pub fn use_state<T>(&mut self, initial: T) -> Result<(T, StateSetter<T>), Error>
    where
        T: Clone + 'static,
    {
        let (base, queue) = match self.previous_slot(HookKind::State)? {
            Some(HookSlot::State(slot)) => {
                let base = Rc::clone(&slot.value)
                    .downcast::<T>()
                    .map_err(|_| self.type_changed(HookKind::State))?;
                let queue = Rc::clone(&slot.queue)
                    .downcast::<UpdateQueue<T>>()
                    .map_err(|_| self.type_changed(HookKind::State))?;
                (T::clone(&base), queue)
            }
            Some(_) => return Err(self.type_changed(HookKind::State)),
            None => (initial, Rc::new(UpdateQueue::default())),
        };

        let pending = queue.snapshot();
        let mut state = base;
        for update in &pending {
            state = update.as_ref()(&state);
        }

        let setter = StateSetter {
            queue: Rc::clone(&queue),
            signal: Rc::clone(self.signal),
        };
        self.push(HookSlot::State(StateSlot::new(state.clone(), &queue, pending.len())));
        Ok((state, setter))
    }
}
