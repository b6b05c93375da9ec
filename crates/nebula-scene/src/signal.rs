//! Single-threaded signals with scoped subscriptions.
//!
//! A [`Signal`] owns a list of slots. [`Signal::connect`] returns a
//! [`Subscription`] guard; dropping the guard disconnects the slot right away,
//! so a component that stores its subscriptions releases them deterministically
//! when it is rebound or detached.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// RAII guard for a connected slot. Dropping it disconnects the slot.
#[must_use = "dropping a Subscription disconnects it immediately"]
pub struct Subscription {
    disconnect: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Build a subscription that runs `disconnect` when dropped.
    pub fn new(disconnect: impl FnOnce() + 'static) -> Self {
        Self {
            disconnect: Some(Box::new(disconnect)),
        }
    }

    /// A subscription that is not connected to anything.
    pub fn empty() -> Self {
        Self { disconnect: None }
    }

    /// Disconnect now. Equivalent to dropping the guard.
    pub fn cancel(mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(disconnect) = self.disconnect.take() {
            disconnect();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("connected", &self.disconnect.is_some())
            .finish()
    }
}

type Callback<A> = Rc<RefCell<dyn FnMut(&A)>>;

struct Slot<A: ?Sized> {
    id: u64,
    active: Rc<Cell<bool>>,
    callback: Callback<A>,
}

/// A list of callbacks invoked with `&A` on [`emit`](Signal::emit).
pub struct Signal<A: ?Sized + 'static> {
    slots: Rc<RefCell<Vec<Slot<A>>>>,
    next_id: Cell<u64>,
}

impl<A: ?Sized + 'static> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: ?Sized + 'static> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.borrow().len())
            .finish()
    }
}

impl<A: ?Sized + 'static> Signal<A> {
    /// Create a signal with no slots.
    pub fn new() -> Self {
        Self {
            slots: Rc::new(RefCell::new(Vec::new())),
            next_id: Cell::new(0),
        }
    }

    /// Connect a slot. It stays connected until the returned guard is dropped.
    pub fn connect(&self, slot: impl FnMut(&A) + 'static) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let active = Rc::new(Cell::new(true));
        let callback: Callback<A> = Rc::new(RefCell::new(slot));
        self.slots.borrow_mut().push(Slot {
            id,
            active: Rc::clone(&active),
            callback,
        });

        let slots: Weak<RefCell<Vec<Slot<A>>>> = Rc::downgrade(&self.slots);
        Subscription::new(move || {
            active.set(false);
            if let Some(slots) = slots.upgrade() {
                slots.borrow_mut().retain(|slot| slot.id != id);
            }
        })
    }

    /// Invoke every connected slot with `args`, in connection order.
    ///
    /// Slots connected during the emission are not called until the next one.
    /// Slots disconnected during the emission are skipped.
    pub fn emit(&self, args: &A) {
        let snapshot: Vec<(Rc<Cell<bool>>, Callback<A>)> = self
            .slots
            .borrow()
            .iter()
            .map(|slot| (Rc::clone(&slot.active), Rc::clone(&slot.callback)))
            .collect();

        for (active, callback) in snapshot {
            if !active.get() {
                continue;
            }
            match callback.try_borrow_mut() {
                Ok(mut callback) => (&mut *callback)(args),
                Err(_) => tracing::warn!("skipping re-entrant signal slot"),
            }
        }
    }

    /// Number of connected slots.
    pub fn slot_count(&self) -> usize {
        self.slots.borrow().len()
    }
}
