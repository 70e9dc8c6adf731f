//! Observable application state.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

/// Source of state changes a mounted view subscribes to.
pub trait Observable<S> {
    /// Registers `listener`. It runs once right away with the current value
    /// and again after every change until the returned [`Subscription`] is
    /// dropped.
    fn on_change(&self, listener: Box<dyn FnMut(&S)>) -> Subscription;
}

/// Keeps a listener registered. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(unsubscribe: impl FnOnce() + 'static) -> Self {
        Self {
            unsubscribe: Some(Box::new(unsubscribe)),
        }
    }

    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

type SharedListener<S> = Rc<RefCell<Box<dyn FnMut(&S)>>>;

struct StoreInner<S> {
    state: RefCell<S>,
    listeners: RefCell<Vec<(u64, SharedListener<S>)>>,
    next_id: Cell<u64>,
    notifying: Cell<bool>,
    pending: RefCell<VecDeque<Box<dyn FnOnce(&mut S)>>>,
}

/// Single-threaded observable cell. Updates issued while listeners are
/// being notified are queued and applied after the current round.
pub struct Store<S> {
    inner: Rc<StoreInner<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: Clone + 'static> Store<S> {
    pub fn new(initial: S) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                state: RefCell::new(initial),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                notifying: Cell::new(false),
                pending: RefCell::new(VecDeque::new()),
            }),
        }
    }

    pub fn get(&self) -> S {
        self.inner.state.borrow().clone()
    }

    pub fn with<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&*self.inner.state.borrow())
    }

    pub fn update(&self, f: impl FnOnce(&mut S) + 'static) {
        self.inner.pending.borrow_mut().push_back(Box::new(f));
        if self.inner.notifying.get() {
            log::trace!("store update queued during notification");
            return;
        }
        self.drain_pending();
    }

    pub fn replace(&self, value: S) {
        self.update(move |state| *state = value);
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub(crate) fn downgrade(&self) -> WeakStore<S> {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn notify(&self) {
        self.inner.notifying.set(true);
        let snapshot = self.get();
        let listeners: Vec<SharedListener<S>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            match listener.try_borrow_mut() {
                Ok(mut listener) => (&mut *listener)(&snapshot),
                Err(_) => log::warn!("store listener re-entered, skipping"),
            }
        }
        self.inner.notifying.set(false);
    }
}

impl<S: Clone + 'static> Observable<S> for Store<S> {
    fn on_change(&self, listener: Box<dyn FnMut(&S)>) -> Subscription {
        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);
        let listener: SharedListener<S> = Rc::new(RefCell::new(listener));
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::clone(&listener)));

        let snapshot = self.get();
        self.inner.notifying.set(true);
        (&mut *listener.borrow_mut())(&snapshot);
        self.inner.notifying.set(false);
        self.drain_pending();

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.listeners.borrow_mut().retain(|(other, _)| *other != id);
            }
        })
    }
}

impl<S: Clone + 'static> Store<S> {
    fn drain_pending(&self) {
        loop {
            let Some(update) = self.inner.pending.borrow_mut().pop_front() else {
                break;
            };
            update(&mut *self.inner.state.borrow_mut());
            self.notify();
        }
    }
}

impl<S: Default + Clone + 'static> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("state", &*self.inner.state.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

/// Non-owning handle used by setters captured inside the view, so the view
/// does not keep its own store alive.
pub(crate) struct WeakStore<S> {
    inner: Weak<StoreInner<S>>,
}

impl<S> Clone for WeakStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S: Clone + 'static> WeakStore<S> {
    pub(crate) fn upgrade(&self) -> Option<Store<S>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
