//! `mount`: binds a view function and an observable state to a target.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::node::{Event, VNode};
use crate::renderer::Renderer;
use crate::store::{Observable, Store, Subscription, WeakStore};
use crate::target::RenderTarget;
use crate::{NodeId, RenderError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MountOptions {
    /// Reconcile through the keyed differ instead of the positional one.
    pub keyed: bool,
    /// Defer re-renders caused by state changes until [`App::flush`].
    pub batched: bool,
}

#[derive(Default)]
struct AppShared {
    root: Cell<Option<NodeId>>,
    last: RefCell<Option<VNode>>,
    error: RefCell<Option<RenderError>>,
    mounted: Cell<bool>,
    pending: Cell<bool>,
}

impl AppShared {
    fn take_error(&self) -> Result<(), RenderError> {
        match self.error.borrow_mut().take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// State setter handed to the view. Every change re-renders the view
/// (immediately, or on the next [`App::flush`] when batched).
pub struct SetState<S> {
    store: WeakStore<S>,
    shared: Weak<AppShared>,
}

impl<S> Clone for SetState<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<S: Clone + 'static> SetState<S> {
    /// Applies `f` to the state and returns the error of the re-render it
    /// triggered, if any.
    pub fn update(&self, f: impl FnOnce(&mut S) + 'static) -> Result<(), RenderError> {
        let Some(store) = self.store.upgrade() else {
            return Ok(());
        };
        store.update(f);
        match self.shared.upgrade() {
            Some(shared) => shared.take_error(),
            None => Ok(()),
        }
    }

    pub fn replace(&self, value: S) -> Result<(), RenderError> {
        self.update(move |state| *state = value)
    }
}

impl<S> fmt::Debug for SetState<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("mounted", &(self.shared.strong_count() > 0))
            .finish()
    }
}

type View<S> = Rc<dyn Fn(&S, &SetState<S>) -> VNode>;

/// A mounted view.
pub struct App<T: RenderTarget, S: Clone + 'static> {
    renderer: Renderer<T>,
    store: Store<S>,
    setter: SetState<S>,
    shared: Rc<AppShared>,
    view: View<S>,
    options: MountOptions,
    subscription: Option<Subscription>,
}

/// Renders `view(initial_state)` into the root of `target` and keeps it in
/// sync with the state.
pub fn mount<T, S, V>(
    target: T,
    view: V,
    initial_state: S,
    options: MountOptions,
) -> Result<App<T, S>, RenderError>
where
    T: RenderTarget,
    S: Clone + 'static,
    V: Fn(&S, &SetState<S>) -> VNode + 'static,
{
    mount_with(Renderer::new(target), view, initial_state, options)
}

/// [`mount`] with a preconfigured renderer (scheduler, options).
pub fn mount_with<T, S, V>(
    renderer: Renderer<T>,
    view: V,
    initial_state: S,
    options: MountOptions,
) -> Result<App<T, S>, RenderError>
where
    T: RenderTarget,
    S: Clone + 'static,
    V: Fn(&S, &SetState<S>) -> VNode + 'static,
{
    let store = Store::new(initial_state);
    let shared = Rc::new(AppShared::default());
    let setter = SetState {
        store: store.downgrade(),
        shared: Rc::downgrade(&shared),
    };
    let view: View<S> = Rc::new(view);

    let listener = {
        let renderer = renderer.clone();
        let shared = Rc::clone(&shared);
        let view = Rc::clone(&view);
        let setter = setter.clone();
        move |state: &S| {
            if options.batched && shared.mounted.get() {
                log::trace!("state change batched until flush");
                shared.pending.set(true);
                return;
            }
            render_view(&renderer, &shared, &*view, &setter, state, options.keyed);
        }
    };
    let subscription = store.on_change(Box::new(listener));
    shared.take_error()?;
    shared.mounted.set(true);
    log::debug!(
        "mounted view (keyed {}, batched {})",
        options.keyed,
        options.batched
    );

    Ok(App {
        renderer,
        store,
        setter,
        shared,
        view,
        options,
        subscription: Some(subscription),
    })
}

fn render_view<T: RenderTarget, S>(
    renderer: &Renderer<T>,
    shared: &AppShared,
    view: &dyn Fn(&S, &SetState<S>) -> VNode,
    setter: &SetState<S>,
    state: &S,
    keyed: bool,
) {
    let node = view(state, setter);
    let root = renderer.root();
    let result = if keyed {
        renderer.render(&node, root, shared.root.get())
    } else {
        let last = shared.last.borrow().clone();
        renderer
            .patch(root, last.as_ref(), Some(&node), 0)
            .and_then(|()| {
                renderer
                    .target()
                    .child_at(root, 0)?
                    .ok_or(RenderError::MissingChild { parent: root, index: 0 })
            })
    };
    match result {
        Ok(live) => {
            shared.root.set(Some(live));
            *shared.last.borrow_mut() = Some(node);
        }
        Err(err) => {
            log::error!("view render failed: {err}");
            *shared.error.borrow_mut() = Some(err);
        }
    }
}

impl<T: RenderTarget, S: Clone + 'static> App<T, S> {
    pub fn renderer(&self) -> &Renderer<T> {
        &self.renderer
    }

    /// Live node the view currently renders to.
    pub fn root_node(&self) -> Option<NodeId> {
        self.shared.root.get()
    }

    pub fn state(&self) -> S {
        self.store.get()
    }

    pub fn store(&self) -> &Store<S> {
        &self.store
    }

    pub fn set_state(&self) -> SetState<S> {
        self.setter.clone()
    }

    pub fn has_pending(&self) -> bool {
        self.shared.pending.get() || self.renderer.has_pending()
    }

    /// Renders a batched state change and any queued component updates.
    /// Returns whether anything was rendered.
    pub fn flush(&self) -> Result<bool, RenderError> {
        let mut progressed = false;
        if self.shared.pending.replace(false) {
            let state = self.store.get();
            render_view(
                &self.renderer,
                &self.shared,
                &*self.view,
                &self.setter,
                &state,
                self.options.keyed,
            );
            self.shared.take_error()?;
            progressed = true;
        }
        progressed |= self.renderer.flush()? > 0;
        Ok(progressed)
    }

    /// Dispatches an event through the renderer and reports any render error
    /// raised by the handlers.
    pub fn dispatch(&self, node: NodeId, event: Event) -> Result<usize, RenderError> {
        let handled = self.renderer.dispatch(node, event)?;
        self.shared.take_error()?;
        Ok(handled)
    }

    /// Stops listening to state changes and tears the rendered tree down.
    pub fn unmount(mut self) -> Result<(), RenderError> {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        match self.shared.root.take() {
            Some(root) => self.renderer.unmount(root),
            None => Ok(()),
        }
    }
}
