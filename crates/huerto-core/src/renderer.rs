//! Renderer: owns a render target, the component instances rendered into it
//! and the queue of pending component updates.

use std::cell::{self, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use crate::component::{
    Component, ComponentRuntime, ComponentType, Context, Instance, InstanceFlags,
    LifecyclePhase, RenderMode, UpdateHost,
};
use crate::diff;
use crate::materialize;
use crate::node::{Event, VNode};
use crate::options::RenderOptions;
use crate::reconcile::Reconciler;
use crate::scheduler::{DefaultScheduler, FlushScheduler, RenderQueue};
use crate::target::RenderTarget;
use crate::{InstanceId, NodeId, RenderError};

struct RendererInner<T: RenderTarget> {
    target: RefCell<T>,
    components: RefCell<ComponentRuntime>,
    queue: Rc<RenderQueue>,
    options: RenderOptions,
    /// Failure of a render started by `Link::force_update`, reported by the
    /// next `flush`.
    deferred_error: RefCell<Option<RenderError>>,
}

impl<T: RenderTarget> RendererInner<T> {
    fn with_pass<R>(
        &self,
        f: impl FnOnce(&mut Reconciler<'_, T>) -> Result<R, RenderError>,
    ) -> Result<R, RenderError> {
        let mut target = self
            .target
            .try_borrow_mut()
            .map_err(|_| RenderError::Reentrant)?;
        let mut components = self
            .components
            .try_borrow_mut()
            .map_err(|_| RenderError::Reentrant)?;
        let mut reconciler =
            Reconciler::new(&mut *target, &mut *components, &self.queue, &self.options);
        f(&mut reconciler)
    }
}

impl<T: RenderTarget> UpdateHost for RendererInner<T> {
    fn force_update(&self, id: InstanceId, flags: &InstanceFlags) {
        let result =
            self.with_pass(|pass| pass.render_component(id, RenderMode::Force, false, false));
        match result {
            Ok(()) => {}
            Err(RenderError::Reentrant) => {
                log::debug!("force update of {id} during a pass, queueing");
                flags.forced.set(true);
                self.queue.enqueue(id, flags);
            }
            Err(err) => {
                log::error!("force update of {id} failed: {err}");
                *self.deferred_error.borrow_mut() = Some(err);
            }
        }
    }
}

/// Entry point of the engine. Cloning a `Renderer` yields another handle to
/// the same target and instances.
pub struct Renderer<T: RenderTarget> {
    inner: Rc<RendererInner<T>>,
}

impl<T: RenderTarget> Clone for Renderer<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: RenderTarget> Renderer<T> {
    pub fn new(target: T) -> Self {
        Self::with_scheduler(target, Arc::new(DefaultScheduler))
    }

    pub fn with_scheduler(target: T, scheduler: Arc<dyn FlushScheduler>) -> Self {
        Self::with_options(target, scheduler, RenderOptions::default())
    }

    pub fn with_options(
        target: T,
        scheduler: Arc<dyn FlushScheduler>,
        options: RenderOptions,
    ) -> Self {
        let queue = Rc::new(RenderQueue::new(scheduler));
        let inner = Rc::new_cyclic(|weak: &std::rc::Weak<RendererInner<T>>| {
            let host: std::rc::Weak<dyn UpdateHost> = weak.clone();
            RendererInner {
                target: RefCell::new(target),
                components: RefCell::new(ComponentRuntime::new(
                    Rc::downgrade(&queue),
                    host,
                    options.recycle,
                    options.recycle_limit,
                )),
                queue: Rc::clone(&queue),
                options,
                deferred_error: RefCell::new(None),
            }
        });
        Self { inner }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.inner.options
    }

    /// Root container of the target.
    pub fn root(&self) -> NodeId {
        self.inner.target.borrow().root()
    }

    /// Diffs `node` against `existing` (or builds it) and makes sure the
    /// result is a child of `parent`. Returns the live root of the tree.
    pub fn render(
        &self,
        node: &VNode,
        parent: NodeId,
        existing: Option<NodeId>,
    ) -> Result<NodeId, RenderError> {
        self.inner.with_pass(|pass| {
            pass.diff(existing, node, &Context::default(), false, Some(parent), false)
        })
    }

    /// Positional patch of the child of `parent` at `index`.
    pub fn patch(
        &self,
        parent: NodeId,
        old: Option<&VNode>,
        new: Option<&VNode>,
        index: usize,
    ) -> Result<(), RenderError> {
        let mut target = self
            .inner
            .target
            .try_borrow_mut()
            .map_err(|_| RenderError::Reentrant)?;
        diff::patch(&mut *target, parent, old, new, index)
    }

    /// Builds a detached live subtree for `node`.
    pub fn materialize(&self, node: &VNode) -> Result<NodeId, RenderError> {
        let mut target = self
            .inner
            .target
            .try_borrow_mut()
            .map_err(|_| RenderError::Reentrant)?;
        materialize::materialize(&mut *target, node)
    }

    /// Re-renders every dirty instance, most recently queued first. Returns
    /// how many instances were rendered.
    pub fn flush(&self) -> Result<usize, RenderError> {
        if let Some(err) = self.inner.deferred_error.borrow_mut().take() {
            return Err(err);
        }
        let mut rendered = 0;
        while let Some(id) = self.inner.queue.pop() {
            let renderable = self
                .inner
                .components
                .try_borrow()
                .map_err(|_| {
                    log::warn!("flush attempted during a render pass");
                    RenderError::Reentrant
                })?
                .slot(id)
                .is_ok_and(|slot| {
                    slot.flags.dirty.get()
                        && !slot.disabled
                        && !matches!(slot.phase, LifecyclePhase::Unmounted)
                });
            if !renderable {
                continue;
            }
            self.inner
                .with_pass(|pass| pass.render_component(id, RenderMode::Async, false, false))?;
            rendered += 1;
        }
        if rendered > 0 {
            log::debug!("flushed {rendered} component update(s)");
        }
        Ok(rendered)
    }

    pub fn has_pending(&self) -> bool {
        !self.inner.queue.is_empty()
    }

    /// Tears down the tree rooted at `root`: components are unmounted, refs
    /// cleared and the live nodes released.
    pub fn unmount(&self, root: NodeId) -> Result<(), RenderError> {
        self.inner.with_pass(|pass| pass.recollect(root, false))
    }

    /// Delivers `event` to the listeners registered for `event.name` along
    /// the path from the root to `node`: capture listeners top-down, then
    /// bubble listeners bottom-up. Returns how many listeners ran.
    pub fn dispatch(&self, node: NodeId, event: Event) -> Result<usize, RenderError> {
        let listeners = {
            let target = self
                .inner
                .target
                .try_borrow()
                .map_err(|_| RenderError::Reentrant)?;
            let mut path = vec![node];
            let mut current = node;
            while let Some(parent) = target.parent(current)? {
                path.push(parent);
                current = parent;
            }
            let mut listeners = Vec::new();
            for &id in path.iter().rev() {
                if let Some(listener) = target.listener(id, &event.name, true)? {
                    listeners.push(listener);
                }
            }
            for &id in &path {
                if let Some(listener) = target.listener(id, &event.name, false)? {
                    listeners.push(listener);
                }
            }
            listeners
        };
        for listener in &listeners {
            listener.call(&event);
        }
        Ok(listeners.len())
    }

    pub fn target(&self) -> cell::Ref<'_, T> {
        self.inner.target.borrow()
    }

    pub fn target_mut(&self) -> cell::RefMut<'_, T> {
        self.inner.target.borrow_mut()
    }

    /// Instance whose base is `node`, if any.
    pub fn component_at(&self, node: NodeId) -> Result<Option<InstanceId>, RenderError> {
        Ok(self.inner.target.borrow().meta(node)?.component)
    }

    pub fn lifecycle(&self, id: InstanceId) -> Option<LifecyclePhase> {
        self.inner
            .components
            .borrow()
            .slot(id)
            .ok()
            .map(|slot| slot.phase)
    }

    /// Number of instances that are currently mounted or mounting.
    pub fn live_components(&self) -> usize {
        self.inner.components.borrow().live_count()
    }

    pub fn pooled_components<C: Component>(&self) -> usize {
        self.inner
            .components
            .borrow()
            .pooled_count(ComponentType::of::<C>())
    }

    /// Runs `f` against a typed component instance and its current state.
    pub fn with_component<C: Component, R>(
        &self,
        id: InstanceId,
        f: impl FnOnce(&C, &C::State) -> R,
    ) -> Result<R, RenderError> {
        let components = self
            .inner
            .components
            .try_borrow()
            .map_err(|_| RenderError::Reentrant)?;
        let slot = components.slot(id)?;
        let instance = slot
            .instance
            .as_any()
            .downcast_ref::<Instance<C>>()
            .ok_or(RenderError::TypeMismatch {
                id,
                expected: std::any::type_name::<C>(),
            })?;
        Ok(f(&instance.component, &instance.state))
    }
}

impl<T: RenderTarget + Default> Default for Renderer<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

#[cfg(test)]
#[path = "tests/renderer_tests.rs"]
mod tests;
