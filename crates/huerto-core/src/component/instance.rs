use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use super::{
    Component, ComponentType, Context, LifecyclePhase, Link, PendingUpdates, Props, Update,
    UpdateHost,
};
use crate::collections::map::HashMap;
use crate::node::{Key, Ref, VNode};
use crate::scheduler::RenderQueue;
use crate::{InstanceId, NodeId, RenderError};

/// Per-instance cells shared with the instance's [`Link`]s.
#[derive(Default)]
pub(crate) struct InstanceFlags {
    pub(crate) dirty: Cell<bool>,
    pub(crate) forced: Cell<bool>,
    callbacks: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl InstanceFlags {
    pub(crate) fn push_callback(&self, callback: Box<dyn FnOnce()>) {
        self.callbacks.borrow_mut().push(callback);
    }

    pub(crate) fn take_callbacks(&self) -> Vec<Box<dyn FnOnce()>> {
        std::mem::take(&mut *self.callbacks.borrow_mut())
    }
}

/// What a fresh instance needs to build its [`Link`].
pub(crate) struct Spawn {
    pub(crate) id: InstanceId,
    pub(crate) flags: Weak<InstanceFlags>,
    pub(crate) queue: Weak<RenderQueue>,
    pub(crate) host: Weak<dyn UpdateHost>,
}

pub(crate) struct Rendered {
    pub(crate) node: VNode,
    pub(crate) context: Context,
}

/// Type-erased view of an [`Instance`].
pub(crate) trait AnyInstance {
    fn as_any(&self) -> &dyn Any;

    /// Stores new props and context and runs the pre-render hooks.
    fn receive_props(&mut self, props: Props, context: &Context, first_mount: bool);
    /// Applies queued state updates and renders unless `should_update`
    /// vetoes. `None` means the render was skipped.
    fn begin_render(&mut self, is_update: bool, forced: bool) -> Option<Rendered>;
    fn did_mount(&mut self);
    fn did_update(&mut self);
    fn will_unmount(&mut self);
}

struct InFlight<S> {
    previous_props: Props,
    previous_state: S,
    snapshot: Option<Box<dyn Any>>,
}

pub(crate) struct Instance<C: Component> {
    pub(crate) component: C,
    pub(crate) props: Props,
    pub(crate) state: C::State,
    context: Context,
    prev_props: Option<Props>,
    prev_state: Option<C::State>,
    prev_context: Option<Context>,
    pending: Rc<PendingUpdates<C::State>>,
    in_flight: Option<InFlight<C::State>>,
}

pub(super) fn spawn<C: Component>(
    props: &Props,
    context: &Context,
    spawn: Spawn,
) -> Box<dyn AnyInstance> {
    let pending: Rc<PendingUpdates<C::State>> = Rc::new(RefCell::new(Vec::new()));
    let link = Link {
        id: spawn.id,
        flags: spawn.flags,
        pending: Rc::downgrade(&pending),
        queue: spawn.queue,
        host: spawn.host,
        _marker: std::marker::PhantomData,
    };
    let component = C::create(props, context, link);
    let state = component.initial_state(props);
    Box::new(Instance::<C> {
        component,
        props: props.clone(),
        state,
        context: context.clone(),
        prev_props: None,
        prev_state: None,
        prev_context: None,
        pending,
        in_flight: None,
    })
}

impl<C: Component> Instance<C> {
    fn apply_pending(&mut self) {
        let updates = std::mem::take(&mut *self.pending.borrow_mut());
        if updates.is_empty() {
            return;
        }
        if self.prev_state.is_none() {
            self.prev_state = Some(self.state.clone());
        }
        for update in updates {
            update(&mut self.state);
        }
    }
}

impl<C: Component> AnyInstance for Instance<C> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn receive_props(&mut self, props: Props, context: &Context, first_mount: bool) {
        match C::derive_state_from_props(&props, &self.state) {
            Some(derived) => {
                if self.prev_state.is_none() {
                    self.prev_state = Some(std::mem::replace(&mut self.state, derived));
                } else {
                    self.state = derived;
                }
            }
            None if first_mount => self.component.will_mount(&props, &mut self.state),
            None => self
                .component
                .will_receive_props(&props, context, &mut self.state),
        }
        if !context.ptr_eq(&self.context) {
            if self.prev_context.is_none() {
                self.prev_context = Some(self.context.clone());
            }
            self.context = context.clone();
        }
        let previous = std::mem::replace(&mut self.props, props);
        if self.prev_props.is_none() {
            self.prev_props = Some(previous);
        }
    }

    fn begin_render(&mut self, is_update: bool, forced: bool) -> Option<Rendered> {
        self.in_flight = None;
        self.apply_pending();
        let previous_props = self.prev_props.take().unwrap_or_else(|| self.props.clone());
        let previous_state = self.prev_state.take().unwrap_or_else(|| self.state.clone());
        let previous_context = self
            .prev_context
            .take()
            .unwrap_or_else(|| self.context.clone());

        if is_update {
            let update = Update {
                props: &previous_props,
                state: &previous_state,
                context: &previous_context,
                next_props: &self.props,
                next_state: &self.state,
                next_context: &self.context,
            };
            if !forced && !self.component.should_update(&update) {
                return None;
            }
            self.component.will_update(&update);
        }

        let node = self.component.render(&self.props, &self.state, &self.context);
        let context = match self.component.child_context(&self.props, &self.state) {
            Some(extra) => self.context.extend(&extra),
            None => self.context.clone(),
        };
        let snapshot = if is_update {
            self.component
                .snapshot_before_update(&previous_props, &previous_state)
        } else {
            None
        };
        self.in_flight = Some(InFlight {
            previous_props,
            previous_state,
            snapshot,
        });
        Some(Rendered { node, context })
    }

    fn did_mount(&mut self) {
        self.in_flight = None;
        self.component.did_mount(&self.props, &self.state);
    }

    fn did_update(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            self.component.did_update(
                &in_flight.previous_props,
                &in_flight.previous_state,
                in_flight.snapshot.as_deref(),
            );
        }
    }

    fn will_unmount(&mut self) {
        self.component.will_unmount();
    }
}

pub(crate) struct InstanceSlot {
    pub(crate) ty: ComponentType,
    pub(crate) key: Option<Key>,
    pub(crate) node_ref: Option<Ref>,
    pub(crate) base: Option<NodeId>,
    /// Detached live node inherited from a recycled instance.
    pub(crate) next_base: Option<NodeId>,
    /// Nested instance when the render output is itself a component.
    pub(crate) child: Option<InstanceId>,
    pub(crate) parent: Option<InstanceId>,
    pub(crate) flags: Rc<InstanceFlags>,
    pub(crate) disabled: bool,
    pub(crate) phase: LifecyclePhase,
    pub(crate) instance: Box<dyn AnyInstance>,
}

/// Arena of component instances with per-type recycle pools.
pub(crate) struct ComponentRuntime {
    slots: Vec<Option<InstanceSlot>>,
    free: Vec<usize>,
    pools: HashMap<ComponentType, SmallVec<[InstanceId; 4]>>,
    queue: Weak<RenderQueue>,
    host: Weak<dyn UpdateHost>,
    recycle: bool,
    recycle_limit: usize,
}

impl ComponentRuntime {
    pub(crate) fn new(
        queue: Weak<RenderQueue>,
        host: Weak<dyn UpdateHost>,
        recycle: bool,
        recycle_limit: usize,
    ) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            pools: HashMap::default(),
            queue,
            host,
            recycle,
            recycle_limit,
        }
    }

    pub(crate) fn slot(&self, id: InstanceId) -> Result<&InstanceSlot, RenderError> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(RenderError::MissingInstance { id })
    }

    pub(crate) fn slot_mut(&mut self, id: InstanceId) -> Result<&mut InstanceSlot, RenderError> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(RenderError::MissingInstance { id })
    }

    pub(crate) fn key_of(&self, id: InstanceId) -> Option<Key> {
        self.slot(id).ok().and_then(|slot| slot.key.clone())
    }

    pub(crate) fn type_of(&self, id: InstanceId) -> Option<ComponentType> {
        self.slot(id).ok().map(|slot| slot.ty)
    }

    pub(crate) fn parent_of(&self, id: InstanceId) -> Option<InstanceId> {
        self.slot(id).ok().and_then(|slot| slot.parent)
    }

    pub(crate) fn base_of(&self, id: InstanceId) -> Option<NodeId> {
        self.slot(id).ok().and_then(|slot| slot.base)
    }

    /// Number of live (mounted or mounting) instances.
    pub(crate) fn live_count(&self) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|slot| !matches!(slot.phase, LifecyclePhase::Unmounted))
            .count()
    }

    pub(crate) fn pooled_count(&self, ty: ComponentType) -> usize {
        self.pools.get(&ty).map_or(0, SmallVec::len)
    }

    /// Builds a fresh component value. A pooled slot of the same type is
    /// reused together with its detached base, which becomes `next_base`.
    pub(crate) fn create(
        &mut self,
        ty: ComponentType,
        props: &Props,
        context: &Context,
    ) -> InstanceId {
        let pooled = if self.recycle {
            self.pools.get_mut(&ty).and_then(SmallVec::pop)
        } else {
            None
        };
        let (id, next_base) = match pooled {
            Some(id) => {
                let next_base = self.slot_mut(id).ok().and_then(|slot| slot.next_base.take());
                log::debug!("reusing pooled slot {id} for {}", ty.name());
                (id, next_base)
            }
            None => (self.allocate(), None),
        };
        let flags = Rc::new(InstanceFlags::default());
        let instance = ty.spawn(
            props,
            context,
            Spawn {
                id,
                flags: Rc::downgrade(&flags),
                queue: self.queue.clone(),
                host: self.host.clone(),
            },
        );
        self.slots[id.0] = Some(InstanceSlot {
            ty,
            key: None,
            node_ref: None,
            base: None,
            next_base,
            child: None,
            parent: None,
            flags,
            disabled: false,
            phase: LifecyclePhase::Unmounted,
            instance,
        });
        id
    }

    fn allocate(&mut self) -> InstanceId {
        match self.free.pop() {
            Some(index) => InstanceId(index),
            None => {
                self.slots.push(None);
                InstanceId(self.slots.len() - 1)
            }
        }
    }

    /// Parks an unmounted instance with its detached base. Returns `false`
    /// when the pool is full or disabled; the slot is then freed and the
    /// caller owns `base`.
    pub(crate) fn recycle(&mut self, id: InstanceId, base: NodeId) -> bool {
        let Ok(slot) = self.slot_mut(id) else {
            return false;
        };
        let ty = slot.ty;
        slot.phase = LifecyclePhase::Unmounted;
        // Parked slots get fresh flags so outstanding links go quiet.
        slot.flags = Rc::new(InstanceFlags::default());
        if self.recycle {
            let pool = self.pools.entry(ty).or_default();
            if pool.len() < self.recycle_limit {
                if let Ok(slot) = self.slot_mut(id) {
                    slot.next_base = Some(base);
                }
                self.pools.entry(ty).or_default().push(id);
                return true;
            }
        }
        log::debug!("recycle pool for {} full, dropping {id}", ty.name());
        self.release(id);
        false
    }

    pub(crate) fn release(&mut self, id: InstanceId) {
        if let Some(slot) = self.slots.get_mut(id.0) {
            if slot.take().is_some() {
                self.free.push(id.0);
            }
        }
    }
}
