//! Stateful components.
//!
//! A component is a node tag backed by user code: it owns props, state and
//! context, renders a [`VNode`] and receives lifecycle hooks. Instances live
//! in an arena owned by the [`Renderer`](crate::Renderer); user code talks to
//! its own instance through a [`Link`].

mod instance;
pub(crate) mod lifecycle;

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::node::{AttrValue, Attributes, Listener, VElement, VNode};
use crate::scheduler::RenderQueue;
use crate::InstanceId;

pub(crate) use instance::{
    AnyInstance, ComponentRuntime, Instance, InstanceFlags, Rendered, Spawn,
};

/// Read-only view over the attributes and children a component was given.
#[derive(Clone, Debug, Default)]
pub struct Props {
    attributes: Attributes,
    children: Vec<VNode>,
}

impl Props {
    pub fn new(attributes: Attributes, children: Vec<VNode>) -> Self {
        Self {
            attributes,
            children,
        }
    }

    pub(crate) fn from_element(element: &VElement) -> Self {
        Self::new(element.attributes.clone(), element.children.clone())
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.attributes.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(AttrValue::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(AttrValue::as_number)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(AttrValue::as_bool)
    }

    pub fn listener(&self, name: &str) -> Option<&Listener> {
        match self.get(name) {
            Some(AttrValue::Listener(listener)) => Some(listener),
            _ => None,
        }
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn children(&self) -> &[VNode] {
        &self.children
    }
}

/// Values inherited by every component below the one that provides them.
#[derive(Clone, Default)]
pub struct Context(Rc<IndexMap<String, Rc<dyn Any>>>);

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<V: Any>(mut self, name: impl Into<String>, value: V) -> Self {
        Rc::make_mut(&mut self.0).insert(name.into(), Rc::new(value));
        self
    }

    pub fn get<V: Any>(&self, name: &str) -> Option<&V> {
        self.0.get(name).and_then(|value| value.downcast_ref::<V>())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries of `self` overridden by the entries of `other`.
    pub fn extend(&self, other: &Context) -> Context {
        if other.is_empty() {
            return self.clone();
        }
        let mut merged = (*self.0).clone();
        for (name, value) in other.0.iter() {
            merged.insert(name.clone(), Rc::clone(value));
        }
        Context(Rc::new(merged))
    }

    pub fn ptr_eq(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}

/// Current and next inputs handed to `should_update` and `will_update`.
pub struct Update<'a, S> {
    pub props: &'a Props,
    pub state: &'a S,
    pub context: &'a Context,
    pub next_props: &'a Props,
    pub next_state: &'a S,
    pub next_context: &'a Context,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LifecyclePhase {
    Unmounted,
    Mounting,
    Mounted,
    Updating,
    Unmounting,
}

/// User-defined component. Only `create` and `render` are required; every
/// hook defaults to doing nothing.
pub trait Component: Sized + 'static {
    type State: Clone + Default + 'static;

    fn create(props: &Props, context: &Context, link: Link<Self>) -> Self;

    fn initial_state(&self, _props: &Props) -> Self::State {
        Self::State::default()
    }

    fn render(&self, props: &Props, state: &Self::State, context: &Context) -> VNode;

    fn will_mount(&mut self, _props: &Props, _state: &mut Self::State) {}

    fn did_mount(&mut self, _props: &Props, _state: &Self::State) {}

    fn will_receive_props(
        &mut self,
        _next_props: &Props,
        _next_context: &Context,
        _state: &mut Self::State,
    ) {
    }

    /// Returning `Some` replaces the state before every render driven by new
    /// props and suppresses `will_mount` and `will_receive_props`.
    fn derive_state_from_props(_props: &Props, _state: &Self::State) -> Option<Self::State> {
        None
    }

    fn should_update(&self, _update: &Update<'_, Self::State>) -> bool {
        true
    }

    fn will_update(&mut self, _update: &Update<'_, Self::State>) {}

    fn snapshot_before_update(
        &self,
        _prev_props: &Props,
        _prev_state: &Self::State,
    ) -> Option<Box<dyn Any>> {
        None
    }

    fn did_update(
        &mut self,
        _prev_props: &Props,
        _prev_state: &Self::State,
        _snapshot: Option<&dyn Any>,
    ) {
    }

    /// Entries added to the context seen by this component's subtree.
    fn child_context(&self, _props: &Props, _state: &Self::State) -> Option<Context> {
        None
    }

    fn will_unmount(&mut self) {}
}

/// Opaque constructor identity of a component type.
#[derive(Copy, Clone)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    spawn: fn(&Props, &Context, Spawn) -> Box<dyn AnyInstance>,
}

impl ComponentType {
    pub fn of<C: Component>() -> Self {
        let full = std::any::type_name::<C>();
        let name = full.rsplit("::").next().unwrap_or(full);
        Self {
            id: TypeId::of::<C>(),
            name,
            spawn: instance::spawn::<C>,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is<C: Component>(&self) -> bool {
        self.id == TypeId::of::<C>()
    }

    pub(crate) fn spawn(&self, props: &Props, context: &Context, spawn: Spawn) -> Box<dyn AnyInstance> {
        (self.spawn)(props, context, spawn)
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl Hash for ComponentType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentType({})", self.name)
    }
}

/// Renderer callback used by [`Link::force_update`].
pub(crate) trait UpdateHost {
    fn force_update(&self, id: InstanceId, flags: &InstanceFlags);
}

pub(crate) type PendingUpdates<S> = RefCell<Vec<Box<dyn FnOnce(&mut S)>>>;

/// Handle a component keeps to its own instance. All operations become
/// no-ops once the instance is gone.
pub struct Link<C: Component> {
    id: InstanceId,
    flags: Weak<InstanceFlags>,
    pending: Weak<PendingUpdates<C::State>>,
    queue: Weak<RenderQueue>,
    host: Weak<dyn UpdateHost>,
    _marker: PhantomData<fn(C)>,
}

impl<C: Component> Clone for Link<C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            flags: self.flags.clone(),
            pending: self.pending.clone(),
            queue: self.queue.clone(),
            host: self.host.clone(),
            _marker: PhantomData,
        }
    }
}

impl<C: Component> Link<C> {
    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn is_alive(&self) -> bool {
        self.flags.strong_count() > 0
    }

    /// Queues `update` and marks the instance dirty. The update is applied
    /// right before the next render of the instance.
    pub fn set_state(&self, update: impl FnOnce(&mut C::State) + 'static) {
        if !self.is_alive() {
            return;
        }
        let Some(pending) = self.pending.upgrade() else {
            return;
        };
        pending.borrow_mut().push(Box::new(update));
        self.enqueue();
    }

    /// Like [`set_state`](Self::set_state); `callback` runs once the update
    /// has been rendered.
    pub fn set_state_then(
        &self,
        update: impl FnOnce(&mut C::State) + 'static,
        callback: impl FnOnce() + 'static,
    ) {
        if let Some(flags) = self.flags.upgrade() {
            flags.push_callback(Box::new(callback));
        }
        self.set_state(update);
    }

    /// Re-renders immediately, bypassing `should_update`. Inside a running
    /// pass the render is queued instead.
    pub fn force_update(&self) {
        let (Some(host), Some(flags)) = (self.host.upgrade(), self.flags.upgrade()) else {
            return;
        };
        host.force_update(self.id, &flags);
    }

    pub fn force_update_then(&self, callback: impl FnOnce() + 'static) {
        if let Some(flags) = self.flags.upgrade() {
            flags.push_callback(Box::new(callback));
        }
        self.force_update();
    }

    fn enqueue(&self) {
        if let (Some(flags), Some(queue)) = (self.flags.upgrade(), self.queue.upgrade()) {
            queue.enqueue(self.id, &flags);
        }
    }
}

impl<C: Component> fmt::Debug for Link<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("id", &self.id)
            .field("alive", &self.is_alive())
            .finish()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum RenderMode {
    /// Props only, the caller renders.
    None,
    Sync,
    /// Bypasses `should_update`.
    Force,
    /// Renders now unless updates are batched through the queue.
    Async,
}
