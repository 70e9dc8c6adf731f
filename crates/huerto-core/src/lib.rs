#![doc = r"Virtual node rendering and reconciliation core for Huerto."]

pub extern crate self as huerto_core;

pub mod app;
pub mod collections;
pub mod component;
mod diff;
mod materialize;
pub mod memory;
pub mod node;
pub mod options;
mod reconcile;
pub mod renderer;
pub mod scheduler;
pub mod store;
pub mod target;

pub use app::{mount, mount_with, App, MountOptions, SetState};
pub use component::{
    Component, ComponentType, Context, LifecyclePhase, Link, Props, Update,
};
pub use diff::{changed, patch};
pub use materialize::materialize;
pub use memory::{MemoryTarget, MutationStats, Snapshot};
pub use node::{
    apply_ref, component, h, text, AttrValue, Attributes, Child, Event, Key, Listener, NodeKind,
    NodeTag, Ref, RefValue, StyleMap, VElement, VNode,
};
pub use options::RenderOptions;
pub use renderer::Renderer;
pub use scheduler::{DefaultScheduler, FlushScheduler, RenderQueue};
pub use store::{Observable, Store, Subscription};
pub use target::{LiveMeta, Namespace, RenderTarget};

pub type NodeId = usize;

/// Slot index of a component instance inside a renderer's instance arena.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct InstanceId(pub(crate) usize);

impl InstanceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    MissingNode { id: NodeId },
    NotAnElement { id: NodeId },
    MissingChild { parent: NodeId, index: usize },
    NotAChild { parent: NodeId, child: NodeId },
    ComponentTag { name: String },
    MissingInstance { id: InstanceId },
    MissingBase { id: InstanceId },
    TypeMismatch { id: InstanceId, expected: &'static str },
    Reentrant,
}

impl std::fmt::Display for RenderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderError::MissingNode { id } => write!(f, "node {id} missing"),
            RenderError::NotAnElement { id } => write!(f, "node {id} is not an element"),
            RenderError::MissingChild { parent, index } => {
                write!(f, "node {parent} has no child at index {index}")
            }
            RenderError::NotAChild { parent, child } => {
                write!(f, "node {child} is not a child of node {parent}")
            }
            RenderError::ComponentTag { name } => {
                write!(f, "component <{name}> cannot be rendered without a renderer")
            }
            RenderError::MissingInstance { id } => write!(f, "component instance {id} missing"),
            RenderError::MissingBase { id } => {
                write!(f, "component instance {id} has no rendered base")
            }
            RenderError::TypeMismatch { id, expected } => {
                write!(f, "component instance {id} type mismatch; expected {expected}")
            }
            RenderError::Reentrant => f.write_str("renderer is already inside a render pass"),
        }
    }
}

impl std::error::Error for RenderError {}

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod node_tests;

#[cfg(test)]
#[path = "tests/diff_tests.rs"]
mod diff_tests;

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod reconcile_tests;

#[cfg(test)]
#[path = "tests/component_tests.rs"]
mod component_tests;

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod app_tests;
