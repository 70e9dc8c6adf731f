//! Render target abstraction.
//!
//! A render target owns the live tree. The differ only ever talks to it
//! through [`RenderTarget`], so any retained-mode tree (a DOM binding, a
//! terminal widget tree, the bundled [`MemoryTarget`](crate::MemoryTarget))
//! can host a renderer.

use std::any::Any;
use std::rc::Rc;

use crate::component::ComponentType;
use crate::node::{AttrValue, Attributes, Key, Listener, Ref};
use crate::{InstanceId, NodeId, RenderError};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

/// Engine bookkeeping attached to every live node.
#[derive(Clone, Debug, Default)]
pub struct LiveMeta {
    /// The attribute cache is valid. Nodes created outside the engine start
    /// unmanaged and are seeded from their live attributes on first diff.
    pub managed: bool,
    pub attrs: Attributes,
    pub key: Option<Key>,
    pub node_ref: Option<Ref>,
    /// Outermost component instance whose base this node is.
    pub component: Option<InstanceId>,
    pub component_type: Option<ComponentType>,
}

pub trait RenderTarget: Any {
    /// Container every renderer-managed tree hangs off.
    fn root(&self) -> NodeId;

    fn contains(&self, id: NodeId) -> bool;
    fn create_element(&mut self, tag: &str, namespace: Namespace) -> NodeId;
    fn create_text(&mut self, text: &str) -> NodeId;

    /// Tag name of an element, `None` for text nodes.
    fn tag(&self, id: NodeId) -> Result<Option<Rc<str>>, RenderError>;
    fn namespace(&self, id: NodeId) -> Result<Option<Namespace>, RenderError>;
    /// Content of a text node, `None` for elements.
    fn text(&self, id: NodeId) -> Result<Option<String>, RenderError>;
    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), RenderError>;

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, RenderError>;
    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, RenderError>;
    fn next_sibling(&self, id: NodeId) -> Result<Option<NodeId>, RenderError>;

    /// Moves `child` under `parent`, before `before` or at the end. A child
    /// that is attached elsewhere is detached first.
    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), RenderError>;
    /// Detaches a node from its parent. Detached nodes are left untouched.
    fn remove(&mut self, id: NodeId) -> Result<(), RenderError>;
    /// Puts `new` in the position of `old`. Detached `old` nodes are left
    /// untouched.
    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), RenderError>;
    /// Frees a node and everything still attached below it.
    fn release(&mut self, id: NodeId) -> Result<(), RenderError>;

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), RenderError>;
    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), RenderError>;
    fn attribute(&self, id: NodeId, name: &str) -> Result<Option<String>, RenderError>;
    fn attribute_names(&self, id: NodeId) -> Result<Vec<String>, RenderError>;

    /// Live properties (`value`, `checked`, `selected`) whose current value
    /// may diverge from the last rendered attribute.
    fn set_property(&mut self, id: NodeId, name: &str, value: AttrValue)
        -> Result<(), RenderError>;
    fn property(&self, id: NodeId, name: &str) -> Result<Option<AttrValue>, RenderError>;

    fn set_class(&mut self, id: NodeId, class: &str) -> Result<(), RenderError>;
    fn set_style_property(
        &mut self,
        id: NodeId,
        property: &str,
        value: &str,
    ) -> Result<(), RenderError>;
    fn remove_style_property(&mut self, id: NodeId, property: &str) -> Result<(), RenderError>;
    /// Replaces the whole inline style with a declaration string.
    fn set_style_text(&mut self, id: NodeId, css: &str) -> Result<(), RenderError>;

    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        listener: Listener,
        capture: bool,
    ) -> Result<(), RenderError>;
    fn remove_listener(&mut self, id: NodeId, event: &str, capture: bool)
        -> Result<(), RenderError>;
    fn listener(
        &self,
        id: NodeId,
        event: &str,
        capture: bool,
    ) -> Result<Option<Listener>, RenderError>;

    fn meta(&self, id: NodeId) -> Result<&LiveMeta, RenderError>;
    fn meta_mut(&mut self, id: NodeId) -> Result<&mut LiveMeta, RenderError>;

    fn is_text(&self, id: NodeId) -> Result<bool, RenderError> {
        Ok(self.tag(id)?.is_none())
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Result<Option<NodeId>, RenderError> {
        Ok(self.children(parent)?.get(index).copied())
    }

    fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), RenderError> {
        self.insert_before(parent, child, None)
    }

    fn as_any(&self) -> &dyn Any
    where
        Self: Sized,
    {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any
    where
        Self: Sized,
    {
        self
    }
}
