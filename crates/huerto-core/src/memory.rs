//! In-memory render target used by tests, benches and headless hosts.

use std::collections::BTreeMap;
use std::rc::Rc;

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::collections::map::HashMap;
use crate::node::{style_text, AttrValue, Listener, StyleMap};
use crate::target::{LiveMeta, Namespace, RenderTarget};
use crate::{NodeId, RenderError};

/// Counters for every mutation a [`MemoryTarget`] has applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationStats {
    pub created: usize,
    pub inserted: usize,
    pub removed: usize,
    pub replaced: usize,
    pub released: usize,
    pub text_updates: usize,
    pub attribute_updates: usize,
    pub style_updates: usize,
    pub listener_updates: usize,
}

impl MutationStats {
    /// Mutations that change the shape of the tree.
    pub fn structural(&self) -> usize {
        self.created + self.inserted + self.removed + self.replaced
    }

    pub fn total(&self) -> usize {
        self.structural()
            + self.text_updates
            + self.attribute_updates
            + self.style_updates
            + self.listener_updates
    }
}

/// Plain-data copy of a live subtree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Snapshot {
    Text(String),
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<Snapshot>,
    },
}

impl Snapshot {
    pub fn tag(&self) -> Option<&str> {
        match self {
            Snapshot::Element { tag, .. } => Some(tag),
            Snapshot::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[Snapshot] {
        match self {
            Snapshot::Element { children, .. } => children,
            Snapshot::Text(_) => &[],
        }
    }

    pub fn text_content(&self) -> String {
        match self {
            Snapshot::Text(text) => text.clone(),
            Snapshot::Element { children, .. } => {
                children.iter().map(Snapshot::text_content).collect()
            }
        }
    }
}

enum MemoryNodeKind {
    Element { tag: Rc<str>, namespace: Namespace },
    Text(String),
}

struct ListenerEntry {
    event: String,
    capture: bool,
    listener: Listener,
}

struct MemoryNode {
    kind: MemoryNodeKind,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    attributes: IndexMap<String, String>,
    properties: IndexMap<String, AttrValue>,
    class: Option<String>,
    style: StyleMap,
    listeners: SmallVec<[ListenerEntry; 2]>,
    markers: HashMap<String, String>,
    meta: LiveMeta,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            parent: None,
            children: Vec::new(),
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
            class: None,
            style: StyleMap::new(),
            listeners: SmallVec::new(),
            markers: HashMap::default(),
            meta: LiveMeta::default(),
        }
    }

    fn is_element(&self) -> bool {
        matches!(self.kind, MemoryNodeKind::Element { .. })
    }
}

/// Arena-backed tree. Node ids are never reused, so a stale id always
/// reports [`RenderError::MissingNode`].
pub struct MemoryTarget {
    nodes: Vec<Option<MemoryNode>>,
    root: NodeId,
    stats: MutationStats,
}

impl MemoryTarget {
    pub fn new() -> Self {
        let mut root = MemoryNode::new(MemoryNodeKind::Element {
            tag: Rc::from("root"),
            namespace: Namespace::Html,
        });
        root.meta.managed = true;
        Self {
            nodes: vec![Some(root)],
            root: 0,
            stats: MutationStats::default(),
        }
    }

    /// Number of live (not released) nodes, the root included.
    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> MutationStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = MutationStats::default();
    }

    /// Attaches an arbitrary marker to a live node. Markers are invisible to
    /// the renderer and survive as long as the node does.
    pub fn set_marker(
        &mut self,
        id: NodeId,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), RenderError> {
        self.node_mut(id)?.markers.insert(name.to_string(), value.into());
        Ok(())
    }

    pub fn marker(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id).ok()?.markers.get(name).map(String::as_str)
    }

    pub fn class(&self, id: NodeId) -> Option<&str> {
        self.node(id).ok()?.class.as_deref()
    }

    pub fn style(&self, id: NodeId) -> Option<&StyleMap> {
        self.node(id).ok().map(|node| &node.style)
    }

    pub fn listener_count(&self, id: NodeId) -> usize {
        self.node(id).map_or(0, |node| node.listeners.len())
    }

    /// Concatenated text of every text node below `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Ok(node) = self.node(id) else {
            return;
        };
        match &node.kind {
            MemoryNodeKind::Text(text) => out.push_str(text),
            MemoryNodeKind::Element { .. } => {
                for &child in &node.children {
                    self.collect_text(child, out);
                }
            }
        }
    }

    /// First element with tag `tag` in depth-first order, `from` included.
    pub fn find_first(&self, from: NodeId, tag: &str) -> Option<NodeId> {
        let node = self.node(from).ok()?;
        if let MemoryNodeKind::Element { tag: own, .. } = &node.kind {
            if own.eq_ignore_ascii_case(tag) {
                return Some(from);
            }
        }
        node.children
            .iter()
            .find_map(|&child| self.find_first(child, tag))
    }

    /// Elements with tag `tag` below `from`, in depth-first order.
    pub fn find_all(&self, from: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        self.collect_tagged(from, tag, &mut found);
        found
    }

    fn collect_tagged(&self, id: NodeId, tag: &str, found: &mut Vec<NodeId>) {
        let Ok(node) = self.node(id) else {
            return;
        };
        if let MemoryNodeKind::Element { tag: own, .. } = &node.kind {
            if own.eq_ignore_ascii_case(tag) {
                found.push(id);
            }
        }
        for &child in &node.children {
            self.collect_tagged(child, tag, found);
        }
    }

    pub fn snapshot(&self, id: NodeId) -> Result<Snapshot, RenderError> {
        let node = self.node(id)?;
        match &node.kind {
            MemoryNodeKind::Text(text) => Ok(Snapshot::Text(text.clone())),
            MemoryNodeKind::Element { tag, .. } => {
                let mut attributes: BTreeMap<String, String> = node
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect();
                for (name, value) in &node.properties {
                    attributes.insert(name.clone(), value.normalized().into_owned());
                }
                if let Some(class) = node.class.as_ref().filter(|c| !c.is_empty()) {
                    attributes.insert("class".to_string(), class.clone());
                }
                if !node.style.is_empty() {
                    attributes.insert("style".to_string(), style_text(&node.style));
                }
                let children = node
                    .children
                    .iter()
                    .map(|&child| self.snapshot(child))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Snapshot::Element {
                    tag: tag.to_string(),
                    attributes,
                    children,
                })
            }
        }
    }

    pub fn dump_tree(&self, root: Option<NodeId>) -> String {
        let mut output = String::new();
        if let Some(root_id) = root {
            self.dump_node(&mut output, root_id, 0);
        } else {
            output.push_str("(no root)\n");
        }
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.nodes.get(id) {
            Some(Some(node)) => {
                match &node.kind {
                    MemoryNodeKind::Text(text) => {
                        output.push_str(&format!("{indent}[{id}] {text:?}\n"));
                    }
                    MemoryNodeKind::Element { tag, .. } => {
                        output.push_str(&format!("{indent}[{id}] <{tag}"));
                        for (name, value) in &node.attributes {
                            output.push_str(&format!(" {name}={value:?}"));
                        }
                        if let Some(class) = &node.class {
                            output.push_str(&format!(" class={class:?}"));
                        }
                        if !node.style.is_empty() {
                            output.push_str(&format!(" style={:?}", style_text(&node.style)));
                        }
                        output.push_str(">\n");
                    }
                }
                for &child in &node.children {
                    self.dump_node(output, child, depth + 1);
                }
            }
            _ => output.push_str(&format!("{indent}[{id}] (missing)\n")),
        }
    }

    fn node(&self, id: NodeId) -> Result<&MemoryNode, RenderError> {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .ok_or(RenderError::MissingNode { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, RenderError> {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .ok_or(RenderError::MissingNode { id })
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, RenderError> {
        let node = self.node_mut(id)?;
        if node.is_element() {
            Ok(node)
        } else {
            Err(RenderError::NotAnElement { id })
        }
    }

    fn push(&mut self, node: MemoryNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Some(node));
        self.stats.created += 1;
        id
    }

    fn detach(&mut self, id: NodeId) -> Result<bool, RenderError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(false);
        };
        let siblings = &mut self.node_mut(parent)?.children;
        siblings.retain(|&child| child != id);
        self.node_mut(id)?.parent = None;
        Ok(true)
    }

    fn free(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get_mut(id).and_then(Option::take) else {
            return;
        };
        self.stats.released += 1;
        for child in node.children {
            self.free(child);
        }
    }
}

impl Default for MemoryTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTarget for MemoryTarget {
    fn root(&self) -> NodeId {
        self.root
    }

    fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_ok()
    }

    fn create_element(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        self.push(MemoryNode::new(MemoryNodeKind::Element {
            tag: Rc::from(tag),
            namespace,
        }))
    }

    fn create_text(&mut self, text: &str) -> NodeId {
        self.push(MemoryNode::new(MemoryNodeKind::Text(text.to_string())))
    }

    fn tag(&self, id: NodeId) -> Result<Option<Rc<str>>, RenderError> {
        Ok(match &self.node(id)?.kind {
            MemoryNodeKind::Element { tag, .. } => Some(Rc::clone(tag)),
            MemoryNodeKind::Text(_) => None,
        })
    }

    fn namespace(&self, id: NodeId) -> Result<Option<Namespace>, RenderError> {
        Ok(match &self.node(id)?.kind {
            MemoryNodeKind::Element { namespace, .. } => Some(*namespace),
            MemoryNodeKind::Text(_) => None,
        })
    }

    fn text(&self, id: NodeId) -> Result<Option<String>, RenderError> {
        Ok(match &self.node(id)?.kind {
            MemoryNodeKind::Text(text) => Some(text.clone()),
            MemoryNodeKind::Element { .. } => None,
        })
    }

    fn set_text(&mut self, id: NodeId, text: &str) -> Result<(), RenderError> {
        match &mut self.node_mut(id)?.kind {
            MemoryNodeKind::Text(current) => {
                current.clear();
                current.push_str(text);
            }
            MemoryNodeKind::Element { .. } => return Err(RenderError::NotAnElement { id }),
        }
        self.stats.text_updates += 1;
        Ok(())
    }

    fn parent(&self, id: NodeId) -> Result<Option<NodeId>, RenderError> {
        Ok(self.node(id)?.parent)
    }

    fn children(&self, id: NodeId) -> Result<Vec<NodeId>, RenderError> {
        Ok(self.node(id)?.children.clone())
    }

    fn child_at(&self, parent: NodeId, index: usize) -> Result<Option<NodeId>, RenderError> {
        Ok(self.node(parent)?.children.get(index).copied())
    }

    fn next_sibling(&self, id: NodeId) -> Result<Option<NodeId>, RenderError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        let siblings = &self.node(parent)?.children;
        Ok(siblings
            .iter()
            .position(|&child| child == id)
            .and_then(|index| siblings.get(index + 1).copied()))
    }

    fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<(), RenderError> {
        self.element_mut(parent)?;
        self.node(child)?;
        self.detach(child)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = match before {
            Some(before) => siblings
                .iter()
                .position(|&id| id == before)
                .ok_or(RenderError::NotAChild {
                    parent,
                    child: before,
                })?,
            None => siblings.len(),
        };
        siblings.insert(index, child);
        self.node_mut(child)?.parent = Some(parent);
        self.stats.inserted += 1;
        Ok(())
    }

    fn remove(&mut self, id: NodeId) -> Result<(), RenderError> {
        if self.detach(id)? {
            self.stats.removed += 1;
        }
        Ok(())
    }

    fn replace(&mut self, old: NodeId, new: NodeId) -> Result<(), RenderError> {
        self.node(new)?;
        let Some(parent) = self.node(old)?.parent else {
            return Ok(());
        };
        self.detach(new)?;
        let siblings = &mut self.node_mut(parent)?.children;
        let index = siblings
            .iter()
            .position(|&id| id == old)
            .ok_or(RenderError::NotAChild { parent, child: old })?;
        siblings[index] = new;
        self.node_mut(old)?.parent = None;
        self.node_mut(new)?.parent = Some(parent);
        self.stats.replaced += 1;
        Ok(())
    }

    fn release(&mut self, id: NodeId) -> Result<(), RenderError> {
        self.detach(id)?;
        self.free(id);
        Ok(())
    }

    fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<(), RenderError> {
        self.element_mut(id)?
            .attributes
            .insert(name.to_string(), value.to_string());
        self.stats.attribute_updates += 1;
        Ok(())
    }

    fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<(), RenderError> {
        let node = self.element_mut(id)?;
        let removed = node.attributes.shift_remove(name).is_some()
            | node.properties.shift_remove(name).is_some();
        if removed {
            self.stats.attribute_updates += 1;
        }
        Ok(())
    }

    fn attribute(&self, id: NodeId, name: &str) -> Result<Option<String>, RenderError> {
        Ok(self.node(id)?.attributes.get(name).cloned())
    }

    fn attribute_names(&self, id: NodeId) -> Result<Vec<String>, RenderError> {
        Ok(self.node(id)?.attributes.keys().cloned().collect())
    }

    fn set_property(
        &mut self,
        id: NodeId,
        name: &str,
        value: AttrValue,
    ) -> Result<(), RenderError> {
        self.element_mut(id)?
            .properties
            .insert(name.to_string(), value);
        self.stats.attribute_updates += 1;
        Ok(())
    }

    fn property(&self, id: NodeId, name: &str) -> Result<Option<AttrValue>, RenderError> {
        Ok(self.node(id)?.properties.get(name).cloned())
    }

    fn set_class(&mut self, id: NodeId, class: &str) -> Result<(), RenderError> {
        self.element_mut(id)?.class = Some(class.to_string());
        self.stats.attribute_updates += 1;
        Ok(())
    }

    fn set_style_property(
        &mut self,
        id: NodeId,
        property: &str,
        value: &str,
    ) -> Result<(), RenderError> {
        self.element_mut(id)?
            .style
            .insert(property.to_string(), value.to_string());
        self.stats.style_updates += 1;
        Ok(())
    }

    fn remove_style_property(&mut self, id: NodeId, property: &str) -> Result<(), RenderError> {
        if self.element_mut(id)?.style.shift_remove(property).is_some() {
            self.stats.style_updates += 1;
        }
        Ok(())
    }

    fn set_style_text(&mut self, id: NodeId, css: &str) -> Result<(), RenderError> {
        let style = &mut self.element_mut(id)?.style;
        style.clear();
        for declaration in css.split(';') {
            if let Some((property, value)) = declaration.split_once(':') {
                let property = property.trim();
                if !property.is_empty() {
                    style.insert(property.to_string(), value.trim().to_string());
                }
            }
        }
        self.stats.style_updates += 1;
        Ok(())
    }

    fn add_listener(
        &mut self,
        id: NodeId,
        event: &str,
        listener: Listener,
        capture: bool,
    ) -> Result<(), RenderError> {
        let listeners = &mut self.element_mut(id)?.listeners;
        match listeners
            .iter_mut()
            .find(|entry| entry.event == event && entry.capture == capture)
        {
            Some(entry) => entry.listener = listener,
            None => listeners.push(ListenerEntry {
                event: event.to_string(),
                capture,
                listener,
            }),
        }
        self.stats.listener_updates += 1;
        Ok(())
    }

    fn remove_listener(
        &mut self,
        id: NodeId,
        event: &str,
        capture: bool,
    ) -> Result<(), RenderError> {
        let listeners = &mut self.element_mut(id)?.listeners;
        let before = listeners.len();
        listeners.retain(|entry| !(entry.event == event && entry.capture == capture));
        if listeners.len() != before {
            self.stats.listener_updates += 1;
        }
        Ok(())
    }

    fn listener(
        &self,
        id: NodeId,
        event: &str,
        capture: bool,
    ) -> Result<Option<Listener>, RenderError> {
        Ok(self
            .node(id)?
            .listeners
            .iter()
            .find(|entry| entry.event == event && entry.capture == capture)
            .map(|entry| entry.listener.clone()))
    }

    fn meta(&self, id: NodeId) -> Result<&LiveMeta, RenderError> {
        Ok(&self.node(id)?.meta)
    }

    fn meta_mut(&mut self, id: NodeId) -> Result<&mut LiveMeta, RenderError> {
        Ok(&mut self.node_mut(id)?.meta)
    }
}

#[cfg(test)]
#[path = "tests/memory_tests.rs"]
mod tests;
