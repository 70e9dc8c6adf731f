//! Keyed live-tree differ.
//!
//! Diffs a new [`VNode`] directly against the live tree, using the attribute
//! cache and key stored in each node's [`LiveMeta`](crate::LiveMeta) instead
//! of the previous node tree. Children are matched by key first, then by
//! node type in scan order.

use indexmap::map::Entry;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;

use crate::component::{ComponentRuntime, Context};
use crate::materialize::{namespace_for, set_accessor, svg_scope};
use crate::node::{apply_ref, same_ref, AttrValue, Attributes, Key, NodeTag, RefValue, VNode};
use crate::options::RenderOptions;
use crate::scheduler::RenderQueue;
use crate::target::{Namespace, RenderTarget};
use crate::{InstanceId, NodeId, RenderError};

/// Mutable state of one top-level pass.
#[derive(Default)]
pub(crate) struct DiffSession {
    pub(crate) depth: usize,
    pub(crate) svg: bool,
    pub(crate) hydrating: bool,
    /// Instances whose `did_mount` runs when the pass completes.
    pub(crate) mounts: Vec<InstanceId>,
}

pub(crate) struct Reconciler<'a, T: RenderTarget> {
    pub(crate) target: &'a mut T,
    pub(crate) components: &'a mut ComponentRuntime,
    pub(crate) queue: &'a RenderQueue,
    pub(crate) options: &'a RenderOptions,
    pub(crate) session: DiffSession,
}

impl<'a, T: RenderTarget> Reconciler<'a, T> {
    pub(crate) fn new(
        target: &'a mut T,
        components: &'a mut ComponentRuntime,
        queue: &'a RenderQueue,
        options: &'a RenderOptions,
    ) -> Self {
        Self {
            target,
            components,
            queue,
            options,
            session: DiffSession::default(),
        }
    }

    /// Diffs `vnode` against `dom` (or creates it) and attaches the result
    /// to `parent` when it is not already there.
    pub(crate) fn diff(
        &mut self,
        dom: Option<NodeId>,
        vnode: &VNode,
        context: &Context,
        mount_all: bool,
        parent: Option<NodeId>,
        component_root: bool,
    ) -> Result<NodeId, RenderError> {
        if self.session.depth == 0 {
            self.session.svg = match parent {
                Some(parent) => self.target.namespace(parent)? == Some(Namespace::Svg),
                None => false,
            };
            self.session.hydrating = match dom {
                Some(dom) => !self.target.meta(dom)?.managed,
                None => false,
            };
            log::debug!(
                "diff pass start (dom {dom:?}, parent {parent:?}, hydrating {})",
                self.session.hydrating
            );
        }
        self.session.depth += 1;

        let out = self.idiff(dom, vnode, context, mount_all, component_root)?;
        if let Some(parent) = parent {
            if self.target.parent(out)? != Some(parent) {
                self.target.append(parent, out)?;
            }
        }

        self.session.depth -= 1;
        if self.session.depth == 0 {
            self.session.hydrating = false;
            if !component_root {
                self.flush_mounts();
            }
            log::debug!("diff pass end (root {out})");
        }
        Ok(out)
    }

    pub(crate) fn idiff(
        &mut self,
        dom: Option<NodeId>,
        vnode: &VNode,
        context: &Context,
        mount_all: bool,
        component_root: bool,
    ) -> Result<NodeId, RenderError> {
        let element = match vnode {
            VNode::Element(element) => element,
            primitive => {
                let text = primitive.primitive_text().unwrap_or_default();
                return self.diff_text(dom, &text, component_root);
            }
        };
        let tag = match &element.tag {
            NodeTag::Component(ty) => {
                return self.build_component(dom, element, *ty, context, mount_all)
            }
            NodeTag::Element(tag) => tag,
        };

        let prev_svg = self.session.svg;
        self.session.svg = svg_scope(tag, prev_svg);

        let out = match dom {
            Some(dom) if self.is_named_node(dom, tag)? => dom,
            _ => {
                let out = self
                    .target
                    .create_element(tag, namespace_for(self.session.svg));
                if let Some(dom) = dom {
                    log::trace!("tag change {dom} -> {out} <{tag}>");
                    while let Some(child) = self.target.child_at(dom, 0)? {
                        self.target.append(out, child)?;
                    }
                    if self.target.parent(dom)?.is_some() {
                        self.target.replace(dom, out)?;
                    }
                    self.discard_replaced(dom)?;
                }
                out
            }
        };

        if !self.target.meta(out)?.managed {
            let mut seeded = Attributes::new();
            for name in self.target.attribute_names(out)? {
                if let Some(value) = self.target.attribute(out, &name)? {
                    seeded.insert(name, value);
                }
            }
            let meta = self.target.meta_mut(out)?;
            meta.attrs = seeded;
            meta.managed = true;
        }

        let children = &element.children;
        let first = self.target.child_at(out, 0)?;
        let single_text = match (children.as_slice(), first) {
            ([only @ (VNode::Text(_) | VNode::Number(_))], Some(first))
                if !self.session.hydrating
                    && self.target.is_text(first)?
                    && self.target.next_sibling(first)?.is_none() =>
            {
                Some((first, only.primitive_text().unwrap_or_default()))
            }
            _ => None,
        };
        if let Some((first, value)) = single_text {
            if self.target.text(first)?.as_deref() != Some(&*value) {
                self.target.set_text(first, &value)?;
            }
        } else if !children.is_empty() || first.is_some() {
            let hydrating = self.session.hydrating;
            self.inner_diff_node(out, children, context, mount_all, hydrating)?;
        }

        self.diff_attributes(out, &element.attributes)?;

        let meta = self.target.meta_mut(out)?;
        meta.key = element.key.clone();
        if !same_ref(meta.node_ref.as_ref(), element.node_ref.as_ref()) {
            let previous = std::mem::replace(&mut meta.node_ref, element.node_ref.clone());
            apply_ref(previous.as_ref(), None);
            apply_ref(element.node_ref.as_ref(), Some(RefValue::Node(out)));
        }

        self.session.svg = prev_svg;
        Ok(out)
    }

    fn diff_text(
        &mut self,
        dom: Option<NodeId>,
        text: &str,
        component_root: bool,
    ) -> Result<NodeId, RenderError> {
        if let Some(dom) = dom {
            let reusable = self.target.is_text(dom)?
                && self.target.parent(dom)?.is_some()
                && (self.target.meta(dom)?.component.is_none() || component_root);
            if reusable {
                if self.target.text(dom)?.as_deref() != Some(text) {
                    self.target.set_text(dom, text)?;
                }
                self.target.meta_mut(dom)?.managed = true;
                return Ok(dom);
            }
        }
        let out = self.target.create_text(text);
        if let Some(dom) = dom {
            if self.target.parent(dom)?.is_some() {
                self.target.replace(dom, out)?;
            }
            self.discard_replaced(dom)?;
        }
        self.target.meta_mut(out)?.managed = true;
        Ok(out)
    }

    fn is_named_node(&self, node: NodeId, tag: &str) -> Result<bool, RenderError> {
        Ok(self
            .target
            .tag(node)?
            .is_some_and(|own| own.eq_ignore_ascii_case(tag)))
    }

    fn is_same_node_type(
        &self,
        node: NodeId,
        vnode: &VNode,
        hydrating: bool,
    ) -> Result<bool, RenderError> {
        let Some(element) = vnode.as_element() else {
            return self.target.is_text(node);
        };
        match &element.tag {
            NodeTag::Element(tag) => Ok(self.target.meta(node)?.component_type.is_none()
                && self.is_named_node(node, tag)?),
            NodeTag::Component(ty) => {
                Ok(hydrating || self.target.meta(node)?.component_type == Some(*ty))
            }
        }
    }

    fn live_key(&self, child: NodeId) -> Result<Option<Key>, RenderError> {
        let meta = self.target.meta(child)?;
        if !meta.managed {
            return Ok(None);
        }
        Ok(match meta.component {
            Some(instance) => self.components.key_of(instance),
            None => meta.key.clone(),
        })
    }

    fn inner_diff_node(
        &mut self,
        dom: NodeId,
        vchildren: &[VNode],
        context: &Context,
        mount_all: bool,
        hydrating: bool,
    ) -> Result<(), RenderError> {
        let original = self.target.children(dom)?;
        let mut keyed: IndexMap<Key, Option<NodeId>, FxBuildHasher> = IndexMap::default();
        let mut keyed_len = 0usize;
        let mut duplicates: SmallVec<[NodeId; 2]> = SmallVec::new();
        let mut pool: Vec<Option<NodeId>> = Vec::with_capacity(original.len());
        let mut min = 0usize;

        for &child in &original {
            let key = if vchildren.is_empty() {
                None
            } else {
                self.live_key(child)?
            };
            if let Some(key) = key {
                match keyed.entry(key) {
                    Entry::Vacant(entry) => {
                        entry.insert(Some(child));
                        keyed_len += 1;
                    }
                    Entry::Occupied(entry) => {
                        log::warn!("duplicate live key {} under node {dom}", entry.key());
                        duplicates.push(child);
                    }
                }
                continue;
            }
            let poolable = if self.target.meta(child)?.managed {
                true
            } else if let Some(text) = self.target.text(child)? {
                !hydrating || !text.trim().is_empty()
            } else {
                hydrating
            };
            if poolable {
                pool.push(Some(child));
            }
        }

        for (i, vchild) in vchildren.iter().enumerate() {
            let mut matched = None;
            if let Some(key) = vchild.key() {
                if keyed_len > 0 {
                    if let Some(found) = keyed.get_mut(key).and_then(Option::take) {
                        log::trace!("keyed match {key} -> {found}");
                        matched = Some(found);
                        keyed_len -= 1;
                    }
                }
            } else {
                for j in min..pool.len() {
                    let Some(candidate) = pool[j] else {
                        continue;
                    };
                    if self.is_same_node_type(candidate, vchild, hydrating)? {
                        matched = Some(candidate);
                        pool[j] = None;
                        if j == min {
                            min += 1;
                        }
                        break;
                    }
                }
            }

            let child = self.idiff(matched, vchild, context, mount_all, false)?;
            let current = self.target.child_at(dom, i)?;
            if child != dom && Some(child) != current {
                match current {
                    None => self.target.append(dom, child)?,
                    Some(current) if self.target.next_sibling(current)? == Some(child) => {
                        log::trace!("dropping stale sibling {current} before {child}");
                        self.target.remove(current)?;
                    }
                    Some(current) => {
                        log::trace!("moving {child} before {current}");
                        self.target.insert_before(dom, child, Some(current))?;
                    }
                }
            }
        }

        if keyed_len > 0 {
            for child in keyed.values().filter_map(|slot| *slot) {
                self.recollect(child, false)?;
            }
        }
        for child in duplicates {
            self.recollect(child, false)?;
        }
        for child in pool.into_iter().rev().flatten() {
            self.recollect(child, false)?;
        }
        Ok(())
    }

    fn diff_attributes(&mut self, dom: NodeId, attrs: &Attributes) -> Result<(), RenderError> {
        let svg = self.session.svg;
        let mut cache = std::mem::take(&mut self.target.meta_mut(dom)?.attrs);

        let stale: SmallVec<[String; 4]> = cache
            .iter()
            .filter(|(name, old)| !old.is_null() && attrs.get(name).map_or(true, AttrValue::is_null))
            .map(|(name, _)| name.to_string())
            .collect();
        for name in stale {
            let old = cache.remove(&name);
            set_accessor(&mut *self.target, dom, &name, old.as_ref(), &AttrValue::Null, svg)?;
        }

        for (name, value) in attrs.iter() {
            let differs = match cache.get(name) {
                None => true,
                Some(_) if matches!(name, "value" | "checked" | "selected") => self
                    .target
                    .property(dom, name)?
                    .map_or(true, |live| !live.same(value)),
                Some(old) => !old.same(value),
            };
            if differs {
                let old = cache.get(name).cloned();
                set_accessor(&mut *self.target, dom, name, old.as_ref(), value, svg)?;
                cache.insert(name, value.clone());
            }
        }

        self.target.meta_mut(dom)?.attrs = cache;
        Ok(())
    }

    /// Releases whatever the engine owns below `node`. Component bases are
    /// handed to their instance's unmount; managed nodes stay attached when
    /// `unmount_only` is set so their parent can be reused intact.
    pub(crate) fn recollect(&mut self, node: NodeId, unmount_only: bool) -> Result<(), RenderError> {
        let meta = self.target.meta(node)?;
        if let Some(instance) = meta.component {
            return self.unmount_component(instance);
        }
        let managed = meta.managed;
        if managed {
            let node_ref = self.target.meta_mut(node)?.node_ref.take();
            apply_ref(node_ref.as_ref(), None);
        }
        let detach = !unmount_only || !managed;
        if detach {
            self.target.remove(node)?;
        }
        self.remove_children(node)?;
        if detach {
            log::trace!("recollected {node}");
            self.target.release(node)?;
        }
        Ok(())
    }

    pub(crate) fn remove_children(&mut self, node: NodeId) -> Result<(), RenderError> {
        let children = self.target.children(node)?;
        for child in children.into_iter().rev() {
            self.recollect(child, true)?;
        }
        Ok(())
    }

    /// Recollects a node that has already been swapped out of the tree and
    /// frees it unless a component instance took ownership of it.
    pub(crate) fn discard_replaced(&mut self, node: NodeId) -> Result<(), RenderError> {
        let owned = self.target.meta(node)?.component.is_some();
        self.recollect(node, true)?;
        if !owned && self.target.contains(node) {
            self.target.release(node)?;
        }
        Ok(())
    }
}
