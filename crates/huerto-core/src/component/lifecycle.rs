//! Component lifecycle driven by the keyed differ.

use super::{ComponentType, Context, LifecyclePhase, Props, Rendered, RenderMode};
use crate::node::{apply_ref, same_ref, Key, Ref, RefValue, VElement};
use crate::reconcile::Reconciler;
use crate::target::RenderTarget;
use crate::{InstanceId, NodeId, RenderError};

impl<T: RenderTarget> Reconciler<'_, T> {
    /// Runs `did_mount` for every instance mounted during the pass, in
    /// mount order.
    pub(crate) fn flush_mounts(&mut self) {
        let mounts = std::mem::take(&mut self.session.mounts);
        for id in mounts {
            if let Ok(slot) = self.components.slot_mut(id) {
                log::debug!("did_mount {} {id}", slot.ty.name());
                slot.instance.did_mount();
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn set_props(
        &mut self,
        id: InstanceId,
        props: Props,
        key: Option<Key>,
        node_ref: Option<Ref>,
        mode: RenderMode,
        context: &Context,
        mount_all: bool,
    ) -> Result<(), RenderError> {
        let slot = self.components.slot_mut(id)?;
        if slot.disabled {
            return Ok(());
        }
        slot.disabled = true;
        if !same_ref(slot.node_ref.as_ref(), node_ref.as_ref()) {
            let previous = std::mem::replace(&mut slot.node_ref, node_ref);
            apply_ref(previous.as_ref(), None);
        }
        slot.key = key;
        let first_mount = slot.base.is_none() || mount_all;
        slot.instance.receive_props(props, context, first_mount);
        slot.disabled = false;

        if mode != RenderMode::None {
            let has_base = slot.base.is_some();
            if mode == RenderMode::Sync || self.options.sync_component_updates || !has_base {
                self.render_component(id, RenderMode::Sync, mount_all, false)?;
            } else {
                let flags = std::rc::Rc::clone(&slot.flags);
                self.queue.enqueue(id, &flags);
            }
        }

        let node_ref = self.components.slot(id)?.node_ref.clone();
        apply_ref(node_ref.as_ref(), Some(RefValue::Component(id)));
        Ok(())
    }

    pub(crate) fn render_component(
        &mut self,
        id: InstanceId,
        mode: RenderMode,
        mount_all: bool,
        is_child: bool,
    ) -> Result<(), RenderError> {
        let slot = self.components.slot_mut(id)?;
        if slot.disabled {
            return Ok(());
        }
        let is_update = slot.base.is_some();
        let next_base = slot.next_base.take();
        let initial_base = slot.base.or(next_base);
        let initial_child = slot.child;
        let forced = slot.flags.forced.replace(false) || mode == RenderMode::Force;
        slot.flags.dirty.set(false);
        slot.phase = if is_update {
            LifecyclePhase::Updating
        } else {
            LifecyclePhase::Mounting
        };
        log::debug!(
            "render {} {id} ({})",
            slot.ty.name(),
            if is_update { "update" } else { "mount" }
        );
        let rendered = slot.instance.begin_render(is_update, forced);
        let skipped = rendered.is_none();

        if let Some(Rendered { node, context }) = rendered {
            let mut to_unmount = None;
            let mut inst = None;
            let base = match node.as_element().and_then(|e| e.component_type().map(|ty| (e, ty))) {
                Some((element, ty)) => {
                    let child_props = Props::from_element(element);
                    let reuse = initial_child.filter(|&child| {
                        self.components.type_of(child) == Some(ty)
                            && self.components.key_of(child) == element.key
                    });
                    let child = match reuse {
                        Some(child) => {
                            self.set_props(
                                child,
                                child_props,
                                element.key.clone(),
                                element.node_ref.clone(),
                                RenderMode::Sync,
                                &context,
                                false,
                            )?;
                            child
                        }
                        None => {
                            to_unmount = initial_child;
                            let child = self.components.create(ty, &child_props, &context);
                            self.components.slot_mut(id)?.child = Some(child);
                            let child_slot = self.components.slot_mut(child)?;
                            if child_slot.next_base.is_none() {
                                child_slot.next_base = next_base;
                            }
                            child_slot.parent = Some(id);
                            self.set_props(
                                child,
                                child_props,
                                element.key.clone(),
                                element.node_ref.clone(),
                                RenderMode::None,
                                &context,
                                false,
                            )?;
                            self.render_component(child, RenderMode::Sync, mount_all, true)?;
                            child
                        }
                    };
                    inst = Some(child);
                    self.components.base_of(child)
                }
                None => {
                    let mut cbase = initial_base;
                    to_unmount = initial_child;
                    if to_unmount.is_some() {
                        cbase = None;
                        self.components.slot_mut(id)?.child = None;
                    }
                    if initial_base.is_some() || mode == RenderMode::Sync {
                        if let Some(cbase) = cbase {
                            self.target.meta_mut(cbase)?.component = None;
                        }
                        let parent = match initial_base {
                            Some(initial) => self.target.parent(initial)?,
                            None => None,
                        };
                        Some(self.diff(
                            cbase,
                            &node,
                            &context,
                            mount_all || !is_update,
                            parent,
                            true,
                        )?)
                    } else {
                        None
                    }
                }
            };

            if let (Some(initial), Some(base)) = (initial_base, base) {
                if base != initial && inst != initial_child {
                    if let Some(base_parent) = self.target.parent(initial)? {
                        if base != base_parent {
                            self.target.replace(initial, base)?;
                            if to_unmount.is_none() {
                                self.target.meta_mut(initial)?.component = None;
                                self.recollect(initial, false)?;
                            }
                        }
                    }
                }
            }
            if let Some(stale) = to_unmount {
                self.unmount_component(stale)?;
            }
            if let Some(unused) = next_base.filter(|&nb| Some(nb) != base) {
                self.release_orphan(unused)?;
            }

            self.components.slot_mut(id)?.base = base;
            if let (Some(base), false) = (base, is_child) {
                let mut owner = id;
                while let Some(parent) = self.components.parent_of(owner) {
                    self.components.slot_mut(parent)?.base = Some(base);
                    owner = parent;
                }
                let owner_type = self.components.type_of(owner);
                let meta = self.target.meta_mut(base)?;
                meta.component = Some(owner);
                meta.component_type = owner_type;
            }
        }

        let slot = self.components.slot_mut(id)?;
        if !is_update || mount_all {
            self.session.mounts.push(id);
        } else if !skipped {
            slot.instance.did_update();
        }
        slot.phase = LifecyclePhase::Mounted;
        let callbacks = slot.flags.take_callbacks();
        for callback in callbacks.into_iter().rev() {
            callback();
        }

        if self.session.depth == 0 && !is_child {
            self.flush_mounts();
        }
        Ok(())
    }

    /// Mounts or updates the instance that should own `dom` for `element`
    /// and returns its base.
    pub(crate) fn build_component(
        &mut self,
        dom: Option<NodeId>,
        element: &VElement,
        ty: ComponentType,
        context: &Context,
        mount_all: bool,
    ) -> Result<NodeId, RenderError> {
        let original = match dom {
            Some(dom) => self.target.meta(dom)?.component,
            None => None,
        };
        let direct_owner = match (dom, original) {
            (Some(dom), Some(_)) => self.target.meta(dom)?.component_type == Some(ty),
            _ => false,
        };
        let mut owner = original;
        let mut is_owner = direct_owner;
        while !is_owner {
            match owner.and_then(|c| self.components.parent_of(c)) {
                Some(parent) => {
                    owner = Some(parent);
                    is_owner = self.components.type_of(parent) == Some(ty);
                }
                None => break,
            }
        }
        let props = Props::from_element(element);

        if let Some(owner) = owner.filter(|&c| {
            is_owner
                && self.components.key_of(c) == element.key
                && (!mount_all || self.components.slot(c).is_ok_and(|s| s.child.is_some()))
        }) {
            log::trace!("reusing {} {owner}", ty.name());
            self.set_props(
                owner,
                props,
                element.key.clone(),
                element.node_ref.clone(),
                RenderMode::Async,
                context,
                mount_all,
            )?;
            return self
                .components
                .base_of(owner)
                .ok_or(RenderError::MissingBase { id: owner });
        }

        let mut dom = dom;
        let mut old_dom = dom;
        if let Some(original) = original {
            self.unmount_component(original)?;
            dom = None;
            old_dom = None;
        }
        let id = self.components.create(ty, &props, context);
        if let Some(dom) = dom {
            let slot = self.components.slot_mut(id)?;
            if slot.next_base.is_none() {
                slot.next_base = Some(dom);
                old_dom = None;
            }
        }
        self.set_props(
            id,
            props,
            element.key.clone(),
            element.node_ref.clone(),
            RenderMode::Sync,
            context,
            mount_all,
        )?;
        let base = self
            .components
            .base_of(id)
            .ok_or(RenderError::MissingBase { id })?;
        if let Some(old) = old_dom.filter(|&old| old != base) {
            self.target.meta_mut(old)?.component = None;
            self.recollect(old, false)?;
        }
        Ok(base)
    }

    pub(crate) fn unmount_component(&mut self, id: InstanceId) -> Result<(), RenderError> {
        let slot = self.components.slot_mut(id)?;
        log::debug!("unmount {} {id}", slot.ty.name());
        let base = slot.base.take();
        slot.disabled = true;
        slot.phase = LifecyclePhase::Unmounting;
        slot.instance.will_unmount();
        let inner = slot.child.take();
        let component_ref = slot.node_ref.take();

        if let Some(inner) = inner {
            self.unmount_component(inner)?;
            self.components.release(id);
        } else if let Some(base) = base {
            let meta = self.target.meta_mut(base)?;
            if meta.managed {
                let node_ref = meta.node_ref.take();
                apply_ref(node_ref.as_ref(), None);
            }
            let meta = self.target.meta_mut(base)?;
            meta.component = None;
            meta.component_type = None;
            self.target.remove(base)?;
            let pooled = self.components.recycle(id, base);
            self.remove_children(base)?;
            if !pooled {
                self.target.release(base)?;
            }
        } else {
            self.components.release(id);
        }

        apply_ref(component_ref.as_ref(), None);
        Ok(())
    }

    /// Frees a recycled base that ended up unused.
    fn release_orphan(&mut self, node: NodeId) -> Result<(), RenderError> {
        if !self.target.contains(node) || self.target.parent(node)?.is_some() {
            return Ok(());
        }
        if self.target.meta(node)?.component.is_some() {
            return Ok(());
        }
        log::trace!("releasing unused recycled base {node}");
        self.recollect(node, false)
    }
}
