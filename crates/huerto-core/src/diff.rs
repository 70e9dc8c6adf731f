//! Positional (ordinal) tree differ.
//!
//! Children are matched by index only. An element whose tag or attributes
//! differ is rebuilt from scratch, so unchanged nodes never need attribute
//! writes.

use crate::materialize::materialize;
use crate::node::{AttrValue, NodeKind, VNode};
use crate::target::RenderTarget;
use crate::{NodeId, RenderError};

/// Whether `a` and `b` cannot be patched into each other in place.
pub fn changed(a: &VNode, b: &VNode) -> bool {
    if a.kind() != b.kind() {
        return true;
    }
    match (a, b) {
        (VNode::Empty, VNode::Empty) => false,
        (VNode::Text(x), VNode::Text(y)) => x != y,
        (VNode::Number(x), VNode::Number(y)) => x != y,
        (VNode::Element(x), VNode::Element(y)) => {
            if x.tag != y.tag || x.attributes.len() != y.attributes.len() {
                return true;
            }
            x.attributes.iter().any(|(name, value)| {
                let other = y.attributes.get(name).unwrap_or(&AttrValue::Null);
                value.normalized() != other.normalized()
            })
        }
        _ => true,
    }
}

/// Moves the child of `parent` at `index` from reflecting `old` to
/// reflecting `new`.
pub fn patch<T: RenderTarget + ?Sized>(
    target: &mut T,
    parent: NodeId,
    old: Option<&VNode>,
    new: Option<&VNode>,
    index: usize,
) -> Result<(), RenderError> {
    if let Some(node) = new {
        if node.kind() == NodeKind::Component {
            return Err(RenderError::ComponentTag {
                name: node
                    .as_element()
                    .map(|element| element.tag.name().to_string())
                    .unwrap_or_default(),
            });
        }
    }
    match (old, new) {
        (None, None) => Ok(()),
        (None, Some(new)) => {
            let id = materialize(target, new)?;
            target.append(parent, id)
        }
        (Some(_), None) => {
            let child = live_child(target, parent, index)?;
            log::trace!("ordinal remove {child} at {parent}[{index}]");
            target.remove(child)?;
            target.release(child)
        }
        (Some(old), Some(new)) if changed(old, new) => {
            let child = live_child(target, parent, index)?;
            let id = materialize(target, new)?;
            log::trace!("ordinal replace {child} -> {id} at {parent}[{index}]");
            target.replace(child, id)?;
            target.release(child)
        }
        (Some(old), Some(new)) => {
            let (old_children, new_children) = (old.children(), new.children());
            if old_children.is_empty() && new_children.is_empty() {
                return Ok(());
            }
            let child = live_child(target, parent, index)?;
            let shared = old_children.len().min(new_children.len());
            for i in 0..shared {
                patch(target, child, Some(&old_children[i]), Some(&new_children[i]), i)?;
            }
            for (i, node) in new_children.iter().enumerate().skip(shared) {
                patch(target, child, None, Some(node), i)?;
            }
            // Back to front so the remaining indices stay valid.
            for i in (shared..old_children.len()).rev() {
                patch(target, child, Some(&old_children[i]), None, i)?;
            }
            Ok(())
        }
    }
}

fn live_child<T: RenderTarget + ?Sized>(
    target: &T,
    parent: NodeId,
    index: usize,
) -> Result<NodeId, RenderError> {
    target
        .child_at(parent, index)?
        .ok_or(RenderError::MissingChild { parent, index })
}
