//! Pure construction of live subtrees, plus the attribute accessor shared
//! with the keyed differ.

use crate::node::{apply_ref, AttrValue, NodeTag, RefValue, VNode};
use crate::target::{Namespace, RenderTarget};
use crate::{NodeId, RenderError};

/// Builds a fresh live subtree for `node`. Nothing is cached; every call
/// yields a disjoint subtree that the caller is expected to attach.
pub fn materialize<T: RenderTarget + ?Sized>(
    target: &mut T,
    node: &VNode,
) -> Result<NodeId, RenderError> {
    materialize_in(target, node, false)
}

pub(crate) fn materialize_in<T: RenderTarget + ?Sized>(
    target: &mut T,
    node: &VNode,
    svg: bool,
) -> Result<NodeId, RenderError> {
    let element = match node {
        VNode::Element(element) => element,
        primitive => {
            let text = primitive.primitive_text().unwrap_or_default();
            let id = target.create_text(&text);
            target.meta_mut(id)?.managed = true;
            return Ok(id);
        }
    };
    let tag = match &element.tag {
        NodeTag::Element(tag) => tag,
        NodeTag::Component(ty) => {
            return Err(RenderError::ComponentTag {
                name: ty.name().to_string(),
            })
        }
    };
    let svg = svg_scope(tag, svg);
    let id = target.create_element(tag, namespace_for(svg));
    for (name, value) in element.attributes.iter() {
        if !value.is_null() {
            set_accessor(target, id, name, None, value, svg)?;
        }
    }
    for child in &element.children {
        let child = materialize_in(target, child, svg)?;
        target.append(id, child)?;
    }
    let meta = target.meta_mut(id)?;
    meta.managed = true;
    meta.attrs = element.attributes.clone();
    meta.key = element.key.clone();
    meta.node_ref = element.node_ref.clone();
    apply_ref(element.node_ref.as_ref(), Some(RefValue::Node(id)));
    Ok(id)
}

/// SVG mode starts at `svg` and ends inside `foreignObject`.
pub(crate) fn svg_scope(tag: &str, inherited: bool) -> bool {
    match tag {
        "svg" => true,
        "foreignObject" => false,
        _ => inherited,
    }
}

pub(crate) fn namespace_for(svg: bool) -> Namespace {
    if svg {
        Namespace::Svg
    } else {
        Namespace::Html
    }
}

fn is_live_property(name: &str) -> bool {
    matches!(name, "value" | "checked" | "selected")
}

/// `onClick` -> (`click`, bubble), `onClickCapture` -> (`click`, capture).
pub(crate) fn event_name(attribute: &str) -> Option<(String, bool)> {
    let event = attribute.strip_prefix("on").filter(|rest| !rest.is_empty())?;
    let (event, capture) = match event.strip_suffix("Capture") {
        Some(stripped) if !stripped.is_empty() => (stripped, true),
        _ => (event, false),
    };
    Some((event.to_ascii_lowercase(), capture))
}

/// Applies one attribute transition `old -> value` to a live element.
pub(crate) fn set_accessor<T: RenderTarget + ?Sized>(
    target: &mut T,
    id: NodeId,
    name: &str,
    old: Option<&AttrValue>,
    value: &AttrValue,
    svg: bool,
) -> Result<(), RenderError> {
    let name = if name == "className" { "class" } else { name };

    if name == "class" && !svg {
        if value.is_removal() {
            return target.set_class(id, "");
        }
        return target.set_class(id, &value.normalized());
    }

    if name == "style" {
        return set_style(target, id, old, value);
    }

    let was_listener = old.is_some_and(AttrValue::is_listener);
    if value.is_listener() || was_listener {
        if let Some((event, capture)) = event_name(name) {
            return match value {
                AttrValue::Listener(listener) => {
                    target.add_listener(id, &event, listener.clone(), capture)
                }
                _ => target.remove_listener(id, &event, capture),
            };
        }
    }

    if !svg && is_live_property(name) {
        target.set_property(id, name, value.clone())?;
        if value.is_removal() {
            target.remove_attribute(id, name)?;
        }
        return Ok(());
    }

    let name = if svg {
        name.strip_prefix("xlink:")
            .or_else(|| name.strip_prefix("xlink"))
            .filter(|rest| !rest.is_empty())
            .unwrap_or(name)
    } else {
        name
    };
    if value.is_removal() {
        target.remove_attribute(id, name)
    } else if value.is_listener() {
        Ok(())
    } else {
        target.set_attribute(id, name, &value.normalized())
    }
}

fn set_style<T: RenderTarget + ?Sized>(
    target: &mut T,
    id: NodeId,
    old: Option<&AttrValue>,
    value: &AttrValue,
) -> Result<(), RenderError> {
    let AttrValue::Style(style) = value else {
        let css = if value.is_removal() {
            String::new()
        } else {
            value.normalized().into_owned()
        };
        return target.set_style_text(id, &css);
    };
    match old {
        Some(AttrValue::Style(previous)) => {
            for property in previous.keys() {
                if !style.contains_key(property) {
                    target.remove_style_property(id, property)?;
                }
            }
        }
        Some(previous) if !previous.is_null() => target.set_style_text(id, "")?,
        _ => {}
    }
    for (property, value) in style.iter() {
        target.set_style_property(id, property, value)?;
    }
    Ok(())
}
