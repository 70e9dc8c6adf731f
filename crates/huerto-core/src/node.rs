//! Immutable node model.
//!
//! A [`VNode`] describes one UI node: nothing, a primitive (text or number), or
//! an element whose tag is either a render-target tag name or a component
//! constructor. Trees are built fresh for every render and never mutated
//! afterwards; subtrees are shared through `Rc` so cloning a tree is cheap.

use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::component::{Component, ComponentType};
use crate::{InstanceId, NodeId};

/// Explicit identity hint used by keyed child reconciliation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i64),
    Str(Rc<str>),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(value) => write!(f, "{value}"),
            Key::Str(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Key::Int(value.into())
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Key::Int(value.into())
    }
}

impl From<usize> for Key {
    fn from(value: usize) -> Self {
        Key::Int(value as i64)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Key::Str(value.into())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Key::Str(value.into())
    }
}

/// Event delivered to a [`Listener`].
#[derive(Clone, Debug)]
pub struct Event {
    pub name: String,
    pub target: NodeId,
    pub value: Option<String>,
}

impl Event {
    pub fn new(name: impl Into<String>, target: NodeId) -> Self {
        Self {
            name: name.into(),
            target,
            value: None,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// Callable attribute value. Two listeners are the same listener only when
/// they share the same allocation.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&Event)>);

impl Listener {
    pub fn new(handler: impl Fn(&Event) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, event: &Event) {
        (self.0)(event)
    }

    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Listener(..)")
    }
}

/// Inline style declaration, property name to value, in declaration order.
pub type StyleMap = IndexMap<String, String>;

/// Value stored under an attribute name.
#[derive(Clone, Debug)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(Rc<str>),
    Style(Rc<StyleMap>),
    Listener(Listener),
}

const LISTENER_MARKER: &str = "[listener]";

impl AttrValue {
    pub fn is_null(&self) -> bool {
        matches!(self, AttrValue::Null)
    }

    pub fn is_listener(&self) -> bool {
        matches!(self, AttrValue::Listener(_))
    }

    /// Null and `false` remove an attribute instead of setting it.
    pub fn is_removal(&self) -> bool {
        matches!(self, AttrValue::Null | AttrValue::Bool(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// String form used by [`changed`](crate::changed) and by targets that
    /// only store strings. Null normalizes to the empty string.
    pub fn normalized(&self) -> Cow<'_, str> {
        match self {
            AttrValue::Null => Cow::Borrowed(""),
            AttrValue::Bool(true) => Cow::Borrowed("true"),
            AttrValue::Bool(false) => Cow::Borrowed("false"),
            AttrValue::Number(value) => Cow::Owned(format_number(*value)),
            AttrValue::Text(value) => Cow::Borrowed(value),
            AttrValue::Style(style) => Cow::Owned(style_text(style)),
            AttrValue::Listener(_) => Cow::Borrowed(LISTENER_MARKER),
        }
    }

    /// Cache comparison used by the keyed differ: listeners compare by
    /// allocation, everything else by value.
    pub(crate) fn same(&self, other: &AttrValue) -> bool {
        match (self, other) {
            (AttrValue::Null, AttrValue::Null) => true,
            (AttrValue::Bool(a), AttrValue::Bool(b)) => a == b,
            (AttrValue::Number(a), AttrValue::Number(b)) => a == b,
            (AttrValue::Text(a), AttrValue::Text(b)) => a == b,
            (AttrValue::Style(a), AttrValue::Style(b)) => Rc::ptr_eq(a, b) || a == b,
            (AttrValue::Listener(a), AttrValue::Listener(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Text(value.into())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Text(value.into())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Number(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Number(value.into())
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<usize> for AttrValue {
    fn from(value: usize) -> Self {
        AttrValue::Number(value as f64)
    }
}

impl From<Listener> for AttrValue {
    fn from(value: Listener) -> Self {
        AttrValue::Listener(value)
    }
}

impl From<StyleMap> for AttrValue {
    fn from(value: StyleMap) -> Self {
        AttrValue::Style(Rc::new(value))
    }
}

impl<T: Into<AttrValue>> From<Option<T>> for AttrValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(AttrValue::Null, Into::into)
    }
}

/// Shortest round-trip digits; exponent form below `1e-6` and from `1e21`.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let scientific = format!("{value:e}");
        return match scientific.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => scientific,
        };
    }
    format!("{value}")
}

pub(crate) fn style_text(style: &StyleMap) -> String {
    let mut css = String::new();
    for (property, value) in style {
        if !css.is_empty() {
            css.push(' ');
        }
        css.push_str(property);
        css.push_str(": ");
        css.push_str(value);
        css.push(';');
    }
    css
}

/// Ordered attribute mapping of an element.
#[derive(Clone, Debug, Default)]
pub struct Attributes(IndexMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Registers `handler` under `on<event>`.
    pub fn on(self, event: &str, handler: impl Fn(&Event) + 'static) -> Self {
        self.with(format!("on{event}"), Listener::new(handler))
    }

    pub fn style<K, V>(self, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let style: StyleMap = properties
            .into_iter()
            .map(|(property, value)| (property.into(), value.into()))
            .collect();
        self.with("style", style)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.0.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<AttrValue> {
        self.0.shift_remove(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttrValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<AttrValue>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// What a [`Ref`] receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefValue {
    Node(NodeId),
    Component(InstanceId),
}

/// Receiver for a live node or a component instance.
#[derive(Clone)]
pub enum Ref {
    Callback(Rc<dyn Fn(Option<RefValue>)>),
    Cell(Rc<RefCell<Option<RefValue>>>),
}

impl Ref {
    pub fn callback(f: impl Fn(Option<RefValue>) + 'static) -> Self {
        Ref::Callback(Rc::new(f))
    }

    pub fn cell() -> Self {
        Ref::Cell(Rc::new(RefCell::new(None)))
    }

    /// Current value of a cell ref. Callback refs always return `None`.
    pub fn get(&self) -> Option<RefValue> {
        match self {
            Ref::Callback(_) => None,
            Ref::Cell(slot) => *slot.borrow(),
        }
    }

    pub fn ptr_eq(&self, other: &Ref) -> bool {
        match (self, other) {
            (Ref::Callback(a), Ref::Callback(b)) => Rc::ptr_eq(a, b),
            (Ref::Cell(a), Ref::Cell(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ref::Callback(_) => f.write_str("Ref::Callback(..)"),
            Ref::Cell(slot) => f.debug_tuple("Ref::Cell").field(&*slot.borrow()).finish(),
        }
    }
}

pub fn apply_ref(node_ref: Option<&Ref>, value: Option<RefValue>) {
    match node_ref {
        Some(Ref::Callback(callback)) => callback(value),
        Some(Ref::Cell(slot)) => *slot.borrow_mut() = value,
        None => {}
    }
}

pub(crate) fn same_ref(a: Option<&Ref>, b: Option<&Ref>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a.ptr_eq(b),
        _ => false,
    }
}

/// Element tag: a render-target tag name or a component constructor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeTag {
    Element(Rc<str>),
    Component(ComponentType),
}

impl NodeTag {
    pub fn name(&self) -> &str {
        match self {
            NodeTag::Element(name) => name,
            NodeTag::Component(ty) => ty.name(),
        }
    }
}

impl From<&str> for NodeTag {
    fn from(value: &str) -> Self {
        NodeTag::Element(value.into())
    }
}

impl From<String> for NodeTag {
    fn from(value: String) -> Self {
        NodeTag::Element(value.into())
    }
}

impl From<ComponentType> for NodeTag {
    fn from(value: ComponentType) -> Self {
        NodeTag::Component(value)
    }
}

#[derive(Clone, Debug)]
pub struct VElement {
    pub tag: NodeTag,
    pub attributes: Attributes,
    pub children: Vec<VNode>,
    pub key: Option<Key>,
    pub node_ref: Option<Ref>,
}

impl VElement {
    pub fn component_type(&self) -> Option<ComponentType> {
        match &self.tag {
            NodeTag::Component(ty) => Some(*ty),
            NodeTag::Element(_) => None,
        }
    }
}

/// Coarse node kind. Nodes of different kinds are never patched into each
/// other.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Empty,
    Text,
    Number,
    Element,
    Component,
}

#[derive(Clone, Debug, Default)]
pub enum VNode {
    #[default]
    Empty,
    Text(Rc<str>),
    Number(f64),
    Element(Rc<VElement>),
}

impl VNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            VNode::Empty => NodeKind::Empty,
            VNode::Text(_) => NodeKind::Text,
            VNode::Number(_) => NodeKind::Number,
            VNode::Element(element) => match element.tag {
                NodeTag::Element(_) => NodeKind::Element,
                NodeTag::Component(_) => NodeKind::Component,
            },
        }
    }

    pub fn as_element(&self) -> Option<&Rc<VElement>> {
        match self {
            VNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn key(&self) -> Option<&Key> {
        self.as_element().and_then(|element| element.key.as_ref())
    }

    pub fn children(&self) -> &[VNode] {
        self.as_element()
            .map_or(&[], |element| element.children.as_slice())
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, VNode::Empty | VNode::Text(_) | VNode::Number(_))
    }

    /// Text content of a primitive node; empty nodes render as `""`.
    pub fn primitive_text(&self) -> Option<Cow<'_, str>> {
        match self {
            VNode::Empty => Some(Cow::Borrowed("")),
            VNode::Text(value) => Some(Cow::Borrowed(value)),
            VNode::Number(value) => Some(Cow::Owned(format_number(*value))),
            VNode::Element(_) => None,
        }
    }

    /// Attaches a key. Primitive nodes cannot carry keys and are returned
    /// unchanged.
    pub fn with_key(self, key: impl Into<Key>) -> Self {
        match self {
            VNode::Element(mut element) => {
                Rc::make_mut(&mut element).key = Some(key.into());
                VNode::Element(element)
            }
            other => other,
        }
    }

    pub fn with_ref(self, node_ref: Ref) -> Self {
        match self {
            VNode::Element(mut element) => {
                Rc::make_mut(&mut element).node_ref = Some(node_ref);
                VNode::Element(element)
            }
            other => other,
        }
    }
}

impl From<&str> for VNode {
    fn from(value: &str) -> Self {
        VNode::Text(value.into())
    }
}

impl From<String> for VNode {
    fn from(value: String) -> Self {
        VNode::Text(value.into())
    }
}

impl From<f64> for VNode {
    fn from(value: f64) -> Self {
        VNode::Number(value)
    }
}

impl From<i32> for VNode {
    fn from(value: i32) -> Self {
        VNode::Number(value.into())
    }
}

impl From<i64> for VNode {
    fn from(value: i64) -> Self {
        VNode::Number(value as f64)
    }
}

impl From<usize> for VNode {
    fn from(value: usize) -> Self {
        VNode::Number(value as f64)
    }
}

impl From<Option<VNode>> for VNode {
    fn from(value: Option<VNode>) -> Self {
        value.unwrap_or_default()
    }
}

/// One argument of [`h`]: a node, or a list flattened into the parent.
#[derive(Clone, Debug)]
pub enum Child {
    Node(VNode),
    List(Vec<VNode>),
}

impl From<VNode> for Child {
    fn from(value: VNode) -> Self {
        Child::Node(value)
    }
}

impl From<Vec<VNode>> for Child {
    fn from(value: Vec<VNode>) -> Self {
        Child::List(value)
    }
}

impl From<Option<VNode>> for Child {
    fn from(value: Option<VNode>) -> Self {
        Child::Node(value.unwrap_or_default())
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Node(value.into())
    }
}

impl From<String> for Child {
    fn from(value: String) -> Self {
        Child::Node(value.into())
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Node(value.into())
    }
}

impl From<i32> for Child {
    fn from(value: i32) -> Self {
        Child::Node(value.into())
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Node(value.into())
    }
}

impl From<usize> for Child {
    fn from(value: usize) -> Self {
        Child::Node(value.into())
    }
}

/// Builds an element node. Absent attributes default to an empty mapping and
/// list children are flattened one level into the parent.
pub fn h<I>(tag: impl Into<NodeTag>, attributes: Option<Attributes>, children: I) -> VNode
where
    I: IntoIterator,
    I::Item: Into<Child>,
{
    let mut flat = Vec::new();
    for child in children {
        match child.into() {
            Child::Node(node) => flat.push(node),
            Child::List(nodes) => flat.extend(nodes),
        }
    }
    VNode::Element(Rc::new(VElement {
        tag: tag.into(),
        attributes: attributes.unwrap_or_default(),
        children: flat,
        key: None,
        node_ref: None,
    }))
}

pub fn text(value: impl Into<Rc<str>>) -> VNode {
    VNode::Text(value.into())
}

/// Element node whose tag is the component `C`.
pub fn component<C: Component>(attributes: Option<Attributes>, children: Vec<VNode>) -> VNode {
    h(ComponentType::of::<C>(), attributes, children)
}

/// `h!(tag, attributes, children...)` with per-child conversion.
#[macro_export]
macro_rules! h {
    ($tag:expr) => {
        $crate::h($tag, None, ::std::vec::Vec::<$crate::Child>::new())
    };
    ($tag:expr, $attrs:expr $(, $child:expr)* $(,)?) => {
        $crate::h($tag, $attrs, ::std::vec![$($crate::Child::from($child)),*])
    };
}
