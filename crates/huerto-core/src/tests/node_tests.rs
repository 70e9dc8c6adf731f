use super::*;

#[test]
fn h_flattens_list_children_one_level() {
    let items: Vec<VNode> = vec![text("b"), text("c")];
    let node = h("ul", None, [Child::from("a"), Child::from(items), Child::from(4)]);

    let children = node.children();
    assert_eq!(children.len(), 4);
    assert_eq!(children[0].primitive_text().as_deref(), Some("a"));
    assert_eq!(children[2].primitive_text().as_deref(), Some("c"));
    assert_eq!(children[3].kind(), NodeKind::Number);
}

#[test]
fn missing_attributes_default_to_empty_mapping() {
    let node = h("div", None, Vec::<VNode>::new());
    let element = node.as_element().expect("element");
    assert!(element.attributes.is_empty());
    assert!(element.key.is_none());
    assert_eq!(node.kind(), NodeKind::Element);
}

#[test]
fn macro_converts_each_child() {
    let node = crate::h!(
        "p",
        Some(Attributes::new().with("id", "greeting")),
        "count: ",
        7,
        None::<VNode>
    );
    let element = node.as_element().expect("element");
    assert_eq!(element.attributes.get("id").and_then(AttrValue::as_str), Some("greeting"));
    let kinds: Vec<NodeKind> = node.children().iter().map(VNode::kind).collect();
    assert_eq!(kinds, vec![NodeKind::Text, NodeKind::Number, NodeKind::Empty]);

    let bare = crate::h!("br");
    assert!(bare.children().is_empty());
}

#[test]
fn keys_only_attach_to_elements() {
    let keyed = h("li", None, ["x"]).with_key(3);
    assert_eq!(keyed.key(), Some(&Key::Int(3)));

    let named = h("li", None, ["x"]).with_key("row-1");
    assert_eq!(named.key().map(ToString::to_string).as_deref(), Some("row-1"));

    let primitive = text("plain").with_key(1);
    assert!(primitive.key().is_none());
}

#[test]
fn with_key_does_not_touch_shared_subtrees() {
    let original = h("li", None, ["x"]);
    let keyed = original.clone().with_key(1);
    assert!(original.key().is_none());
    assert!(keyed.key().is_some());
}

#[test]
fn numbers_normalize_like_text() {
    assert_eq!(AttrValue::from(1).normalized(), "1");
    assert_eq!(AttrValue::from(1.5).normalized(), "1.5");
    assert_eq!(AttrValue::from(f64::INFINITY).normalized(), "Infinity");
    assert_eq!(AttrValue::from(f64::NEG_INFINITY).normalized(), "-Infinity");
    assert_eq!(AttrValue::Null.normalized(), "");
    assert_eq!(AttrValue::from(true).normalized(), "true");
    assert_eq!(VNode::from(42).primitive_text().as_deref(), Some("42"));
    assert_eq!(VNode::Empty.primitive_text().as_deref(), Some(""));
}

#[test]
fn extreme_numbers_use_exponent_form() {
    assert_eq!(VNode::from(-0.0).primitive_text().as_deref(), Some("0"));
    assert_eq!(VNode::from(1e21).primitive_text().as_deref(), Some("1e+21"));
    assert_eq!(VNode::from(-2.5e22).primitive_text().as_deref(), Some("-2.5e+22"));
    assert_eq!(VNode::from(1.5e-7).primitive_text().as_deref(), Some("1.5e-7"));
    assert_eq!(VNode::from(1e20).primitive_text().as_deref(), Some("100000000000000000000"));
    assert_eq!(VNode::from(0.000001).primitive_text().as_deref(), Some("0.000001"));
    assert_eq!(AttrValue::from(f64::NAN).normalized(), "NaN");
}

#[test]
fn removal_values() {
    assert!(AttrValue::Null.is_removal());
    assert!(AttrValue::from(false).is_removal());
    assert!(!AttrValue::from(true).is_removal());
    assert!(!AttrValue::from("").is_removal());
    assert!(AttrValue::from(None::<&str>).is_null());
}

#[test]
fn style_attribute_serializes_in_declaration_order() {
    let attrs = Attributes::new().style([("color", "red"), ("margin", "0")]);
    let style = attrs.get("style").expect("style");
    assert_eq!(style.normalized(), "color: red; margin: 0;");
}

#[test]
fn listeners_compare_by_allocation() {
    let listener = Listener::new(|_| {});
    let same = listener.clone();
    let other = Listener::new(|_| {});
    assert!(listener.ptr_eq(&same));
    assert!(!listener.ptr_eq(&other));
    assert!(AttrValue::from(listener.clone()).same(&AttrValue::from(same)));
    assert!(!AttrValue::from(listener).same(&AttrValue::from(other)));
}

#[test]
fn on_registers_listener_under_prefixed_name() {
    let attrs = Attributes::new().on("click", |_| {});
    assert!(attrs.get("onclick").is_some_and(AttrValue::is_listener));
    assert_eq!(attrs.names().collect::<Vec<_>>(), vec!["onclick"]);
}

#[test]
fn cell_refs_hold_the_last_value() {
    let node_ref = Ref::cell();
    apply_ref(Some(&node_ref), Some(RefValue::Node(5)));
    assert_eq!(node_ref.get(), Some(RefValue::Node(5)));
    apply_ref(Some(&node_ref), None);
    assert_eq!(node_ref.get(), None);
}

#[test]
fn callback_refs_receive_every_value() {
    let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let sink = std::rc::Rc::clone(&seen);
    let node_ref = Ref::callback(move |value| sink.borrow_mut().push(value));
    apply_ref(Some(&node_ref), Some(RefValue::Node(1)));
    apply_ref(Some(&node_ref), None);
    assert_eq!(*seen.borrow(), vec![Some(RefValue::Node(1)), None]);
    assert_eq!(node_ref.get(), None);
}

#[test]
fn context_extend_overrides_entries() {
    let base = Context::new().with("theme", "light".to_string()).with("size", 12u32);
    let extended = base.extend(&Context::new().with("theme", "dark".to_string()));

    assert_eq!(base.get::<String>("theme").map(String::as_str), Some("light"));
    assert_eq!(extended.get::<String>("theme").map(String::as_str), Some("dark"));
    assert_eq!(extended.get::<u32>("size"), Some(&12));
    assert_eq!(extended.get::<i32>("size"), None);
    assert!(base.extend(&Context::new()).ptr_eq(&base));
}
