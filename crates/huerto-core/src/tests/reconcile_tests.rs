use super::*;

fn item(key: i32, label: &str) -> VNode {
    h("li", None, [label]).with_key(key)
}

fn keyed_list(entries: &[(i32, &str)]) -> VNode {
    h(
        "ul",
        None,
        entries
            .iter()
            .map(|(key, label)| item(*key, label))
            .collect::<Vec<_>>(),
    )
}

fn rendered(node: &VNode) -> (Renderer<MemoryTarget>, NodeId) {
    let renderer = Renderer::new(MemoryTarget::new());
    let live = renderer.render(node, renderer.root(), None).unwrap();
    renderer.target_mut().reset_stats();
    (renderer, live)
}

fn labels(renderer: &Renderer<MemoryTarget>, parent: NodeId) -> Vec<String> {
    let target = renderer.target();
    let labels = target
        .children(parent)
        .unwrap()
        .into_iter()
        .map(|child| target.text_content(child))
        .collect();
    labels
}

#[test]
fn render_appends_to_parent() {
    let (renderer, ul) = rendered(&keyed_list(&[(1, "a")]));
    let root = renderer.root();
    assert_eq!(renderer.target().children(root).unwrap(), vec![ul]);
    assert_eq!(labels(&renderer, ul), vec!["a"]);
}

#[test]
fn rerender_of_identical_tree_is_free() {
    let tree = h(
        "div",
        Some(Attributes::new().with("class", "box").style([("color", "red")])),
        [keyed_list(&[(1, "a"), (2, "b")]), h("p", None, ["text"])],
    );
    let (renderer, div) = rendered(&tree);

    let again = renderer.render(&tree, renderer.root(), Some(div)).unwrap();

    assert_eq!(again, div);
    assert_eq!(renderer.target().stats().total(), 0);
}

#[test]
fn keyed_reorder_preserves_identity() {
    let (renderer, ul) = rendered(&keyed_list(&[(1, "A"), (2, "B"), (3, "C")]));
    let before = renderer.target().children(ul).unwrap();
    renderer
        .target_mut()
        .set_marker(before[2], "expando", "kept")
        .unwrap();

    renderer
        .render(
            &keyed_list(&[(3, "C"), (1, "A"), (2, "B")]),
            renderer.root(),
            Some(ul),
        )
        .unwrap();

    let after = renderer.target().children(ul).unwrap();
    assert_eq!(after, vec![before[2], before[0], before[1]]);
    assert_eq!(renderer.target().marker(after[0], "expando"), Some("kept"));
    let stats = renderer.target().stats();
    assert_eq!(stats.created, 0);
    assert_eq!(stats.released, 0);
    assert_eq!(stats.text_updates, 0);
}

#[test]
fn keyed_reverse_preserves_identity() {
    let (renderer, ul) = rendered(&keyed_list(&[(1, "A"), (2, "B"), (3, "C")]));
    let before = renderer.target().children(ul).unwrap();

    renderer
        .render(
            &keyed_list(&[(3, "C"), (2, "B"), (1, "A")]),
            renderer.root(),
            Some(ul),
        )
        .unwrap();

    let after = renderer.target().children(ul).unwrap();
    assert_eq!(after, vec![before[2], before[1], before[0]]);
    assert_eq!(labels(&renderer, ul), vec!["C", "B", "A"]);
}

#[test]
fn keyed_insert_and_remove() {
    let (renderer, ul) = rendered(&keyed_list(&[(1, "A"), (2, "B"), (3, "C")]));
    let before = renderer.target().children(ul).unwrap();

    renderer
        .render(
            &keyed_list(&[(1, "A"), (4, "D"), (3, "C")]),
            renderer.root(),
            Some(ul),
        )
        .unwrap();

    let after = renderer.target().children(ul).unwrap();
    assert_eq!(after.len(), 3);
    assert_eq!(after[0], before[0]);
    assert_eq!(after[2], before[2]);
    assert!(!renderer.target().contains(before[1]));
    assert_eq!(labels(&renderer, ul), vec!["A", "D", "C"]);
}

#[test]
fn duplicate_keys_keep_the_first_match() {
    let (renderer, ul) = rendered(&keyed_list(&[(1, "A"), (1, "B")]));
    let before = renderer.target().children(ul).unwrap();

    renderer
        .render(&keyed_list(&[(1, "A")]), renderer.root(), Some(ul))
        .unwrap();

    assert_eq!(renderer.target().children(ul).unwrap(), vec![before[0]]);
    assert!(!renderer.target().contains(before[1]));
}

#[test]
fn unkeyed_children_match_by_type_in_order() {
    let before = h("div", None, [h("p", None, ["1"]), h("span", None, ["2"])]);
    let after = h("div", None, [h("span", None, ["2"])]);
    let (renderer, div) = rendered(&before);
    let old = renderer.target().children(div).unwrap();

    renderer.render(&after, renderer.root(), Some(div)).unwrap();

    assert_eq!(renderer.target().children(div).unwrap(), vec![old[1]]);
    assert!(!renderer.target().contains(old[0]));
}

#[test]
fn unkeyed_tag_change_replaces_node() {
    let (renderer, div) = rendered(&h("div", None, [h("p", None, ["1"])]));
    let old_p = renderer.target().child_at(div, 0).unwrap().unwrap();

    renderer
        .render(&h("div", None, [h("span", None, ["1"])]), renderer.root(), Some(div))
        .unwrap();

    let span = renderer.target().child_at(div, 0).unwrap().unwrap();
    assert_ne!(span, old_p);
    assert_eq!(renderer.target().tag(span).unwrap().as_deref(), Some("span"));
    assert!(!renderer.target().contains(old_p));
}

#[test]
fn top_level_tag_change_moves_children() {
    let (renderer, div) = rendered(&h("div", None, [h("b", None, ["x"]), h("i", None, ["y"])]));
    let children = renderer.target().children(div).unwrap();
    let root = renderer.root();

    let section = renderer
        .render(&h("section", None, [h("b", None, ["x"]), h("i", None, ["y"])]), root, Some(div))
        .unwrap();

    assert_ne!(section, div);
    assert!(!renderer.target().contains(div));
    assert_eq!(renderer.target().children(root).unwrap(), vec![section]);
    assert_eq!(renderer.target().children(section).unwrap(), children);
}

#[test]
fn single_text_child_updates_in_place() {
    let (renderer, p) = rendered(&h("p", None, ["before"]));
    let text_node = renderer.target().child_at(p, 0).unwrap().unwrap();

    renderer
        .render(&h("p", None, ["after"]), renderer.root(), Some(p))
        .unwrap();

    assert_eq!(renderer.target().child_at(p, 0).unwrap(), Some(text_node));
    assert_eq!(renderer.target().text_content(p), "after");
    let stats = renderer.target().stats();
    assert_eq!(stats.text_updates, 1);
    assert_eq!(stats.structural(), 0);
}

#[test]
fn style_maps_merge_per_property() {
    let red = h("div", Some(Attributes::new().style([("color", "red"), ("margin", "0")])), ["x"]);
    let blue = h(
        "div",
        Some(Attributes::new().style([("color", "blue"), ("font-size", "2px")])),
        ["x"],
    );
    let (renderer, div) = rendered(&red);

    renderer.render(&blue, renderer.root(), Some(div)).unwrap();

    let target = renderer.target();
    let style = target.style(div).unwrap();
    assert_eq!(style.len(), 2);
    assert_eq!(style.get("color").map(String::as_str), Some("blue"));
    assert_eq!(style.get("font-size").map(String::as_str), Some("2px"));
    assert!(style.get("margin").is_none());
}

#[test]
fn style_text_replaces_whole_declaration() {
    let (renderer, div) = rendered(&h(
        "div",
        Some(Attributes::new().style([("color", "red")])),
        Vec::<VNode>::new(),
    ));

    renderer
        .render(
            &h("div", Some(Attributes::new().with("style", "margin: 1px")), Vec::<VNode>::new()),
            renderer.root(),
            Some(div),
        )
        .unwrap();

    let target = renderer.target();
    let style = target.style(div).unwrap();
    assert_eq!(style.len(), 1);
    assert_eq!(style.get("margin").map(String::as_str), Some("1px"));
}

#[test]
fn removed_and_false_attributes_are_cleared() {
    let (renderer, input) = rendered(&h(
        "input",
        Some(
            Attributes::new()
                .with("disabled", true)
                .with("title", "hint")
                .with("className", "field"),
        ),
        Vec::<VNode>::new(),
    ));
    assert_eq!(renderer.target().attribute(input, "disabled").unwrap().as_deref(), Some("true"));
    assert_eq!(renderer.target().class(input), Some("field"));

    renderer
        .render(
            &h(
                "input",
                Some(Attributes::new().with("disabled", false)),
                Vec::<VNode>::new(),
            ),
            renderer.root(),
            Some(input),
        )
        .unwrap();

    let target = renderer.target();
    assert_eq!(target.attribute(input, "disabled").unwrap(), None);
    assert_eq!(target.attribute(input, "title").unwrap(), None);
    assert_eq!(target.class(input), Some(""));
}

#[test]
fn false_class_clears_instead_of_naming_a_class() {
    let (renderer, div) = rendered(&h(
        "div",
        Some(Attributes::new().with("class", "a")),
        Vec::<VNode>::new(),
    ));
    assert_eq!(renderer.target().class(div), Some("a"));

    renderer
        .render(
            &h("div", Some(Attributes::new().with("class", false)), Vec::<VNode>::new()),
            renderer.root(),
            Some(div),
        )
        .unwrap();
    assert_eq!(renderer.target().class(div), Some(""));

    let (renderer, fresh) = rendered(&h(
        "div",
        Some(Attributes::new().with("className", false)),
        Vec::<VNode>::new(),
    ));
    assert_ne!(renderer.target().class(fresh), Some("false"));
}

#[test]
fn live_properties_compare_against_the_node() {
    let node = h("input", Some(Attributes::new().with("value", "typed")), Vec::<VNode>::new());
    let (renderer, input) = rendered(&node);

    renderer
        .target_mut()
        .set_property(input, "value", AttrValue::from("user edit"))
        .unwrap();
    renderer.render(&node, renderer.root(), Some(input)).unwrap();

    let value = renderer.target().property(input, "value").unwrap();
    assert_eq!(value.as_ref().and_then(AttrValue::as_str), Some("typed"));
}

#[test]
fn listeners_are_swapped_and_removed() {
    let hits = std::rc::Rc::new(std::cell::Cell::new(0));
    let first = {
        let hits = hits.clone();
        h(
            "button",
            Some(Attributes::new().on("click", move |_| hits.set(hits.get() + 1))),
            ["go"],
        )
    };
    let second = {
        let hits = hits.clone();
        h(
            "button",
            Some(Attributes::new().on("click", move |_| hits.set(hits.get() + 10))),
            ["go"],
        )
    };
    let (renderer, button) = rendered(&first);

    renderer.dispatch(button, Event::new("click", button)).unwrap();
    assert_eq!(hits.get(), 1);

    renderer.render(&second, renderer.root(), Some(button)).unwrap();
    renderer.dispatch(button, Event::new("click", button)).unwrap();
    assert_eq!(hits.get(), 11);

    renderer
        .render(&h("button", None, ["go"]), renderer.root(), Some(button))
        .unwrap();
    assert_eq!(renderer.dispatch(button, Event::new("click", button)).unwrap(), 0);
    assert_eq!(renderer.target().listener_count(button), 0);
}

#[test]
fn dispatch_runs_capture_then_bubble() {
    let order = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
    let log = |label: &'static str| {
        let order = order.clone();
        move |_: &Event| order.borrow_mut().push(label)
    };
    let tree = h(
        "div",
        Some(
            Attributes::new()
                .with("onClickCapture", Listener::new(log("outer capture")))
                .on("click", log("outer bubble")),
        ),
        [h("button", Some(Attributes::new().on("click", log("inner bubble"))), ["go"])],
    );
    let (renderer, div) = rendered(&tree);
    let button = renderer.target().child_at(div, 0).unwrap().unwrap();

    let handled = renderer.dispatch(button, Event::new("click", button)).unwrap();

    assert_eq!(handled, 3);
    assert_eq!(
        *order.borrow(),
        vec!["outer capture", "inner bubble", "outer bubble"]
    );
}

#[test]
fn element_refs_follow_the_node() {
    let node_ref = Ref::cell();
    let with_ref = h(
        "div",
        None,
        [h("canvas", None, Vec::<VNode>::new()).with_ref(node_ref.clone())],
    );
    let (renderer, div) = rendered(&with_ref);
    let canvas = renderer.target().child_at(div, 0).unwrap().unwrap();
    assert_eq!(node_ref.get(), Some(RefValue::Node(canvas)));

    renderer
        .render(&h("div", None, Vec::<VNode>::new()), renderer.root(), Some(div))
        .unwrap();
    assert_eq!(node_ref.get(), None);
}

#[test]
fn svg_subtree_uses_svg_namespace() {
    let tree = h(
        "div",
        None,
        [h(
            "svg",
            Some(Attributes::new().with("class", "icon")),
            [
                h("use", Some(Attributes::new().with("xlink:href", "#a")), Vec::<VNode>::new()),
                h("foreignObject", None, [h("p", None, ["html"])]),
            ],
        )],
    );
    let (renderer, div) = rendered(&tree);
    let target = renderer.target();
    let svg = target.find_first(div, "svg").unwrap();
    let use_node = target.find_first(div, "use").unwrap();
    let p = target.find_first(div, "p").unwrap();

    assert_eq!(target.namespace(div).unwrap(), Some(Namespace::Html));
    assert_eq!(target.namespace(svg).unwrap(), Some(Namespace::Svg));
    assert_eq!(target.namespace(use_node).unwrap(), Some(Namespace::Svg));
    assert_eq!(target.namespace(p).unwrap(), Some(Namespace::Html));
    assert_eq!(target.attribute(svg, "class").unwrap().as_deref(), Some("icon"));
    assert_eq!(target.attribute(use_node, "href").unwrap().as_deref(), Some("#a"));
}

#[test]
fn hydration_adopts_existing_nodes() {
    let renderer = Renderer::new(MemoryTarget::new());
    let root = renderer.root();
    let (div, greeting) = {
        let mut target = renderer.target_mut();
        let div = target.create_element("div", Namespace::Html);
        target.set_attribute(div, "id", "app").unwrap();
        let greeting = target.create_text("hello");
        let blank = target.create_text("  ");
        target.append(div, greeting).unwrap();
        target.append(div, blank).unwrap();
        target.append(root, div).unwrap();
        target.reset_stats();
        (div, greeting)
    };

    let live = renderer
        .render(
            &h("div", Some(Attributes::new().with("id", "app")), ["hello"]),
            root,
            Some(div),
        )
        .unwrap();

    let target = renderer.target();
    assert_eq!(live, div);
    assert_eq!(target.child_at(div, 0).unwrap(), Some(greeting));
    assert!(target.meta(div).unwrap().managed);
    assert!(target.meta(greeting).unwrap().managed);
    let stats = target.stats();
    assert_eq!(stats.created, 0);
    assert_eq!(stats.attribute_updates, 0);
    assert_eq!(stats.text_updates, 0);
}

#[test]
fn unmount_releases_the_tree() {
    let node_ref = Ref::cell();
    let (renderer, ul) = rendered(&h(
        "ul",
        None,
        [item(1, "a").with_ref(node_ref.clone())],
    ));

    renderer.unmount(ul).unwrap();

    assert!(!renderer.target().contains(ul));
    assert_eq!(renderer.target().len(), 1);
    assert_eq!(node_ref.get(), None);
}
