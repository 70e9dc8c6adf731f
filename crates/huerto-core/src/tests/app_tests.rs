use super::*;
use std::cell::RefCell;
use std::rc::Rc;

fn counter_view(count: &i32, set_state: &SetState<i32>) -> VNode {
    let set_state = set_state.clone();
    h(
        "div",
        None,
        [
            h("p", None, [VNode::from(*count)]),
            h(
                "button",
                Some(Attributes::new().on("click", move |_| {
                    set_state.update(|count| *count += 1).unwrap();
                })),
                ["+"],
            ),
        ],
    )
}

fn find(app: &App<MemoryTarget, i32>, tag: &str) -> NodeId {
    let root = app.renderer().root();
    app.renderer()
        .target()
        .find_first(root, tag)
        .expect("tagged node")
}

fn text_of(app: &App<MemoryTarget, i32>, node: NodeId) -> String {
    app.renderer().target().text_content(node)
}

fn click(app: &App<MemoryTarget, i32>, tag: &str) {
    let node = find(app, tag);
    app.dispatch(node, Event::new("click", node)).unwrap();
}

#[test]
fn counter_increments_through_the_ordinal_path() {
    let app = mount(MemoryTarget::new(), counter_view, 0, MountOptions::default()).unwrap();
    let p = find(&app, "p");
    assert_eq!(text_of(&app, p), "0");

    click(&app, "button");

    assert_eq!(app.state(), 1);
    let p_after = find(&app, "p");
    assert_eq!(p_after, p);
    assert_eq!(text_of(&app, p_after), "1");
}

#[test]
fn counter_increments_through_the_keyed_path() {
    let options = MountOptions {
        keyed: true,
        ..MountOptions::default()
    };
    let app = mount(MemoryTarget::new(), counter_view, 0, options).unwrap();
    let p = find(&app, "p");
    let text_node = app.renderer().target().child_at(p, 0).unwrap();

    click(&app, "button");
    click(&app, "button");

    assert_eq!(app.state(), 2);
    assert_eq!(find(&app, "p"), p);
    assert_eq!(app.renderer().target().child_at(p, 0).unwrap(), text_node);
    assert_eq!(text_of(&app, p), "2");
}

#[test]
fn root_node_tracks_the_rendered_tree() {
    let app = mount(MemoryTarget::new(), counter_view, 0, MountOptions::default()).unwrap();
    let root = app.renderer().root();
    let div = app.root_node().expect("rendered");

    assert_eq!(app.renderer().target().children(root).unwrap(), vec![div]);
    app.set_state().replace(9).unwrap();
    assert_eq!(app.root_node(), Some(div));
    assert_eq!(text_of(&app, div), "9+");
}

#[test]
fn batched_updates_wait_for_flush() {
    let options = MountOptions {
        batched: true,
        ..MountOptions::default()
    };
    let app = mount(MemoryTarget::new(), counter_view, 0, options).unwrap();
    let p = find(&app, "p");

    click(&app, "button");
    click(&app, "button");
    assert_eq!(app.state(), 2);
    assert_eq!(text_of(&app, p), "0");
    assert!(app.has_pending());

    assert!(app.flush().unwrap());
    assert_eq!(text_of(&app, find(&app, "p")), "2");
    assert!(!app.has_pending());
    assert!(!app.flush().unwrap());
}

#[test]
fn view_sees_every_state() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let app = mount(
        MemoryTarget::new(),
        move |value: &String, _: &SetState<String>| {
            sink.borrow_mut().push(value.clone());
            h("span", None, [value.as_str()])
        },
        "a".to_string(),
        MountOptions::default(),
    )
    .unwrap();

    app.set_state().replace("b".to_string()).unwrap();
    app.set_state().update(|value| value.push('!')).unwrap();

    assert_eq!(*seen.borrow(), vec!["a", "b", "b!"]);
}

#[test]
fn initial_render_errors_are_returned() {
    struct Never;

    impl Component for Never {
        type State = ();

        fn create(_props: &Props, _context: &Context, _link: Link<Self>) -> Self {
            Never
        }

        fn render(&self, _props: &Props, _state: &(), _context: &Context) -> VNode {
            VNode::Empty
        }
    }

    let result = mount(
        MemoryTarget::new(),
        |_: &(), _: &SetState<()>| component::<Never>(None, Vec::new()),
        (),
        MountOptions::default(),
    );

    assert!(matches!(result, Err(RenderError::ComponentTag { .. })));
}

#[test]
fn keyed_mount_renders_components() {
    struct Greeting;

    impl Component for Greeting {
        type State = ();

        fn create(_props: &Props, _context: &Context, _link: Link<Self>) -> Self {
            Greeting
        }

        fn render(&self, props: &Props, _state: &(), _context: &Context) -> VNode {
            h("h1", None, [format!("hello {}", props.str("name").unwrap_or("?"))])
        }
    }

    let options = MountOptions {
        keyed: true,
        ..MountOptions::default()
    };
    let app = mount(
        MemoryTarget::new(),
        |name: &String, _: &SetState<String>| {
            component::<Greeting>(Some(Attributes::new().with("name", name.as_str())), Vec::new())
        },
        "world".to_string(),
        options,
    )
    .unwrap();
    let h1 = app.root_node().expect("rendered");
    assert_eq!(app.renderer().target().text_content(h1), "hello world");

    app.set_state().replace("huerto".to_string()).unwrap();

    assert_eq!(app.root_node(), Some(h1));
    assert_eq!(app.renderer().target().text_content(h1), "hello huerto");
}

#[test]
fn unmount_stops_rendering() {
    let app = mount(MemoryTarget::new(), counter_view, 0, MountOptions::default()).unwrap();
    let renderer = app.renderer().clone();
    let store = app.store().clone();
    let div = app.root_node().expect("rendered");

    app.unmount().unwrap();
    store.replace(5);

    assert!(!renderer.target().contains(div));
    assert_eq!(renderer.target().len(), 1);
    assert_eq!(store.listener_count(), 0);
}
