use super::*;
use crate::node::{h, text, Attributes};
use crate::memory::MemoryTarget;

#[test]
fn clones_share_the_same_target() {
    let renderer = Renderer::new(MemoryTarget::new());
    let other = renderer.clone();

    let p = renderer
        .render(&h("p", None, ["shared"]), renderer.root(), None)
        .unwrap();

    assert_eq!(other.target().text_content(p), "shared");
    assert_eq!(other.target().parent(p).unwrap(), Some(other.root()));
}

#[test]
fn default_options_are_used() {
    let renderer: Renderer<MemoryTarget> = Renderer::default();
    assert_eq!(renderer.options(), &RenderOptions::default());
    assert!(!renderer.has_pending());
}

#[test]
fn reentrant_calls_are_rejected() {
    let renderer = Renderer::new(MemoryTarget::new());
    let root = renderer.root();
    let _guard = renderer.target_mut();

    assert_eq!(
        renderer.render(&text("x"), root, None).unwrap_err(),
        RenderError::Reentrant
    );
    assert_eq!(
        renderer.patch(root, None, Some(&text("x")), 0).unwrap_err(),
        RenderError::Reentrant
    );
    assert_eq!(
        renderer.materialize(&text("x")).unwrap_err(),
        RenderError::Reentrant
    );
}

#[test]
fn patch_and_materialize_operate_on_the_owned_target() {
    let renderer = Renderer::new(MemoryTarget::new());
    let root = renderer.root();
    let first = h("ul", None, [h("li", None, ["a"])]);
    let second = h("ul", None, [h("li", None, ["a"]), h("li", None, ["b"])]);

    renderer.patch(root, None, Some(&first), 0).unwrap();
    renderer.patch(root, Some(&first), Some(&second), 0).unwrap();
    let ul = renderer.target().child_at(root, 0).unwrap().unwrap();
    assert_eq!(renderer.target().text_content(ul), "ab");

    let detached = renderer.materialize(&second).unwrap();
    assert_eq!(renderer.target().parent(detached).unwrap(), None);
    assert_eq!(
        renderer.target().snapshot(detached).unwrap(),
        renderer.target().snapshot(ul).unwrap()
    );
}

#[test]
fn render_into_nested_parent() {
    let renderer = Renderer::new(MemoryTarget::new());
    let shell = renderer
        .render(&h("main", None, Vec::<VNode>::new()), renderer.root(), None)
        .unwrap();

    let card = renderer
        .render(
            &h("article", Some(Attributes::new().with("id", "card")), ["body"]),
            shell,
            None,
        )
        .unwrap();

    assert_eq!(renderer.target().parent(card).unwrap(), Some(shell));
    assert_eq!(
        renderer.target().attribute(card, "id").unwrap().as_deref(),
        Some("card")
    );
}

#[test]
fn render_text_root() {
    let renderer = Renderer::new(MemoryTarget::new());
    let root = renderer.root();
    let node = renderer.render(&VNode::from(5), root, None).unwrap();
    assert_eq!(renderer.target().text(node).unwrap().as_deref(), Some("5"));

    let again = renderer.render(&VNode::from(6), root, Some(node)).unwrap();
    assert_eq!(again, node);
    assert_eq!(renderer.target().text(node).unwrap().as_deref(), Some("6"));
}

#[test]
fn dispatch_without_listeners_reports_zero() {
    let renderer = Renderer::new(MemoryTarget::new());
    let p = renderer
        .render(&h("p", None, ["quiet"]), renderer.root(), None)
        .unwrap();
    assert_eq!(renderer.dispatch(p, Event::new("click", p)).unwrap(), 0);
    assert_eq!(
        renderer.dispatch(999, Event::new("click", 999)).unwrap_err(),
        RenderError::MissingNode { id: 999 }
    );
}

#[test]
fn listeners_may_re_render_through_a_cloned_handle() {
    let renderer = Renderer::new(MemoryTarget::new());
    let root = renderer.root();
    let handle = renderer.clone();
    let button = renderer
        .render(
            &h(
                "button",
                Some(Attributes::new().on("click", move |event| {
                    handle
                        .render(&h("button", None, ["clicked"]), handle.root(), Some(event.target))
                        .unwrap();
                })),
                ["idle"],
            ),
            root,
            None,
        )
        .unwrap();

    renderer.dispatch(button, Event::new("click", button)).unwrap();

    assert_eq!(renderer.target().text_content(button), "clicked");
    assert_eq!(renderer.target().listener_count(button), 0);
}
