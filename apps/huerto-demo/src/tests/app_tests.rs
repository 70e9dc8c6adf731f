use super::*;
use huerto_core::{mount, Event, MemoryTarget, MountOptions, NodeId, RenderTarget};
use huerto_testing::RenderTestRule;

fn by_id(target: &MemoryTarget, id: &str) -> NodeId {
    target
        .find_all(target.root(), "button")
        .into_iter()
        .find(|&node| target.attribute(node, "id").unwrap().as_deref() == Some(id))
        .expect("button with id")
}

fn labels(rule: &RenderTestRule) -> Vec<String> {
    let labels = rule
        .find_all("span")
        .into_iter()
        .map(|span| rule.text_of(span))
        .collect();
    labels
}

#[test]
fn counter_buttons_update_the_heading() {
    let app = mount(
        MemoryTarget::new(),
        combined_view,
        DemoState::default(),
        MountOptions {
            keyed: true,
            ..MountOptions::default()
        },
    )
    .unwrap();
    let heading = app
        .renderer()
        .target()
        .find_first(app.renderer().root(), "h2")
        .unwrap();

    let increment = by_id(&app.renderer().target(), "increment");
    app.dispatch(increment, Event::new("click", increment)).unwrap();
    app.dispatch(increment, Event::new("click", increment)).unwrap();
    let decrement = by_id(&app.renderer().target(), "decrement");
    app.dispatch(decrement, Event::new("click", decrement)).unwrap();

    assert_eq!(app.state().count, 1);
    assert_eq!(app.renderer().target().text_content(heading), "Count: 1");
}

#[test]
fn toggling_mounts_and_unmounts_the_todo_list() {
    let app = mount(
        MemoryTarget::new(),
        combined_view,
        DemoState::default(),
        MountOptions {
            keyed: true,
            ..MountOptions::default()
        },
    )
    .unwrap();
    assert_eq!(app.renderer().live_components(), 0);

    let toggle = by_id(&app.renderer().target(), "toggle");
    app.dispatch(toggle, Event::new("click", toggle)).unwrap();
    assert_eq!(app.renderer().live_components(), 1);
    assert_eq!(
        app.renderer().target().find_all(app.renderer().root(), "li").len(),
        2
    );

    let toggle = by_id(&app.renderer().target(), "toggle");
    app.dispatch(toggle, Event::new("click", toggle)).unwrap();
    assert_eq!(app.renderer().live_components(), 0);
}

#[test]
fn todo_rows_keep_their_nodes_when_reversed() {
    let mut rule = RenderTestRule::new();
    rule.set_content(|| component::<TodoList>(None, Vec::new()))
        .unwrap();
    let rows = rule.find_all("li");
    assert_eq!(labels(&rule), vec!["water the beds", "plant garlic"]);

    let reverse = by_id(&rule.target(), "reverse");
    rule.click(reverse).unwrap();

    assert_eq!(labels(&rule), vec!["plant garlic", "water the beds"]);
    assert_eq!(rule.find_all("li"), vec![rows[1], rows[0]]);
}

#[test]
fn todo_rows_can_be_added_and_removed() {
    let mut rule = RenderTestRule::new();
    rule.set_content(|| component::<TodoList>(None, Vec::new()))
        .unwrap();

    let add = by_id(&rule.target(), "add");
    rule.click(add).unwrap();
    assert_eq!(labels(&rule), vec!["water the beds", "plant garlic", "task 2"]);

    let first_remove = rule.find_all("button")[2];
    rule.click(first_remove).unwrap();
    assert_eq!(labels(&rule), vec!["plant garlic", "task 2"]);
    assert_eq!(rule.find_all("li").len(), 2);
}
