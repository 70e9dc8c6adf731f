use huerto_core::{component, h, Attributes, Component, Context, Link, Props, SetState, VNode};

/// Top-level state owned by the mounted store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DemoState {
    pub count: i32,
    pub show_todos: bool,
}

pub fn counter_view(state: &DemoState, set_state: &SetState<DemoState>) -> VNode {
    let increment = set_state.clone();
    let decrement = set_state.clone();
    h(
        "section",
        Some(Attributes::new().with("class", "counter")),
        [
            h("h2", None, [format!("Count: {}", state.count)]),
            h(
                "button",
                Some(Attributes::new().with("id", "decrement").on("click", move |_| {
                    if let Err(err) = decrement.update(|state| state.count -= 1) {
                        log::error!("decrement failed: {err}");
                    }
                })),
                ["-"],
            ),
            h(
                "button",
                Some(Attributes::new().with("id", "increment").on("click", move |_| {
                    if let Err(err) = increment.update(|state| state.count += 1) {
                        log::error!("increment failed: {err}");
                    }
                })),
                ["+"],
            ),
        ],
    )
}

pub fn combined_view(state: &DemoState, set_state: &SetState<DemoState>) -> VNode {
    let toggle = set_state.clone();
    let todos = state
        .show_todos
        .then(|| component::<TodoList>(None, Vec::new()).with_key("todos"));
    h(
        "main",
        None,
        [
            counter_view(state, set_state),
            h(
                "button",
                Some(Attributes::new().with("id", "toggle").on("click", move |_| {
                    if let Err(err) = toggle.update(|state| state.show_todos = !state.show_todos) {
                        log::error!("toggle failed: {err}");
                    }
                })),
                [if state.show_todos { "hide todos" } else { "show todos" }],
            ),
            todos.unwrap_or_default(),
        ],
    )
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TodoState {
    pub items: Vec<(u32, String)>,
    pub next_id: u32,
}

/// Keyed list whose rows keep their live nodes across reorders.
pub struct TodoList {
    link: Link<TodoList>,
}

impl TodoList {
    fn row(&self, id: u32, label: &str) -> VNode {
        let link = self.link.clone();
        h(
            "li",
            None,
            [
                h("span", None, [label]),
                h(
                    "button",
                    Some(Attributes::new().with("class", "remove").on("click", move |_| {
                        link.set_state(move |state: &mut TodoState| {
                            state.items.retain(|(item, _)| *item != id);
                        });
                    })),
                    ["x"],
                ),
            ],
        )
        .with_key(id)
    }
}

impl Component for TodoList {
    type State = TodoState;

    fn create(_props: &Props, _context: &Context, link: Link<Self>) -> Self {
        TodoList { link }
    }

    fn initial_state(&self, _props: &Props) -> TodoState {
        TodoState {
            items: vec![(0, "water the beds".into()), (1, "plant garlic".into())],
            next_id: 2,
        }
    }

    fn render(&self, _props: &Props, state: &TodoState, _context: &Context) -> VNode {
        let add = self.link.clone();
        let reverse = self.link.clone();
        let rows: Vec<VNode> = state
            .items
            .iter()
            .map(|(id, label)| self.row(*id, label))
            .collect();
        h(
            "div",
            Some(Attributes::new().with("class", "todos")),
            [
                h(
                    "button",
                    Some(Attributes::new().with("id", "add").on("click", move |_| {
                        add.set_state(|state: &mut TodoState| {
                            let id = state.next_id;
                            state.next_id += 1;
                            state.items.push((id, format!("task {id}")));
                        });
                    })),
                    ["add"],
                ),
                h(
                    "button",
                    Some(Attributes::new().with("id", "reverse").on("click", move |_| {
                        reverse.set_state(|state: &mut TodoState| state.items.reverse());
                    })),
                    ["reverse"],
                ),
                h("ul", None, rows),
            ],
        )
    }

    fn did_mount(&mut self, _props: &Props, state: &TodoState) {
        log::info!("todo list mounted with {} item(s)", state.items.len());
    }

    fn will_unmount(&mut self) {
        log::info!("todo list unmounted");
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
