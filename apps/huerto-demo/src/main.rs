use huerto_core::{mount_with, App, Event, MemoryTarget, MountOptions, NodeId, RenderTarget};
use huerto_demo::app::{combined_view, DemoState};
use huerto_runtime_std::StdRuntime;

type DemoApp = App<MemoryTarget, DemoState>;

fn init_logging() {
    #[cfg(feature = "logging")]
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn button(app: &DemoApp, id: &str) -> anyhow::Result<NodeId> {
    let target = app.renderer().target();
    let root = app.renderer().root();
    target
        .find_all(root, "button")
        .into_iter()
        .find(|&node| matches!(target.attribute(node, "id"), Ok(Some(value)) if value == id))
        .ok_or_else(|| anyhow::anyhow!("no button with id {id:?}"))
}

fn click(app: &DemoApp, runtime: &StdRuntime, id: &str) -> anyhow::Result<()> {
    let node = button(app, id)?;
    app.dispatch(node, Event::new("click", node))?;
    let rendered = runtime.run_until_idle(app.renderer(), 16)?;
    log::debug!("click on #{id} settled after {rendered} flush round(s)");
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();

    println!("=== Huerto Headless Demo ===");
    println!("Drives a counter and a keyed todo list against an in-memory target");
    println!();

    let runtime = StdRuntime::new();
    let app = mount_with(
        runtime.renderer(MemoryTarget::new()),
        combined_view,
        DemoState::default(),
        MountOptions {
            keyed: true,
            ..MountOptions::default()
        },
    )?;

    click(&app, &runtime, "increment")?;
    click(&app, &runtime, "increment")?;
    click(&app, &runtime, "decrement")?;
    click(&app, &runtime, "toggle")?;
    click(&app, &runtime, "add")?;
    click(&app, &runtime, "reverse")?;

    let root = app.renderer().root();
    println!("{}", app.renderer().target().dump_tree(Some(root)));
    println!("{:?}", app.renderer().target().stats());

    app.unmount()?;
    Ok(())
}
