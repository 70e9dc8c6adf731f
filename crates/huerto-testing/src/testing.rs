use std::cell::Ref;

use huerto_core::{Event, MemoryTarget, NodeId, RenderError, RenderOptions, Renderer, VNode};
use huerto_runtime_std::StdRuntime;

const MAX_PUMP_ROUNDS: usize = 100;

/// Headless harness for exercising virtual trees in tests.
///
/// `RenderTestRule` owns an in-memory target, a renderer wired to a
/// [`StdRuntime`] scheduler and the installed content closure. Helpers drive
/// re-renders, drain queued component updates and deliver events without a
/// host platform.
pub struct RenderTestRule {
    runtime: StdRuntime,
    renderer: Renderer<MemoryTarget>,
    content: Option<Box<dyn FnMut() -> VNode>>,
    live: Option<NodeId>,
}

impl RenderTestRule {
    pub fn new() -> Self {
        Self::with_options(RenderOptions::default())
    }

    pub fn with_options(options: RenderOptions) -> Self {
        let runtime = StdRuntime::with_options(options);
        let renderer = runtime.renderer(MemoryTarget::new());
        Self {
            runtime,
            renderer,
            content: None,
            live: None,
        }
    }

    /// Install `content` and render it under the target root.
    pub fn set_content(&mut self, content: impl FnMut() -> VNode + 'static) -> Result<(), RenderError> {
        self.content = Some(Box::new(content));
        self.render()
    }

    /// Calls the installed content again and diffs it against the live tree.
    pub fn rerender(&mut self) -> Result<(), RenderError> {
        self.render()
    }

    /// Flushes queued component updates until the render queue stays empty.
    ///
    /// Panics if updates keep scheduling each other for too many rounds.
    pub fn pump_until_idle(&mut self) -> Result<(), RenderError> {
        let mut rounds = 0;
        loop {
            rounds += 1;
            if rounds > MAX_PUMP_ROUNDS {
                panic!("pump_until_idle looped too many times!");
            }
            let rendered = self.runtime.drain(&self.renderer)?;
            if rendered == 0 {
                break;
            }
            log::trace!("pump_until_idle: round {rounds} rendered {rendered} instance(s)");
        }
        Ok(())
    }

    /// Dispatches `event` to `node` and pumps any updates it queued.
    /// Returns how many listeners ran.
    pub fn dispatch(&mut self, node: NodeId, event: Event) -> Result<usize, RenderError> {
        let handled = self.renderer.dispatch(node, event)?;
        self.pump_until_idle()?;
        Ok(handled)
    }

    pub fn click(&mut self, node: NodeId) -> Result<usize, RenderError> {
        self.dispatch(node, Event::new("click", node))
    }

    /// First node below the root with `tag`, depth first.
    pub fn find_first(&self, tag: &str) -> Option<NodeId> {
        let root = self.renderer.root();
        self.renderer.target().find_first(root, tag)
    }

    pub fn find_all(&self, tag: &str) -> Vec<NodeId> {
        let root = self.renderer.root();
        self.renderer.target().find_all(root, tag)
    }

    pub fn text_of(&self, node: NodeId) -> String {
        self.renderer.target().text_content(node)
    }

    /// Dump the current node tree as text for debugging
    pub fn dump_tree(&self) -> String {
        let root = self.renderer.root();
        self.renderer.target().dump_tree(Some(root))
    }

    pub fn has_content(&self) -> bool {
        self.content.is_some()
    }

    /// Live node produced by the last render of the content.
    pub fn root_id(&self) -> Option<NodeId> {
        self.live
    }

    /// Flush requests raised by the render queue so far.
    pub fn flush_requests(&self) -> usize {
        self.runtime.scheduler().request_count()
    }

    pub fn renderer(&self) -> &Renderer<MemoryTarget> {
        &self.renderer
    }

    pub fn target(&self) -> Ref<'_, MemoryTarget> {
        self.renderer.target()
    }

    fn render(&mut self) -> Result<(), RenderError> {
        if let Some(content) = self.content.as_mut() {
            let node = content();
            let root = self.renderer.root();
            self.live = Some(self.renderer.render(&node, root, self.live)?);
        }
        Ok(())
    }
}

impl Default for RenderTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `RenderTestRule`.
pub fn run_test_render<R>(f: impl FnOnce(&mut RenderTestRule) -> R) -> R {
    let mut rule = RenderTestRule::new();
    f(&mut rule)
}

#[cfg(test)]
#[path = "tests/testing_tests.rs"]
mod tests;
