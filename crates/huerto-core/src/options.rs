/// Renderer-wide switches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Prop changes re-render nested components immediately. When `false`,
    /// components that already rendered once are queued instead.
    pub sync_component_updates: bool,
    /// Keep unmounted instances and their detached bases for reuse.
    pub recycle: bool,
    /// Pooled instances kept per component type.
    pub recycle_limit: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sync_component_updates: true,
            recycle: true,
            recycle_limit: 7,
        }
    }
}
