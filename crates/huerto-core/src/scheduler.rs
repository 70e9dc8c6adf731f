//! Batching of component re-render requests.

use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::collections::map::IndexSet;
use crate::component::InstanceFlags;
use crate::InstanceId;

/// Host hook asked to run [`Renderer::flush`](crate::Renderer::flush) at
/// some later point, typically the next frame or event-loop turn.
pub trait FlushScheduler: Send + Sync {
    fn schedule_flush(&self);
}

/// Never arms anything; hosts call `flush` themselves.
#[derive(Default)]
pub struct DefaultScheduler;

impl FlushScheduler for DefaultScheduler {
    fn schedule_flush(&self) {}
}

/// Insertion-ordered set of dirty instances.
pub struct RenderQueue {
    items: RefCell<IndexSet<InstanceId>>,
    scheduler: Arc<dyn FlushScheduler>,
}

impl RenderQueue {
    pub(crate) fn new(scheduler: Arc<dyn FlushScheduler>) -> Self {
        Self {
            items: RefCell::new(IndexSet::default()),
            scheduler,
        }
    }

    /// Marks the instance dirty. Only the first insertion into an empty
    /// queue arms a flush; already dirty instances are ignored.
    pub(crate) fn enqueue(&self, id: InstanceId, flags: &InstanceFlags) {
        if flags.dirty.replace(true) {
            return;
        }
        let arm = {
            let mut items = self.items.borrow_mut();
            let was_empty = items.is_empty();
            items.insert(id);
            was_empty
        };
        if arm {
            log::debug!("render queue armed by {id}");
            self.scheduler.schedule_flush();
        }
    }

    /// Most recently queued instance.
    pub(crate) fn pop(&self) -> Option<InstanceId> {
        self.items.borrow_mut().pop()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    pub fn scheduler(&self) -> Arc<dyn FlushScheduler> {
        Arc::clone(&self.scheduler)
    }
}

impl fmt::Debug for RenderQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderQueue")
            .field("items", &*self.items.borrow())
            .finish()
    }
}
