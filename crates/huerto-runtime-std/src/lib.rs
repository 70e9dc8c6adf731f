//! Standard runtime services backed by Rust's `std` library.
//!
//! [`StdScheduler`] records flush requests made by a [`Renderer`]'s render
//! queue and optionally wakes a host event loop. [`StdRuntime`] bundles the
//! scheduler with helpers that build renderers wired to it and drain their
//! pending updates.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use huerto_core::{FlushScheduler, RenderError, RenderOptions, RenderTarget, Renderer};

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that raises a flag, and calls an optional waker, whenever a
/// render queue goes from empty to non-empty.
pub struct StdScheduler {
    frame_requested: AtomicBool,
    requests: AtomicUsize,
    frame_waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            frame_requested: AtomicBool::new(false),
            requests: AtomicUsize::new(0),
            frame_waker: RwLock::new(None),
        }
    }

    /// Returns whether a flush has been requested since the last call.
    pub fn take_frame_request(&self) -> bool {
        self.frame_requested.swap(false, Ordering::SeqCst)
    }

    /// Total number of flush requests seen.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Registers a waker invoked whenever a new flush is scheduled.
    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .frame_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_frame_waker(&self) {
        *self
            .frame_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .frame_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field(
                "frame_requested",
                &self.frame_requested.load(Ordering::SeqCst),
            )
            .field("requests", &self.request_count())
            .finish()
    }
}

impl FlushScheduler for StdScheduler {
    fn schedule_flush(&self) {
        self.frame_requested.store(true, Ordering::SeqCst);
        self.requests.fetch_add(1, Ordering::SeqCst);
        log::trace!("flush requested");
        self.wake();
    }
}

/// Convenience container around a shared [`StdScheduler`].
#[derive(Clone, Default)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    options: RenderOptions,
}

impl StdRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runtime whose renderers are built with `options`.
    pub fn with_options(options: RenderOptions) -> Self {
        Self {
            scheduler: Arc::new(StdScheduler::new()),
            options,
        }
    }

    /// Builds a renderer over `target` whose render queue reports to this
    /// runtime's scheduler.
    pub fn renderer<T: RenderTarget>(&self, target: T) -> Renderer<T> {
        let scheduler: Arc<dyn FlushScheduler> = self.scheduler.clone();
        Renderer::with_options(target, scheduler, self.options.clone())
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn take_frame_request(&self) -> bool {
        self.scheduler.take_frame_request()
    }

    pub fn set_frame_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_frame_waker(waker);
    }

    pub fn clear_frame_waker(&self) {
        self.scheduler.clear_frame_waker();
    }

    /// Flushes `renderer` if a flush was requested since the last poll.
    /// Returns how many component instances were re-rendered.
    pub fn drain<T: RenderTarget>(&self, renderer: &Renderer<T>) -> Result<usize, RenderError> {
        if !self.take_frame_request() && !renderer.has_pending() {
            return Ok(0);
        }
        renderer.flush()
    }

    /// Keeps draining until no further flush is requested, giving up after
    /// `max_rounds`. Returns the number of rounds that rendered something.
    pub fn run_until_idle<T: RenderTarget>(
        &self,
        renderer: &Renderer<T>,
        max_rounds: usize,
    ) -> Result<usize, RenderError> {
        let mut rounds = 0;
        while rounds < max_rounds {
            if self.drain(renderer)? == 0 {
                return Ok(rounds);
            }
            rounds += 1;
        }
        if renderer.has_pending() {
            log::warn!("render queue still busy after {max_rounds} rounds");
        }
        Ok(rounds)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/std_runtime_tests.rs"]
mod tests;
