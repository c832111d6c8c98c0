use std::cell::Cell;
use std::rc::Rc;

use crate::pipeline::events::{PipelineEvent, Subscription};
use crate::pipeline::filter::Filter;
use crate::pipeline::model::Pipeline;

/// External trigger that schedules a repaint of the hosting surface.
pub trait RedrawScheduler {
    /// Ask for the next frame. Called synchronously from pipeline mutations.
    fn request_redraw(&self);
}

/// Scheduler that only counts requests; useful for headless hosts.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: Cell<u64>,
}

impl CountingScheduler {
    /// Requests received so far.
    pub fn requests(&self) -> u64 {
        self.requests.get()
    }
}

impl RedrawScheduler for CountingScheduler {
    fn request_redraw(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

struct Shared {
    scheduler: Rc<dyn RedrawScheduler>,
    generation: Cell<u64>,
    requests: Cell<u64>,
}

impl Shared {
    fn request(&self) {
        self.requests.set(self.requests.get() + 1);
        self.scheduler.request_redraw();
    }
}

/// Turns pipeline and filter change notifications into redraw requests.
///
/// At most one pipeline is attached at a time. Every attach hands the pipeline a handler
/// stamped with the current generation; detaching bumps the generation, so a handler
/// that outlives its attachment is inert.
pub struct InvalidationBridge {
    shared: Rc<Shared>,
    subscription: Option<Subscription>,
}

impl InvalidationBridge {
    /// Bridge forwarding to `scheduler`.
    pub fn new(scheduler: Rc<dyn RedrawScheduler>) -> Self {
        Self {
            shared: Rc::new(Shared {
                scheduler,
                generation: Cell::new(0),
                requests: Cell::new(0),
            }),
            subscription: None,
        }
    }

    /// Whether a pipeline is currently attached.
    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Subscribe to `pipeline`.
    ///
    /// A previous attachment that was never detached is retired first: its handler is
    /// removed when it belongs to `pipeline`, and left inert otherwise.
    pub fn attach<I, F: Filter>(&mut self, pipeline: &mut Pipeline<I, F>) {
        if self.subscription.is_some() {
            tracing::warn!("bridge attached twice without detach, retiring the old handler");
            self.retire(pipeline);
        }
        let shared = Rc::clone(&self.shared);
        let generation = shared.generation.get();
        let sub = pipeline.subscribe(move |event: &PipelineEvent| {
            if shared.generation.get() != generation {
                tracing::trace!(?event, "ignoring event from detached pipeline");
                return;
            }
            shared.request();
        });
        self.subscription = Some(sub);
    }

    /// Unsubscribe from `pipeline` and retire the current generation.
    pub fn detach<I, F: Filter>(&mut self, pipeline: &mut Pipeline<I, F>) {
        if !self.retire(pipeline) {
            tracing::warn!("detached pipeline did not hold the bridge subscription");
        }
    }

    // Bumps the generation and drops the subscription; true when `pipeline` held it.
    fn retire<I, F: Filter>(&mut self, pipeline: &mut Pipeline<I, F>) -> bool {
        self.shared
            .generation
            .set(self.shared.generation.get().wrapping_add(1));
        match self.subscription.take() {
            Some(sub) => pipeline.unsubscribe(sub),
            None => true,
        }
    }

    /// Request a redraw directly.
    pub fn request_redraw(&self) {
        self.shared.request();
    }

    /// Redraw requests forwarded so far.
    pub fn redraw_requests(&self) -> u64 {
        self.shared.requests.get()
    }
}

impl std::fmt::Debug for InvalidationBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationBridge")
            .field("attached", &self.subscription.is_some())
            .field("generation", &self.shared.generation.get())
            .field("requests", &self.shared.requests.get())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/bridge.rs"]
mod tests;
