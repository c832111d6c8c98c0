use std::sync::atomic::{AtomicU64, Ordering};

use crate::pipeline::filter::FilterId;

/// What changed in a pipeline's own state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineChange {
    /// The source image was set, replaced or removed.
    ImageChanged,
    /// A filter joined the list.
    FilterAdded(FilterId),
    /// A filter left the list.
    FilterRemoved(FilterId),
    /// List order changed.
    FiltersReordered,
    /// Every filter was removed.
    FiltersCleared,
}

/// Notification raised synchronously by a [`Pipeline`](crate::Pipeline) mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineEvent {
    /// Image or list membership changed.
    PipelineChanged(PipelineChange),
    /// A member filter's own state changed.
    FilterChanged(FilterId),
}

/// Handle identifying one subscriber; pass it back to `unsubscribe`.
///
/// Handles are unique across all pipelines, so unsubscribing from the wrong pipeline is a
/// miss rather than the removal of an unrelated handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

static NEXT_SUBSCRIPTION: AtomicU64 = AtomicU64::new(0);

pub(crate) type Handler = Box<dyn FnMut(&PipelineEvent)>;

/// Subscriber list owned by a pipeline.
#[derive(Default)]
pub(crate) struct EventHub {
    handlers: Vec<(Subscription, Handler)>,
}

impl EventHub {
    pub(crate) fn subscribe(&mut self, handler: Handler) -> Subscription {
        let sub = Subscription(NEXT_SUBSCRIPTION.fetch_add(1, Ordering::Relaxed));
        self.handlers.push((sub, handler));
        sub
    }

    pub(crate) fn unsubscribe(&mut self, sub: Subscription) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(s, _)| *s != sub);
        self.handlers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.len()
    }

    pub(crate) fn emit(&mut self, event: PipelineEvent) {
        for (_, handler) in &mut self.handlers {
            handler(&event);
        }
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("subscribers", &self.handlers.len())
            .finish()
    }
}
