use smallvec::SmallVec;

use crate::foundation::error::{FilterChainError, FilterChainResult};
use crate::pipeline::events::{EventHub, PipelineChange, PipelineEvent, Subscription};
use crate::pipeline::filter::{Filter, FilterId, InheritedContext};

/// Enabled filters of one frame, in list order.
pub type EnabledFilters<'a, F> = SmallVec<[&'a F; 8]>;

#[derive(Debug)]
struct FilterSlot<F> {
    id: FilterId,
    filter: F,
}

/// Ordered, observable filter list plus an optional source image.
///
/// Every mutation that changes observable state raises exactly one [`PipelineEvent`] on the
/// calling thread before returning. Handlers run while the pipeline is mutably borrowed
/// and must not reach back into it.
pub struct Pipeline<I, F: Filter> {
    image: Option<I>,
    filters: Vec<FilterSlot<F>>,
    next_filter_id: u64,
    context: Option<InheritedContext>,
    events: EventHub,
}

impl<I, F: Filter> Default for Pipeline<I, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I, F: Filter> Pipeline<I, F> {
    /// Empty pipeline with no image.
    pub fn new() -> Self {
        Self {
            image: None,
            filters: Vec::new(),
            next_filter_id: 0,
            context: None,
            events: EventHub::default(),
        }
    }

    /// Empty pipeline drawing `image`.
    pub fn with_image(image: I) -> Self {
        let mut p = Self::new();
        p.image = Some(image);
        p
    }

    /// Current source image.
    pub fn image(&self) -> Option<&I> {
        self.image.as_ref()
    }

    /// Replace the source image, returning the previous one.
    pub fn set_image(&mut self, image: Option<I>) -> Option<I> {
        if self.image.is_none() && image.is_none() {
            return None;
        }
        let old = std::mem::replace(&mut self.image, image);
        self.emit(PipelineEvent::PipelineChanged(PipelineChange::ImageChanged));
        old
    }

    /// Number of filters, enabled or not.
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Return `true` when the pipeline holds no filters.
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Append a filter to the end of the chain.
    pub fn push_filter(&mut self, filter: F) -> FilterId {
        let index = self.filters.len();
        self.insert_unchecked(index, filter)
    }

    /// Insert a filter at `index` (`0..=len`).
    pub fn insert_filter(&mut self, index: usize, filter: F) -> FilterChainResult<FilterId> {
        if index > self.filters.len() {
            return Err(FilterChainError::validation(format!(
                "filter index {index} out of range (len {})",
                self.filters.len()
            )));
        }
        Ok(self.insert_unchecked(index, filter))
    }

    fn insert_unchecked(&mut self, index: usize, mut filter: F) -> FilterId {
        let id = FilterId(self.next_filter_id);
        self.next_filter_id += 1;
        filter.set_inherited_context(self.context.as_ref());
        self.filters.insert(index, FilterSlot { id, filter });
        self.emit(PipelineEvent::PipelineChanged(PipelineChange::FilterAdded(
            id,
        )));
        id
    }

    /// Remove a filter, handing it back to the caller with its context cleared.
    pub fn remove_filter(&mut self, id: FilterId) -> Option<F> {
        let index = self.index_of(id)?;
        let mut slot = self.filters.remove(index);
        slot.filter.set_inherited_context(None);
        self.emit(PipelineEvent::PipelineChanged(
            PipelineChange::FilterRemoved(id),
        ));
        Some(slot.filter)
    }

    /// Move a filter to `new_index` (`0..len`), shifting the others.
    pub fn move_filter(&mut self, id: FilterId, new_index: usize) -> FilterChainResult<()> {
        let index = self.require_index(id)?;
        if new_index >= self.filters.len() {
            return Err(FilterChainError::validation(format!(
                "filter index {new_index} out of range (len {})",
                self.filters.len()
            )));
        }
        if index == new_index {
            return Ok(());
        }
        let slot = self.filters.remove(index);
        self.filters.insert(new_index, slot);
        self.emit(PipelineEvent::PipelineChanged(
            PipelineChange::FiltersReordered,
        ));
        Ok(())
    }

    /// Remove every filter.
    pub fn clear_filters(&mut self) {
        if self.filters.is_empty() {
            return;
        }
        for slot in &mut self.filters {
            slot.filter.set_inherited_context(None);
        }
        self.filters.clear();
        self.emit(PipelineEvent::PipelineChanged(
            PipelineChange::FiltersCleared,
        ));
    }

    /// Look up a filter by id.
    pub fn filter(&self, id: FilterId) -> Option<&F> {
        self.filters.iter().find(|s| s.id == id).map(|s| &s.filter)
    }

    /// Iterate `(id, filter)` pairs in chain order.
    pub fn filters(&self) -> impl Iterator<Item = (FilterId, &F)> + '_ {
        self.filters.iter().map(|s| (s.id, &s.filter))
    }

    /// Position of a filter in the chain.
    pub fn index_of(&self, id: FilterId) -> Option<usize> {
        self.filters.iter().position(|s| s.id == id)
    }

    /// Enable or disable a filter. Raises `FilterChanged` only when the flag flips.
    pub fn set_filter_enabled(&mut self, id: FilterId, enabled: bool) -> FilterChainResult<()> {
        let index = self.require_index(id)?;
        let filter = &mut self.filters[index].filter;
        if filter.is_enabled() == enabled {
            return Ok(());
        }
        filter.set_enabled(enabled);
        self.emit(PipelineEvent::FilterChanged(id));
        Ok(())
    }

    /// Mutate a filter in place and raise `FilterChanged` for it.
    pub fn update_filter<R>(
        &mut self,
        id: FilterId,
        f: impl FnOnce(&mut F) -> R,
    ) -> FilterChainResult<R> {
        let index = self.require_index(id)?;
        let out = f(&mut self.filters[index].filter);
        self.emit(PipelineEvent::FilterChanged(id));
        Ok(out)
    }

    /// Snapshot of the enabled filters in chain order.
    ///
    /// The borrow pins the pipeline, so membership and order cannot change while the
    /// snapshot is alive.
    pub fn enabled_snapshot(&self) -> EnabledFilters<'_, F> {
        self.filters
            .iter()
            .filter(|s| s.filter.is_enabled())
            .map(|s| &s.filter)
            .collect()
    }

    /// Context cascaded from the host, if any.
    pub fn inherited_context(&self) -> Option<&InheritedContext> {
        self.context.as_ref()
    }

    /// Store the host context and cascade it to every filter. `None` clears it.
    pub fn set_inherited_context(&mut self, context: Option<InheritedContext>) {
        self.context = context;
        for slot in &mut self.filters {
            slot.filter.set_inherited_context(self.context.as_ref());
        }
    }

    /// Register a change handler.
    pub fn subscribe(&mut self, handler: impl FnMut(&PipelineEvent) + 'static) -> Subscription {
        self.events.subscribe(Box::new(handler))
    }

    /// Remove a handler. Returns `false` when it was not registered.
    pub fn unsubscribe(&mut self, sub: Subscription) -> bool {
        self.events.unsubscribe(sub)
    }

    /// Number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.events.len()
    }

    fn require_index(&self, id: FilterId) -> FilterChainResult<usize> {
        self.index_of(id)
            .ok_or_else(|| FilterChainError::validation(format!("unknown filter {id:?}")))
    }

    fn emit(&mut self, event: PipelineEvent) {
        tracing::trace!(?event, "pipeline event");
        self.events.emit(event);
    }
}

impl<I, F: Filter> std::fmt::Debug for Pipeline<I, F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("has_image", &self.image.is_some())
            .field("filters", &self.filters.len())
            .field("events", &self.events)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/model.rs"]
mod tests;
