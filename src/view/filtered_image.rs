use std::cell::{RefCell, RefMut};
use std::rc::Rc;

use crate::foundation::core::IntRect;
use crate::foundation::error::{FilterChainError, FilterChainResult};
use crate::pipeline::filter::{Filter, InheritedContext};
use crate::pipeline::model::Pipeline;
use crate::render::backend::RenderBackend;
use crate::render::compositor::{CompositeOutcome, Compositor};
use crate::view::bridge::{InvalidationBridge, RedrawScheduler};

/// Pipeline shared between the host and a [`FilteredImage`].
pub type SharedPipeline<I, F> = Rc<RefCell<Pipeline<I, F>>>;

/// Host-facing control that paints a pipeline through a [`Compositor`].
///
/// The host owns the drawing target, the backend and the redraw trigger. This type
/// keeps the pipeline subscription, the binding context and the cached surfaces in step
/// with the host's lifecycle calls.
pub struct FilteredImage<B: RenderBackend, F: Filter<Paint = B::Paint>> {
    pipeline: Option<SharedPipeline<B::Image, F>>,
    binding_context: Option<InheritedContext>,
    bridge: InvalidationBridge,
    compositor: Compositor<B>,
}

impl<B, F> FilteredImage<B, F>
where
    B: RenderBackend,
    F: Filter<Paint = B::Paint>,
{
    /// Control with no pipeline, forwarding invalidations to `scheduler`.
    pub fn new(scheduler: Rc<dyn RedrawScheduler>) -> Self {
        Self {
            pipeline: None,
            binding_context: None,
            bridge: InvalidationBridge::new(scheduler),
            compositor: Compositor::new(),
        }
    }

    /// Currently attached pipeline.
    pub fn pipeline(&self) -> Option<&SharedPipeline<B::Image, F>> {
        self.pipeline.as_ref()
    }

    /// Swap the pipeline, returning the previous one.
    ///
    /// The old pipeline is unsubscribed and loses its inherited context before the new
    /// one is subscribed, so no event from the old pipeline can reach the host afterwards.
    /// When either pipeline is borrowed elsewhere nothing changes and a `Validation` error
    /// is returned.
    pub fn set_pipeline(
        &mut self,
        pipeline: Option<SharedPipeline<B::Image, F>>,
    ) -> FilterChainResult<Option<SharedPipeline<B::Image, F>>> {
        let unchanged = matches!(
            (&self.pipeline, &pipeline),
            (Some(cur), Some(new)) if Rc::ptr_eq(cur, new)
        );
        if unchanged {
            self.bridge.request_redraw();
            return Ok(pipeline);
        }

        let mut old_guard = self
            .pipeline
            .as_ref()
            .map(|p| borrow_for_update(p, "current"))
            .transpose()?;
        let mut new_guard = pipeline
            .as_ref()
            .map(|p| borrow_for_update(p, "new"))
            .transpose()?;

        if let Some(p) = old_guard.as_deref_mut() {
            self.bridge.detach(p);
            p.set_inherited_context(None);
        }
        if let Some(p) = new_guard.as_deref_mut() {
            p.set_inherited_context(self.binding_context.clone());
            self.bridge.attach(p);
        }
        drop(old_guard);
        drop(new_guard);

        let old = std::mem::replace(&mut self.pipeline, pipeline);
        self.bridge.request_redraw();
        Ok(old)
    }

    /// Binding context cascaded into the pipeline.
    pub fn binding_context(&self) -> Option<&InheritedContext> {
        self.binding_context.as_ref()
    }

    /// Replace the binding context and cascade it into the current pipeline.
    ///
    /// Fails without changing anything when the pipeline is borrowed elsewhere.
    pub fn set_binding_context(
        &mut self,
        context: Option<InheritedContext>,
    ) -> FilterChainResult<()> {
        if let Some(p) = &self.pipeline {
            borrow_for_update(p, "current")?.set_inherited_context(context.clone());
        }
        self.binding_context = context;
        Ok(())
    }

    /// A new drawing target was attached; surfaces from the previous one are dropped.
    pub fn attach_target(&mut self) {
        self.compositor.invalidate_surfaces();
        self.bridge.request_redraw();
    }

    /// The drawing target went away; release every cached surface.
    pub fn detach_target(&mut self) {
        self.compositor.invalidate_surfaces();
    }

    /// Request a repaint from the host.
    pub fn invalidate(&self) {
        self.bridge.request_redraw();
    }

    /// Redraw requests forwarded to the host so far.
    pub fn redraw_requests(&self) -> u64 {
        self.bridge.redraw_requests()
    }

    /// The compositor, for cache inspection.
    pub fn compositor(&self) -> &Compositor<B> {
        &self.compositor
    }

    /// Paint the current pipeline into `viewport` on `canvas`.
    ///
    /// With no pipeline the viewport is only cleared. A pipeline that is mutably borrowed
    /// elsewhere is skipped for this frame.
    pub fn paint(
        &mut self,
        backend: &mut B,
        canvas: &mut B::Surface,
        viewport: IntRect,
    ) -> CompositeOutcome {
        match &self.pipeline {
            None => {
                let empty = Pipeline::<B::Image, F>::new();
                self.compositor.composite(backend, canvas, viewport, &empty)
            }
            Some(shared) => match shared.try_borrow() {
                Ok(p) => self.compositor.composite(backend, canvas, viewport, &*p),
                Err(_) => {
                    tracing::warn!("pipeline is being mutated, skipping paint");
                    CompositeOutcome::Aborted {
                        reason: "pipeline is being mutated".to_owned(),
                    }
                }
            },
        }
    }
}

fn borrow_for_update<'a, I, F: Filter>(
    pipeline: &'a SharedPipeline<I, F>,
    role: &'static str,
) -> FilterChainResult<RefMut<'a, Pipeline<I, F>>> {
    pipeline.try_borrow_mut().map_err(|_| {
        tracing::warn!(role, "pipeline is borrowed elsewhere, leaving it unchanged");
        FilterChainError::validation(format!("{role} pipeline is borrowed elsewhere"))
    })
}

impl<B, F> std::fmt::Debug for FilteredImage<B, F>
where
    B: RenderBackend,
    F: Filter<Paint = B::Paint>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilteredImage")
            .field("has_pipeline", &self.pipeline.is_some())
            .field("bridge", &self.bridge)
            .field("compositor", &self.compositor)
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/view/filtered_image.rs"]
mod tests;
