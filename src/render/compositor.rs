use crate::foundation::core::{IntPoint, IntRect};
use crate::foundation::error::{FilterChainError, FilterChainResult};
use crate::pipeline::filter::Filter;
use crate::pipeline::model::Pipeline;
use crate::render::backend::{DrawSurface, RenderBackend, SourceImage};
use crate::render::surface_cache::{SlotId, SurfaceCache};

/// What a single [`Compositor::composite`] call ended up drawing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CompositeOutcome {
    /// The pipeline has no image; the viewport was only cleared.
    NoImage,
    /// Viewport or image has zero area; the viewport was only cleared.
    Degenerate,
    /// The image was drawn straight onto the canvas, with the single enabled filter's
    /// paint when `filtered` is set.
    Direct {
        /// Aspect-fit placement on the canvas.
        target: IntRect,
        /// Whether a filter paint was applied.
        filtered: bool,
    },
    /// Two or more filters were chained through the cached surfaces.
    MultiPass {
        /// Aspect-fit placement on the canvas.
        target: IntRect,
        /// Number of filter passes executed.
        passes: usize,
    },
    /// Allocation or drawing failed; nothing further was drawn this frame.
    Aborted {
        /// Display form of the contained error.
        reason: String,
    },
}

impl CompositeOutcome {
    /// Return `true` when the frame was abandoned.
    pub fn is_aborted(&self) -> bool {
        matches!(self, CompositeOutcome::Aborted { .. })
    }
}

/// Draws a [`Pipeline`] onto a destination canvas, chaining enabled filters through two
/// ping-pong surfaces.
pub struct Compositor<B: RenderBackend> {
    cache: SurfaceCache<B::Surface>,
}

impl<B: RenderBackend> Default for Compositor<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RenderBackend> Compositor<B> {
    /// Compositor with an empty surface cache.
    pub fn new() -> Self {
        Self {
            cache: SurfaceCache::new(),
        }
    }

    /// Read access to the intermediate surface cache.
    pub fn cache(&self) -> &SurfaceCache<B::Surface> {
        &self.cache
    }

    /// Drop both cached surfaces, e.g. when the destination is detached or its context lost.
    pub fn invalidate_surfaces(&mut self) {
        self.cache.invalidate();
    }

    /// Render one frame of `pipeline` into `viewport` on `canvas`.
    ///
    /// The viewport is always cleared first. Failures are contained: the frame is
    /// abandoned, logged and reported as [`CompositeOutcome::Aborted`].
    #[tracing::instrument(skip_all, fields(viewport = ?viewport))]
    pub fn composite<F>(
        &mut self,
        backend: &mut B,
        canvas: &mut B::Surface,
        viewport: IntRect,
        pipeline: &Pipeline<B::Image, F>,
    ) -> CompositeOutcome
    where
        F: Filter<Paint = B::Paint>,
    {
        match self.composite_inner(backend, canvas, viewport, pipeline) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::warn!(error = %err, "composite aborted");
                CompositeOutcome::Aborted {
                    reason: err.to_string(),
                }
            }
        }
    }

    fn composite_inner<F>(
        &mut self,
        backend: &mut B,
        canvas: &mut B::Surface,
        viewport: IntRect,
        pipeline: &Pipeline<B::Image, F>,
    ) -> FilterChainResult<CompositeOutcome>
    where
        F: Filter<Paint = B::Paint>,
    {
        canvas.clear_rect(viewport);

        let Some(image) = pipeline.image() else {
            return Ok(CompositeOutcome::NoImage);
        };

        let target = viewport.aspect_fit(image.size());
        if target.is_empty() {
            return Ok(CompositeOutcome::Degenerate);
        }

        let enabled = pipeline.enabled_snapshot();
        match enabled.as_slice() {
            [] => {
                canvas.draw_image(image, target, None)?;
                Ok(CompositeOutcome::Direct {
                    target,
                    filtered: false,
                })
            }
            [only] => {
                let paint = only.paint();
                canvas.draw_image(image, target, Some(&paint))?;
                Ok(CompositeOutcome::Direct {
                    target,
                    filtered: true,
                })
            }
            chain => {
                let desc = canvas.desc().with_size(target.size());
                self.cache.ensure_pair(backend, &desc)?;

                let local = IntRect::from_size(target.size());
                let mut current = SlotId::A;
                for (i, filter) in chain.iter().enumerate() {
                    let paint = filter.paint();
                    let (dst, prev) = self
                        .cache
                        .split(current)
                        .ok_or_else(|| FilterChainError::allocation("cached surfaces missing"))?;
                    dst.clear();
                    if i == 0 {
                        dst.draw_image(image, local, Some(&paint))?;
                    } else {
                        dst.draw_surface(prev, IntPoint::ZERO, Some(&paint))?;
                    }
                    current = current.other();
                }

                // After the trailing swap the last written surface is the "previous" one.
                let result = self
                    .cache
                    .slot(current.other())
                    .ok_or_else(|| FilterChainError::allocation("cached surfaces missing"))?;
                canvas.draw_surface(result, target.origin(), None)?;

                Ok(CompositeOutcome::MultiPass {
                    target,
                    passes: chain.len(),
                })
            }
        }
    }
}

impl<B: RenderBackend> std::fmt::Debug for Compositor<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compositor")
            .field("cache", &self.cache)
            .finish()
    }
}
