//! filterchain renders an image through an ordered chain of filters.
//!
//! - Build a [`Pipeline`] holding a source image and [`Filter`]s
//! - Hand it to a [`Compositor`] (directly, or through a [`FilteredImage`] control)
//! - Each frame, `composite` aspect-fits the image into the viewport and chains every
//!   enabled filter through two reusable offscreen surfaces
//!
//! Rendering goes through the [`RenderBackend`] / [`DrawSurface`] traits; [`CpuBackend`]
//! is the bundled raster implementation.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Observable filter pipeline.
pub mod pipeline;
/// Backends, surface cache and compositor.
pub mod render;
/// Host glue: invalidation and the filtered-image control.
pub mod view;

pub use crate::foundation::core::{
    ColorSpace, IntPoint, IntRect, IntSize, PixelFormat, Point, Rect, Size, SurfaceDesc,
};
pub use crate::foundation::error::{FilterChainError, FilterChainResult};

pub use crate::pipeline::events::{PipelineChange, PipelineEvent, Subscription};
pub use crate::pipeline::filter::{Filter, FilterId, InheritedContext, PaintFilter};
pub use crate::pipeline::model::{EnabledFilters, Pipeline};
pub use crate::render::backend::{DrawSurface, RenderBackend, SourceImage};
pub use crate::render::compositor::{CompositeOutcome, Compositor};
pub use crate::render::cpu::{
    BlendMode, CpuBackend, CpuBackendOpts, CpuImage, CpuPaint, CpuSurface, Sampling,
};
pub use crate::render::surface_cache::{SlotId, SurfaceCache, SurfaceCacheStats};
pub use crate::view::bridge::{CountingScheduler, InvalidationBridge, RedrawScheduler};
pub use crate::view::filtered_image::{FilteredImage, SharedPipeline};
