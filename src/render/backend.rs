use crate::foundation::core::{IntPoint, IntRect, IntSize, SurfaceDesc};
use crate::foundation::error::FilterChainResult;

/// A drawable source image with known pixel dimensions.
pub trait SourceImage {
    /// Width in pixels.
    fn width(&self) -> u32;

    /// Height in pixels.
    fn height(&self) -> u32;

    /// Dimensions in pixels.
    fn size(&self) -> IntSize {
        IntSize::new(self.width(), self.height())
    }
}

/// A render target that can be cleared, drawn into and sampled from.
///
/// Destination canvases and cached intermediate surfaces share this one abstraction, so
/// raster and GPU-bound targets look the same to the compositor.
pub trait DrawSurface {
    /// Image type this surface can draw.
    type Image: SourceImage;
    /// Paint applied while drawing.
    type Paint;

    /// Descriptor the surface was created with.
    fn desc(&self) -> SurfaceDesc;

    /// Clear `rect` (clipped to the surface) to fully transparent.
    fn clear_rect(&mut self, rect: IntRect);

    /// Clear the whole surface to fully transparent.
    fn clear(&mut self) {
        let bounds = self.desc().bounds();
        self.clear_rect(bounds);
    }

    /// Draw `image` scaled into `dst`, applying `paint` when given.
    fn draw_image(
        &mut self,
        image: &Self::Image,
        dst: IntRect,
        paint: Option<&Self::Paint>,
    ) -> FilterChainResult<()>;

    /// Draw `src` unscaled with its top-left corner at `origin`, applying `paint` when given.
    fn draw_surface(
        &mut self,
        src: &Self,
        origin: IntPoint,
        paint: Option<&Self::Paint>,
    ) -> FilterChainResult<()>;
}

/// Allocator for surfaces bound to the active rendering context.
pub trait RenderBackend {
    /// Source image type.
    type Image: SourceImage;
    /// Paint type filters produce.
    type Paint;
    /// Surface type for both destination canvases and intermediates.
    type Surface: DrawSurface<Image = Self::Image, Paint = Self::Paint>;

    /// Allocate a surface matching `desc`.
    fn create_surface(&mut self, desc: &SurfaceDesc) -> FilterChainResult<Self::Surface>;

    /// Identity of the current rendering context.
    ///
    /// A change means every surface created earlier is stale and must be dropped.
    fn context_generation(&self) -> u64 {
        0
    }
}
