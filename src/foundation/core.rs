use crate::foundation::error::{FilterChainError, FilterChainResult};

pub use kurbo::{Point, Rect, Size};

/// Integer pixel position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntPoint {
    /// Horizontal offset in pixels.
    pub x: i32,
    /// Vertical offset in pixels.
    pub y: i32,
}

impl IntPoint {
    /// The origin `(0, 0)`.
    pub const ZERO: Self = Self { x: 0, y: 0 };

    /// Create a point.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Integer pixel dimensions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl IntSize {
    /// Create a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Return `true` when either dimension is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Integer pixel rectangle: origin plus unsigned extent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IntRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl IntRect {
    /// Create a rectangle from origin and extent.
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle anchored at the origin.
    pub const fn from_size(size: IntSize) -> Self {
        Self::new(0, 0, size.width, size.height)
    }

    /// Top-left corner.
    pub fn origin(self) -> IntPoint {
        IntPoint::new(self.x, self.y)
    }

    /// Extent of the rectangle.
    pub fn size(self) -> IntSize {
        IntSize::new(self.width, self.height)
    }

    /// Exclusive right edge.
    pub fn right(self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    /// Return `true` when the rectangle covers no pixels.
    pub fn is_empty(self) -> bool {
        self.size().is_empty()
    }

    /// Return `true` when pixel `(x, y)` lies inside the rectangle.
    pub fn contains(self, x: i32, y: i32) -> bool {
        i64::from(x) >= i64::from(self.x)
            && i64::from(x) < self.right()
            && i64::from(y) >= i64::from(self.y)
            && i64::from(y) < self.bottom()
    }

    /// Overlap of two rectangles, or `None` when they are disjoint.
    pub fn intersect(self, other: IntRect) -> Option<IntRect> {
        let x0 = i64::from(self.x).max(i64::from(other.x));
        let y0 = i64::from(self.y).max(i64::from(other.y));
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(IntRect::new(
            x0 as i32,
            y0 as i32,
            (x1 - x0) as u32,
            (y1 - y0) as u32,
        ))
    }

    /// Convert to a floating-point `kurbo` rectangle.
    pub fn to_kurbo(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            self.right() as f64,
            self.bottom() as f64,
        )
    }

    /// Round a `kurbo` rectangle edge-wise onto the pixel grid.
    pub fn from_kurbo_round(rect: Rect) -> Self {
        let r = rect.abs().round();
        let x0 = r.x0.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        let y0 = r.y0.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
        let w = r.width().clamp(0.0, f64::from(u32::MAX)) as u32;
        let h = r.height().clamp(0.0, f64::from(u32::MAX)) as u32;
        Self::new(x0, y0, w, h)
    }

    /// Largest rectangle with the aspect ratio of `size` that fits inside `self`, centered.
    ///
    /// The image touches `self` on its constraining axis and is letterboxed on the other.
    /// Degenerate input (empty `self` or empty `size`) yields a zero-size rectangle at the
    /// center of `self`.
    pub fn aspect_fit(self, size: IntSize) -> IntRect {
        let dest = self.to_kurbo();
        let center = dest.center();
        if self.is_empty() || size.is_empty() {
            return IntRect::new(center.x.round() as i32, center.y.round() as i32, 0, 0);
        }

        let img_aspect = f64::from(size.width) / f64::from(size.height);
        let dest_aspect = dest.width() / dest.height();
        let fitted = if dest_aspect > img_aspect {
            Size::new(dest.height() * img_aspect, dest.height())
        } else {
            Size::new(dest.width(), dest.width() / img_aspect)
        };

        IntRect::from_kurbo_round(Rect::from_center_size(center, fitted))
    }
}

/// Pixel layout of a render surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// Premultiplied RGBA, 8 bits per channel.
    #[default]
    Rgba8Premul,
}

impl PixelFormat {
    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgba8Premul => 4,
        }
    }
}

/// Color space tag carried by surfaces. Backends never convert between spaces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    /// Gamma-encoded sRGB.
    #[default]
    Srgb,
    /// Linear-light sRGB primaries.
    LinearSrgb,
}

/// Surface declaration: dimensions, pixel format and color space.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceDesc {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: PixelFormat,
    /// Color space tag.
    pub color_space: ColorSpace,
}

impl SurfaceDesc {
    /// sRGB premultiplied RGBA8 surface of the given size.
    pub fn rgba8(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            format: PixelFormat::Rgba8Premul,
            color_space: ColorSpace::Srgb,
        }
    }

    /// Same format and color space, different dimensions.
    pub fn with_size(self, size: IntSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
            ..self
        }
    }

    /// Same dimensions and format, different color space.
    pub fn with_color_space(self, color_space: ColorSpace) -> Self {
        Self {
            color_space,
            ..self
        }
    }

    /// Dimensions of the surface.
    pub fn size(&self) -> IntSize {
        IntSize::new(self.width, self.height)
    }

    /// Bounds of the surface in its own pixel space.
    pub fn bounds(&self) -> IntRect {
        IntRect::from_size(self.size())
    }

    /// Backing store size in bytes, saturating.
    pub fn byte_len(&self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(self.format.bytes_per_pixel())
    }

    /// Reject zero-sized descriptors.
    pub fn validate(&self) -> FilterChainResult<()> {
        if self.size().is_empty() {
            return Err(FilterChainError::validation(format!(
                "surface must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
