use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::{IntPoint, IntRect, PixelFormat, SurfaceDesc};
use crate::foundation::error::{FilterChainError, FilterChainResult};
use crate::foundation::math::{mul_div255_u8, unit_to_u8};
use crate::render::backend::{DrawSurface, RenderBackend, SourceImage};

/// How scaled image draws pick source pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Sampling {
    /// Nearest source pixel.
    #[default]
    Nearest,
    /// Bilinear filtering with clamp-to-edge.
    Bilinear,
}

/// Blend equation used when a paint writes into a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BlendMode {
    /// Porter-Duff source-over.
    #[default]
    SrcOver,
    /// Replace destination pixels.
    Src,
    /// Multiply colors, source-over alpha.
    Multiply,
    /// Screen colors, source-over alpha.
    Screen,
}

/// Draw-time paint understood by [`CpuBackend`] surfaces.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CpuPaint {
    /// Row-major 4x5 matrix applied to straight-alpha RGBA in `0..=1`.
    pub color_matrix: Option<[f32; 20]>,
    /// Multiplier on source coverage, clamped to `0..=1`.
    pub opacity: f32,
    /// Blend equation.
    pub blend: BlendMode,
}

impl Default for CpuPaint {
    fn default() -> Self {
        Self {
            color_matrix: None,
            opacity: 1.0,
            blend: BlendMode::SrcOver,
        }
    }
}

impl CpuPaint {
    /// Paint applying a color matrix.
    pub fn color_matrix(matrix: [f32; 20]) -> Self {
        Self {
            color_matrix: Some(matrix),
            ..Self::default()
        }
    }

    /// Return the paint with a different opacity.
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.opacity = opacity;
        self
    }

    /// Return the paint with a different blend mode.
    pub fn with_blend(mut self, blend: BlendMode) -> Self {
        self.blend = blend;
        self
    }
}

/// Options for [`CpuBackend`].
#[derive(Clone, Copy, Debug)]
pub struct CpuBackendOpts {
    pub(crate) max_surface_bytes: usize,
    pub(crate) sampling: Sampling,
}

impl Default for CpuBackendOpts {
    fn default() -> Self {
        Self {
            max_surface_bytes: 256 * 1024 * 1024,
            sampling: Sampling::Nearest,
        }
    }
}

impl CpuBackendOpts {
    /// Return options refusing surfaces larger than `bytes`.
    pub fn with_max_surface_bytes(mut self, bytes: usize) -> Self {
        self.max_surface_bytes = bytes;
        self
    }

    /// Return options with a different sampling mode for surfaces created afterwards.
    pub fn with_sampling(mut self, sampling: Sampling) -> Self {
        self.sampling = sampling;
        self
    }
}

/// Immutable premultiplied RGBA8 image, cheap to clone.
#[derive(Clone)]
pub struct CpuImage {
    pixmap: Arc<vello_cpu::Pixmap>,
    width: u32,
    height: u32,
}

impl CpuImage {
    /// Wrap tightly packed premultiplied RGBA8 bytes.
    pub fn from_premul_rgba8(bytes: &[u8], width: u32, height: u32) -> FilterChainResult<Self> {
        let pixmap = pixmap_from_premul_bytes(bytes, width, height)?;
        Ok(Self {
            pixmap: Arc::new(pixmap),
            width,
            height,
        })
    }

    /// Premultiply and wrap straight-alpha RGBA8 bytes.
    pub fn from_straight_rgba8(bytes: &[u8], width: u32, height: u32) -> FilterChainResult<Self> {
        let mut tmp = bytes.to_vec();
        premultiply_rgba8_in_place(&mut tmp);
        Self::from_premul_rgba8(&tmp, width, height)
    }

    /// Convert an `image` buffer (straight alpha).
    pub fn from_rgba_image(img: &image::RgbaImage) -> FilterChainResult<Self> {
        let (width, height) = img.dimensions();
        Self::from_straight_rgba8(img.as_raw(), width, height)
    }

    /// Decode any format supported by the `image` crate.
    pub fn decode(bytes: &[u8]) -> FilterChainResult<Self> {
        let dyn_img = image::load_from_memory(bytes).context("decode source image from memory")?;
        Self::from_rgba_image(&dyn_img.to_rgba8())
    }

    /// Image filled with one straight-alpha color.
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> FilterChainResult<Self> {
        pixmap_dims(width, height)?;
        let px = premul_rgba8(rgba);
        Self::from_premul_rgba8(&px.repeat(width as usize * height as usize), width, height)
    }

    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    fn px(&self, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let d = self.data();
        [d[idx], d[idx + 1], d[idx + 2], d[idx + 3]]
    }
}

impl SourceImage for CpuImage {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

impl std::fmt::Debug for CpuImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// Raster surface backed by a `vello_cpu` pixmap.
#[derive(Clone)]
pub struct CpuSurface {
    desc: SurfaceDesc,
    pixmap: vello_cpu::Pixmap,
    sampling: Sampling,
}

impl CpuSurface {
    /// Premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    /// Premultiplied pixel at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.desc.width || y >= self.desc.height {
            return None;
        }
        let idx = ((y as usize) * (self.desc.width as usize) + (x as usize)) * 4;
        let d = self.data();
        Some([d[idx], d[idx + 1], d[idx + 2], d[idx + 3]])
    }

    /// Copy out as a straight-alpha `image` buffer.
    pub fn to_rgba_image(&self) -> FilterChainResult<image::RgbaImage> {
        let mut bytes = self.data().to_vec();
        unpremultiply_rgba8_in_place(&mut bytes);
        image::RgbaImage::from_raw(self.desc.width, self.desc.height, bytes)
            .ok_or_else(|| FilterChainError::draw("surface byte length does not match its size"))
    }

    fn write_px(&mut self, x: u32, y: u32, src: [u8; 4], paint: Option<&CpuPaint>) {
        let idx = ((y as usize) * (self.desc.width as usize) + (x as usize)) * 4;
        let d = &mut self.pixmap.data_as_u8_slice_mut()[idx..idx + 4];
        let out = paint_px([d[0], d[1], d[2], d[3]], src, paint);
        d.copy_from_slice(&out);
    }
}

impl std::fmt::Debug for CpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuSurface")
            .field("desc", &self.desc)
            .field("sampling", &self.sampling)
            .finish()
    }
}

impl DrawSurface for CpuSurface {
    type Image = CpuImage;
    type Paint = CpuPaint;

    fn desc(&self) -> SurfaceDesc {
        self.desc
    }

    fn clear_rect(&mut self, rect: IntRect) {
        let Some(clip) = rect.intersect(self.desc.bounds()) else {
            return;
        };
        let stride = self.desc.width as usize * 4;
        let x0 = clip.x as usize * 4;
        let x1 = x0 + clip.width as usize * 4;
        let data = self.pixmap.data_as_u8_slice_mut();
        for y in clip.y as usize..clip.bottom() as usize {
            data[y * stride + x0..y * stride + x1].fill(0);
        }
    }

    fn draw_image(
        &mut self,
        image: &CpuImage,
        dst: IntRect,
        paint: Option<&CpuPaint>,
    ) -> FilterChainResult<()> {
        if dst.is_empty() || image.size().is_empty() {
            return Ok(());
        }
        let Some(clip) = dst.intersect(self.desc.bounds()) else {
            return Ok(());
        };

        let sx = f64::from(image.width) / f64::from(dst.width);
        let sy = f64::from(image.height) / f64::from(dst.height);
        // Offsets from a far-off `dst` origin exceed i32.
        for y in clip.y..clip.bottom() as i32 {
            let v = ((i64::from(y) - i64::from(dst.y)) as f64 + 0.5) * sy;
            for x in clip.x..clip.right() as i32 {
                let u = ((i64::from(x) - i64::from(dst.x)) as f64 + 0.5) * sx;
                let src = match self.sampling {
                    Sampling::Nearest => sample_nearest(image, u, v),
                    Sampling::Bilinear => sample_bilinear(image, u - 0.5, v - 0.5),
                };
                self.write_px(x as u32, y as u32, src, paint);
            }
        }
        Ok(())
    }

    fn draw_surface(
        &mut self,
        src: &CpuSurface,
        origin: IntPoint,
        paint: Option<&CpuPaint>,
    ) -> FilterChainResult<()> {
        if src.desc.format != self.desc.format {
            return Err(FilterChainError::draw(format!(
                "cannot draw {:?} surface into {:?} surface",
                src.desc.format, self.desc.format
            )));
        }
        let placed = IntRect::new(origin.x, origin.y, src.desc.width, src.desc.height);
        let Some(clip) = placed.intersect(self.desc.bounds()) else {
            return Ok(());
        };

        for y in clip.y..clip.bottom() as i32 {
            for x in clip.x..clip.right() as i32 {
                let sx = i64::from(x) - i64::from(origin.x);
                let sy = i64::from(y) - i64::from(origin.y);
                let s = src.pixel(sx as u32, sy as u32).unwrap_or([0; 4]);
                self.write_px(x as u32, y as u32, s, paint);
            }
        }
        Ok(())
    }
}

/// CPU raster backend.
#[derive(Debug, Default)]
pub struct CpuBackend {
    opts: CpuBackendOpts,
    generation: u64,
}

impl CpuBackend {
    /// Backend with the given options.
    pub fn new(opts: CpuBackendOpts) -> Self {
        Self {
            opts,
            generation: 0,
        }
    }

    /// Active options.
    pub fn opts(&self) -> CpuBackendOpts {
        self.opts
    }

    /// Replace options; affects surfaces created afterwards.
    pub fn set_opts(&mut self, opts: CpuBackendOpts) {
        self.opts = opts;
    }

    /// Start a new rendering context. Surfaces created before become stale.
    pub fn reset_context(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        tracing::debug!(generation = self.generation, "cpu rendering context reset");
    }
}

impl RenderBackend for CpuBackend {
    type Image = CpuImage;
    type Paint = CpuPaint;
    type Surface = CpuSurface;

    fn create_surface(&mut self, desc: &SurfaceDesc) -> FilterChainResult<CpuSurface> {
        if desc.size().is_empty() {
            return Err(FilterChainError::allocation(format!(
                "surface must be non-empty, got {}x{}",
                desc.width, desc.height
            )));
        }
        match desc.format {
            PixelFormat::Rgba8Premul => {}
        }
        if desc.byte_len() > self.opts.max_surface_bytes {
            return Err(FilterChainError::allocation(format!(
                "surface {}x{} needs {} bytes, limit is {}",
                desc.width,
                desc.height,
                desc.byte_len(),
                self.opts.max_surface_bytes
            )));
        }
        let w: u16 = desc.width.try_into().map_err(|_| {
            FilterChainError::allocation(format!("surface width exceeds u16: {}", desc.width))
        })?;
        let h: u16 = desc.height.try_into().map_err(|_| {
            FilterChainError::allocation(format!("surface height exceeds u16: {}", desc.height))
        })?;

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        pixmap.data_as_u8_slice_mut().fill(0);
        Ok(CpuSurface {
            desc: *desc,
            pixmap,
            sampling: self.opts.sampling,
        })
    }

    fn context_generation(&self) -> u64 {
        self.generation
    }
}

fn pixmap_dims(width: u32, height: u32) -> FilterChainResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| FilterChainError::validation("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| FilterChainError::validation("image height exceeds u16"))?;
    Ok((w, h))
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> FilterChainResult<vello_cpu::Pixmap> {
    let (w, h) = pixmap_dims(width, height)?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(FilterChainError::validation("image byte len mismatch"));
    }
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    pixmap.data_as_u8_slice_mut().copy_from_slice(bytes);
    Ok(pixmap)
}

fn premul_rgba8(rgba: [u8; 4]) -> [u8; 4] {
    let [r, g, b, a] = rgba;
    let a16 = u16::from(a);
    [
        mul_div255_u8(u16::from(r), a16),
        mul_div255_u8(u16::from(g), a16),
        mul_div255_u8(u16::from(b), a16),
        a,
    ]
}

fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let out = premul_rgba8([px[0], px[1], px[2], px[3]]);
        px.copy_from_slice(&out);
    }
}

fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn sample_nearest(image: &CpuImage, u: f64, v: f64) -> [u8; 4] {
    let x = (u.floor().max(0.0) as u32).min(image.width - 1);
    let y = (v.floor().max(0.0) as u32).min(image.height - 1);
    image.px(x, y)
}

fn sample_bilinear(image: &CpuImage, fx: f64, fy: f64) -> [u8; 4] {
    let max_x = f64::from(image.width - 1);
    let max_y = f64::from(image.height - 1);
    let fx = fx.clamp(0.0, max_x);
    let fy = fy.clamp(0.0, max_y);
    let x0 = fx.floor() as u32;
    let y0 = fy.floor() as u32;
    let x1 = (x0 + 1).min(image.width - 1);
    let y1 = (y0 + 1).min(image.height - 1);
    let tx = (fx - f64::from(x0)) as f32;
    let ty = (fy - f64::from(y0)) as f32;

    let p00 = image.px(x0, y0);
    let p10 = image.px(x1, y0);
    let p01 = image.px(x0, y1);
    let p11 = image.px(x1, y1);

    let mut out = [0u8; 4];
    for c in 0..4 {
        let top = f32::from(p00[c]) * (1.0 - tx) + f32::from(p10[c]) * tx;
        let bottom = f32::from(p01[c]) * (1.0 - tx) + f32::from(p11[c]) * tx;
        out[c] = (top * (1.0 - ty) + bottom * ty).round().clamp(0.0, 255.0) as u8;
    }
    out
}

// Applies the paint's color matrix to `src`, then blends it into `dst`.
fn paint_px(dst: [u8; 4], src: [u8; 4], paint: Option<&CpuPaint>) -> [u8; 4] {
    let Some(paint) = paint else {
        return premul_over_px(dst, src, 255);
    };
    let src = match &paint.color_matrix {
        Some(m) => color_matrix_px(src, m),
        None => src,
    };
    let op = u16::from(unit_to_u8(paint.opacity.clamp(0.0, 1.0)));
    match paint.blend {
        BlendMode::SrcOver => premul_over_px(dst, src, op),
        BlendMode::Src => src.map(|c| mul_div255_u8(u16::from(c), op)),
        BlendMode::Multiply => blend_px(dst, src, op, |s, d| s * d),
        BlendMode::Screen => blend_px(dst, src, op, |s, d| s + d - s * d),
    }
}

fn premul_over_px(dst: [u8; 4], src: [u8; 4], op: u16) -> [u8; 4] {
    if op == 0 {
        return dst;
    }
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for c in 0..3 {
        let sc = mul_div255_u8(u16::from(src[c]), op);
        let dc = mul_div255_u8(u16::from(dst[c]), inv);
        out[c] = sc.saturating_add(dc);
    }
    out
}

// Source-over with the blend function applied to unpremultiplied colors:
// out_a = sa + da * (1 - sa)
// out_p = sp * (1 - da) + dp * (1 - sa) + B(sc, dc) * sa * da
fn blend_px<F>(dst: [u8; 4], src: [u8; 4], op: u16, blend_fn: F) -> [u8; 4]
where
    F: Fn(f32, f32) -> f32,
{
    if op == 0 {
        return dst;
    }
    let opacity = f32::from(op) / 255.0;
    let sp = [0, 1, 2].map(|c| f32::from(src[c]) / 255.0 * opacity);
    let sa = f32::from(src[3]) / 255.0 * opacity;
    let dp = [0, 1, 2].map(|c| f32::from(dst[c]) / 255.0);
    let da = f32::from(dst[3]) / 255.0;

    let unpremul = |p: f32, a: f32| if a > 0.0 { (p / a).clamp(0.0, 1.0) } else { 0.0 };

    let mut out = [0u8; 4];
    for c in 0..3 {
        let b = blend_fn(unpremul(sp[c], sa), unpremul(dp[c], da)).clamp(0.0, 1.0);
        let p = sp[c] * (1.0 - da) + dp[c] * (1.0 - sa) + b * sa * da;
        out[c] = unit_to_u8(p.clamp(0.0, 1.0));
    }
    out[3] = unit_to_u8((sa + da * (1.0 - sa)).clamp(0.0, 1.0));
    out
}

fn color_matrix_px(s: [u8; 4], m: &[f32; 20]) -> [u8; 4] {
    let pa = f32::from(s[3]) / 255.0;

    // Premul -> straight for matrix application.
    let inv_a = if pa > 0.0 { 1.0 / pa } else { 0.0 };
    let r = f32::from(s[0]) / 255.0 * inv_a;
    let g = f32::from(s[1]) / 255.0 * inv_a;
    let b = f32::from(s[2]) / 255.0 * inv_a;
    let a = pa;

    let out_r = (m[0] * r + m[1] * g + m[2] * b + m[3] * a + m[4]).clamp(0.0, 1.0);
    let out_g = (m[5] * r + m[6] * g + m[7] * b + m[8] * a + m[9]).clamp(0.0, 1.0);
    let out_b = (m[10] * r + m[11] * g + m[12] * b + m[13] * a + m[14]).clamp(0.0, 1.0);
    let out_a = (m[15] * r + m[16] * g + m[17] * b + m[18] * a + m[19]).clamp(0.0, 1.0);

    [
        unit_to_u8(out_r * out_a),
        unit_to_u8(out_g * out_a),
        unit_to_u8(out_b * out_a),
        unit_to_u8(out_a),
    ]
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
