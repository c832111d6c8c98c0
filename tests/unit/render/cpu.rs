use super::*;

const IDENTITY: [f32; 20] = [
    1.0, 0.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 0.0, 1.0, 0.0,
];

fn surface(w: u32, h: u32) -> CpuSurface {
    CpuBackend::default()
        .create_surface(&SurfaceDesc::rgba8(w, h))
        .unwrap()
}

#[test]
fn new_surface_is_transparent() {
    let s = surface(3, 2);
    assert!(s.data().iter().all(|&b| b == 0));
    assert_eq!(s.pixel(3, 0), None);
}

#[test]
fn create_surface_enforces_limits() {
    let mut backend = CpuBackend::new(CpuBackendOpts::default().with_max_surface_bytes(64));
    assert!(backend.create_surface(&SurfaceDesc::rgba8(4, 4)).is_ok());
    assert!(matches!(
        backend.create_surface(&SurfaceDesc::rgba8(5, 4)),
        Err(FilterChainError::Allocation(_))
    ));
    assert!(backend.create_surface(&SurfaceDesc::rgba8(0, 4)).is_err());

    let mut big = CpuBackend::new(CpuBackendOpts::default().with_max_surface_bytes(usize::MAX));
    assert!(big.create_surface(&SurfaceDesc::rgba8(70_000, 1)).is_err());
}

#[test]
fn draw_image_scales_nearest() {
    let img = CpuImage::from_straight_rgba8(
        &[
            255, 0, 0, 255, 0, 255, 0, 255, //
            0, 0, 255, 255, 255, 255, 255, 255,
        ],
        2,
        2,
    )
    .unwrap();
    let mut s = surface(4, 4);
    s.draw_image(&img, IntRect::new(0, 0, 4, 4), None).unwrap();

    assert_eq!(s.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(s.pixel(1, 1), Some([255, 0, 0, 255]));
    assert_eq!(s.pixel(2, 0), Some([0, 255, 0, 255]));
    assert_eq!(s.pixel(0, 3), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(3, 3), Some([255, 255, 255, 255]));
}

#[test]
fn bilinear_on_solid_image_is_exact() {
    let img = CpuImage::solid(3, 3, [10, 20, 30, 255]).unwrap();
    let mut backend = CpuBackend::new(CpuBackendOpts::default().with_sampling(Sampling::Bilinear));
    let mut s = backend.create_surface(&SurfaceDesc::rgba8(7, 5)).unwrap();
    s.draw_image(&img, IntRect::new(0, 0, 7, 5), None).unwrap();
    assert!(s.data().chunks_exact(4).all(|px| px == [10, 20, 30, 255]));
}

#[test]
fn draw_image_clips_to_surface() {
    let img = CpuImage::solid(2, 2, [0, 0, 255, 255]).unwrap();
    let mut s = surface(4, 4);
    s.draw_image(&img, IntRect::new(-2, 2, 4, 4), None).unwrap();
    assert_eq!(s.pixel(0, 2), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(1, 3), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(2, 2), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(0, 1), Some([0, 0, 0, 0]));
}

#[test]
fn clear_rect_only_touches_region() {
    let img = CpuImage::solid(1, 1, [255, 255, 255, 255]).unwrap();
    let mut s = surface(4, 4);
    s.draw_image(&img, IntRect::new(0, 0, 4, 4), None).unwrap();
    s.clear_rect(IntRect::new(1, 1, 10, 2));
    assert_eq!(s.pixel(0, 1), Some([255, 255, 255, 255]));
    assert_eq!(s.pixel(1, 1), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(3, 2), Some([0, 0, 0, 0]));
    assert_eq!(s.pixel(1, 3), Some([255, 255, 255, 255]));
}

#[test]
fn draw_surface_offsets_without_scaling() {
    let img = CpuImage::solid(2, 2, [0, 255, 0, 255]).unwrap();
    let mut src = surface(2, 2);
    src.draw_image(&img, IntRect::new(0, 0, 2, 2), None).unwrap();

    let mut dst = surface(4, 4);
    dst.draw_surface(&src, IntPoint::new(1, 2), None).unwrap();
    assert_eq!(dst.pixel(0, 2), Some([0, 0, 0, 0]));
    assert_eq!(dst.pixel(1, 2), Some([0, 255, 0, 255]));
    assert_eq!(dst.pixel(2, 3), Some([0, 255, 0, 255]));
    assert_eq!(dst.pixel(3, 3), Some([0, 0, 0, 0]));
}

#[test]
fn identity_matrix_is_identity() {
    for px in [[10u8, 20, 30, 255], [0, 0, 0, 0], [64, 32, 16, 128]] {
        assert_eq!(color_matrix_px(px, &IDENTITY), px);
    }
}

#[test]
fn zero_alpha_matrix_makes_pixels_transparent() {
    let mut m = IDENTITY;
    m[18] = 0.0;
    assert_eq!(color_matrix_px([200, 100, 50, 255], &m), [0, 0, 0, 0]);
}

#[test]
fn opacity_scales_source_over() {
    let paint = CpuPaint::default().with_opacity(0.5);
    let out = paint_px([0, 0, 0, 0], [255, 0, 0, 255], Some(&paint));
    assert_eq!(out, [128, 0, 0, 128]);
    let hidden = CpuPaint::default().with_opacity(0.0);
    assert_eq!(
        paint_px([1, 2, 3, 4], [255, 0, 0, 255], Some(&hidden)),
        [1, 2, 3, 4]
    );
}

#[test]
fn src_blend_replaces_destination() {
    let paint = CpuPaint::default().with_blend(BlendMode::Src);
    let out = paint_px([255, 255, 255, 255], [0, 0, 0, 0], Some(&paint));
    assert_eq!(out, [0, 0, 0, 0]);
}

#[test]
fn multiply_opaque_is_multiply() {
    let paint = CpuPaint::default().with_blend(BlendMode::Multiply);
    let out = paint_px([128, 255, 0, 255], [255, 128, 255, 255], Some(&paint));
    assert_eq!(out, [128, 128, 0, 255]);
}

#[test]
fn screen_with_black_is_identity() {
    let paint = CpuPaint::default().with_blend(BlendMode::Screen);
    let out = paint_px([10, 20, 30, 255], [0, 0, 0, 255], Some(&paint));
    assert_eq!(out, [10, 20, 30, 255]);
}

#[test]
fn premul_roundtrip_through_rgba_image() {
    let img = CpuImage::from_straight_rgba8(&[200, 100, 50, 255, 0, 0, 0, 0], 2, 1).unwrap();
    let mut s = surface(2, 1);
    s.draw_image(&img, IntRect::new(0, 0, 2, 1), None).unwrap();
    let out = s.to_rgba_image().unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [200, 100, 50, 255]);
    assert_eq!(out.get_pixel(1, 0).0, [0, 0, 0, 0]);
}

#[test]
fn decode_png_premultiplies() {
    use std::io::Cursor;

    let src = image::RgbaImage::from_raw(1, 1, vec![100u8, 50, 200, 128]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(src)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();

    let img = CpuImage::decode(&buf).unwrap();
    assert_eq!(img.size(), crate::foundation::core::IntSize::new(1, 1));
    assert_eq!(img.data(), &[50, 25, 100, 128]);

    assert!(matches!(
        CpuImage::decode(b"not an image"),
        Err(FilterChainError::Other(_))
    ));
}

#[test]
fn image_byte_len_is_validated() {
    assert!(CpuImage::from_premul_rgba8(&[0; 7], 1, 2).is_err());
}

#[test]
fn reset_context_bumps_generation() {
    let mut b = CpuBackend::default();
    let g0 = b.context_generation();
    b.reset_context();
    assert_ne!(b.context_generation(), g0);
}

#[test]
fn draw_image_handles_far_negative_origin() {
    let img = CpuImage::solid(2, 2, [0, 0, 255, 255]).unwrap();
    let mut s = surface(4, 4);
    s.draw_image(&img, IntRect::new(i32::MIN, i32::MIN, u32::MAX, u32::MAX), None)
        .unwrap();
    assert_eq!(s.pixel(0, 0), Some([0, 0, 255, 255]));
    assert_eq!(s.pixel(3, 3), Some([0, 0, 255, 255]));
}

#[test]
fn draw_surface_handles_negative_origin() {
    let img = CpuImage::solid(1, 1, [255, 0, 0, 255]).unwrap();
    let mut src = surface(4, 4);
    src.draw_image(&img, IntRect::new(3, 3, 1, 1), None).unwrap();

    let mut dst = surface(2, 2);
    dst.draw_surface(&src, IntPoint::new(-3, -3), None).unwrap();
    assert_eq!(dst.pixel(0, 0), Some([255, 0, 0, 255]));
    assert_eq!(dst.pixel(1, 1), Some([0, 0, 0, 0]));
}

#[test]
fn solid_rejects_oversized_dimensions_before_allocating() {
    assert!(matches!(
        CpuImage::solid(100_000, 100_000, [0, 0, 0, 255]),
        Err(FilterChainError::Validation(_))
    ));
    assert!(matches!(
        CpuImage::solid(1, u32::MAX, [0, 0, 0, 255]),
        Err(FilterChainError::Validation(_))
    ));
}
