use super::*;

#[test]
fn aspect_fit_letterboxes_wide_image() {
    let view = IntRect::new(0, 0, 100, 100);
    let fit = view.aspect_fit(IntSize::new(400, 200));
    assert_eq!(fit, IntRect::new(0, 25, 100, 50));
}

#[test]
fn aspect_fit_pillarboxes_tall_image() {
    let view = IntRect::new(10, 20, 200, 100);
    let fit = view.aspect_fit(IntSize::new(50, 100));
    assert_eq!(fit, IntRect::new(85, 20, 50, 100));
}

#[test]
fn aspect_fit_same_aspect_fills_view() {
    let view = IntRect::new(0, 0, 64, 64);
    assert_eq!(view.aspect_fit(IntSize::new(8, 8)), view);
}

#[test]
fn aspect_fit_degenerate_is_empty_at_center() {
    let view = IntRect::new(0, 0, 100, 60);
    let fit = view.aspect_fit(IntSize::new(0, 10));
    assert!(fit.is_empty());
    assert_eq!(fit.origin(), IntPoint::new(50, 30));

    let empty_view = IntRect::new(4, 4, 0, 10);
    assert!(empty_view.aspect_fit(IntSize::new(10, 10)).is_empty());
}

#[test]
fn intersect_clips_and_rejects_disjoint() {
    let a = IntRect::new(0, 0, 10, 10);
    let b = IntRect::new(5, -3, 10, 6);
    assert_eq!(a.intersect(b), Some(IntRect::new(5, 0, 5, 3)));
    assert_eq!(a.intersect(IntRect::new(10, 0, 4, 4)), None);
}

#[test]
fn contains_is_half_open() {
    let r = IntRect::new(2, 2, 3, 3);
    assert!(r.contains(2, 2));
    assert!(r.contains(4, 4));
    assert!(!r.contains(5, 4));
    assert!(!r.contains(1, 2));
}

#[test]
fn surface_desc_size_and_bytes() {
    let d = SurfaceDesc::rgba8(8, 4);
    assert_eq!(d.byte_len(), 8 * 4 * 4);
    assert_eq!(d.with_size(IntSize::new(2, 2)).byte_len(), 16);
    assert_ne!(d, d.with_color_space(ColorSpace::LinearSrgb));
    assert!(SurfaceDesc::rgba8(0, 4).validate().is_err());
    assert!(d.validate().is_ok());
}
