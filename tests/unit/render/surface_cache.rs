use super::*;
use crate::foundation::core::ColorSpace;
use crate::render::cpu::{CpuBackend, CpuBackendOpts, CpuSurface};

fn desc(w: u32, h: u32) -> SurfaceDesc {
    SurfaceDesc::rgba8(w, h)
}

#[test]
fn ensure_reuses_matching_surface() {
    let mut backend = CpuBackend::default();
    let mut cache = SurfaceCache::<CpuSurface>::new();

    cache.ensure_pair(&mut backend, &desc(8, 8)).unwrap();
    cache.ensure_pair(&mut backend, &desc(8, 8)).unwrap();

    let st = cache.stats();
    assert_eq!(st.allocations, 2);
    assert_eq!(st.reuses, 2);
    assert_eq!(st.releases, 0);
    assert_eq!(st.retained_surfaces, 2);
    assert_eq!(st.retained_bytes, 2 * 8 * 8 * 4);
}

#[test]
fn size_change_reallocates_both_slots() {
    let mut backend = CpuBackend::default();
    let mut cache = SurfaceCache::<CpuSurface>::new();

    cache.ensure_pair(&mut backend, &desc(8, 8)).unwrap();
    cache.ensure_pair(&mut backend, &desc(4, 2)).unwrap();

    let st = cache.stats();
    assert_eq!(st.allocations, 4);
    assert_eq!(st.releases, 2);
    assert_eq!(cache.slot_desc(SlotId::A), Some(desc(4, 2)));
    assert_eq!(cache.slot_desc(SlotId::B), Some(desc(4, 2)));
    assert_eq!(st.retained_bytes, 2 * 4 * 2 * 4);
}

#[test]
fn color_space_change_reallocates() {
    let mut backend = CpuBackend::default();
    let mut cache = SurfaceCache::<CpuSurface>::new();

    cache.ensure(&mut backend, SlotId::A, &desc(4, 4)).unwrap();
    let linear = desc(4, 4).with_color_space(ColorSpace::LinearSrgb);
    cache.ensure(&mut backend, SlotId::A, &linear).unwrap();

    assert_eq!(cache.stats().allocations, 2);
    assert_eq!(cache.slot_desc(SlotId::A), Some(linear));
    assert!(cache.slot(SlotId::B).is_none());
}

#[test]
fn failed_allocation_leaves_slot_empty() {
    let mut backend = CpuBackend::new(CpuBackendOpts::default().with_max_surface_bytes(256));
    let mut cache = SurfaceCache::<CpuSurface>::new();

    cache.ensure(&mut backend, SlotId::A, &desc(4, 4)).unwrap();
    let err = cache.ensure(&mut backend, SlotId::A, &desc(16, 16));
    assert!(matches!(err, Err(FilterChainError::Allocation(_))));
    assert!(cache.slot(SlotId::A).is_none());
    assert_eq!(cache.slot_desc(SlotId::A), None);

    let st = cache.stats();
    assert_eq!(st.failed_allocations, 1);
    assert_eq!(st.releases, 1);
    assert_eq!(st.retained_surfaces, 0);

    backend.set_opts(CpuBackendOpts::default());
    assert!(cache.ensure(&mut backend, SlotId::A, &desc(16, 16)).is_ok());
}

#[test]
fn context_change_drops_both_slots() {
    let mut backend = CpuBackend::default();
    let mut cache = SurfaceCache::<CpuSurface>::new();

    cache.ensure_pair(&mut backend, &desc(4, 4)).unwrap();
    backend.reset_context();
    cache.ensure(&mut backend, SlotId::A, &desc(4, 4)).unwrap();

    let st = cache.stats();
    assert_eq!(st.releases, 2);
    assert_eq!(st.allocations, 3);
    assert!(cache.slot(SlotId::B).is_none());
}

#[test]
fn invalidate_releases_everything() {
    let mut backend = CpuBackend::default();
    let mut cache = SurfaceCache::<CpuSurface>::new();
    cache.ensure_pair(&mut backend, &desc(4, 4)).unwrap();

    cache.invalidate();
    cache.invalidate();

    let st = cache.stats();
    assert_eq!(st.releases, 2);
    assert_eq!(st.retained_surfaces, 0);
}

#[test]
fn split_requires_both_slots() {
    let mut backend = CpuBackend::default();
    let mut cache = SurfaceCache::<CpuSurface>::new();
    cache.ensure(&mut backend, SlotId::A, &desc(4, 4)).unwrap();
    assert!(cache.split(SlotId::A).is_none());

    cache.ensure(&mut backend, SlotId::B, &desc(4, 4)).unwrap();
    assert!(cache.split(SlotId::A).is_some());
    assert!(cache.split(SlotId::B).is_some());
}

#[test]
fn zero_sized_request_is_rejected_without_allocating() {
    let mut backend = CpuBackend::default();
    let mut cache = SurfaceCache::<CpuSurface>::new();
    assert!(matches!(
        cache.ensure(&mut backend, SlotId::A, &desc(0, 4)),
        Err(FilterChainError::Validation(_))
    ));
    assert_eq!(cache.stats().allocations, 0);
}

#[test]
fn slot_other_alternates() {
    assert_eq!(SlotId::A.other(), SlotId::B);
    assert_eq!(SlotId::B.other(), SlotId::A);
}
