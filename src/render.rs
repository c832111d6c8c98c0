//! Rendering: backend abstraction, the two-slot surface cache, the compositor and the
//! CPU reference backend.

pub(crate) mod backend;
pub(crate) mod compositor;
pub(crate) mod cpu;
pub(crate) mod surface_cache;
