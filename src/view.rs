//! Host glue: redraw invalidation and the filtered-image control.

pub(crate) mod bridge;
pub(crate) mod filtered_image;
