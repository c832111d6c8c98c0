//! Observable filter pipeline: the ordered filter list plus its source image.

pub(crate) mod events;
pub(crate) mod filter;
pub(crate) mod model;
