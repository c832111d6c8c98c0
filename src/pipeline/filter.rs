use std::any::Any;
use std::rc::Rc;

/// Opaque value cascaded from the host into a pipeline and its filters.
pub type InheritedContext = Rc<dyn Any>;

/// Identifier assigned to a filter when it joins a [`Pipeline`](crate::Pipeline).
///
/// Ids are never reused within one pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterId(
    /// Raw id, unique within the owning pipeline.
    pub u64,
);

/// A unit of the filter chain.
///
/// The compositor only asks two things of a filter: whether it is enabled and which
/// paint to apply while drawing one surface into the next.
pub trait Filter {
    /// Backend paint produced by this filter.
    type Paint;

    /// Whether the filter takes part in the next composite.
    fn is_enabled(&self) -> bool;

    /// Toggle participation.
    fn set_enabled(&mut self, enabled: bool);

    /// Paint applied when this filter's pass is drawn.
    fn paint(&self) -> Self::Paint;

    /// Receive the host context cascaded through the pipeline.
    fn set_inherited_context(&mut self, _context: Option<&InheritedContext>) {}
}

impl<T: Filter + ?Sized> Filter for Box<T> {
    type Paint = T::Paint;

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }

    fn set_enabled(&mut self, enabled: bool) {
        (**self).set_enabled(enabled);
    }

    fn paint(&self) -> Self::Paint {
        (**self).paint()
    }

    fn set_inherited_context(&mut self, context: Option<&InheritedContext>) {
        (**self).set_inherited_context(context);
    }
}

/// Stock filter: a stored paint behind an enabled flag.
#[derive(Clone, Debug)]
pub struct PaintFilter<P> {
    enabled: bool,
    paint: P,
}

impl<P: Clone> PaintFilter<P> {
    /// Enabled filter applying `paint`.
    pub fn new(paint: P) -> Self {
        Self {
            enabled: true,
            paint,
        }
    }

    /// Disabled filter applying `paint` once enabled.
    pub fn disabled(paint: P) -> Self {
        Self {
            enabled: false,
            paint,
        }
    }

    /// Borrow the stored paint.
    pub fn paint_ref(&self) -> &P {
        &self.paint
    }

    /// Replace the stored paint.
    pub fn set_paint(&mut self, paint: P) {
        self.paint = paint;
    }
}

impl<P: Clone> Filter for PaintFilter<P> {
    type Paint = P;

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn paint(&self) -> P {
        self.paint.clone()
    }
}
