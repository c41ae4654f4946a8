//! The seam between container decoders and the conversion core.

use std::borrow::Cow;

use crate::error::Result;
use crate::types::{Shape, Slide};

/// A slide whose content can be materialized on demand.
///
/// Decoders that materialize lazily (such as the PPTX backend) may fail per
/// slide; the synthesizer turns such failures into a degraded block for that
/// slide alone.
pub trait SlideSource {
    /// The slide's top-level shapes.
    fn shapes(&self) -> Result<Cow<'_, [Shape]>>;

    /// Title supplied by the container, if any.
    fn title(&self) -> Option<String>;

    /// Speaker notes. Failures are tolerated by callers.
    fn notes(&self) -> Result<Option<String>>;
}

impl SlideSource for Slide {
    fn shapes(&self) -> Result<Cow<'_, [Shape]>> {
        Ok(Cow::Borrowed(&self.shapes))
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn notes(&self) -> Result<Option<String>> {
        Ok(self.notes.clone())
    }
}

