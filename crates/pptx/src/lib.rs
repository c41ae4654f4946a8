//! PPTX (Office Open XML) container decoder.
//!
//! Reads .pptx files (ZIP archives of XML parts) and materializes each
//! slide's shape tree for `deckmark-core`.

pub mod parser;
pub mod shapes;

pub use parser::{PptxDocument, PptxParser, PptxSlide};
pub use shapes::{PlaceholderAnchors, ShapeDecoder};
