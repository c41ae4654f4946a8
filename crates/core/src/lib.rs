//! Core shape model and Markdown conversion for presentation documents.
//!
//! A container decoder materializes each slide's shape tree; this crate
//! orders, classifies and extracts it into a single Markdown document, one
//! block per slide. A slide that fails to convert is replaced by a warning
//! block instead of aborting the document.
//!
//! ```
//! use deckmark_core::{DocumentAssembler, PlaceholderRole, Presentation, Slide, TextBox};
//!
//! let presentation = Presentation::new().with_slide(Slide::new(vec![
//!     TextBox::from_text("Welcome").with_role(PlaceholderRole::Title).into(),
//!     TextBox::from_text("first point\nsecond point").at_y(200.0).into(),
//! ]));
//!
//! let markdown = DocumentAssembler::default().assemble_presentation(&presentation);
//! assert_eq!(markdown, "# Welcome\n\n- first point\n- second point\n\n---");
//! ```

pub mod assemble;
pub mod classify;
pub mod error;
pub mod extract;
pub mod options;
pub mod order;
pub mod source;
pub mod synthesize;
pub mod types;

pub use assemble::{Conversion, DocumentAssembler, EMPTY_DOCUMENT, FAILURE_DOCUMENT};
pub use classify::ContentClassifier;
pub use error::{Error, Result};
pub use extract::FragmentExtractor;
pub use options::ConvertOptions;
pub use order::order_by_position;
pub use source::SlideSource;
pub use synthesize::{SlideBlock, SlideSynthesizer};
pub use types::{
    Cell, ContentFragment, Group, Paragraph, Picture, PlaceholderRole, Position, Presentation,
    Row, Run, Shape, Slide, Table, TextBox, TitleEvidence,
};
