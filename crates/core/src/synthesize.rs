//! Per-slide Markdown synthesis with failure isolation.
//!
//! A slide is rendered as:
//!
//! ```text
//! # Heading
//!
//! - body text
//!
//! <!-- notes
//! speaker notes
//! -->
//!
//! ---
//! ```
//!
//! Any error while materializing or extracting a slide is caught here and
//! rendered as a short warning block, so the rest of the document survives.

use crate::error::{Error, Result};
use crate::extract::FragmentExtractor;
use crate::options::ConvertOptions;
use crate::order::order_by_position;
use crate::source::SlideSource;
use crate::types::{ContentFragment, TitleEvidence};

/// Horizontal rule closing every slide block.
const SLIDE_SEPARATOR: &str = "---\n\n";

/// The rendered output for one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideBlock {
    /// 1-based slide number.
    pub number: usize,

    /// The chosen heading (or the degraded heading).
    pub heading: String,

    /// Rendered Markdown, including the trailing separator.
    pub markdown: String,

    /// Error message when the slide could not be converted.
    pub error: Option<String>,
}

impl SlideBlock {
    /// Whether this block is a degraded stand-in for a failed slide.
    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    fn degraded(number: usize, error: &Error) -> Self {
        let heading = format!("Slide {} (failed to parse)", number);
        let markdown = format!(
            "# {}\n> ⚠️ Unable to read this slide: {}\n\n{}",
            heading, error, SLIDE_SEPARATOR
        );
        Self {
            number,
            heading,
            markdown,
            error: Some(error.to_string()),
        }
    }
}

/// Turns one slide into a [`SlideBlock`].
#[derive(Debug, Clone, Copy)]
pub struct SlideSynthesizer {
    extractor: FragmentExtractor,
    include_notes: bool,
}

impl Default for SlideSynthesizer {
    fn default() -> Self {
        Self::new(&ConvertOptions::default())
    }
}

impl SlideSynthesizer {
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            extractor: FragmentExtractor::new(options),
            include_notes: options.include_notes,
        }
    }

    /// Synthesize slide `number` (1-based). Never fails.
    pub fn synthesize<S: SlideSource + ?Sized>(&self, slide: &S, number: usize) -> SlideBlock {
        match self.try_synthesize(slide, number) {
            Ok(block) => block,
            Err(e) => {
                log::warn!("Error parsing slide {}: {}", number, e);
                SlideBlock::degraded(number, &e)
            }
        }
    }

    fn try_synthesize<S: SlideSource + ?Sized>(&self, slide: &S, number: usize) -> Result<SlideBlock> {
        let shapes = slide.shapes()?;

        let mut fragments: Vec<ContentFragment> = Vec::with_capacity(shapes.len());
        for shape in order_by_position(&shapes) {
            let fragment = self.extractor.extract(shape)?;
            if !fragment.is_empty() {
                fragments.push(fragment);
            }
        }

        // A title placeholder anywhere at the top level outranks the heuristics.
        let heading = fragments
            .iter()
            .find(|f| f.title_evidence == Some(TitleEvidence::Placeholder))
            .or_else(|| fragments.iter().find(|f| f.is_title_candidate()))
            .map(|f| f.text.clone())
            .or_else(|| slide.title().and_then(|t| single_line(&t)))
            .unwrap_or_else(|| format!("Slide {}", number));

        // Every fragment repeating the heading is dropped, not just the one promoted.
        let body: Vec<&str> = fragments
            .iter()
            .filter(|f| f.text != heading)
            .map(|f| f.text.as_str())
            .collect();

        let notes = if self.include_notes {
            fetch_notes(slide, number)
        } else {
            String::new()
        };

        log::debug!(
            "Slide {}: heading {:?}, {} body fragments, notes: {}",
            number,
            heading,
            body.len(),
            !notes.is_empty()
        );

        let markdown = render(&heading, &body, &notes);
        Ok(SlideBlock {
            number,
            heading,
            markdown,
            error: None,
        })
    }
}

/// Notes are supplementary: any failure reads as "no notes".
fn fetch_notes<S: SlideSource + ?Sized>(slide: &S, number: usize) -> String {
    match slide.notes() {
        Ok(notes) => notes.map(|n| n.trim().to_string()).unwrap_or_default(),
        Err(e) => {
            log::debug!("Ignoring notes for slide {}: {}", number, e);
            String::new()
        }
    }
}

/// Collapse a container title to one line; `None` when blank.
fn single_line(text: &str) -> Option<String> {
    let joined = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!joined.is_empty()).then_some(joined)
}

fn render(heading: &str, body: &[&str], notes: &str) -> String {
    let mut out = format!("# {}\n\n", heading);

    if !body.is_empty() {
        out.push_str(&body.join("\n\n"));
        out.push_str("\n\n");
    }

    if !notes.is_empty() {
        out.push_str("<!-- notes\n");
        out.push_str(notes);
        out.push_str("\n-->\n\n");
    }

    out.push_str(SLIDE_SEPARATOR);
    out
}
