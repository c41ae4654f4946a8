//! Whole-document assembly.

use std::fmt::Display;

use rayon::prelude::*;

use crate::options::ConvertOptions;
use crate::source::SlideSource;
use crate::synthesize::{SlideBlock, SlideSynthesizer};
use crate::types::Presentation;

/// Output for a presentation without slides.
pub const EMPTY_DOCUMENT: &str = "# Empty presentation";

/// Output when the document itself could not be read.
pub const FAILURE_DOCUMENT: &str =
    "# Import failed\nUnable to read the file; it may be corrupted or encrypted.";

/// The result of converting a whole document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// The Markdown document.
    pub markdown: String,

    /// Number of slides in the input.
    pub slide_count: usize,

    /// 1-based numbers of slides rendered as degraded blocks.
    pub failed_slides: Vec<usize>,

    /// Set when the whole document could not be read.
    pub document_error: Option<String>,
}

impl Conversion {
    fn empty() -> Self {
        Self {
            markdown: EMPTY_DOCUMENT.to_string(),
            slide_count: 0,
            failed_slides: Vec::new(),
            document_error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            markdown: FAILURE_DOCUMENT.to_string(),
            slide_count: 0,
            failed_slides: Vec::new(),
            document_error: Some(error),
        }
    }
}

/// Drives the [`SlideSynthesizer`] over every slide and joins the blocks.
#[derive(Debug, Clone, Copy)]
pub struct DocumentAssembler {
    synthesizer: SlideSynthesizer,
    parallel: bool,
    parallel_threshold: usize,
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(&ConvertOptions::default())
    }
}

impl DocumentAssembler {
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            synthesizer: SlideSynthesizer::new(options),
            parallel: options.parallel,
            parallel_threshold: options.parallel_threshold,
        }
    }

    /// Convert slides to Markdown.
    pub fn assemble<S: SlideSource + Sync>(&self, slides: &[S]) -> String {
        self.convert(slides).markdown
    }

    /// Convert an in-memory presentation to Markdown.
    pub fn assemble_presentation(&self, presentation: &Presentation) -> String {
        self.assemble(&presentation.slides)
    }

    /// Convert the output of a container decoder.
    ///
    /// A decoder error is a whole-document failure: the fixed failure
    /// document is returned and no slide is attempted.
    pub fn assemble_decoded<S, E>(&self, decoded: Result<Vec<S>, E>) -> String
    where
        S: SlideSource + Sync,
        E: Display,
    {
        self.convert_decoded(decoded).markdown
    }

    /// Like [`DocumentAssembler::assemble_decoded`], with a report.
    pub fn convert_decoded<S, E>(&self, decoded: Result<Vec<S>, E>) -> Conversion
    where
        S: SlideSource + Sync,
        E: Display,
    {
        match decoded {
            Ok(slides) => self.convert(&slides),
            Err(e) => {
                log::error!("Fatal error reading presentation: {}", e);
                Conversion::failed(e.to_string())
            }
        }
    }

    /// Convert slides and report which ones were degraded.
    pub fn convert<S: SlideSource + Sync>(&self, slides: &[S]) -> Conversion {
        if slides.is_empty() {
            return Conversion::empty();
        }

        let blocks = self.synthesize_all(slides);

        let total_size: usize = blocks.iter().map(|b| b.markdown.len()).sum();
        let mut markdown = String::with_capacity(total_size);
        let mut failed_slides = Vec::new();
        for block in &blocks {
            if block.is_degraded() {
                failed_slides.push(block.number);
            }
            markdown.push_str(&block.markdown);
        }
        markdown.truncate(markdown.trim_end().len());

        log::debug!(
            "Assembled {} slides ({} degraded)",
            blocks.len(),
            failed_slides.len()
        );

        Conversion {
            markdown,
            slide_count: slides.len(),
            failed_slides,
            document_error: None,
        }
    }

    /// Blocks are returned in slide order whichever path runs.
    fn synthesize_all<S: SlideSource + Sync>(&self, slides: &[S]) -> Vec<SlideBlock> {
        if self.parallel && slides.len() >= self.parallel_threshold {
            slides
                .par_iter()
                .enumerate()
                .map(|(i, slide)| self.synthesizer.synthesize(slide, i + 1))
                .collect()
        } else {
            slides
                .iter()
                .enumerate()
                .map(|(i, slide)| self.synthesizer.synthesize(slide, i + 1))
                .collect()
        }
    }
}
