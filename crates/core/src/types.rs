//! Shape model for a materialized presentation document.
//!
//! These types are plain data: they are built by a container decoder (or
//! deserialized from JSON) and only ever borrowed by the conversion core.

use serde::{Deserialize, Serialize};

/// Represents an entire presentation as an ordered list of slides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Slides in presentation order.
    #[serde(default)]
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create an empty presentation.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a slide to the end of the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Builder-style variant of [`Presentation::add_slide`].
    pub fn with_slide(mut self, slide: Slide) -> Self {
        self.add_slide(slide);
        self
    }
}

/// A single slide: a forest of top-level shapes plus optional metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// Top-level shapes in document (z-) order.
    #[serde(default)]
    pub shapes: Vec<Shape>,

    /// Title supplied by the container, used when no shape qualifies.
    #[serde(default)]
    pub title: Option<String>,

    /// Speaker notes.
    #[serde(default)]
    pub notes: Option<String>,
}

impl Slide {
    /// Create a slide with the given top-level shapes.
    pub fn new(shapes: Vec<Shape>) -> Self {
        Self {
            shapes,
            title: None,
            notes: None,
        }
    }

    /// Set the container-supplied title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the speaker notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Vertical anchor of a shape, in points from the top of the slide.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub y: f64,
}

/// Semantic placeholder tag carried by a text box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaceholderRole {
    Title,
    CenteredTitle,
    Body,
    Other,
}

impl PlaceholderRole {
    /// Whether this role marks the slide's title.
    pub fn is_title(self) -> bool {
        matches!(self, Self::Title | Self::CenteredTitle)
    }
}

/// A node in a slide's shape tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Shape {
    TextBox(TextBox),
    Table(Table),
    Picture(Picture),
    Group(Group),
}

impl Shape {
    /// The shape's vertical anchor, if the container supplied one.
    pub fn position(&self) -> Option<Position> {
        match self {
            Shape::TextBox(text_box) => text_box.position,
            Shape::Table(table) => table.position,
            Shape::Picture(picture) => picture.position,
            Shape::Group(group) => group.position,
        }
    }
}

impl From<TextBox> for Shape {
    fn from(value: TextBox) -> Self {
        Shape::TextBox(value)
    }
}

impl From<Table> for Shape {
    fn from(value: Table) -> Self {
        Shape::Table(value)
    }
}

impl From<Picture> for Shape {
    fn from(value: Picture) -> Self {
        Shape::Picture(value)
    }
}

impl From<Group> for Shape {
    fn from(value: Group) -> Self {
        Shape::Group(value)
    }
}

/// A shape holding paragraphs of text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBox {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,

    #[serde(default)]
    pub placeholder_role: Option<PlaceholderRole>,

    #[serde(default)]
    pub position: Option<Position>,
}

impl TextBox {
    /// Create a text box with one single-run paragraph per input line.
    pub fn from_text(text: &str) -> Self {
        Self {
            paragraphs: text.split('\n').map(Paragraph::from_text).collect(),
            placeholder_role: None,
            position: None,
        }
    }

    /// Set the placeholder role.
    pub fn with_role(mut self, role: PlaceholderRole) -> Self {
        self.placeholder_role = Some(role);
        self
    }

    /// Set the vertical position.
    pub fn at_y(mut self, y: f64) -> Self {
        self.position = Some(Position { y });
        self
    }

    /// Set the font size of the first run of the first paragraph.
    pub fn with_font_size(mut self, size: f64) -> Self {
        if let Some(run) = self
            .paragraphs
            .first_mut()
            .and_then(|p| p.runs.first_mut())
        {
            run.font_size = Some(size);
        }
        self
    }

    /// Full text: paragraphs joined by newlines.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// An ordered sequence of runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// Create a paragraph with a single unsized run.
    pub fn from_text(text: &str) -> Self {
        Self {
            runs: vec![Run::new(text)],
        }
    }

    /// Concatenated run text.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// A span of text sharing formatting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub text: String,

    /// Font size in points.
    #[serde(default)]
    pub font_size: Option<f64>,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font_size: None,
        }
    }
}

/// A grid of text cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<Row>,

    #[serde(default)]
    pub position: Option<Position>,
}

impl Table {
    /// Build a table from row-major cell text.
    pub fn from_rows<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|cells| Row {
                    cells: cells
                        .into_iter()
                        .map(|text| Cell { text: text.into() })
                        .collect(),
                })
                .collect(),
            position: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    #[serde(default)]
    pub text: String,
}

/// An embedded image. Carries no text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Picture {
    #[serde(default)]
    pub position: Option<Position>,
}

/// A group of shapes, nested to any depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub children: Vec<Shape>,

    #[serde(default)]
    pub position: Option<Position>,
}

impl Group {
    pub fn new(children: Vec<Shape>) -> Self {
        Self {
            children,
            position: None,
        }
    }
}

/// One unit of extracted text from a single shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentFragment {
    pub text: String,

    /// Why the fragment may become the slide heading; `None` for body text.
    pub title_evidence: Option<TitleEvidence>,
}

impl ContentFragment {
    /// A fragment that can only ever be body text.
    pub fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            title_evidence: None,
        }
    }

    /// A fragment eligible to become the slide heading.
    pub fn title(text: impl Into<String>, evidence: TitleEvidence) -> Self {
        Self {
            text: text.into(),
            title_evidence: Some(evidence),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_title_candidate(&self) -> bool {
        self.title_evidence.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// The classifier rule that marked a text box as a title candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleEvidence {
    /// Title or centered-title placeholder.
    Placeholder,
    /// Anchored near the top of the slide.
    Position,
    /// Leading run set in a large font.
    FontSize,
}
