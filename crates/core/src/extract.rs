//! Fragment extraction over the shape tree.

use crate::classify::ContentClassifier;
use crate::error::{Error, Result};
use crate::options::ConvertOptions;
use crate::order::order_by_position;
use crate::types::{ContentFragment, Group, Shape, Table, TextBox};

/// Placeholder emitted for every picture.
pub const PICTURE_PLACEHOLDER: &str = "![Slide image (placeholder)]";

/// Marker substituted for line breaks inside a table cell.
const CELL_LINE_BREAK: &str = "<br>";

/// Walks shapes depth-first and turns each into a [`ContentFragment`].
#[derive(Debug, Clone, Copy)]
pub struct FragmentExtractor {
    classifier: ContentClassifier,
    max_group_depth: usize,
}

impl Default for FragmentExtractor {
    fn default() -> Self {
        Self::new(&ConvertOptions::default())
    }
}

impl FragmentExtractor {
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            classifier: ContentClassifier::new(options),
            max_group_depth: options.max_group_depth,
        }
    }

    /// Extract one shape (and, for groups, everything beneath it).
    pub fn extract(&self, shape: &Shape) -> Result<ContentFragment> {
        match shape {
            Shape::Group(group) => self.extract_group(group),
            Shape::TextBox(text_box) => Ok(self.extract_text_box(text_box)),
            Shape::Table(table) => Ok(ContentFragment::body(table_to_markdown(table))),
            Shape::Picture(_) => Ok(ContentFragment::body(PICTURE_PLACEHOLDER)),
        }
    }

    /// Groups contribute body text only, even when a child reads as a title.
    ///
    /// Nested groups are flattened with an explicit stack, innermost last.
    fn extract_group(&self, group: &Group) -> Result<ContentFragment> {
        let mut open = vec![OpenGroup::new(group)];

        while let Some(current) = open.last_mut() {
            match current.children.next() {
                Some(Shape::Group(child)) => {
                    if open.len() >= self.max_group_depth {
                        return Err(Error::ExtractionError(format!(
                            "group nesting exceeds {} levels",
                            self.max_group_depth
                        )));
                    }
                    open.push(OpenGroup::new(child));
                }
                Some(shape) => {
                    let fragment = self.extract(shape)?;
                    if !fragment.is_empty() {
                        current.blocks.push(fragment.text);
                    }
                }
                None => {
                    let text = current.blocks.join("\n\n");
                    open.pop();
                    match open.last_mut() {
                        Some(parent) if !text.trim().is_empty() => parent.blocks.push(text),
                        Some(_) => {}
                        None => return Ok(ContentFragment::body(text)),
                    }
                }
            }
        }

        Ok(ContentFragment::empty())
    }

    fn extract_text_box(&self, text_box: &TextBox) -> ContentFragment {
        let text = text_box.text();
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let Some(first) = lines.first() else {
            return ContentFragment::empty();
        };

        if let Some(evidence) = self.classifier.classify(text_box) {
            return ContentFragment::title(*first, evidence);
        }

        let bullets: Vec<String> = lines.iter().map(|line| format!("- {}", line)).collect();
        ContentFragment::body(bullets.join("\n"))
    }
}

/// A group being flattened: its remaining children in reading order and
/// the blocks collected so far.
struct OpenGroup<'a> {
    children: std::vec::IntoIter<&'a Shape>,
    blocks: Vec<String>,
}

impl<'a> OpenGroup<'a> {
    fn new(group: &'a Group) -> Self {
        Self {
            children: order_by_position(&group.children).into_iter(),
            blocks: Vec::new(),
        }
    }
}

/// Render a table as a pipe grid with a separator after the first row.
pub fn table_to_markdown(table: &Table) -> String {
    let mut lines = Vec::with_capacity(table.rows.len() + 1);

    for (i, row) in table.rows.iter().enumerate() {
        let mut line = String::from("|");
        for cell in &row.cells {
            let value = format_cell(&cell.text);
            line.push(' ');
            line.push_str(if value.is_empty() { " " } else { &value });
            line.push_str(" |");
        }
        lines.push(line);

        if i == 0 {
            lines.push(format!("|{}", "---|".repeat(row.cells.len())));
        }
    }

    lines.join("\n")
}

fn format_cell(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\n', CELL_LINE_BREAK)
        .trim()
        .replace('|', "\\|")
}
