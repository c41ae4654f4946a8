//! Heading heuristics for text boxes.

use crate::options::ConvertOptions;
use crate::types::{TextBox, TitleEvidence};

/// Decides whether a text box reads as a slide title.
#[derive(Debug, Clone, Copy)]
pub struct ContentClassifier {
    title_max_y: f64,
    title_min_font_size: f64,
}

impl Default for ContentClassifier {
    fn default() -> Self {
        Self::new(&ConvertOptions::default())
    }
}

impl ContentClassifier {
    pub fn new(options: &ConvertOptions) -> Self {
        Self {
            title_max_y: options.title_max_y,
            title_min_font_size: options.title_min_font_size,
        }
    }

    /// Whether the text box may become the slide heading.
    pub fn is_title_candidate(&self, text_box: &TextBox) -> bool {
        self.classify(text_box).is_some()
    }

    /// Rules are evaluated in order; the first match wins:
    ///
    /// 1. a title or centered-title placeholder,
    /// 2. anchored near the top of the slide,
    /// 3. a large leading run.
    pub fn classify(&self, text_box: &TextBox) -> Option<TitleEvidence> {
        if text_box.placeholder_role.is_some_and(|role| role.is_title()) {
            return Some(TitleEvidence::Placeholder);
        }

        if text_box
            .position
            .is_some_and(|position| position.y < self.title_max_y)
        {
            return Some(TitleEvidence::Position);
        }

        self.leading_font_size(text_box)
            .filter(|size| *size > self.title_min_font_size)
            .map(|_| TitleEvidence::FontSize)
    }

    /// Font size of the first run of the first paragraph, if any.
    fn leading_font_size(&self, text_box: &TextBox) -> Option<f64> {
        text_box.paragraphs.first()?.runs.first()?.font_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Paragraph, PlaceholderRole};

    #[test]
    fn test_title_placeholder_always_wins() {
        let classifier = ContentClassifier::default();
        let text_box = TextBox::from_text("Agenda")
            .with_role(PlaceholderRole::Title)
            .at_y(400.0)
            .with_font_size(10.0);
        assert!(classifier.is_title_candidate(&text_box));

        let centered = TextBox::from_text("Cover").with_role(PlaceholderRole::CenteredTitle);
        assert!(classifier.is_title_candidate(&centered));
    }

    #[test]
    fn test_first_matching_rule_is_reported() {
        let classifier = ContentClassifier::default();
        let text_box = TextBox::from_text("x").at_y(10.0).with_font_size(40.0);
        assert_eq!(classifier.classify(&text_box), Some(TitleEvidence::Position));

        let text_box = TextBox::from_text("x").at_y(300.0).with_font_size(40.0);
        assert_eq!(classifier.classify(&text_box), Some(TitleEvidence::FontSize));

        let text_box = TextBox::from_text("x").with_role(PlaceholderRole::Title).at_y(10.0);
        assert_eq!(classifier.classify(&text_box), Some(TitleEvidence::Placeholder));

        assert_eq!(classifier.classify(&TextBox::from_text("x").at_y(300.0)), None);
    }

    #[test]
    fn test_body_placeholder_falls_through_to_position() {
        let classifier = ContentClassifier::default();
        let near_top = TextBox::from_text("x").with_role(PlaceholderRole::Body).at_y(10.0);
        let lower = TextBox::from_text("x").with_role(PlaceholderRole::Body).at_y(200.0);
        assert!(classifier.is_title_candidate(&near_top));
        assert!(!classifier.is_title_candidate(&lower));
    }

    #[test]
    fn test_position_threshold_is_exclusive() {
        let classifier = ContentClassifier::default();
        assert!(classifier.is_title_candidate(&TextBox::from_text("x").at_y(49.9)));
        assert!(!classifier.is_title_candidate(&TextBox::from_text("x").at_y(50.0)));
    }

    #[test]
    fn test_font_size_threshold_is_exclusive() {
        let classifier = ContentClassifier::default();
        let big = TextBox::from_text("x").at_y(300.0).with_font_size(24.5);
        let exact = TextBox::from_text("x").at_y(300.0).with_font_size(24.0);
        assert!(classifier.is_title_candidate(&big));
        assert!(!classifier.is_title_candidate(&exact));
    }

    #[test]
    fn test_only_first_run_counts() {
        let classifier = ContentClassifier::default();
        let mut text_box = TextBox::from_text("small\nhuge");
        text_box.paragraphs[1].runs[0].font_size = Some(60.0);
        assert!(!classifier.is_title_candidate(&text_box));
    }

    #[test]
    fn test_missing_paragraphs_or_runs_is_no_match() {
        let classifier = ContentClassifier::default();
        assert!(!classifier.is_title_candidate(&TextBox::default()));

        let text_box = TextBox {
            paragraphs: vec![Paragraph::default()],
            ..TextBox::default()
        };
        assert!(!classifier.is_title_candidate(&text_box));
    }

    #[test]
    fn test_custom_thresholds() {
        let options = ConvertOptions::new()
            .with_title_max_y(10.0)
            .with_title_min_font_size(40.0);
        let classifier = ContentClassifier::new(&options);
        assert!(!classifier.is_title_candidate(&TextBox::from_text("x").at_y(20.0)));
        assert!(!classifier.is_title_candidate(
            &TextBox::from_text("x").at_y(100.0).with_font_size(30.0)
        ));
    }
}
