//! Reading-order reconstruction for sibling shapes.

use crate::types::Shape;

/// Order siblings top-to-bottom by their vertical anchor.
///
/// Shapes without a position sort as `y = 0`. The sort is stable, so shapes
/// sharing a position keep their document order. Only this level is sorted;
/// group children are ordered when the group itself is visited.
pub fn order_by_position(shapes: &[Shape]) -> Vec<&Shape> {
    let mut ordered: Vec<&Shape> = shapes.iter().collect();
    ordered.sort_by(|a, b| sort_key(a).total_cmp(&sort_key(b)));
    ordered
}

fn sort_key(shape: &Shape) -> f64 {
    shape.position().map_or(0.0, |p| p.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Group, Picture, Position, TextBox};

    fn text_at(text: &str, y: Option<f64>) -> Shape {
        let mut text_box = TextBox::from_text(text);
        text_box.position = y.map(|y| Position { y });
        text_box.into()
    }

    fn texts(shapes: &[&Shape]) -> Vec<String> {
        shapes
            .iter()
            .map(|s| match s {
                Shape::TextBox(tb) => tb.text(),
                _ => String::from("?"),
            })
            .collect()
    }

    #[test]
    fn test_orders_by_y() {
        let shapes = vec![
            text_at("bottom", Some(300.0)),
            text_at("top", Some(10.0)),
            text_at("middle", Some(120.0)),
        ];
        assert_eq!(texts(&order_by_position(&shapes)), vec!["top", "middle", "bottom"]);
    }

    #[test]
    fn test_missing_position_sorts_first_and_stable() {
        let shapes = vec![
            text_at("a", Some(50.0)),
            text_at("b", None),
            text_at("c", Some(0.0)),
            text_at("d", None),
        ];
        assert_eq!(texts(&order_by_position(&shapes)), vec!["b", "c", "d", "a"]);
    }

    #[test]
    fn test_equal_positions_keep_document_order() {
        let shapes = vec![
            text_at("first", Some(100.0)),
            text_at("second", Some(100.0)),
            text_at("third", Some(100.0)),
        ];
        assert_eq!(
            texts(&order_by_position(&shapes)),
            vec!["first", "second", "third"]
        );
    }

    #[test]
    fn test_non_text_shapes_use_their_position() {
        let picture = Shape::Picture(Picture {
            position: Some(Position { y: 5.0 }),
        });
        let group = Shape::Group(Group {
            children: vec![],
            position: Some(Position { y: 1.0 }),
        });
        let shapes = vec![text_at("text", Some(20.0)), picture, group];
        let ordered = order_by_position(&shapes);
        assert!(matches!(ordered[0], Shape::Group(_)));
        assert!(matches!(ordered[1], Shape::Picture(_)));
        assert!(matches!(ordered[2], Shape::TextBox(_)));
    }

    #[test]
    fn test_nan_position_does_not_panic() {
        let shapes = vec![text_at("nan", Some(f64::NAN)), text_at("one", Some(1.0))];
        assert_eq!(order_by_position(&shapes).len(), 2);
    }

    #[test]
    fn test_does_not_reorder_input() {
        let shapes = vec![text_at("late", Some(9.0)), text_at("early", Some(1.0))];
        let _ = order_by_position(&shapes);
        assert!(matches!(&shapes[0], Shape::TextBox(tb) if tb.text() == "late"));
    }
}
