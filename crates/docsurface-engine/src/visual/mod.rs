//! The rendered side: an arena tree of elements and text nodes, boundary
//! points and the native selection over it, and the layout that turns
//! boundary points into pixel rectangles.

pub mod geometry;
pub mod tree;

use std::cmp::Ordering;

pub use geometry::{BlockLayout, Layout, LayoutMetrics, Rect};
pub use tree::{VisualId, VisualKind, VisualTree};

/// A boundary point: a text node and a char offset into it, or an element
/// and a child index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VisualPoint {
    pub node: VisualId,
    pub offset: usize,
}

impl VisualPoint {
    pub fn new(node: VisualId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A range between two boundary points, `start` never after `end`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisualRange {
    pub start: VisualPoint,
    pub end: VisualPoint,
}

impl VisualRange {
    pub fn collapsed(at: VisualPoint) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// The platform selection over the visual tree
///
/// Holds a document-ordered range plus the anchor, the point where the user
/// started selecting, which may be either end of the range (or neither, for
/// word and line selections).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NativeSelection {
    range: Option<VisualRange>,
    anchor: Option<VisualPoint>,
}

impl NativeSelection {
    /// Select from `anchor` to `focus`, as a pointer drag would
    pub fn select(&mut self, tree: &VisualTree, anchor: VisualPoint, focus: VisualPoint) {
        let range = match tree.compare_points(anchor, focus) {
            Ordering::Greater => VisualRange {
                start: focus,
                end: anchor,
            },
            _ => VisualRange {
                start: anchor,
                end: focus,
            },
        };
        self.range = Some(range);
        self.anchor = Some(anchor);
    }

    /// Replace the selection with `range`, anchored at its start
    pub fn set_range(&mut self, range: VisualRange) {
        self.range = Some(range);
        self.anchor = Some(range.start);
    }

    /// A selection whose anchor matches neither end, e.g. a double-click word selection
    pub fn set_range_with_anchor(&mut self, range: VisualRange, anchor: VisualPoint) {
        self.range = Some(range);
        self.anchor = Some(anchor);
    }

    pub fn clear(&mut self) {
        self.range = None;
        self.anchor = None;
    }

    pub fn range(&self) -> Option<VisualRange> {
        self.range
    }

    pub fn anchor(&self) -> Option<VisualPoint> {
        self.anchor
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_select_backwards_keeps_anchor_at_range_end() {
        let mut tree = VisualTree::new();
        let text = tree.create_text("hello");
        let mut selection = NativeSelection::default();

        selection.select(&tree, VisualPoint::new(text, 4), VisualPoint::new(text, 1));

        let range = selection.range().unwrap();
        assert_eq!(range.start, VisualPoint::new(text, 1));
        assert_eq!(range.end, VisualPoint::new(text, 4));
        assert_eq!(selection.anchor(), Some(range.end));
    }

    #[test]
    fn test_set_range_anchors_at_start() {
        let mut tree = VisualTree::new();
        let text = tree.create_text("hello");
        let mut selection = NativeSelection::default();
        let range = VisualRange {
            start: VisualPoint::new(text, 0),
            end: VisualPoint::new(text, 3),
        };

        selection.set_range(range);
        assert_eq!(selection.anchor(), Some(range.start));

        selection.clear();
        assert!(selection.is_empty());
        assert_eq!(selection.anchor(), None);
    }
}
