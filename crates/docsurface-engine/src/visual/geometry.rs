use serde::{Deserialize, Serialize};

use crate::surface::NODES_CLASS;
use crate::visual::{VisualId, VisualPoint, VisualTree};

/// Pixel rectangle in client coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub width: f32,
    pub height: f32,
}

/// Source of pixel geometry for the visual tree
pub trait Layout {
    /// Client rectangle of an element
    fn element_rect(&self, tree: &VisualTree, element: VisualId) -> Option<Rect>;

    /// Client rectangle of a collapsed range at `point` (zero width)
    fn point_rect(&self, tree: &VisualTree, point: VisualPoint) -> Option<Rect>;
}

/// Fixed-cell metrics for [`BlockLayout`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutMetrics {
    /// Client position of the surface root
    pub origin_top: f32,
    pub origin_left: f32,
    /// Inset of the node container inside the surface
    pub padding_top: f32,
    pub padding_left: f32,
    pub line_height: f32,
    pub char_width: f32,
    /// Vertical space after each block
    pub block_gap: f32,
    pub width: f32,
}

impl Default for LayoutMetrics {
    fn default() -> Self {
        Self {
            origin_top: 0.0,
            origin_left: 0.0,
            padding_top: 0.0,
            padding_left: 0.0,
            line_height: 20.0,
            char_width: 8.0,
            block_gap: 10.0,
            width: 640.0,
        }
    }
}

/// Deterministic block-flow layout
///
/// Children of the node container stack top to bottom; inside a block every
/// character is one cell wide and each `\n` starts a new line. No wrapping.
#[derive(Debug, Clone, Default)]
pub struct BlockLayout {
    metrics: LayoutMetrics,
}

impl BlockLayout {
    pub fn new(metrics: LayoutMetrics) -> Self {
        Self { metrics }
    }

    pub fn metrics(&self) -> &LayoutMetrics {
        &self.metrics
    }

    fn is_block(tree: &VisualTree, id: VisualId) -> bool {
        tree.parent(id)
            .is_some_and(|parent| tree.has_class(parent, NODES_CLASS))
    }

    fn block_height(&self, tree: &VisualTree, block: VisualId) -> f32 {
        let lines = tree.text_content(block).split('\n').count().max(1);
        lines as f32 * self.metrics.line_height + self.metrics.block_gap
    }

    fn container_height(&self, tree: &VisualTree, container: VisualId) -> f32 {
        tree.children(container)
            .iter()
            .map(|&block| self.block_height(tree, block))
            .sum()
    }

    fn root_rect(&self, tree: &VisualTree, root: VisualId) -> Rect {
        let content_height = tree
            .children(root)
            .iter()
            .find(|&&child| tree.has_class(child, NODES_CLASS))
            .map_or(0.0, |&container| self.container_height(tree, container));

        Rect {
            top: self.metrics.origin_top,
            left: self.metrics.origin_left,
            width: self.metrics.width,
            height: self.metrics.padding_top + content_height,
        }
    }

    fn block_rect(&self, tree: &VisualTree, block: VisualId) -> Option<Rect> {
        let container = tree.parent(block)?;
        let root = tree.ancestors(container).last()?;
        let origin = self.root_rect(tree, root);

        let above: f32 = tree
            .children(container)
            .iter()
            .take_while(|&&sibling| sibling != block)
            .map(|&sibling| self.block_height(tree, sibling))
            .sum();

        Some(Rect {
            top: origin.top + self.metrics.padding_top + above,
            left: origin.left + self.metrics.padding_left,
            width: self.metrics.width - self.metrics.padding_left,
            height: self.block_height(tree, block),
        })
    }
}

impl Layout for BlockLayout {
    fn element_rect(&self, tree: &VisualTree, element: VisualId) -> Option<Rect> {
        if !tree.contains(element) {
            None
        } else if tree.parent(element).is_none() {
            Some(self.root_rect(tree, element))
        } else if Self::is_block(tree, element) {
            self.block_rect(tree, element)
        } else {
            None
        }
    }

    fn point_rect(&self, tree: &VisualTree, point: VisualPoint) -> Option<Rect> {
        let block = tree
            .ancestors(point.node)
            .find(|&id| Self::is_block(tree, id))?;
        let block_rect = self.block_rect(tree, block)?;

        let offset = tree.char_offset_within(block, point)?;
        let (line, column) = line_column(&tree.text_content(block), offset);

        Some(Rect {
            top: block_rect.top + line as f32 * self.metrics.line_height,
            left: block_rect.left + column as f32 * self.metrics.char_width,
            width: 0.0,
            height: self.metrics.line_height,
        })
    }
}

/// Zero-based line and column of char `offset` in `text`
fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let mut line = 0;
    let mut column = 0;
    for ch in text.chars().take(offset) {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    (line, column)
}
