use crate::error::{OpError, SurfaceError};
use crate::model::{Annotation, ContentNode};
use crate::ops::text::splice_chars;
use crate::views::{AnnotationRenderer, CONTENT_NODE_CLASS, NodeView};
use crate::visual::{VisualId, VisualPoint, VisualTree};

/// Class of the element holding a text view's characters
pub const CONTENT_CLASS: &str = "content";
/// Class of every annotation span
pub const ANNOTATION_CLASS: &str = "annotation";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Paragraph,
    Heading,
    /// Preformatted text; cannot show annotations
    Code,
}

impl TextStyle {
    pub fn node_type(self) -> &'static str {
        match self {
            TextStyle::Paragraph => "paragraph",
            TextStyle::Heading => "heading",
            TextStyle::Code => "code",
        }
    }

    fn holder_tag(self) -> &'static str {
        match self {
            TextStyle::Paragraph => "div",
            TextStyle::Heading => "h2",
            TextStyle::Code => "pre",
        }
    }

    pub fn supports_annotations(self) -> bool {
        !matches!(self, TextStyle::Code)
    }
}

/// View for nodes whose content is a single run of text
///
/// Renders as
///
/// ```text
/// div.content-node.<type>#<id>
///   <holder>.content
///     "plain text"
///     span.annotation.<kind>[data-annotations=<ids>]
///       "annotated text"
/// ```
#[derive(Debug)]
pub struct TextView {
    node_id: String,
    style: TextStyle,
    content: String,
    annotations: Vec<Annotation>,
    root: Option<VisualId>,
    holder: Option<VisualId>,
}

impl TextView {
    pub fn new(node: &ContentNode, style: TextStyle) -> Self {
        Self {
            node_id: node.id.clone(),
            style,
            content: node.content.clone(),
            annotations: Vec::new(),
            root: None,
            holder: None,
        }
    }

    pub fn style(&self) -> TextStyle {
        self.style
    }

    /// The holder element, if the view is rendered and still alive
    fn live_holder(&self, tree: &VisualTree) -> Option<VisualId> {
        self.holder.filter(|&holder| tree.contains(holder))
    }

    fn rendered_holder(&self, tree: &VisualTree) -> Result<VisualId, SurfaceError> {
        self.live_holder(tree).ok_or_else(|| SurfaceError::ViewNotRendered {
            node_id: self.node_id.clone(),
        })
    }

    fn ensure_root(&mut self, tree: &mut VisualTree) -> (VisualId, VisualId) {
        if let (Some(root), Some(holder)) = (self.root, self.live_holder(tree)) {
            if tree.contains(root) {
                return (root, holder);
            }
        }

        let root = tree.create_element("div", &[CONTENT_NODE_CLASS, self.style.node_type()]);
        tree.set_attribute(root, "id", &self.node_id);
        let holder = tree.create_element(self.style.holder_tag(), &[CONTENT_CLASS]);
        tree.append_child(root, holder);

        self.root = Some(root);
        self.holder = Some(holder);
        (root, holder)
    }

    fn render_segments(&self, tree: &mut VisualTree, holder: VisualId) {
        for child in tree.detach_children(holder) {
            tree.remove_subtree(child);
        }

        let len = self.content.chars().count();
        if len == 0 {
            // Keep a text node so an empty node still has a caret position
            let empty = tree.create_text("");
            tree.append_child(holder, empty);
            return;
        }

        let annotations: &[Annotation] = if self.style.supports_annotations() {
            &self.annotations
        } else {
            &[]
        };

        for segment in segments(&self.content, annotations) {
            let text = tree.create_text(&segment.text);
            if segment.covering.is_empty() {
                tree.append_child(holder, text);
                continue;
            }

            let mut classes = vec![ANNOTATION_CLASS];
            for annotation in &segment.covering {
                if !classes.contains(&annotation.kind.as_str()) {
                    classes.push(annotation.kind.as_str());
                }
            }
            let span = tree.create_element("span", &classes);
            let ids: Vec<&str> = segment.covering.iter().map(|a| a.id.as_str()).collect();
            tree.set_attribute(span, "data-annotations", &ids.join(" "));
            tree.append_child(span, text);
            tree.append_child(holder, span);
        }
    }

    fn out_of_range(&self, offset: usize) -> SurfaceError {
        OpError::OffsetOutOfRange {
            offset,
            len: self.char_len(),
        }
        .into()
    }
}

/// A run of characters covered by the same set of annotations
struct Segment<'a> {
    text: String,
    covering: Vec<&'a Annotation>,
}

/// Split `content` at every annotation boundary
fn segments<'a>(content: &str, annotations: &'a [Annotation]) -> Vec<Segment<'a>> {
    let chars: Vec<char> = content.chars().collect();
    let len = chars.len();

    let mut bounds = vec![0, len];
    for annotation in annotations {
        bounds.push(annotation.start.min(len));
        bounds.push(annotation.end.min(len));
    }
    bounds.sort_unstable();
    bounds.dedup();

    bounds
        .windows(2)
        .map(|window| {
            let (from, to) = (window[0], window[1]);
            Segment {
                text: chars[from..to].iter().collect(),
                covering: annotations
                    .iter()
                    .filter(|a| a.start < a.end && a.start <= from && a.end >= to)
                    .collect(),
            }
        })
        .collect()
}

impl NodeView for TextView {
    fn node_id(&self) -> &str {
        &self.node_id
    }

    fn root(&self) -> Option<VisualId> {
        self.root
    }

    fn render(&mut self, tree: &mut VisualTree) -> VisualId {
        let (root, holder) = self.ensure_root(tree);
        self.render_segments(tree, holder);
        root
    }

    fn dispose(&mut self, tree: &mut VisualTree) {
        if let Some(root) = self.root.take() {
            tree.remove_subtree(root);
        }
        self.holder = None;
    }

    fn char_position(&self, tree: &VisualTree, point: VisualPoint) -> Result<usize, SurfaceError> {
        let holder = self.rendered_holder(tree)?;
        let foreign = || SurfaceError::ForeignPoint {
            node_id: self.node_id.clone(),
        };

        if tree.is_inclusive_ancestor(holder, point.node) {
            return tree.char_offset_within(holder, point).ok_or_else(foreign);
        }

        // A point on the root element itself sits before or after the holder
        match self.root {
            Some(root) if point.node == root => {
                let holder_index = tree.index_in_parent(holder).unwrap_or(0);
                Ok(if point.offset <= holder_index {
                    0
                } else {
                    self.char_len()
                })
            }
            _ => Err(foreign()),
        }
    }

    fn visual_position(&self, tree: &VisualTree, offset: usize) -> Result<VisualPoint, SurfaceError> {
        let holder = self.rendered_holder(tree)?;
        if offset > self.char_len() {
            return Err(self.out_of_range(offset));
        }
        tree.point_at_char_offset(holder, offset)
            .ok_or_else(|| self.out_of_range(offset))
    }

    fn char_len(&self) -> usize {
        self.content.chars().count()
    }

    fn text(&self, tree: &VisualTree) -> String {
        self.live_holder(tree)
            .map(|holder| tree.text_content(holder))
            .unwrap_or_default()
    }

    fn replace_content(&mut self, content: &str) {
        self.content = content.to_string();
    }

    fn insert(&mut self, tree: &mut VisualTree, pos: usize, text: &str) -> Result<(), SurfaceError> {
        if pos > self.char_len() {
            return Err(self.out_of_range(pos));
        }
        splice_chars(&mut self.content, pos, 0, text)?;

        let Some(holder) = self.live_holder(tree) else {
            return Ok(());
        };
        match tree.point_at_char_offset(holder, pos) {
            Some(point) if tree.is_text(point.node) => {
                tree.splice_text(point.node, point.offset, 0, text)?;
            }
            _ => {
                let node = tree.create_text(text);
                tree.append_child(holder, node);
            }
        }
        Ok(())
    }

    fn delete(&mut self, tree: &mut VisualTree, pos: usize, len: usize) -> Result<(), SurfaceError> {
        let Some(until) = pos.checked_add(len).filter(|&until| until <= self.char_len()) else {
            return Err(self.out_of_range(pos.saturating_add(len)));
        };
        splice_chars(&mut self.content, pos, len, "")?;

        let Some(holder) = self.live_holder(tree) else {
            return Ok(());
        };

        // Remove the overlap of [pos, pos + len) with every text node
        let (from, to) = (pos, until);
        let mut seen = 0;
        for node in tree.text_nodes(holder) {
            let node_len = tree.text(node).map_or(0, |t| t.chars().count());
            let (node_from, node_to) = (seen, seen + node_len);
            seen = node_to;

            let cut_from = from.max(node_from);
            let cut_to = to.min(node_to);
            if cut_from < cut_to {
                tree.splice_text(node, cut_from - node_from, cut_to - cut_from, "")?;
            }
        }
        Ok(())
    }

    fn annotations(&mut self) -> Option<&mut dyn AnnotationRenderer> {
        if self.style.supports_annotations() {
            Some(self)
        } else {
            None
        }
    }
}

impl AnnotationRenderer for TextView {
    fn render_annotations(
        &mut self,
        tree: &mut VisualTree,
        annotations: &[Annotation],
    ) -> Result<(), SurfaceError> {
        self.annotations = annotations.to_vec();
        if let Some(holder) = self.live_holder(tree) {
            self.render_segments(tree, holder);
        }
        Ok(())
    }
}
