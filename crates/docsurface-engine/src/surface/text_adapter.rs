use crate::error::SurfaceError;
use crate::ops::StringAdapter;
use crate::views::NodeView;
use crate::visual::VisualTree;

/// Applies text diffs on one node's content to its view
///
/// Offsets are character offsets into the node's content; the view maps
/// them onto its own text nodes.
pub struct TextNodeAdapter<'a> {
    view: &'a mut dyn NodeView,
    tree: &'a mut VisualTree,
}

impl<'a> TextNodeAdapter<'a> {
    pub fn new(view: &'a mut dyn NodeView, tree: &'a mut VisualTree) -> Self {
        Self { view, tree }
    }
}

impl StringAdapter for TextNodeAdapter<'_> {
    type Error = SurfaceError;

    fn insert(&mut self, pos: usize, text: &str) -> Result<(), SurfaceError> {
        self.view.insert(self.tree, pos, text)
    }

    fn delete(&mut self, pos: usize, len: usize) -> Result<(), SurfaceError> {
        self.view.delete(self.tree, pos, len)
    }

    fn get(&self) -> String {
        self.view.text(&*self.tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ContentNode;
    use crate::ops::TextOperation;
    use crate::views::{TextStyle, TextView};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_text_diffs_reach_the_view() {
        let mut tree = VisualTree::new();
        let mut view = TextView::new(&ContentNode::with_id("p1", "paragraph", "abc"), TextStyle::Paragraph);
        view.render(&mut tree);

        let mut model = String::from("abc");
        let op = TextOperation::Compound(vec![
            TextOperation::insert(1, "Q"),
            TextOperation::delete(3, 1),
            TextOperation::insert(3, "!"),
        ]);
        op.apply(&mut model).unwrap();

        let mut adapter = TextNodeAdapter::new(&mut view, &mut tree);
        op.apply(&mut adapter).unwrap();

        assert_eq!(adapter.get(), "aQb!");
        assert_eq!(adapter.get(), model);
    }

    #[test]
    fn test_bad_offset_is_reported() {
        let mut tree = VisualTree::new();
        let mut view = TextView::new(&ContentNode::with_id("p1", "paragraph", "abc"), TextStyle::Paragraph);
        view.render(&mut tree);

        let mut adapter = TextNodeAdapter::new(&mut view, &mut tree);
        assert!(TextOperation::delete(2, 5).apply(&mut adapter).is_err());
        assert_eq!(adapter.get(), "abc");
    }
}
