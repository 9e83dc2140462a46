//! Node views: the per-type renderers the surface drives.
//!
//! A [`NodeView`] owns the visual subtree of one content node. Its root is an
//! element carrying the [`CONTENT_NODE_CLASS`] class and the node id as its
//! `id` attribute; the selection translator finds a node by walking up from a
//! boundary point to the innermost such element, so views that nest other
//! node containers must keep their own root outermost.

pub mod text;

use std::collections::HashMap;
use std::fmt;

use crate::error::SurfaceError;
use crate::model::{Annotation, ContentNode};
use crate::visual::{VisualId, VisualPoint, VisualTree};

pub use text::{TextStyle, TextView};

/// Class marking the root element of every node view
pub const CONTENT_NODE_CLASS: &str = "content-node";

/// Capability interface of a node view
pub trait NodeView {
    fn node_id(&self) -> &str;

    /// Root element, `None` before the first render and after dispose
    fn root(&self) -> Option<VisualId>;

    /// Build the view's subtree from its current state and return the root.
    /// Calling it again rebuilds the inside of the same root element.
    fn render(&mut self, tree: &mut VisualTree) -> VisualId;

    /// Free the view's subtree, detaching it from wherever it is placed
    fn dispose(&mut self, tree: &mut VisualTree);

    /// Character offset of a boundary point inside this view
    fn char_position(&self, tree: &VisualTree, point: VisualPoint) -> Result<usize, SurfaceError>;

    /// Boundary point for a character offset
    fn visual_position(&self, tree: &VisualTree, offset: usize) -> Result<VisualPoint, SurfaceError>;

    /// Length of the node's content in characters
    fn char_len(&self) -> usize;

    /// The content as currently shown in the visual tree
    fn text(&self, tree: &VisualTree) -> String;

    /// Swap in new content; takes effect on the next [`NodeView::render`]
    fn replace_content(&mut self, content: &str);

    fn insert(&mut self, tree: &mut VisualTree, pos: usize, text: &str) -> Result<(), SurfaceError>;

    fn delete(&mut self, tree: &mut VisualTree, pos: usize, len: usize) -> Result<(), SurfaceError>;

    /// Annotation rendering, for views that support it
    fn annotations(&mut self) -> Option<&mut dyn AnnotationRenderer> {
        None
    }
}

pub trait AnnotationRenderer {
    /// Re-render the view with exactly `annotations` applied
    fn render_annotations(
        &mut self,
        tree: &mut VisualTree,
        annotations: &[Annotation],
    ) -> Result<(), SurfaceError>;
}

/// Builds the view for a node of one type
pub type ViewFactory = Box<dyn Fn(&ContentNode) -> Result<Box<dyn NodeView>, SurfaceError>>;

/// Maps node types to view factories
///
/// A type can be absent (the surface ignores such nodes), declared without a
/// renderer (creating such a node is a configuration error), or registered.
#[derive(Default)]
pub struct NodeTypeRegistry {
    types: HashMap<String, Option<ViewFactory>>,
}

impl fmt::Debug for NodeTypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self
            .types
            .iter()
            .map(|(name, factory)| (name.as_str(), factory.is_some()))
            .collect();
        types.sort();
        f.debug_struct("NodeTypeRegistry").field("types", &types).finish()
    }
}

impl NodeTypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in text views: `paragraph`, `heading` and `code`
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for style in [TextStyle::Paragraph, TextStyle::Heading, TextStyle::Code] {
            registry.register(style.node_type(), move |node| {
                Ok(Box::new(TextView::new(node, style)) as Box<dyn NodeView>)
            });
        }
        registry
    }

    pub fn register<F>(&mut self, node_type: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&ContentNode) -> Result<Box<dyn NodeView>, SurfaceError> + 'static,
    {
        self.types.insert(node_type.into(), Some(Box::new(factory)));
        self
    }

    /// Declare a type the document knows about but that has no renderer
    pub fn declare(&mut self, node_type: impl Into<String>) -> &mut Self {
        self.types.insert(node_type.into(), None);
        self
    }

    pub fn is_supported(&self, node_type: &str) -> bool {
        self.types.contains_key(node_type)
    }

    /// Build the view for `node`
    ///
    /// `Ok(None)` means the type is not shown on surfaces at all.
    pub fn instantiate(&self, node: &ContentNode) -> Result<Option<Box<dyn NodeView>>, SurfaceError> {
        match self.types.get(&node.node_type) {
            None => Ok(None),
            Some(None) => Err(SurfaceError::MissingRenderer {
                node_type: node.node_type.clone(),
            }),
            Some(Some(factory)) => factory(node).map(Some),
        }
    }
}
