//! Contracts of the document model the surface is kept in sync with.
//!
//! The model itself (node storage, ordering, annotations, selection) lives
//! outside the surface. [`DocumentModel`] lists the calls the surface makes
//! into it; [`memory::MemoryDocument`] is the in-process implementation used
//! by tests and the CLI.

pub mod events;
pub mod memory;

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use events::Subscription;

/// Property name holding a node's text content
pub const CONTENT_PROPERTY: &str = "content";
/// Property name holding a view's ordered node list
pub const NODES_PROPERTY: &str = "nodes";

/// An addressable unit of document content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub content: String,
}

impl ContentNode {
    /// Create a node with a freshly generated id
    pub fn new(node_type: impl Into<String>, content: impl Into<String>) -> Self {
        let node_type = node_type.into();
        let id = format!("{}_{}", node_type, uuid::Uuid::new_v4().simple());
        Self {
            id,
            node_type,
            content: content.into(),
        }
    }

    pub fn with_id(
        id: impl Into<String>,
        node_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            content: content.into(),
        }
    }

    /// Content length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Address of a model property, e.g. `[node_id, "content"]` or `["content", "nodes"]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyPath(pub Vec<String>);

impl PropertyPath {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// `[node_id, "content"]`
    pub fn node_content(node_id: impl Into<String>) -> Self {
        Self(vec![node_id.into(), CONTENT_PROPERTY.to_string()])
    }

    /// `[view, "nodes"]`
    pub fn view_nodes(view: impl Into<String>) -> Self {
        Self(vec![view.into(), NODES_PROPERTY.to_string()])
    }

    /// The node id if this path addresses a node's text content
    pub fn content_node_id(&self) -> Option<&str> {
        match self.0.as_slice() {
            [node_id, property] if property == CONTENT_PROPERTY => Some(node_id),
            _ => None,
        }
    }

    /// Whether this path addresses the ordered node list of `view`
    pub fn is_view_nodes(&self, view: &str) -> bool {
        matches!(self.0.as_slice(), [name, property] if name == view && property == NODES_PROPERTY)
    }
}

/// A text range attached to one node's content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: String,
    pub kind: String,
    pub path: PropertyPath,
    pub start: usize,
    pub end: usize,
}

impl Annotation {
    /// Create an annotation over `start..end` of `node_id`'s content with a generated id
    pub fn new(kind: impl Into<String>, node_id: impl Into<String>, start: usize, end: usize) -> Self {
        let kind = kind.into();
        let id = format!("{}_{}", kind, uuid::Uuid::new_v4().simple());
        Self {
            id,
            kind,
            path: PropertyPath::node_content(node_id),
            start,
            end,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// The annotated node, i.e. `path[0]`
    pub fn node_id(&self) -> Option<&str> {
        self.path.0.first().map(String::as_str)
    }
}

/// Which annotations to return from [`DocumentModel::annotations`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationFilter {
    All,
    Node(String),
}

impl AnnotationFilter {
    pub fn matches(&self, annotation: &Annotation) -> bool {
        match self {
            AnnotationFilter::All => true,
            AnnotationFilter::Node(node_id) => annotation.node_id() == Some(node_id.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Created,
    Updated,
    Deleted,
}

/// A `[node position, character offset]` pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "[usize; 2]", into = "[usize; 2]")]
pub struct Coordinate {
    pub position: usize,
    pub offset: usize,
}

impl Coordinate {
    pub fn new(position: usize, offset: usize) -> Self {
        Self { position, offset }
    }
}

impl From<[usize; 2]> for Coordinate {
    fn from([position, offset]: [usize; 2]) -> Self {
        Self { position, offset }
    }
}

impl From<Coordinate> for [usize; 2] {
    fn from(coordinate: Coordinate) -> Self {
        [coordinate.position, coordinate.offset]
    }
}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.position, self.offset).cmp(&(other.position, other.offset))
    }
}

/// A model-level selection
///
/// `start` never comes after `end`; `reverse` records that the selection was
/// authored from `end` back to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub start: Coordinate,
    pub end: Coordinate,
    #[serde(default)]
    pub reverse: bool,
}

impl Selection {
    /// Forward selection over `start..end` (swapped if given out of order)
    pub fn new(start: impl Into<Coordinate>, end: impl Into<Coordinate>) -> Self {
        let (start, end) = (start.into(), end.into());
        Self {
            start: start.min(end),
            end: start.max(end),
            reverse: false,
        }
    }

    pub fn collapsed(at: impl Into<Coordinate>) -> Self {
        let at = at.into();
        Self::new(at, at)
    }

    /// Selection authored from `anchor` to `head`, in either direction
    pub fn between(anchor: impl Into<Coordinate>, head: impl Into<Coordinate>) -> Self {
        let (anchor, head) = (anchor.into(), head.into());
        Self {
            reverse: head < anchor,
            ..Self::new(anchor, head)
        }
    }

    pub fn is_reverse(&self) -> bool {
        self.reverse
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> (Coordinate, Coordinate) {
        (self.start, self.end)
    }

    /// The authored end of the selection, where the caret sits
    pub fn head(&self) -> Coordinate {
        if self.reverse { self.start } else { self.end }
    }
}

/// Calls the surface makes into the document model
pub trait DocumentModel {
    /// Open a change-event subscription; dropping it unsubscribes
    fn subscribe(&self) -> Subscription;

    /// Nodes in view order
    fn nodes(&self) -> Vec<&ContentNode>;

    fn node(&self, node_id: &str) -> Option<&ContentNode>;

    /// Position of a node in view order
    fn position(&self, node_id: &str) -> Option<usize>;

    fn node_at(&self, position: usize) -> Option<&ContentNode>;

    fn annotations(&self, filter: &AnnotationFilter) -> Vec<Annotation>;

    /// Current selection, `None` when the selection is null
    fn selection(&self) -> Option<Selection>;

    /// Replace the selection wholesale
    fn set_selection(&mut self, selection: Selection);
}
