//! # docsurface engine
//!
//! Keeps a rendered block tree (one node view per content node inside a
//! `nodes` container, plus a caret overlay) in step with a document model.
//!
//! The model is external: it owns nodes, their ordering, annotations and the
//! selection, and reports every mutation as a [`model::events::ModelEvent`].
//! The [`Surface`] consumes those events and applies the matching minimal
//! change to its [`visual::VisualTree`] instead of re-rendering, and it
//! translates selections between visual boundary points and model
//! `[position, offset]` coordinates in both directions.
//!
//! ```rust
//! use docsurface_engine::{ContentNode, MemoryDocument, NodeTypeRegistry, Surface, SurfaceOptions};
//!
//! let mut doc = MemoryDocument::from_nodes(vec![
//!     ContentNode::with_id("p1", "paragraph", "abc"),
//!     ContentNode::with_id("p2", "paragraph", "def"),
//! ]);
//! let mut surface =
//!     Surface::new(&doc, NodeTypeRegistry::with_defaults(), SurfaceOptions::default()).unwrap();
//! surface.render(&doc).unwrap();
//!
//! doc.insert_node(ContentNode::with_id("p3", "paragraph", "xyz"), 1).unwrap();
//! surface.process_events(&doc).unwrap();
//!
//! assert_eq!(surface.container_order(), vec!["p1", "p3", "p2"]);
//! ```

pub mod error;
pub mod model;
pub mod ops;
pub mod surface;
pub mod views;
pub mod visual;

// Re-export key types for easier usage
pub use error::{ModelError, OpError, SurfaceError};
pub use model::events::{EventHub, ModelEvent, Subscription};
pub use model::memory::MemoryDocument;
pub use model::{
    Annotation, AnnotationFilter, ChangeType, ContentNode, Coordinate, DocumentModel,
    PropertyPath, Selection,
};
pub use ops::{ArrayAdapter, ArrayOperation, Diff, StringAdapter, TextOperation};
pub use surface::{CaretGeometry, CaretOverlay, Surface, SurfaceOptions};
pub use views::{AnnotationRenderer, NodeTypeRegistry, NodeView, TextStyle, TextView};
pub use visual::{
    BlockLayout, Layout, LayoutMetrics, NativeSelection, Rect, VisualId, VisualPoint,
    VisualRange, VisualTree,
};
