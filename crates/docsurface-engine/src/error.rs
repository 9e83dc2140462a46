use thiserror::Error;

use crate::visual::VisualId;

/// Failures while applying a diff operation to an adapter
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OpError {
    #[error("Position {position} is out of range for a list of length {len}")]
    PositionOutOfRange { position: usize, len: usize },

    #[error("Character offset {offset} is out of range for text of length {len}")]
    OffsetOutOfRange { offset: usize, len: usize },
}

/// Errors raised by the surface and its adapters
///
/// Only configuration and resolution failures end up here. Conditions the
/// surface can recover from (a missing view for an update, a view without
/// annotation support) are logged and skipped instead.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SurfaceError {
    #[error("Node type \"{node_type}\" not supported")]
    MissingRenderer { node_type: String },

    #[error("Failed to construct a view for node {node_id}: {reason}")]
    ViewConstruction { node_id: String, reason: String },

    #[error("No node view registered for node {node_id}")]
    MissingView { node_id: String },

    #[error("Model has no node {node_id}")]
    UnknownNode { node_id: String },

    #[error("Model has no node at position {position}")]
    NoNodeAtPosition { position: usize },

    #[error("Selection boundary is not inside a content node")]
    NoEnclosingNode,

    #[error("Content node element {element:?} carries no id")]
    MissingNodeId { element: VisualId },

    #[error("Visual point is not part of node {node_id}")]
    ForeignPoint { node_id: String },

    #[error("Node view for {node_id} has not been rendered")]
    ViewNotRendered { node_id: String },

    #[error("Surface has not been rendered")]
    NotRendered,

    #[error("No native selection to read")]
    NoNativeSelection,

    #[error("Layout has no geometry for {0:?}")]
    NoLayout(VisualId),

    #[error(transparent)]
    Op(#[from] OpError),
}

/// Errors raised by the in-memory reference model
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Node {node_id} already exists")]
    DuplicateNode { node_id: String },

    #[error("Unknown node {node_id}")]
    UnknownNode { node_id: String },

    #[error("Node {node_id} is already placed in the view")]
    AlreadyPlaced { node_id: String },

    #[error("Node {node_id} is not placed in the view")]
    NotPlaced { node_id: String },

    #[error("Unknown annotation {annotation_id}")]
    UnknownAnnotation { annotation_id: String },

    #[error(transparent)]
    Op(#[from] OpError),
}
