//! Translation between native selections over the visual tree and model
//! selections in `[position, offset]` coordinates.

use std::collections::HashMap;

use crate::error::SurfaceError;
use crate::model::{Coordinate, DocumentModel, Selection};
use crate::surface::caret::CaretGeometry;
use crate::views::{CONTENT_NODE_CLASS, NodeView};
use crate::visual::{Layout, NativeSelection, VisualId, VisualPoint, VisualRange, VisualTree};

/// Innermost node-container element at or above `node`
pub fn find_node_element(tree: &VisualTree, node: VisualId) -> Option<VisualId> {
    tree.ancestors(node)
        .find(|&id| tree.has_class(id, CONTENT_NODE_CLASS))
}

/// Id of the content node a boundary point lies in
pub fn enclosing_node_id(tree: &VisualTree, node: VisualId) -> Result<&str, SurfaceError> {
    let element = find_node_element(tree, node).ok_or(SurfaceError::NoEnclosingNode)?;
    tree.attribute(element, "id")
        .ok_or(SurfaceError::MissingNodeId { element })
}

fn model_coordinate<M: DocumentModel + ?Sized>(
    tree: &VisualTree,
    nodes: &HashMap<String, Box<dyn NodeView>>,
    model: &M,
    point: VisualPoint,
) -> Result<Coordinate, SurfaceError> {
    let node_id = enclosing_node_id(tree, point.node)?;
    let unknown = || SurfaceError::UnknownNode {
        node_id: node_id.to_string(),
    };

    let position = model.position(node_id).ok_or_else(unknown)?;
    let view = nodes.get(node_id).ok_or_else(|| SurfaceError::MissingView {
        node_id: node_id.to_string(),
    })?;
    let offset = view.char_position(tree, point)?;

    Ok(Coordinate::new(position, offset))
}

/// Read the native selection as a model selection
///
/// The result is always in document order. It is flagged reverse when the
/// user anchored the selection at the end of the range and dragged back
/// towards the start. An anchor on neither end (a word selected by
/// double-click) counts as forward.
pub fn visual_to_model<M: DocumentModel + ?Sized>(
    tree: &VisualTree,
    nodes: &HashMap<String, Box<dyn NodeView>>,
    model: &M,
    native: &NativeSelection,
) -> Result<Selection, SurfaceError> {
    let range = native.range().ok_or(SurfaceError::NoNativeSelection)?;
    let reverse = !range.is_collapsed() && native.anchor() == Some(range.end);

    let start = model_coordinate(tree, nodes, model, range.start)?;
    let end = model_coordinate(tree, nodes, model, range.end)?;

    Ok(Selection {
        start: start.min(end),
        end: start.max(end),
        reverse,
    })
}

fn visual_point<M: DocumentModel + ?Sized>(
    tree: &VisualTree,
    nodes: &HashMap<String, Box<dyn NodeView>>,
    model: &M,
    coordinate: Coordinate,
) -> Result<VisualPoint, SurfaceError> {
    let node = model
        .node_at(coordinate.position)
        .ok_or(SurfaceError::NoNodeAtPosition {
            position: coordinate.position,
        })?;
    let view = nodes.get(&node.id).ok_or_else(|| SurfaceError::MissingView {
        node_id: node.id.clone(),
    })?;
    view.visual_position(tree, coordinate.offset)
}

/// Visual range spanning a model selection, start to end in document order
pub fn model_to_visual<M: DocumentModel + ?Sized>(
    tree: &VisualTree,
    nodes: &HashMap<String, Box<dyn NodeView>>,
    model: &M,
    selection: &Selection,
) -> Result<VisualRange, SurfaceError> {
    let (start, end) = selection.range();
    Ok(VisualRange {
        start: visual_point(tree, nodes, model, start)?,
        end: visual_point(tree, nodes, model, end)?,
    })
}

/// Caret geometry for `point`, relative to the surface root element
pub fn caret_geometry(
    layout: &dyn Layout,
    tree: &VisualTree,
    surface_root: VisualId,
    point: VisualPoint,
) -> Result<CaretGeometry, SurfaceError> {
    let rect = layout
        .point_rect(tree, point)
        .ok_or(SurfaceError::NoLayout(point.node))?;
    let origin = layout
        .element_rect(tree, surface_root)
        .ok_or(SurfaceError::NoLayout(surface_root))?;

    Ok(CaretGeometry {
        top: rect.top - origin.top,
        left: rect.left - origin.left,
        height: rect.height,
    })
}
