//! In-process document model.
//!
//! Stores nodes, the ordered node list of one view, annotations and the
//! selection, and reports every mutation through an [`EventHub`] in the
//! order a surface needs to see them: a node is created before it is placed,
//! and removed from the list before it is deleted.

use std::collections::HashMap;

use crate::error::ModelError;
use crate::model::events::{EventHub, ModelEvent, Subscription};
use crate::model::{
    Annotation, AnnotationFilter, ChangeType, ContentNode, DocumentModel, PropertyPath, Selection,
};
use crate::ops::{ArrayOperation, TextOperation};

#[derive(Debug)]
pub struct MemoryDocument {
    hub: EventHub,
    view: String,
    nodes: HashMap<String, ContentNode>,
    order: Vec<String>,
    annotations: Vec<Annotation>,
    selection: Option<Selection>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self {
            hub: EventHub::new(),
            view: "content".to_string(),
            nodes: HashMap::new(),
            order: Vec::new(),
            annotations: Vec::new(),
            selection: None,
        }
    }
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// A document whose view shows `nodes` in the given order; emits nothing
    pub fn from_nodes(nodes: Vec<ContentNode>) -> Self {
        let mut doc = Self::new();
        doc.load(nodes);
        doc
    }

    /// Name the view whose node list this document maintains
    pub fn with_view(mut self, view: impl Into<String>) -> Self {
        self.view = view.into();
        self
    }

    pub fn view(&self) -> &str {
        &self.view
    }

    /// Ids of the placed nodes, in order
    pub fn order(&self) -> &[String] {
        &self.order
    }

    /// Number of live subscriptions to this document's events
    pub fn subscriber_count(&self) -> usize {
        self.hub.subscriber_count()
    }

    pub fn content(&self, node_id: &str) -> Option<&str> {
        self.nodes.get(node_id).map(|node| node.content.as_str())
    }

    fn load(&mut self, nodes: Vec<ContentNode>) {
        self.order = nodes.iter().map(|node| node.id.clone()).collect();
        self.nodes = nodes.into_iter().map(|node| (node.id.clone(), node)).collect();
    }

    fn node_mut(&mut self, node_id: &str) -> Result<&mut ContentNode, ModelError> {
        self.nodes.get_mut(node_id).ok_or_else(|| ModelError::UnknownNode {
            node_id: node_id.to_string(),
        })
    }

    fn placed_position(&self, node_id: &str) -> Result<usize, ModelError> {
        if !self.nodes.contains_key(node_id) {
            return Err(ModelError::UnknownNode {
                node_id: node_id.to_string(),
            });
        }
        self.position(node_id).ok_or_else(|| ModelError::NotPlaced {
            node_id: node_id.to_string(),
        })
    }

    fn apply_to_order(&mut self, op: ArrayOperation) -> Result<(), ModelError> {
        op.apply(&mut self.order)?;
        self.hub.emit(ModelEvent::PropertyUpdated {
            path: PropertyPath::view_nodes(self.view.clone()),
            diff: op.into(),
        });
        Ok(())
    }

    fn apply_to_content(&mut self, node_id: &str, op: TextOperation) -> Result<(), ModelError> {
        let node = self.node_mut(node_id)?;
        // Apply to a copy so a failing compound leaves the content untouched
        let mut content = node.content.clone();
        op.apply(&mut content)?;
        node.content = content;

        self.hub.emit(ModelEvent::PropertyUpdated {
            path: PropertyPath::node_content(node_id),
            diff: op.into(),
        });
        Ok(())
    }

    // ============ Structure ============

    /// Add a node to the document without placing it in the view
    pub fn create_node(&mut self, node: ContentNode) -> Result<(), ModelError> {
        if self.nodes.contains_key(&node.id) {
            return Err(ModelError::DuplicateNode { node_id: node.id });
        }
        self.nodes.insert(node.id.clone(), node.clone());
        self.hub.emit(ModelEvent::NodeCreated(node));
        Ok(())
    }

    /// Place an existing node at `pos`, appending when `pos` is past the end
    pub fn show_node(&mut self, node_id: &str, pos: usize) -> Result<(), ModelError> {
        if !self.nodes.contains_key(node_id) {
            return Err(ModelError::UnknownNode {
                node_id: node_id.to_string(),
            });
        }
        if self.position(node_id).is_some() {
            return Err(ModelError::AlreadyPlaced {
                node_id: node_id.to_string(),
            });
        }
        self.apply_to_order(ArrayOperation::insert(pos, node_id))
    }

    /// Create `node` and place it at `pos`
    pub fn insert_node(&mut self, node: ContentNode, pos: usize) -> Result<(), ModelError> {
        let node_id = node.id.clone();
        self.create_node(node)?;
        self.show_node(&node_id, pos)
    }

    /// Remove a node from the view, keeping it in the document
    pub fn hide_node(&mut self, node_id: &str) -> Result<(), ModelError> {
        let pos = self.placed_position(node_id)?;
        self.apply_to_order(ArrayOperation::delete(pos))
    }

    /// Hide the node if placed, drop its annotations, then delete it
    pub fn delete_node(&mut self, node_id: &str) -> Result<(), ModelError> {
        if !self.nodes.contains_key(node_id) {
            return Err(ModelError::UnknownNode {
                node_id: node_id.to_string(),
            });
        }
        if self.position(node_id).is_some() {
            self.hide_node(node_id)?;
        }

        let (dropped, kept): (Vec<Annotation>, Vec<Annotation>) = std::mem::take(&mut self.annotations)
            .into_iter()
            .partition(|annotation| annotation.node_id() == Some(node_id));
        self.annotations = kept;
        for annotation in dropped {
            self.hub.emit(ModelEvent::AnnotationChanged {
                change: ChangeType::Deleted,
                annotation,
            });
        }

        self.nodes.remove(node_id);
        self.hub.emit(ModelEvent::NodeDeleted(node_id.to_string()));
        Ok(())
    }

    /// Move a placed node to `to`, counted after its removal
    pub fn move_node(&mut self, node_id: &str, to: usize) -> Result<(), ModelError> {
        let from = self.placed_position(node_id)?;
        self.apply_to_order(ArrayOperation::move_item(node_id, from, to))
    }

    // ============ Content ============

    pub fn insert_text(&mut self, node_id: &str, pos: usize, text: &str) -> Result<(), ModelError> {
        self.apply_to_content(node_id, TextOperation::insert(pos, text))
    }

    pub fn delete_text(&mut self, node_id: &str, pos: usize, len: usize) -> Result<(), ModelError> {
        self.apply_to_content(node_id, TextOperation::delete(pos, len))
    }

    /// Apply an arbitrary text operation to a node's content
    pub fn update_text(&mut self, node_id: &str, op: TextOperation) -> Result<(), ModelError> {
        self.apply_to_content(node_id, op)
    }

    /// Replace a node's content wholesale
    pub fn set_content(&mut self, node_id: &str, content: &str) -> Result<(), ModelError> {
        self.node_mut(node_id)?.content = content.to_string();
        self.hub.emit(ModelEvent::PropertySet {
            path: PropertyPath::node_content(node_id),
            value: content.to_string(),
        });
        Ok(())
    }

    // ============ Annotations ============

    pub fn add_annotation(&mut self, annotation: Annotation) -> Result<(), ModelError> {
        let node_id = annotation.node_id().unwrap_or_default();
        if !self.nodes.contains_key(node_id) {
            return Err(ModelError::UnknownNode {
                node_id: node_id.to_string(),
            });
        }
        self.annotations.push(annotation.clone());
        self.hub.emit(ModelEvent::AnnotationChanged {
            change: ChangeType::Created,
            annotation,
        });
        Ok(())
    }

    /// Change the range of an annotation
    pub fn update_annotation(&mut self, annotation_id: &str, start: usize, end: usize) -> Result<(), ModelError> {
        let annotation = self
            .annotations
            .iter_mut()
            .find(|annotation| annotation.id == annotation_id)
            .ok_or_else(|| ModelError::UnknownAnnotation {
                annotation_id: annotation_id.to_string(),
            })?;
        annotation.start = start;
        annotation.end = end;

        let annotation = annotation.clone();
        self.hub.emit(ModelEvent::AnnotationChanged {
            change: ChangeType::Updated,
            annotation,
        });
        Ok(())
    }

    pub fn remove_annotation(&mut self, annotation_id: &str) -> Result<(), ModelError> {
        let index = self
            .annotations
            .iter()
            .position(|annotation| annotation.id == annotation_id)
            .ok_or_else(|| ModelError::UnknownAnnotation {
                annotation_id: annotation_id.to_string(),
            })?;
        let annotation = self.annotations.remove(index);
        self.hub.emit(ModelEvent::AnnotationChanged {
            change: ChangeType::Deleted,
            annotation,
        });
        Ok(())
    }

    // ============ Bulk ============

    /// Replace the whole graph: new nodes, no annotations, no selection
    pub fn replace_all(&mut self, nodes: Vec<ContentNode>) {
        self.load(nodes);
        self.annotations.clear();
        self.selection = None;
        self.hub.emit(ModelEvent::GraphReset);
    }

    // ============ Selection ============

    pub fn select(&mut self, selection: Selection) {
        self.set_selection(selection);
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
        self.hub.emit(ModelEvent::SelectionChanged);
    }
}

impl DocumentModel for MemoryDocument {
    fn subscribe(&self) -> Subscription {
        self.hub.subscribe()
    }

    fn nodes(&self) -> Vec<&ContentNode> {
        self.order.iter().filter_map(|id| self.nodes.get(id)).collect()
    }

    fn node(&self, node_id: &str) -> Option<&ContentNode> {
        self.nodes.get(node_id)
    }

    fn position(&self, node_id: &str) -> Option<usize> {
        self.order.iter().position(|id| id == node_id)
    }

    fn node_at(&self, position: usize) -> Option<&ContentNode> {
        self.order.get(position).and_then(|id| self.nodes.get(id))
    }

    fn annotations(&self, filter: &AnnotationFilter) -> Vec<Annotation> {
        self.annotations
            .iter()
            .filter(|annotation| filter.matches(annotation))
            .cloned()
            .collect()
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }

    fn set_selection(&mut self, selection: Selection) {
        self.selection = Some(selection);
        self.hub.emit(ModelEvent::SelectionChanged);
    }
}
