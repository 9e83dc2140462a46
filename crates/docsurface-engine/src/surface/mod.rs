//! The surface controller.
//!
//! A [`Surface`] owns the node-view registry and the visual tree, listens to
//! the model through a [`Subscription`], and routes every model event to the
//! matching minimal update:
//!
//! | event | handler |
//! |-------|---------|
//! | node created | [`Surface::on_create_node`] registers a view (no placement) |
//! | node deleted | [`Surface::on_delete_node`] disposes the view |
//! | property set | [`Surface::on_set_node_content`] re-renders one view |
//! | property updated | [`Surface::on_update_view`] (ordered list) and [`Surface::on_update_node_content`] (text) |
//! | graph reset | [`Surface::reset`] |
//! | selection changed | [`Surface::render_selection`] |
//! | annotation changed | [`Surface::update_annotation`] |
//!
//! Creating a node and placing it are reported by the model as separate
//! events; the surface keeps them separate too.

pub mod caret;
pub mod list_adapter;
pub mod selection;
pub mod text_adapter;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::SurfaceError;
use crate::model::events::{ModelEvent, Subscription};
use crate::model::{Annotation, AnnotationFilter, ChangeType, ContentNode, DocumentModel, PropertyPath};
use crate::ops::Diff;
use crate::views::{NodeTypeRegistry, NodeView};
use crate::visual::{BlockLayout, Layout, LayoutMetrics, NativeSelection, VisualId, VisualPoint, VisualTree};

pub use caret::{CaretGeometry, CaretOverlay};
pub use list_adapter::ListViewAdapter;
pub use text_adapter::TextNodeAdapter;

/// Class of the element holding the node views, in model order
pub const NODES_CLASS: &str = "nodes";
/// Class of the caret overlay element
pub const CURSOR_CLASS: &str = "cursor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceOptions {
    /// Whether pointer selections are written back to the model
    pub editable: bool,
    /// Name of the model view whose node list the surface shows
    pub view: String,
    pub layout: LayoutMetrics,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            editable: true,
            view: "content".to_string(),
            layout: LayoutMetrics::default(),
        }
    }
}

pub struct Surface {
    options: SurfaceOptions,
    types: NodeTypeRegistry,
    nodes: HashMap<String, Box<dyn NodeView>>,
    tree: VisualTree,
    el: VisualId,
    container: Option<VisualId>,
    /// Node ids of the shown view as last placed, with or without a view
    order: Vec<String>,
    caret: Option<CaretOverlay>,
    selection: NativeSelection,
    layout: Box<dyn Layout>,
    subscription: Subscription,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("options", &self.options)
            .field("nodes", &self.registered_ids())
            .field("el", &self.el)
            .field("container", &self.container)
            .field("caret", &self.caret)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Subscribe to `model` and build the view registry from its nodes
    ///
    /// Nothing is placed in the visual tree until [`Surface::render`].
    pub fn new<M: DocumentModel + ?Sized>(
        model: &M,
        types: NodeTypeRegistry,
        options: SurfaceOptions,
    ) -> Result<Self, SurfaceError> {
        let subscription = model.subscribe();
        let mut tree = VisualTree::new();
        let el = tree.create_element("div", &["surface", options.view.as_str()]);
        let layout = Box::new(BlockLayout::new(options.layout));

        let mut surface = Self {
            options,
            types,
            nodes: HashMap::new(),
            tree,
            el,
            container: None,
            order: Vec::new(),
            caret: None,
            selection: NativeSelection::default(),
            layout,
            subscription,
        };
        surface.build(model)?;
        Ok(surface)
    }

    /// Replace the layout used for caret geometry
    pub fn with_layout(mut self, layout: impl Layout + 'static) -> Self {
        self.layout = Box::new(layout);
        self
    }

    // ============ Setup ============

    /// Rebuild the registry from the model's current nodes, without rendering
    ///
    /// Expects the previous views to have been disposed already.
    pub fn build<M: DocumentModel + ?Sized>(&mut self, model: &M) -> Result<(), SurfaceError> {
        self.nodes.clear();
        for node in model.nodes() {
            match self.types.instantiate(node)? {
                Some(view) => {
                    self.nodes.insert(node.id.clone(), view);
                }
                None => log::debug!("Node type {} is not shown on surfaces, skipping {}", node.node_type, node.id),
            }
        }
        Ok(())
    }

    /// Replace the surface's content with the node views in model order
    ///
    /// Renders annotations and leaves the caret hidden.
    pub fn render<M: DocumentModel + ?Sized>(&mut self, model: &M) -> Result<(), SurfaceError> {
        // Keep view roots alive while the old template is freed
        if let Some(container) = self.container.take() {
            self.tree.detach_children(container);
        }
        for child in self.tree.detach_children(self.el) {
            self.tree.remove_subtree(child);
        }

        let container = self.tree.create_element("div", &[NODES_CLASS]);
        let cursor = self.tree.create_element("div", &[CURSOR_CLASS]);
        self.tree.append_child(self.el, container);
        self.tree.append_child(self.el, cursor);

        let nodes = model.nodes();
        log::debug!("Rendering surface with {} nodes", nodes.len());
        self.order = nodes.iter().map(|node| node.id.clone()).collect();
        for node in nodes {
            if let Some(view) = self.nodes.get_mut(&node.id) {
                let root = view.render(&mut self.tree);
                self.tree.append_child(container, root);
            }
        }
        self.container = Some(container);

        self.render_annotations(model)?;

        let mut caret = CaretOverlay::new(cursor);
        caret.hide(&mut self.tree);
        self.caret = Some(caret);
        Ok(())
    }

    /// Dispose every view, then build and render from scratch
    pub fn reset<M: DocumentModel + ?Sized>(&mut self, model: &M) -> Result<(), SurfaceError> {
        log::debug!("Resetting surface");
        self.dispose_views();
        self.selection.clear();
        self.build(model)?;
        self.render(model)
    }

    /// Dispose every view and unsubscribe from the model
    pub fn dispose(mut self) {
        self.dispose_views();
        log::debug!("Surface disposed");
    }

    fn dispose_views(&mut self) {
        for (_, mut view) in self.nodes.drain() {
            view.dispose(&mut self.tree);
        }
    }

    // ============ Model event handlers ============

    /// Register a view for a new node; placement follows as a separate list update
    pub fn on_create_node(&mut self, node: &ContentNode) -> Result<(), SurfaceError> {
        let Some(view) = self.types.instantiate(node)? else {
            log::debug!("Node type {} is not shown on surfaces, ignoring {}", node.node_type, node.id);
            return Ok(());
        };
        if let Some(mut previous) = self.nodes.insert(node.id.clone(), view) {
            previous.dispose(&mut self.tree);
        }
        Ok(())
    }

    pub fn on_delete_node(&mut self, node_id: &str) {
        if let Some(mut view) = self.nodes.remove(node_id) {
            view.dispose(&mut self.tree);
        }
    }

    /// Content replaced wholesale: re-render that one view
    pub fn on_set_node_content(&mut self, path: &PropertyPath, value: &str) {
        let Some(node_id) = path.content_node_id() else {
            return;
        };
        let Some(view) = self.nodes.get_mut(node_id) else {
            log::warn!("No node view for {node_id}, content not re-rendered");
            return;
        };
        view.replace_content(value);
        view.render(&mut self.tree);
    }

    /// Apply a text diff on a node's content to its view
    pub fn on_update_node_content(&mut self, path: &PropertyPath, diff: &Diff) -> Result<(), SurfaceError> {
        let Some(node_id) = path.content_node_id() else {
            return Ok(());
        };
        let Diff::Text(op) = diff else {
            return Ok(());
        };
        let Some(view) = self.nodes.get_mut(node_id) else {
            log::warn!("No node view for {node_id}, text update skipped");
            return Ok(());
        };
        let mut adapter = TextNodeAdapter::new(view.as_mut(), &mut self.tree);
        op.apply(&mut adapter)
    }

    /// Apply an ordered-list diff on the surface's view to the node container
    pub fn on_update_view(&mut self, path: &PropertyPath, diff: &Diff) -> Result<(), SurfaceError> {
        if !path.is_view_nodes(&self.options.view) {
            return Ok(());
        }
        let Diff::Array(op) = diff else {
            return Ok(());
        };
        let Some(container) = self.container else {
            log::debug!("Surface not rendered yet, placement left to the first render");
            return Ok(());
        };
        let mut adapter =
            ListViewAdapter::new(&mut self.tree, container, &mut self.nodes, &mut self.order);
        op.apply(&mut adapter)
    }

    /// Re-render every annotation of the annotated node
    ///
    /// Always the whole node, never just the changed annotation.
    pub fn update_annotation<M: DocumentModel + ?Sized>(
        &mut self,
        change: ChangeType,
        annotation: &Annotation,
        model: &M,
    ) -> Result<(), SurfaceError> {
        log::debug!("Updating annotation {} ({change:?})", annotation.id);
        let Some(node_id) = annotation.node_id() else {
            log::warn!("Annotation {} has an empty path", annotation.id);
            return Ok(());
        };
        let annotations = model.annotations(&AnnotationFilter::Node(node_id.to_string()));
        self.render_node_annotations(node_id, &annotations)
    }

    /// Render every annotation in the model, grouped by node
    pub fn render_annotations<M: DocumentModel + ?Sized>(&mut self, model: &M) -> Result<(), SurfaceError> {
        let mut groups: BTreeMap<String, Vec<Annotation>> = BTreeMap::new();
        for annotation in model.annotations(&AnnotationFilter::All) {
            if let Some(node_id) = annotation.node_id() {
                groups.entry(node_id.to_string()).or_default().push(annotation);
            }
        }
        for (node_id, group) in groups {
            self.render_node_annotations(&node_id, &group)?;
        }
        Ok(())
    }

    fn render_node_annotations(&mut self, node_id: &str, annotations: &[Annotation]) -> Result<(), SurfaceError> {
        let Some(view) = self.nodes.get_mut(node_id) else {
            log::warn!("There are annotations for node {node_id} but no node view");
            return Ok(());
        };
        let Some(renderer) = view.annotations() else {
            log::warn!("Node view for {node_id} does not support annotations");
            return Ok(());
        };
        renderer.render_annotations(&mut self.tree, annotations)
    }

    /// Route one model event to its handler
    pub fn handle_event<M: DocumentModel + ?Sized>(&mut self, event: ModelEvent, model: &M) -> Result<(), SurfaceError> {
        match event {
            ModelEvent::NodeCreated(node) => self.on_create_node(&node),
            ModelEvent::NodeDeleted(node_id) => {
                self.on_delete_node(&node_id);
                Ok(())
            }
            ModelEvent::PropertySet { path, value } => {
                self.on_set_node_content(&path, &value);
                Ok(())
            }
            ModelEvent::PropertyUpdated { path, diff } => {
                self.on_update_view(&path, &diff)?;
                self.on_update_node_content(&path, &diff)
            }
            ModelEvent::GraphReset => self.reset(model),
            ModelEvent::SelectionChanged => self.render_selection(model),
            ModelEvent::AnnotationChanged { change, annotation } => {
                self.update_annotation(change, &annotation, model)
            }
        }
    }

    /// Handle every pending model event in emission order
    ///
    /// Returns the number of events handled. Stops at the first fatal error;
    /// later events stay queued.
    pub fn process_events<M: DocumentModel + ?Sized>(&mut self, model: &M) -> Result<usize, SurfaceError> {
        let mut handled = 0;
        while let Some(event) = self.subscription.next_event() {
            log::debug!("Surface event: {event:?}");
            self.handle_event(event, model)?;
            handled += 1;
        }
        Ok(handled)
    }

    // ============ Selection ============

    /// Set the native selection as a pointer drag from `anchor` to `focus` would
    pub fn select_visual(&mut self, anchor: VisualPoint, focus: VisualPoint) {
        self.selection.select(&self.tree, anchor, focus);
    }

    /// Pointer released over the surface; writes the selection back when editable
    pub fn pointer_up<M: DocumentModel + ?Sized>(&mut self, model: &mut M) -> Result<(), SurfaceError> {
        if !self.options.editable {
            return Ok(());
        }
        self.update_selection(model)
    }

    /// Read the native selection and replace the model selection with it
    pub fn update_selection<M: DocumentModel + ?Sized>(&mut self, model: &mut M) -> Result<(), SurfaceError> {
        let selection = selection::visual_to_model(&self.tree, &self.nodes, &*model, &self.selection)?;
        log::debug!("Selection from surface: {selection:?}");
        model.set_selection(selection);
        Ok(())
    }

    /// Mirror the model selection as the native selection and place the caret
    pub fn render_selection<M: DocumentModel + ?Sized>(&mut self, model: &M) -> Result<(), SurfaceError> {
        let Some(mut caret) = self.caret.take() else {
            log::debug!("Surface not rendered yet, selection not shown");
            return Ok(());
        };
        let result = self.show_selection(model, &mut caret);
        self.caret = Some(caret);
        result
    }

    fn show_selection<M: DocumentModel + ?Sized>(&mut self, model: &M, caret: &mut CaretOverlay) -> Result<(), SurfaceError> {
        let Some(model_selection) = model.selection() else {
            caret.hide(&mut self.tree);
            return Ok(());
        };

        let range = selection::model_to_visual(&self.tree, &self.nodes, model, &model_selection)?;
        self.selection.set_range(range);

        let head = if model_selection.is_reverse() {
            range.start
        } else {
            range.end
        };
        self.position_cursor(caret, head)
    }

    fn position_cursor(&mut self, caret: &mut CaretOverlay, point: VisualPoint) -> Result<(), SurfaceError> {
        let geometry = selection::caret_geometry(self.layout.as_ref(), &self.tree, self.el, point)?;
        caret.show(&mut self.tree, geometry);
        Ok(())
    }

    // ============ Accessors ============

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    pub fn tree(&self) -> &VisualTree {
        &self.tree
    }

    /// The surface root element
    pub fn root(&self) -> VisualId {
        self.el
    }

    /// The node container, once rendered
    pub fn container(&self) -> Option<VisualId> {
        self.container
    }

    pub fn caret(&self) -> Option<&CaretOverlay> {
        self.caret.as_ref()
    }

    pub fn native_selection(&self) -> &NativeSelection {
        &self.selection
    }

    pub fn node_view(&self, node_id: &str) -> Option<&dyn NodeView> {
        self.nodes.get(node_id).map(|view| view.as_ref())
    }

    /// Ids with a registered view, sorted
    pub fn registered_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Node ids of the container's children, in visual order
    pub fn container_order(&self) -> Vec<String> {
        let Some(container) = self.container else {
            return Vec::new();
        };
        self.tree
            .children(container)
            .iter()
            .filter_map(|&child| self.tree.attribute(child, "id"))
            .map(str::to_string)
            .collect()
    }

    pub fn outline(&self) -> String {
        self.tree.outline(self.el)
    }
}
