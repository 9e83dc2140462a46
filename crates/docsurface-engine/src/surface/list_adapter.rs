use std::collections::HashMap;

use crate::error::{OpError, SurfaceError};
use crate::ops::ArrayAdapter;
use crate::ops::array::insert_or_append;
use crate::views::NodeView;
use crate::visual::{VisualId, VisualTree};

/// Applies ordered-list diffs to the children of the node container
///
/// Only placement changes here. Views are created and disposed by the
/// surface when the model reports node creation and deletion.
///
/// `order` mirrors the model's node list, including nodes the surface has no
/// view for. Those never reach the container, so a model position is turned
/// into a container index by counting the viewed nodes before it.
pub struct ListViewAdapter<'a> {
    tree: &'a mut VisualTree,
    container: VisualId,
    nodes: &'a mut HashMap<String, Box<dyn NodeView>>,
    order: &'a mut Vec<String>,
}

impl<'a> ListViewAdapter<'a> {
    pub fn new(
        tree: &'a mut VisualTree,
        container: VisualId,
        nodes: &'a mut HashMap<String, Box<dyn NodeView>>,
        order: &'a mut Vec<String>,
    ) -> Self {
        Self {
            tree,
            container,
            nodes,
            order,
        }
    }

    fn container_index(&self, pos: usize) -> usize {
        self.order
            .iter()
            .take(pos)
            .filter(|id| self.nodes.contains_key(id.as_str()))
            .count()
    }

    fn check_position(&self, pos: usize) -> Result<(), SurfaceError> {
        if pos >= self.order.len() {
            return Err(OpError::PositionOutOfRange {
                position: pos,
                len: self.order.len(),
            }
            .into());
        }
        Ok(())
    }
}

impl ArrayAdapter for ListViewAdapter<'_> {
    type Error = SurfaceError;

    fn insert(&mut self, pos: usize, node_id: &str) -> Result<(), SurfaceError> {
        let index = self.container_index(pos);
        insert_or_append(self.order, pos, node_id.to_string());

        let Some(view) = self.nodes.get_mut(node_id) else {
            log::warn!("No node view for {node_id}, not placing it on the surface");
            return Ok(());
        };
        let root = view.render(self.tree);
        self.tree.insert_child(self.container, index, root);
        Ok(())
    }

    fn delete(&mut self, pos: usize) -> Result<(), SurfaceError> {
        self.check_position(pos)?;
        if self.nodes.contains_key(&self.order[pos]) {
            let index = self.container_index(pos);
            self.tree.remove_child_at(self.container, index)?;
        }
        self.order.remove(pos);
        Ok(())
    }

    fn move_item(&mut self, _node_id: &str, from: usize, to: usize) -> Result<(), SurfaceError> {
        self.check_position(from)?;
        let element = if self.nodes.contains_key(&self.order[from]) {
            let index = self.container_index(from);
            Some(self.tree.remove_child_at(self.container, index)?)
        } else {
            None
        };
        let node_id = self.order.remove(from);

        let index = self.container_index(to);
        insert_or_append(self.order, to, node_id);
        if let Some(element) = element {
            self.tree.insert_child(self.container, index, element);
        }
        Ok(())
    }
}
