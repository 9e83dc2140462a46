use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::error::OpError;
use crate::ops::array::insert_or_append;
use crate::ops::text::splice_chars;
use crate::visual::VisualPoint;

/// Handle to a node of a [`VisualTree`]
///
/// Handles are never reused, so a handle to a freed node stays dead rather
/// than silently pointing at something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VisualId(usize);

#[derive(Debug, Clone, PartialEq)]
pub enum VisualKind {
    Element {
        tag: String,
        classes: Vec<String>,
        attributes: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct VisualNode {
    kind: VisualKind,
    parent: Option<VisualId>,
    children: Vec<VisualId>,
}

/// Arena holding the rendered tree: elements and text nodes
#[derive(Debug, Default)]
pub struct VisualTree {
    slots: Vec<Option<VisualNode>>,
}

impl VisualTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: VisualKind) -> VisualId {
        self.slots.push(Some(VisualNode {
            kind,
            parent: None,
            children: Vec::new(),
        }));
        VisualId(self.slots.len() - 1)
    }

    fn get(&self, id: VisualId) -> Option<&VisualNode> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: VisualId) -> Option<&mut VisualNode> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    pub fn create_element(&mut self, tag: &str, classes: &[&str]) -> VisualId {
        self.alloc(VisualKind::Element {
            tag: tag.to_string(),
            classes: classes.iter().map(|c| c.to_string()).collect(),
            attributes: BTreeMap::new(),
        })
    }

    pub fn create_text(&mut self, text: &str) -> VisualId {
        self.alloc(VisualKind::Text(text.to_string()))
    }

    pub fn contains(&self, id: VisualId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live nodes in the arena
    pub fn live_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn kind(&self, id: VisualId) -> Option<&VisualKind> {
        self.get(id).map(|node| &node.kind)
    }

    pub fn parent(&self, id: VisualId) -> Option<VisualId> {
        self.get(id).and_then(|node| node.parent)
    }

    pub fn children(&self, id: VisualId) -> &[VisualId] {
        self.get(id).map(|node| node.children.as_slice()).unwrap_or(&[])
    }

    pub fn index_in_parent(&self, id: VisualId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    /// `id` itself followed by each ancestor up to the root
    pub fn ancestors(&self, id: VisualId) -> impl Iterator<Item = VisualId> + '_ {
        std::iter::successors(self.contains(id).then_some(id), move |&current| {
            self.parent(current)
        })
    }

    pub fn is_inclusive_ancestor(&self, ancestor: VisualId, id: VisualId) -> bool {
        self.ancestors(id).any(|a| a == ancestor)
    }

    // ============ Elements ============

    pub fn tag(&self, id: VisualId) -> Option<&str> {
        match self.kind(id)? {
            VisualKind::Element { tag, .. } => Some(tag),
            VisualKind::Text(_) => None,
        }
    }

    pub fn has_class(&self, id: VisualId, class: &str) -> bool {
        matches!(self.kind(id), Some(VisualKind::Element { classes, .. }) if classes.iter().any(|c| c == class))
    }

    pub fn add_class(&mut self, id: VisualId, class: &str) {
        if let Some(VisualKind::Element { classes, .. }) = self.get_mut(id).map(|node| &mut node.kind) {
            if !classes.iter().any(|c| c == class) {
                classes.push(class.to_string());
            }
        }
    }

    pub fn attribute(&self, id: VisualId, name: &str) -> Option<&str> {
        match self.kind(id)? {
            VisualKind::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            VisualKind::Text(_) => None,
        }
    }

    pub fn set_attribute(&mut self, id: VisualId, name: &str, value: &str) {
        if let Some(VisualKind::Element { attributes, .. }) = self.get_mut(id).map(|node| &mut node.kind) {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    pub fn remove_attribute(&mut self, id: VisualId, name: &str) {
        if let Some(VisualKind::Element { attributes, .. }) = self.get_mut(id).map(|node| &mut node.kind) {
            attributes.remove(name);
        }
    }

    // ============ Structure ============

    /// Insert `child` under `parent` at `index`, appending when `index` is at
    /// or beyond the current child count. A child already attached elsewhere
    /// is moved.
    pub fn insert_child(&mut self, parent: VisualId, index: usize, child: VisualId) {
        if !self.contains(parent) || !self.contains(child) || self.is_inclusive_ancestor(child, parent) {
            log::warn!("Refusing to attach {child:?} under {parent:?}");
            return;
        }
        self.detach(child);
        if let Some(node) = self.get_mut(parent) {
            insert_or_append(&mut node.children, index, child);
        }
        if let Some(node) = self.get_mut(child) {
            node.parent = Some(parent);
        }
    }

    pub fn append_child(&mut self, parent: VisualId, child: VisualId) {
        self.insert_child(parent, usize::MAX, child);
    }

    /// Detach and return the child at `index`
    pub fn remove_child_at(&mut self, parent: VisualId, index: usize) -> Result<VisualId, OpError> {
        let len = self.children(parent).len();
        let child = *self
            .children(parent)
            .get(index)
            .ok_or(OpError::PositionOutOfRange { position: index, len })?;
        self.detach(child);
        Ok(child)
    }

    /// Unlink `id` from its parent, keeping its subtree alive
    pub fn detach(&mut self, id: VisualId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(node) = self.get_mut(parent) {
            node.children.retain(|&child| child != id);
        }
        if let Some(node) = self.get_mut(id) {
            node.parent = None;
        }
    }

    /// Detach every child of `parent` and return them in order
    pub fn detach_children(&mut self, parent: VisualId) -> Vec<VisualId> {
        let children = match self.get_mut(parent) {
            Some(node) => std::mem::take(&mut node.children),
            None => return Vec::new(),
        };
        for &child in &children {
            if let Some(node) = self.get_mut(child) {
                node.parent = None;
            }
        }
        children
    }

    /// Detach `id` and free it together with its whole subtree
    pub fn remove_subtree(&mut self, id: VisualId) {
        self.detach(id);
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.slots.get_mut(current.0).and_then(Option::take) {
                pending.extend(node.children);
            }
        }
    }

    // ============ Text ============

    pub fn text(&self, id: VisualId) -> Option<&str> {
        match self.kind(id)? {
            VisualKind::Text(text) => Some(text),
            VisualKind::Element { .. } => None,
        }
    }

    pub fn is_text(&self, id: VisualId) -> bool {
        self.text(id).is_some()
    }

    /// Replace `remove` characters at char `offset` of a text node with `insert`
    pub fn splice_text(
        &mut self,
        id: VisualId,
        offset: usize,
        remove: usize,
        insert: &str,
    ) -> Result<(), OpError> {
        match self.get_mut(id).map(|node| &mut node.kind) {
            Some(VisualKind::Text(text)) => splice_chars(text, offset, remove, insert),
            _ => Err(OpError::OffsetOutOfRange { offset, len: 0 }),
        }
    }

    /// Text nodes below `id` (inclusive) in document order
    pub fn text_nodes(&self, id: VisualId) -> Vec<VisualId> {
        let mut found = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if self.is_text(current) {
                found.push(current);
            }
            pending.extend(self.children(current).iter().rev());
        }
        found
    }

    /// Concatenated text below `id`
    pub fn text_content(&self, id: VisualId) -> String {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|t| self.text(t))
            .collect()
    }

    pub fn char_len(&self, id: VisualId) -> usize {
        self.text_nodes(id)
            .into_iter()
            .filter_map(|t| self.text(t))
            .map(|text| text.chars().count())
            .sum()
    }

    /// Number of characters that precede `point` inside `ancestor`
    ///
    /// A point on a text node counts its offset into that node; a point on an
    /// element sits before that element's `offset`-th child.
    pub fn char_offset_within(&self, ancestor: VisualId, point: VisualPoint) -> Option<usize> {
        if !self.is_inclusive_ancestor(ancestor, point.node) {
            return None;
        }

        let mut offset = match self.text(point.node) {
            Some(text) => point.offset.min(text.chars().count()),
            None => {
                let children = self.children(point.node);
                let end = point.offset.min(children.len());
                children[..end].iter().map(|&c| self.char_len(c)).sum()
            }
        };

        let mut current = point.node;
        while current != ancestor {
            let parent = self.parent(current)?;
            let index = self.index_in_parent(current)?;
            offset += self.children(parent)[..index]
                .iter()
                .map(|&c| self.char_len(c))
                .sum::<usize>();
            current = parent;
        }

        Some(offset)
    }

    /// Boundary point `offset` characters into `ancestor`
    ///
    /// Resolves to the earliest text node that can hold the offset, so an
    /// offset on the border of two text nodes lands at the end of the first.
    /// With no text below `ancestor`, offset 0 maps to `(ancestor, 0)`.
    pub fn point_at_char_offset(&self, ancestor: VisualId, offset: usize) -> Option<VisualPoint> {
        let mut remaining = offset;
        for node in self.text_nodes(ancestor) {
            let len = self.text(node).map_or(0, |t| t.chars().count());
            if remaining <= len {
                return Some(VisualPoint::new(node, remaining));
            }
            remaining -= len;
        }
        (remaining == 0 && self.contains(ancestor)).then(|| VisualPoint::new(ancestor, 0))
    }

    // ============ Ordering ============

    /// Child-index path from the root down to `id`
    fn path(&self, id: VisualId) -> Vec<usize> {
        let mut path: Vec<usize> = self
            .ancestors(id)
            .filter_map(|a| self.index_in_parent(a))
            .collect();
        path.reverse();
        path
    }

    /// Document order of two boundary points
    ///
    /// Follows DOM boundary-point rules: `(element, k)` sits before anything
    /// inside the element's `k`-th child and after anything inside child `k-1`.
    pub fn compare_points(&self, a: VisualPoint, b: VisualPoint) -> Ordering {
        let key = |point: VisualPoint| {
            let mut key = self.path(point.node);
            key.push(point.offset);
            key
        };
        key(a).cmp(&key(b))
    }

    // ============ Debugging ============

    /// Indented dump of the subtree at `id`, one node per line
    pub fn outline(&self, id: VisualId) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, id, 0);
        out
    }

    fn write_outline(&self, out: &mut String, id: VisualId, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.kind(id) {
            Some(VisualKind::Text(text)) => {
                let _ = writeln!(out, "{indent}{text:?}");
            }
            Some(VisualKind::Element {
                tag,
                classes,
                attributes,
            }) => {
                let _ = write!(out, "{indent}{tag}");
                for class in classes {
                    let _ = write!(out, ".{class}");
                }
                if let Some(element_id) = attributes.get("id") {
                    let _ = write!(out, "#{element_id}");
                }
                for (name, value) in attributes.iter().filter(|(name, _)| *name != "id") {
                    if value.is_empty() {
                        let _ = write!(out, "[{name}]");
                    } else {
                        let _ = write!(out, "[{name}={value}]");
                    }
                }
                out.push('\n');
                for &child in self.children(id) {
                    self.write_outline(out, child, depth + 1);
                }
            }
            None => {
                let _ = writeln!(out, "{indent}<freed {id:?}>");
            }
        }
    }
}
