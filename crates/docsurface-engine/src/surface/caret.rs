use crate::visual::{VisualId, VisualTree};

/// Caret position relative to the surface root, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaretGeometry {
    pub top: f32,
    pub left: f32,
    pub height: f32,
}

impl CaretGeometry {
    fn to_style(self) -> String {
        format!("top:{}px;left:{}px;height:{}px", self.top, self.left, self.height)
    }
}

/// Handle to the `div.cursor` element drawn over the authored end of the selection
#[derive(Debug, Clone, PartialEq)]
pub struct CaretOverlay {
    element: VisualId,
    geometry: Option<CaretGeometry>,
}

impl CaretOverlay {
    pub fn new(element: VisualId) -> Self {
        Self {
            element,
            geometry: None,
        }
    }

    pub fn element(&self) -> VisualId {
        self.element
    }

    /// Where the caret is drawn, `None` while hidden
    pub fn geometry(&self) -> Option<CaretGeometry> {
        self.geometry
    }

    pub fn is_visible(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn show(&mut self, tree: &mut VisualTree, geometry: CaretGeometry) {
        tree.set_attribute(self.element, "style", &geometry.to_style());
        tree.remove_attribute(self.element, "hidden");
        self.geometry = Some(geometry);
    }

    pub fn hide(&mut self, tree: &mut VisualTree) {
        tree.set_attribute(self.element, "hidden", "");
        self.geometry = None;
    }
}
