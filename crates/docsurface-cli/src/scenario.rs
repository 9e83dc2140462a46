//! Scenario files: an initial document plus a list of edits, replayed through
//! a surface one step at a time.

use anyhow::{Context, Result, anyhow};
use docsurface_engine::{
    Annotation, ContentNode, Coordinate, DocumentModel, MemoryDocument, NodeTypeRegistry,
    Selection, Surface, SurfaceOptions, VisualPoint,
};
use serde::Deserialize;
use std::fmt::Write as _;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Scenario {
    /// Nodes present before the first step
    #[serde(default)]
    pub nodes: Vec<ContentNode>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    InsertNode {
        node: ContentNode,
        pos: usize,
    },
    DeleteNode {
        id: String,
    },
    MoveNode {
        id: String,
        to: usize,
    },
    InsertText {
        id: String,
        pos: usize,
        text: String,
    },
    DeleteText {
        id: String,
        pos: usize,
        len: usize,
    },
    SetContent {
        id: String,
        content: String,
    },
    Annotate {
        #[serde(default)]
        id: Option<String>,
        kind: String,
        node: String,
        start: usize,
        end: usize,
    },
    RemoveAnnotation {
        id: String,
    },
    /// Set the model selection directly
    Select {
        start: Coordinate,
        end: Coordinate,
        #[serde(default)]
        reverse: bool,
    },
    ClearSelection,
    /// Drag a native selection from `anchor` to `focus` and release the pointer
    SelectVisual {
        anchor: Coordinate,
        focus: Coordinate,
    },
    /// Replace the whole document
    Reset {
        #[serde(default)]
        nodes: Vec<ContentNode>,
    },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::InsertNode { .. } => "insert_node",
            Step::DeleteNode { .. } => "delete_node",
            Step::MoveNode { .. } => "move_node",
            Step::InsertText { .. } => "insert_text",
            Step::DeleteText { .. } => "delete_text",
            Step::SetContent { .. } => "set_content",
            Step::Annotate { .. } => "annotate",
            Step::RemoveAnnotation { .. } => "remove_annotation",
            Step::Select { .. } => "select",
            Step::ClearSelection => "clear_selection",
            Step::SelectVisual { .. } => "select_visual",
            Step::Reset { .. } => "reset",
        }
    }
}

impl Scenario {
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse scenario {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// A document and the surface mounted on it
pub struct Runner {
    doc: MemoryDocument,
    surface: Surface,
}

impl Runner {
    pub fn new(nodes: Vec<ContentNode>, options: SurfaceOptions) -> Result<Self> {
        let doc = MemoryDocument::from_nodes(nodes);
        let mut surface = Surface::new(&doc, NodeTypeRegistry::with_defaults(), options)?;
        surface.render(&doc)?;
        Ok(Self { doc, surface })
    }

    pub fn document(&self) -> &MemoryDocument {
        &self.doc
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Apply one step to the document and let the surface catch up
    pub fn apply(&mut self, step: &Step) -> Result<()> {
        let doc = &mut self.doc;
        match step {
            Step::InsertNode { node, pos } => doc.insert_node(node.clone(), *pos)?,
            Step::DeleteNode { id } => doc.delete_node(id)?,
            Step::MoveNode { id, to } => doc.move_node(id, *to)?,
            Step::InsertText { id, pos, text } => doc.insert_text(id, *pos, text)?,
            Step::DeleteText { id, pos, len } => doc.delete_text(id, *pos, *len)?,
            Step::SetContent { id, content } => doc.set_content(id, content)?,
            Step::Annotate {
                id,
                kind,
                node,
                start,
                end,
            } => {
                let annotation = Annotation::new(kind.as_str(), node.as_str(), *start, *end);
                let annotation = match id {
                    Some(id) => annotation.with_id(id.as_str()),
                    None => annotation,
                };
                doc.add_annotation(annotation)?;
            }
            Step::RemoveAnnotation { id } => doc.remove_annotation(id)?,
            Step::Select {
                start,
                end,
                reverse,
            } => {
                let selection = if *reverse {
                    Selection::between(*end, *start)
                } else {
                    Selection::new(*start, *end)
                };
                doc.select(selection);
            }
            Step::ClearSelection => doc.clear_selection(),
            Step::SelectVisual { anchor, focus } => {
                let anchor = self.visual_point(*anchor)?;
                let focus = self.visual_point(*focus)?;
                self.surface.select_visual(anchor, focus);
                self.surface.pointer_up(&mut self.doc)?;
            }
            Step::Reset { nodes } => doc.replace_all(nodes.clone()),
        }

        let handled = self.surface.process_events(&self.doc)?;
        log::debug!("{} handled {handled} events", step.name());
        Ok(())
    }

    fn visual_point(&self, coordinate: Coordinate) -> Result<VisualPoint> {
        let node = self
            .doc
            .node_at(coordinate.position)
            .ok_or_else(|| anyhow!("No node at position {}", coordinate.position))?;
        let view = self
            .surface
            .node_view(&node.id)
            .ok_or_else(|| anyhow!("Node {} is not shown on the surface", node.id))?;
        Ok(view.visual_position(self.surface.tree(), coordinate.offset)?)
    }

    /// Outline of the surface followed by the caret and model selection
    pub fn snapshot(&self) -> String {
        let mut out = self.surface.outline();
        let caret = self.surface.caret().and_then(|caret| caret.geometry());
        match caret {
            Some(caret) => {
                let _ = writeln!(
                    out,
                    "caret: top={} left={} height={}",
                    caret.top, caret.left, caret.height
                );
            }
            None => out.push_str("caret: hidden\n"),
        }
        match self.doc.selection() {
            Some(selection) => {
                let _ = writeln!(
                    out,
                    "selection: [{}, {}] -> [{}, {}]{}",
                    selection.start.position,
                    selection.start.offset,
                    selection.end.position,
                    selection.end.offset,
                    if selection.is_reverse() { " (reverse)" } else { "" }
                );
            }
            None => out.push_str("selection: none\n"),
        }
        out
    }
}

/// Replay `scenario`, writing a snapshot after the initial render and after every step
pub fn run(scenario: &Scenario, options: SurfaceOptions, out: &mut impl std::io::Write) -> Result<()> {
    let mut runner = Runner::new(scenario.nodes.clone(), options)?;
    writeln!(out, "== initial ==")?;
    write!(out, "{}", runner.snapshot())?;

    for (index, step) in scenario.steps.iter().enumerate() {
        runner
            .apply(step)
            .with_context(|| format!("Step {} ({}) failed", index + 1, step.name()))?;
        writeln!(out, "== step {}: {} ==", index + 1, step.name())?;
        write!(out, "{}", runner.snapshot())?;
    }

    log::info!(
        "Finished with {} nodes and {} views",
        runner.document().order().len(),
        runner.surface().registered_ids().len()
    );
    runner.surface.dispose();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn runner(nodes: &[(&str, &str)]) -> Runner {
        let nodes = nodes
            .iter()
            .map(|(id, content)| ContentNode::with_id(*id, "paragraph", *content))
            .collect();
        Runner::new(nodes, SurfaceOptions::default()).unwrap()
    }

    #[test]
    fn test_parse_every_step_kind() {
        let scenario = Scenario::parse(
            r#"
nodes = [{ id = "p1", type = "paragraph", content = "abc" }]

[[steps]]
op = "insert_node"
pos = 1
node = { id = "p2", type = "heading", content = "Title" }

[[steps]]
op = "delete_node"
id = "p2"

[[steps]]
op = "move_node"
id = "p1"
to = 0

[[steps]]
op = "insert_text"
id = "p1"
pos = 1
text = "Q"

[[steps]]
op = "delete_text"
id = "p1"
pos = 0
len = 1

[[steps]]
op = "set_content"
id = "p1"
content = "new"

[[steps]]
op = "annotate"
kind = "strong"
node = "p1"
start = 0
end = 2

[[steps]]
op = "remove_annotation"
id = "a1"

[[steps]]
op = "select"
start = [0, 1]
end = [0, 2]
reverse = true

[[steps]]
op = "clear_selection"

[[steps]]
op = "select_visual"
anchor = [0, 2]
focus = [0, 0]

[[steps]]
op = "reset"
nodes = []
"#,
        )
        .unwrap();

        let names: Vec<&str> = scenario.steps.iter().map(Step::name).collect();
        assert_eq!(
            names,
            vec![
                "insert_node",
                "delete_node",
                "move_node",
                "insert_text",
                "delete_text",
                "set_content",
                "annotate",
                "remove_annotation",
                "select",
                "clear_selection",
                "select_visual",
                "reset",
            ]
        );
        assert_eq!(scenario.nodes, vec![ContentNode::with_id("p1", "paragraph", "abc")]);
        assert_eq!(
            scenario.steps[8],
            Step::Select {
                start: Coordinate::new(0, 1),
                end: Coordinate::new(0, 2),
                reverse: true,
            }
        );
    }

    #[test]
    fn test_unknown_op_is_rejected() {
        let err = Scenario::parse("[[steps]]\nop = \"explode\"\n").unwrap_err();
        assert!(err.to_string().contains("explode"));
    }

    #[test]
    fn test_select_visual_writes_reverse_selection() {
        let mut runner = runner(&[("p1", "hello world"), ("p2", "second")]);

        runner
            .apply(&Step::SelectVisual {
                anchor: Coordinate::new(1, 3),
                focus: Coordinate::new(0, 4),
            })
            .unwrap();

        let selection = runner.document().selection().unwrap();
        assert!(selection.is_reverse());
        assert_eq!(selection.range(), (Coordinate::new(0, 4), Coordinate::new(1, 3)));
        assert!(runner.snapshot().ends_with("caret: top=0 left=32 height=20\nselection: [0, 4] -> [1, 3] (reverse)\n"));
    }

    #[test]
    fn test_select_visual_outside_document_fails() {
        let mut runner = runner(&[("p1", "abc")]);
        let err = runner
            .apply(&Step::SelectVisual {
                anchor: Coordinate::new(3, 0),
                focus: Coordinate::new(0, 0),
            })
            .unwrap_err();
        assert!(err.to_string().contains("No node at position 3"));
    }

    #[test]
    fn test_run_writes_a_transcript() {
        let scenario = Scenario {
            nodes: vec![ContentNode::with_id("p1", "paragraph", "abc")],
            steps: vec![
                Step::InsertText {
                    id: "p1".to_string(),
                    pos: 1,
                    text: "Q".to_string(),
                },
                Step::Select {
                    start: Coordinate::new(0, 0),
                    end: Coordinate::new(0, 0),
                    reverse: false,
                },
            ],
        };

        let mut out = Vec::new();
        run(&scenario, SurfaceOptions::default(), &mut out).unwrap();

        insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r#"
        == initial ==
        div.surface.content
          div.nodes
            div.content-node.paragraph#p1
              div.content
                "abc"
          div.cursor[hidden]
        caret: hidden
        selection: none
        == step 1: insert_text ==
        div.surface.content
          div.nodes
            div.content-node.paragraph#p1
              div.content
                "aQbc"
          div.cursor[hidden]
        caret: hidden
        selection: none
        == step 2: select ==
        div.surface.content
          div.nodes
            div.content-node.paragraph#p1
              div.content
                "aQbc"
          div.cursor[style=top:0px;left:0px;height:20px]
        caret: top=0 left=0 height=20
        selection: [0, 0] -> [0, 0]
        "#);
    }

    #[test]
    fn test_bundled_basic_editing_scenario() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/basic_editing.toml");
        let scenario = Scenario::from_path(&path).unwrap();

        let mut runner = Runner::new(scenario.nodes.clone(), SurfaceOptions::default()).unwrap();
        for step in &scenario.steps {
            runner.apply(step).unwrap();
        }

        assert_eq!(
            runner.document().content("p1"),
            Some("The quick brown fox jumps over the lazy dog.")
        );
        assert_eq!(runner.surface().container_order(), vec!["p1", "p2"]);
        assert!(runner.snapshot().ends_with("caret: top=30 left=16 height=20\nselection: [1, 2] -> [1, 2]\n"));
    }

    #[test]
    fn test_from_path_reports_the_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("broken.toml");
        std::fs::write(&path, "steps = 3").unwrap();

        let err = Scenario::from_path(&path).unwrap_err();

        assert!(err.to_string().starts_with("Failed to parse scenario"));
        assert!(err.to_string().ends_with("broken.toml"));
    }

    #[test]
    fn test_failing_step_is_named() {
        let scenario = Scenario {
            nodes: Vec::new(),
            steps: vec![Step::DeleteNode { id: "ghost".to_string() }],
        };

        let err = run(&scenario, SurfaceOptions::default(), &mut std::io::sink()).unwrap_err();
        assert_eq!(err.to_string(), "Step 1 (delete_node) failed");
    }
}
