//! Model changes flowing into the surface: placement, text, annotations,
//! node lifetime and full resets.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use docsurface_engine::{
    Annotation, AnnotationRenderer, ContentNode, DocumentModel, MemoryDocument, NodeTypeRegistry,
    NodeView, Surface, SurfaceError, SurfaceOptions, TextStyle, TextView, VisualId, VisualPoint,
    VisualTree,
};
use pretty_assertions::assert_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;

fn paragraphs(nodes: &[(&str, &str)]) -> MemoryDocument {
    MemoryDocument::from_nodes(
        nodes
            .iter()
            .map(|(id, content)| ContentNode::with_id(*id, "paragraph", *content))
            .collect(),
    )
}

fn mount(doc: &MemoryDocument, types: NodeTypeRegistry) -> Surface {
    let mut surface = Surface::new(doc, types, SurfaceOptions::default()).unwrap();
    surface.render(doc).unwrap();
    surface
}

fn pump(surface: &mut Surface, doc: &MemoryDocument) {
    surface.process_events(doc).unwrap();
}

// ============ Disposal tracking ============

type Disposals = Rc<RefCell<BTreeMap<String, usize>>>;

/// Text view that records how often it is disposed
struct CountingView {
    inner: TextView,
    disposals: Disposals,
}

impl NodeView for CountingView {
    fn node_id(&self) -> &str {
        self.inner.node_id()
    }

    fn root(&self) -> Option<VisualId> {
        self.inner.root()
    }

    fn render(&mut self, tree: &mut VisualTree) -> VisualId {
        self.inner.render(tree)
    }

    fn dispose(&mut self, tree: &mut VisualTree) {
        *self
            .disposals
            .borrow_mut()
            .entry(self.inner.node_id().to_string())
            .or_default() += 1;
        self.inner.dispose(tree);
    }

    fn char_position(&self, tree: &VisualTree, point: VisualPoint) -> Result<usize, SurfaceError> {
        self.inner.char_position(tree, point)
    }

    fn visual_position(&self, tree: &VisualTree, offset: usize) -> Result<VisualPoint, SurfaceError> {
        self.inner.visual_position(tree, offset)
    }

    fn char_len(&self) -> usize {
        self.inner.char_len()
    }

    fn text(&self, tree: &VisualTree) -> String {
        self.inner.text(tree)
    }

    fn replace_content(&mut self, content: &str) {
        self.inner.replace_content(content);
    }

    fn insert(&mut self, tree: &mut VisualTree, pos: usize, text: &str) -> Result<(), SurfaceError> {
        self.inner.insert(tree, pos, text)
    }

    fn delete(&mut self, tree: &mut VisualTree, pos: usize, len: usize) -> Result<(), SurfaceError> {
        self.inner.delete(tree, pos, len)
    }

    fn annotations(&mut self) -> Option<&mut dyn AnnotationRenderer> {
        self.inner.annotations()
    }
}

fn counting_registry() -> (NodeTypeRegistry, Disposals) {
    let disposals = Disposals::default();
    let shared = disposals.clone();
    let mut types = NodeTypeRegistry::new();
    types.register("paragraph", move |node| {
        Ok(Box::new(CountingView {
            inner: TextView::new(node, TextStyle::Paragraph),
            disposals: shared.clone(),
        }) as Box<dyn NodeView>)
    });
    (types, disposals)
}

// ============ Structure ============

#[test]
fn test_insert_between_existing_nodes() {
    let mut doc = paragraphs(&[("P1", "abc"), ("P2", "def")]);
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());

    doc.insert_node(ContentNode::with_id("P3", "paragraph", "xyz"), 1)
        .unwrap();
    pump(&mut surface, &doc);

    assert_eq!(surface.container_order(), vec!["P1", "P3", "P2"]);
    assert_eq!(surface.registered_ids(), vec!["P1", "P2", "P3"]);
}

fn below(rng: &mut StdRng, bound: usize) -> usize {
    rng.gen_range(0..bound.max(1))
}

/// Model order with the nodes the surface has no view for left out
fn viewed_order(surface: &Surface, doc: &MemoryDocument) -> Vec<String> {
    doc.order()
        .iter()
        .filter(|id| surface.node_view(id).is_some())
        .cloned()
        .collect()
}

#[rstest]
#[case(1)]
#[case(7)]
#[case(42)]
#[case(1234)]
#[case(99991)]
fn test_container_tracks_model_order(#[case] seed: u64) {
    let mut doc = MemoryDocument::new();
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());
    let mut rng = StdRng::seed_from_u64(seed);
    let mut hidden: Vec<String> = Vec::new();

    for step in 0..80 {
        let len = doc.order().len();
        match below(&mut rng, 6) {
            0 | 1 => {
                let id = format!("n{step}");
                doc.insert_node(ContentNode::with_id(id.as_str(), "paragraph", id.as_str()), below(&mut rng, len + 2))
                    .unwrap();
            }
            2 => {
                // Unsupported, so it occupies a model slot but no container slot
                let id = format!("c{step}");
                doc.insert_node(ContentNode::with_id(id.as_str(), "comment", ""), below(&mut rng, len + 1))
                    .unwrap();
            }
            3 if len > 0 => {
                let id = doc.order()[below(&mut rng, len)].clone();
                doc.move_node(&id, below(&mut rng, len + 1)).unwrap();
            }
            4 if len > 0 => {
                let id = doc.order()[below(&mut rng, len)].clone();
                if below(&mut rng, 2) == 0 {
                    doc.delete_node(&id).unwrap();
                } else {
                    doc.hide_node(&id).unwrap();
                    hidden.push(id);
                }
            }
            5 if !hidden.is_empty() => {
                let id = hidden.swap_remove(below(&mut rng, hidden.len()));
                doc.show_node(&id, below(&mut rng, len + 1)).unwrap();
            }
            _ => continue,
        }
        pump(&mut surface, &doc);
        assert_eq!(surface.container_order(), viewed_order(&surface, &doc), "after step {step}");
    }
}

#[test]
fn test_unsupported_nodes_are_ignored() {
    let mut doc = paragraphs(&[("P1", "abc")]);
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());

    doc.insert_node(ContentNode::with_id("C1", "comment", "hidden note"), 1)
        .unwrap();
    pump(&mut surface, &doc);

    assert_eq!(surface.registered_ids(), vec!["P1"]);
    assert_eq!(surface.container_order(), vec!["P1"]);
}

#[test]
fn test_placement_below_an_unsupported_node() {
    let mut doc = MemoryDocument::from_nodes(vec![
        ContentNode::with_id("C1", "comment", "note"),
        ContentNode::with_id("P1", "paragraph", "abc"),
    ]);
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());

    doc.insert_node(ContentNode::with_id("P2", "paragraph", "def"), 1)
        .unwrap();
    pump(&mut surface, &doc);
    assert_eq!(doc.order(), ["C1", "P2", "P1"]);
    assert_eq!(surface.container_order(), vec!["P2", "P1"]);

    doc.move_node("C1", 2).unwrap();
    doc.move_node("P1", 0).unwrap();
    pump(&mut surface, &doc);
    assert_eq!(doc.order(), ["P1", "P2", "C1"]);
    assert_eq!(surface.container_order(), vec!["P1", "P2"]);

    doc.delete_node("C1").unwrap();
    doc.delete_node("P1").unwrap();
    pump(&mut surface, &doc);
    assert_eq!(surface.container_order(), vec!["P2"]);
}

#[test]
fn test_node_type_without_renderer_is_fatal() {
    let mut doc = paragraphs(&[("P1", "abc")]);
    let mut types = NodeTypeRegistry::with_defaults();
    types.declare("figure");
    let mut surface = mount(&doc, types);

    doc.insert_node(ContentNode::with_id("F1", "figure", ""), 1)
        .unwrap();

    assert_eq!(
        surface.process_events(&doc),
        Err(SurfaceError::MissingRenderer {
            node_type: "figure".to_string()
        })
    );
}

// ============ Node lifetime ============

#[test]
fn test_delete_disposes_exactly_once() {
    let mut doc = paragraphs(&[("P1", "abc"), ("P2", "def")]);
    let (types, disposals) = counting_registry();
    let mut surface = mount(&doc, types);
    let root = surface.node_view("P1").unwrap().root().unwrap();

    doc.delete_node("P1").unwrap();
    pump(&mut surface, &doc);

    assert_eq!(disposals.borrow().get("P1"), Some(&1));
    assert_eq!(disposals.borrow().get("P2"), None);
    assert!(surface.node_view("P1").is_none());
    assert_eq!(surface.container_order(), vec!["P2"]);
    assert!(!surface.tree().contains(root));
}

#[test]
fn test_reset_rebuilds_without_leaks() {
    let mut doc = paragraphs(&[("P1", "abc"), ("P2", "def")]);
    let (types, disposals) = counting_registry();
    let mut surface = mount(&doc, types);

    doc.replace_all(vec![
        ContentNode::with_id("N1", "paragraph", "one"),
        ContentNode::with_id("P2", "paragraph", "two"),
        ContentNode::with_id("N3", "paragraph", "three"),
    ]);
    pump(&mut surface, &doc);

    assert_eq!(
        *disposals.borrow(),
        BTreeMap::from([("P1".to_string(), 1), ("P2".to_string(), 1)])
    );
    let ids: Vec<&str> = doc.nodes().iter().map(|node| node.id.as_str()).collect();
    assert_eq!(surface.container_order(), ids);

    // Same tree a fresh surface would build
    let fresh = mount(&doc, NodeTypeRegistry::with_defaults());
    assert_eq!(surface.tree().live_count(), fresh.tree().live_count());
    assert_eq!(surface.outline(), fresh.outline());
}

#[test]
fn test_dispose_releases_views_and_subscription() {
    let doc = paragraphs(&[("P1", "abc"), ("P2", "def")]);
    let (types, disposals) = counting_registry();
    let surface = mount(&doc, types);
    assert_eq!(doc.subscriber_count(), 1);

    surface.dispose();

    assert_eq!(doc.subscriber_count(), 0);
    assert_eq!(
        *disposals.borrow(),
        BTreeMap::from([("P1".to_string(), 1), ("P2".to_string(), 1)])
    );
}

// ============ Text ============

#[test]
fn test_text_insert_reads_back_through_view() {
    let mut doc = paragraphs(&[("P1", "abc")]);
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());

    doc.insert_text("P1", 1, "Q").unwrap();
    pump(&mut surface, &doc);

    let view = surface.node_view("P1").unwrap();
    assert_eq!(view.text(surface.tree()), "aQbc");
}

#[rstest]
#[case("abc", "Q")]
#[case("", "first")]
#[case("naïve café", "ü")]
fn test_text_insert_round_trip_at_every_offset(#[case] content: &str, #[case] inserted: &str) {
    for offset in 0..=content.chars().count() {
        let mut doc = paragraphs(&[("P1", content)]);
        let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());

        doc.insert_text("P1", offset, inserted).unwrap();
        pump(&mut surface, &doc);

        let view = surface.node_view("P1").unwrap();
        assert_eq!(Some(view.text(surface.tree()).as_str()), doc.content("P1"), "offset {offset}");
    }
}

#[test]
fn test_edits_before_placement_show_up_when_placed() {
    let mut doc = paragraphs(&[("P1", "abc")]);
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());

    doc.create_node(ContentNode::with_id("P2", "paragraph", "draft"))
        .unwrap();
    doc.insert_text("P2", 5, "ed").unwrap();
    doc.show_node("P2", 0).unwrap();
    pump(&mut surface, &doc);

    assert_eq!(surface.container_order(), vec!["P2", "P1"]);
    let view = surface.node_view("P2").unwrap();
    assert_eq!(view.text(surface.tree()), "drafted");
}

#[test]
fn test_set_content_rerenders_one_node() {
    let mut doc = paragraphs(&[("P1", "abc"), ("P2", "def")]);
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());

    doc.set_content("P2", "replaced").unwrap();
    pump(&mut surface, &doc);

    insta::assert_snapshot!(surface.outline(), @r#"
    div.surface.content
      div.nodes
        div.content-node.paragraph#P1
          div.content
            "abc"
        div.content-node.paragraph#P2
          div.content
            "replaced"
      div.cursor[hidden]
    "#);
}

// ============ Annotations ============

#[test]
fn test_annotations_render_per_node() {
    let mut doc = paragraphs(&[("P1", "hello world"), ("P2", "plain")]);
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());

    doc.add_annotation(Annotation::new("strong", "P1", 0, 5).with_id("a1"))
        .unwrap();
    doc.add_annotation(Annotation::new("emphasis", "P1", 6, 11).with_id("a2"))
        .unwrap();
    pump(&mut surface, &doc);

    insta::assert_snapshot!(surface.outline(), @r#"
    div.surface.content
      div.nodes
        div.content-node.paragraph#P1
          div.content
            span.annotation.strong[data-annotations=a1]
              "hello"
            " "
            span.annotation.emphasis[data-annotations=a2]
              "world"
        div.content-node.paragraph#P2
          div.content
            "plain"
      div.cursor[hidden]
    "#);

    doc.remove_annotation("a1").unwrap();
    pump(&mut surface, &doc);

    let view = surface.node_view("P1").unwrap();
    assert_eq!(view.text(surface.tree()), "hello world");
    assert!(!surface.outline().contains("strong"));
    assert!(surface.outline().contains("emphasis"));
}

#[test]
fn test_existing_annotations_render_on_mount() {
    let mut doc = paragraphs(&[("P1", "hello world")]);
    doc.add_annotation(Annotation::new("strong", "P1", 0, 5)).unwrap();

    let surface = mount(&doc, NodeTypeRegistry::with_defaults());

    assert!(surface.outline().contains("span.annotation.strong"));
}

#[test]
fn test_annotations_on_views_without_support_are_skipped() {
    let mut doc = MemoryDocument::from_nodes(vec![ContentNode::with_id("C1", "code", "let x = 1;")]);
    let mut surface = mount(&doc, NodeTypeRegistry::with_defaults());
    let before = surface.outline();

    doc.add_annotation(Annotation::new("strong", "C1", 0, 3)).unwrap();
    pump(&mut surface, &doc);

    assert_eq!(surface.outline(), before);
}
