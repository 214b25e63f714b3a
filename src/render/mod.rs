//! Module containing the `Renderer` interface for writing out a flow
//! document tree.

pub mod xaml_renderer;

use crate::flow::{FlowKind, FlowTree, NodeId};
use crate::{tree_map_reduce, TreeMapResult};

/// A type which is a backend for serialising a flow document tree.
pub trait Renderer {
    /// The finished output.
    type Output;

    /// Open an element which will have content.
    fn start_element(&mut self, name: &str, attributes: &[(String, String)]);

    /// Write an element with no content.
    fn empty_element(&mut self, name: &str, attributes: &[(String, String)]);

    /// Close the element most recently opened with `start_element`.
    fn end_element(&mut self, name: &str);

    /// Add some character data to the current element.
    fn add_text(&mut self, text: &str);

    /// Return the finished output.
    fn finish(self) -> Self::Output;
}

/// True if `node` only contains text runs with no formatting of their own.
fn only_plain_runs(tree: &FlowTree, node: NodeId) -> bool {
    tree.children(node).iter().all(|&child| {
        let child = tree.node(child);
        child.kind() == FlowKind::Run && child.attributes().is_empty()
    })
}

fn write_run<T: Renderer>(renderer: &mut T, attributes: &[(String, String)], text: &str) {
    if text.is_empty() {
        renderer.empty_element(FlowKind::Run.element_name(), attributes);
    } else {
        renderer.start_element(FlowKind::Run.element_name(), attributes);
        renderer.add_text(text);
        renderer.end_element(FlowKind::Run.element_name());
    }
}

fn render_node<'a, T: Renderer + 'a>(
    tree: &FlowTree,
    renderer: &mut T,
    id: NodeId,
) -> TreeMapResult<'a, T, NodeId, ()> {
    let node = tree.node(id);
    let is_root = id == tree.root();

    match node.kind() {
        // Plain runs are just text.
        FlowKind::Run if !is_root && node.attributes().is_empty() => {
            renderer.add_text(node.text());
        }
        FlowKind::Run => write_run(renderer, node.attributes(), node.text()),
        // A span of plain text is written as a single run.
        FlowKind::Span if !is_root && only_plain_runs(tree, id) => {
            write_run(renderer, node.attributes(), &tree.text_content(id));
        }
        kind if node.children().is_empty() => {
            renderer.empty_element(kind.element_name(), node.attributes());
        }
        kind => {
            renderer.start_element(kind.element_name(), node.attributes());
            return TreeMapResult::PendingChildren {
                children: node.children().to_vec(),
                cons: Box::new(move |renderer: &mut T, _| {
                    renderer.end_element(kind.element_name());
                    Some(())
                }),
            };
        }
    }
    TreeMapResult::Finished(())
}

/// Write out `tree` with `renderer`, returning its output.
pub fn render_tree<T: Renderer>(tree: &FlowTree, mut renderer: T) -> T::Output {
    html_trace!("render_tree: root {}", tree.kind(tree.root()));
    tree_map_reduce(&mut renderer, tree.root(), |renderer, id| {
        render_node(tree, renderer, id)
    });
    renderer.finish()
}

#[cfg(test)]
mod test {
    use super::{render_tree, Renderer};
    use crate::flow::{FlowKind, FlowTree};

    /// Records the calls made, for checking the walk.
    #[derive(Default)]
    struct Recorder(Vec<String>);

    impl Renderer for Recorder {
        type Output = Vec<String>;

        fn start_element(&mut self, name: &str, attributes: &[(String, String)]) {
            self.0.push(format!("start {} {}", name, attributes.len()));
        }
        fn empty_element(&mut self, name: &str, attributes: &[(String, String)]) {
            self.0.push(format!("empty {} {}", name, attributes.len()));
        }
        fn end_element(&mut self, name: &str) {
            self.0.push(format!("end {}", name));
        }
        fn add_text(&mut self, text: &str) {
            self.0.push(format!("text {}", text));
        }
        fn finish(self) -> Vec<String> {
            self.0
        }
    }

    #[test]
    fn test_walk_order() {
        let mut tree = FlowTree::new(FlowKind::Document);
        let para = tree.create(FlowKind::Paragraph);
        tree.append(tree.root(), para);
        let run = tree.create_run("a");
        tree.append(para, run);
        let line_break = tree.create(FlowKind::LineBreak);
        tree.append(para, line_break);
        let span = tree.create(FlowKind::Span);
        tree.set_attribute(span, "FontWeight", "bold");
        tree.append(para, span);
        let inner = tree.create_run("b");
        tree.append(span, inner);

        assert_eq!(
            render_tree(&tree, Recorder::default()),
            vec![
                "start FlowDocument 0",
                "start Paragraph 0",
                "text a",
                "empty LineBreak 0",
                "start Run 1",
                "text b",
                "end Run",
                "end Paragraph",
                "end FlowDocument",
            ]
        );
    }

    #[test]
    fn test_nested_span_kept() {
        let mut tree = FlowTree::new(FlowKind::Section);
        let outer = tree.create(FlowKind::Span);
        tree.append(tree.root(), outer);
        let inner = tree.create(FlowKind::Span);
        tree.set_attribute(inner, "FontStyle", "italic");
        tree.append(outer, inner);

        assert_eq!(
            render_tree(&tree, Recorder::default()),
            vec![
                "start Section 0",
                "start Span 0",
                "empty Run 1",
                "end Span",
                "end Section",
            ]
        );
    }
}
