//! Convert HTML to XAML flow documents.
//!
//! This crate parses HTML (or an HTML clipboard fragment) and converts it
//! into a tree of flow document elements: sections, paragraphs, runs,
//! hyperlinks, lists and tables.  The tree can be inspected directly, or
//! serialised as XAML presentation markup.
//!
//! # Examples
//!
//! ```rust
//! let xaml = html2flow::convert("<p>Hi <b>there</b></p>", true).unwrap();
//! assert_eq!(
//!     xaml,
//!     concat!(
//!         r#"<FlowDocument xmlns="http://schemas.microsoft.com/winfx/2006/xaml/presentation" xml:space="preserve">"#,
//!         r#"<Paragraph>Hi <Run FontWeight="bold">there</Run></Paragraph>"#,
//!         "</FlowDocument>"
//!     )
//! );
//! ```
//!
//! Fragment mode is meant for pasted HTML.  The result has a `Section` root,
//! or an inline `Span` when the input contains `<!--StartFragment-->` and
//! `<!--EndFragment-->` markers:
//!
//! ```rust
//! let xaml = html2flow::config::fragment()
//!     .preserve_whitespace(false)
//!     .string_from_str("<p><!--StartFragment--><i>copied</i><!--EndFragment--></p>")
//!     .unwrap();
//! assert_eq!(
//!     xaml,
//!     r#"<Span xmlns="http://schemas.microsoft.com/winfx/2006/xaml/presentation"><Run FontStyle="italic">copied</Run></Span>"#
//! );
//! ```
//!
//! A simple demonstration program is included as `html2flow`:
//!
//! ```sh
//! $ cargo run --example html2flow -- foo.html
//! [...]
//! ```

#![deny(missing_docs)]

#[macro_use]
extern crate html5ever;

#[macro_use]
mod macros;

mod builder;
mod css;
pub mod flow;
mod properties;
pub mod render;
mod schema;
mod table;

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::tree_builder::TreeBuilderOpts;
use markup5ever_rcdom::Handle;
pub use markup5ever_rcdom::RcDom;
use std::io;

use flow::NodeId;

/// Errors from reading or converting HTML
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The input has no element to convert.
    #[error("Malformed input: no root element")]
    MalformedInput,
    /// An I/O error
    #[error("I/O error")]
    IoError(#[from] io::Error),
}

impl PartialEq for Error {
    fn eq(&self, other: &Error) -> bool {
        use Error::*;
        matches!((self, other), (MalformedInput, MalformedInput))
    }
}

impl Eq for Error {}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// State for one conversion.  A new one is made for every call, so
/// conversions never share a fragment marker.
pub(crate) struct ConvertContext {
    /// Where the selected fragment starts, once a marker has been seen.
    pub(crate) fragment_parent: Option<NodeId>,
    /// The source elements being converted, outermost first.
    pub(crate) source_context: Vec<Handle>,
    pub(crate) horizontal_rule: String,
}

/// A reducer which combines results from mapping children into
/// the result for the current node.  Takes a context and a
/// vector of results and returns a new result (or nothing).
type ResultReducer<'a, C, R> = dyn Fn(&mut C, Vec<R>) -> Option<R> + 'a;

/// The result of trying to process one node.
pub(crate) enum TreeMapResult<'a, C, N, R> {
    /// A completed result.
    Finished(R),
    /// Deferred completion - can be turned into a result
    /// once the vector of children are processed.
    PendingChildren {
        children: Vec<N>,
        cons: Box<ResultReducer<'a, C, R>>,
    },
}

/// Walk a tree depth first without recursion, mapping each node with
/// `process_node` and combining the results of children on the way back
/// up.
pub(crate) fn tree_map_reduce<'a, C, N, R, M>(
    context: &mut C,
    top: N,
    mut process_node: M,
) -> Option<R>
where
    M: for<'c> FnMut(&'c mut C, N) -> TreeMapResult<'a, C, N, R>,
{
    /// A node partially processed, waiting for its children.
    struct PendingNode<'a, C, R, N> {
        /// How to make the node once finished
        construct: Box<ResultReducer<'a, C, R>>,
        /// Children already processed
        children: Vec<R>,
        /// Iterator of child nodes not yet processed
        to_process: std::vec::IntoIter<N>,
    }

    let mut pending_stack = vec![PendingNode {
        // We only expect one child, which we'll just return.
        construct: Box::new(|_, mut cs| cs.pop()),
        children: Vec::new(),
        to_process: vec![top].into_iter(),
    }];
    loop {
        let Some(pending) = pending_stack.last_mut() else {
            break None;
        };
        // Get the next child node to process
        if let Some(h) = pending.to_process.next() {
            match process_node(context, h) {
                TreeMapResult::Finished(result) => pending.children.push(result),
                TreeMapResult::PendingChildren { children, cons } => {
                    pending_stack.push(PendingNode {
                        construct: cons,
                        children: Vec::new(),
                        to_process: children.into_iter(),
                    });
                }
            }
        } else {
            // No more children, so finally construct the parent.
            let Some(completed) = pending_stack.pop() else {
                break None;
            };
            let reduced = (completed.construct)(context, completed.children);
            match (reduced, pending_stack.last_mut()) {
                (Some(node), Some(parent)) => parent.children.push(node),
                // Finished the whole stack!
                (Some(node), None) => break Some(node),
                (None, None) => break None,
                (None, Some(_)) => (),
            }
        }
    }
}

pub mod config {
    //! Configure the HTML to flow document conversion using the `Config`
    //! type, which can be constructed using one of the functions in this
    //! module.
    use std::io;

    use super::{ConvertContext, Error, RcDom, Result};
    use crate::flow::FlowTree;
    use crate::render::xaml_renderer::XamlRenderer;
    use crate::render::render_tree;
    use markup5ever_rcdom::NodeData;
    use tendril::StrTendril;

    const DEFAULT_HORIZONTAL_RULE: &str = "----------------------";

    /// Configure the HTML processing.
    #[derive(Debug, Clone)]
    pub struct Config {
        standalone: bool,
        preserve_whitespace: bool,
        horizontal_rule: String,
    }

    impl Config {
        /// Make the ConvertContext from self.
        fn make_context(&self) -> ConvertContext {
            ConvertContext {
                fragment_parent: None,
                source_context: Vec::new(),
                horizontal_rule: self.horizontal_rule.clone(),
            }
        }

        /// Parse the HTML into a DOM structure.
        pub fn parse_html<R: io::Read>(&self, mut input: R) -> Result<RcDom> {
            use html5ever::tendril::TendrilSink;
            Ok(super::parse_document(RcDom::default(), parse_opts())
                .from_utf8()
                .read_from(&mut input)?)
        }

        /// Convert an HTML DOM into a flow document tree.
        pub fn dom_to_flow_tree(&self, dom: &RcDom) -> Result<FlowTree> {
            let document = &dom.document;
            let has_root = document
                .children
                .borrow()
                .iter()
                .any(|child| matches!(child.data, NodeData::Element { .. }));
            if !has_root {
                return Err(Error::MalformedInput);
            }
            Ok(crate::builder::convert_document(
                document,
                &mut self.make_context(),
                self.standalone,
            ))
        }

        /// Reads HTML from `input` and returns its flow document tree.
        pub fn flow_tree_from_read<R: io::Read>(&self, input: R) -> Result<FlowTree> {
            let dom = self.parse_html(input)?;
            self.dom_to_flow_tree(&dom)
        }

        /// Converts an HTML string into a flow document tree.
        pub fn flow_tree_from_str(&self, html: &str) -> Result<FlowTree> {
            use html5ever::tendril::TendrilSink;
            let dom = super::parse_document(RcDom::default(), parse_opts())
                .one(StrTendril::from_slice(html));
            self.dom_to_flow_tree(&dom)
        }

        /// Serialise a flow document tree as XAML.
        pub fn render_to_string(&self, tree: &FlowTree) -> String {
            render_tree(tree, XamlRenderer::new(self.preserve_whitespace))
        }

        /// Reads HTML from `input`, and returns the XAML markup.
        pub fn string_from_read<R: io::Read>(&self, input: R) -> Result<String> {
            let tree = self.flow_tree_from_read(input)?;
            Ok(self.render_to_string(&tree))
        }

        /// Converts an HTML string, and returns the XAML markup.
        pub fn string_from_str(&self, html: &str) -> Result<String> {
            let tree = self.flow_tree_from_str(html)?;
            Ok(self.render_to_string(&tree))
        }

        /// Whether to mark the root with `xml:space="preserve"`.  The default
        /// is true.
        pub fn preserve_whitespace(mut self, preserve: bool) -> Self {
            self.preserve_whitespace = preserve;
            self
        }

        /// Set the text written for a horizontal rule (`<hr>`).
        pub fn horizontal_rule(mut self, text: impl Into<String>) -> Self {
            self.horizontal_rule = text.into();
            self
        }
    }

    fn parse_opts() -> super::ParseOpts {
        super::ParseOpts {
            tree_builder: super::TreeBuilderOpts {
                drop_doctype: true,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// The Config for a standalone document or a fragment.
    pub(crate) fn for_mode(standalone: bool) -> Config {
        Config {
            standalone,
            preserve_whitespace: true,
            horizontal_rule: DEFAULT_HORIZONTAL_RULE.into(),
        }
    }

    /// Return a Config for converting a whole document, with a
    /// `FlowDocument` root.
    pub fn document() -> Config {
        for_mode(true)
    }

    /// Return a Config for converting pasted HTML, with a `Section` root.
    /// Content between fragment marker comments becomes an inline `Span`.
    pub fn fragment() -> Config {
        for_mode(false)
    }
}

/// Convert an HTML string into XAML markup.  With `as_standalone_document`
/// the result is a `FlowDocument`; otherwise it's a fragment which can be
/// pasted into one.
pub fn convert(markup: &str, as_standalone_document: bool) -> Result<String> {
    config::for_mode(as_standalone_document).string_from_str(markup)
}

/// Reads HTML from `input`, and returns XAML markup.  See `convert`.
pub fn from_read<R>(input: R, as_standalone_document: bool) -> Result<String>
where
    R: io::Read,
{
    config::for_mode(as_standalone_document).string_from_read(input)
}

#[cfg(test)]
mod tests;
