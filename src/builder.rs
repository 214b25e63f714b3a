//! Conversion of the parsed HTML tree into a flow document tree.
//!
//! The DOM is walked with `tree_map_reduce`, so nesting depth is limited
//! only by memory.  Each step is a piece of `Work`: flow nodes are created
//! and attached when their source node is reached, and the step's children
//! are the work for the source node's content.
//!
//! At block level, sibling lists are split up front: a run of loose inline
//! content becomes one implicit paragraph, and consecutive `li` elements
//! without a list become one list.

use markup5ever_rcdom::{Handle, NodeData};
use std::rc::Rc;

use crate::flow::{FlowKind, FlowTree, MarkerStyle, NodeId};
use crate::properties::{apply_local_properties, resolve, PropertySet};
use crate::schema::{block_role, children, element_name, is_block, is_inline, BlockRole, SourceElement};
use crate::{tree_map_reduce, ConvertContext, TreeMapResult};

const START_FRAGMENT: &str = "StartFragment";
const END_FRAGMENT: &str = "EndFragment";

/// A piece of conversion still to do.  `parent` is the flow node which
/// receives the output.
pub(crate) enum Work {
    /// The children of `source`, as blocks.
    Blocks {
        parent: NodeId,
        source: Handle,
        inherited: Rc<PropertySet>,
    },
    /// An element where a block is expected.
    Block {
        parent: NodeId,
        element: SourceElement,
        inherited: Rc<PropertySet>,
    },
    /// Siblings which make up one implicit paragraph.
    ImplicitParagraph {
        parent: NodeId,
        run: Vec<Handle>,
        inherited: Rc<PropertySet>,
    },
    /// Consecutive `li` elements found without a list.
    OrphanListItems {
        parent: NodeId,
        items: Vec<Handle>,
        inherited: Rc<PropertySet>,
    },
    ListItem {
        list: NodeId,
        element: SourceElement,
        inherited: Rc<PropertySet>,
    },
    /// A node in inline position.  Loose nodes sit directly among blocks,
    /// where whitespace is dropped and comments can't mark a fragment.
    Inline {
        parent: NodeId,
        handle: Handle,
        inherited: Rc<PropertySet>,
        loose: bool,
    },
}

pub(crate) type Step<'c> = TreeMapResult<'static, Builder<'c>, Work, ()>;

/// Builds one flow tree.  All per-conversion state lives in the context.
pub(crate) struct Builder<'c> {
    pub(crate) tree: FlowTree,
    ctx: &'c mut ConvertContext,
}

/// Convert the children of `document` into a new flow tree.  In fragment
/// mode the root is a `Section`, and the range between fragment markers is
/// extracted afterwards.
pub(crate) fn convert_document(
    document: &Handle,
    ctx: &mut ConvertContext,
    standalone: bool,
) -> FlowTree {
    html_trace!("convert_document: standalone={}", standalone);
    ctx.fragment_parent = None;
    ctx.source_context.clear();

    let root_kind = if standalone {
        FlowKind::Document
    } else {
        FlowKind::Section
    };
    let mut builder = Builder {
        tree: FlowTree::new(root_kind),
        ctx,
    };
    let top = Work::Blocks {
        parent: builder.tree.root(),
        source: document.clone(),
        inherited: Rc::new(PropertySet::new()),
    };
    tree_map_reduce(&mut builder, top, |builder, work| builder.process(work));
    debug_assert!(builder.ctx.source_context.is_empty());

    let Builder { mut tree, ctx } = builder;
    if !standalone {
        extract_inline_fragment(&mut tree, ctx.fragment_parent);
    }
    tree
}

/// Make the content marked by fragment comments the new root, wrapped in a
/// `Span` unless its parent already is one.
pub(crate) fn extract_inline_fragment(tree: &mut FlowTree, fragment_parent: Option<NodeId>) {
    let Some(parent) = fragment_parent else {
        return;
    };
    if tree.kind(parent) == FlowKind::Span {
        tree.set_root(parent);
        return;
    }
    let span = tree.create(FlowKind::Span);
    for child in tree.take_children(parent) {
        tree.append(span, child);
    }
    tree.set_root(span);
}

/// Strip control characters, and replace non-breaking spaces which the
/// flow document can't display.
fn clean_text(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == '\u{a0}' { ' ' } else { c })
        .collect()
}

/// The index of the last sibling of an implicit paragraph starting at
/// `start`.  It runs up to the next block element.
fn implicit_paragraph_end(siblings: &[Handle], start: usize) -> usize {
    siblings
        .iter()
        .enumerate()
        .skip(start + 1)
        .take_while(|(_, handle)| !element_name(handle).is_some_and(|tag| is_block(&tag)))
        .last()
        .map_or(start, |(index, _)| index)
}

/// The index of the last of the consecutive `li` elements from `start`.
fn orphan_items_end(siblings: &[Handle], start: usize) -> usize {
    siblings
        .iter()
        .enumerate()
        .skip(start + 1)
        .take_while(|(_, handle)| {
            SourceElement::from_handle(handle).is_some_and(|element| element.name == "li")
        })
        .last()
        .map_or(start, |(index, _)| index)
}

/// Split `siblings` into block level work for `parent`.
pub(crate) fn block_work(parent: NodeId, siblings: Vec<Handle>, inherited: &Rc<PropertySet>) -> Vec<Work> {
    let mut work = Vec::new();
    let mut index = 0;
    while index < siblings.len() {
        let handle = &siblings[index];
        let last = match handle.data {
            NodeData::Comment { .. } => {
                work.push(Work::Inline {
                    parent,
                    handle: handle.clone(),
                    inherited: inherited.clone(),
                    loose: true,
                });
                index
            }
            NodeData::Text { .. } => {
                let last = implicit_paragraph_end(&siblings, index);
                work.push(Work::ImplicitParagraph {
                    parent,
                    run: siblings[index..=last].to_vec(),
                    inherited: inherited.clone(),
                });
                last
            }
            NodeData::Element { .. } => match SourceElement::from_handle(handle) {
                None => {
                    html_trace!("block_work: dropping foreign element {:?}", element_name(handle));
                    index
                }
                Some(element) => match block_role(&element.name) {
                    BlockRole::Default => {
                        let last = implicit_paragraph_end(&siblings, index);
                        work.push(Work::ImplicitParagraph {
                            parent,
                            run: siblings[index..=last].to_vec(),
                            inherited: inherited.clone(),
                        });
                        last
                    }
                    BlockRole::OrphanListItem => {
                        let last = orphan_items_end(&siblings, index);
                        work.push(Work::OrphanListItems {
                            parent,
                            items: siblings[index..=last].to_vec(),
                            inherited: inherited.clone(),
                        });
                        last
                    }
                    _ => {
                        work.push(Work::Block {
                            parent,
                            element,
                            inherited: inherited.clone(),
                        });
                        index
                    }
                },
            },
            _ => index,
        };
        index = last + 1;
    }
    work
}

fn inline_work(parent: NodeId, nodes: Vec<Handle>, inherited: &Rc<PropertySet>, loose: bool) -> Vec<Work> {
    nodes
        .into_iter()
        .map(|handle| Work::Inline {
            parent,
            handle,
            inherited: inherited.clone(),
            loose,
        })
        .collect()
}

impl<'c> Builder<'c> {
    fn push_context(&mut self, handle: &Handle) {
        self.ctx.source_context.push(handle.clone());
    }

    fn pop_context(&mut self, handle: &Handle) {
        let top = self.ctx.source_context.pop();
        debug_assert!(top.is_some_and(|top| Rc::ptr_eq(&top, handle)));
    }

    #[cfg(feature = "html_trace")]
    fn context_path(&self) -> String {
        self.ctx
            .source_context
            .iter()
            .filter_map(element_name)
            .collect::<Vec<_>>()
            .join("/")
    }

    fn horizontal_rule(&self) -> String {
        self.ctx.horizontal_rule.clone()
    }

    /// Convert `children` next.  `source`, if any, is on the context stack
    /// while they are converted, and `finish` runs once they are done.
    pub(crate) fn pending<F>(&mut self, source: Option<&Handle>, children: Vec<Work>, finish: F) -> Step<'c>
    where
        F: Fn(&mut FlowTree) + 'static,
    {
        if let Some(source) = source {
            self.push_context(source);
        }
        let source = source.cloned();
        TreeMapResult::PendingChildren {
            children,
            cons: Box::new(move |builder: &mut Self, _: Vec<()>| {
                if let Some(ref source) = source {
                    builder.pop_context(source);
                }
                finish(&mut builder.tree);
                Some(())
            }),
        }
    }

    fn process(&mut self, work: Work) -> Step<'c> {
        match work {
            Work::Blocks {
                parent,
                source,
                inherited,
            } => {
                let children = block_work(parent, children(&source), &inherited);
                self.pending(Some(&source), children, |_| ())
            }
            Work::Block {
                parent,
                element,
                inherited,
            } => self.add_block(parent, element, &inherited),
            Work::ImplicitParagraph {
                parent,
                run,
                inherited,
            } => self.add_implicit_paragraph(parent, run, &inherited),
            Work::OrphanListItems {
                parent,
                items,
                inherited,
            } => self.add_orphan_list_items(parent, items, &inherited),
            Work::ListItem {
                list,
                element,
                inherited,
            } => self.add_list_item(list, element, &inherited),
            Work::Inline {
                parent,
                handle,
                inherited,
                loose,
            } => self.add_inline(parent, handle, &inherited, loose),
        }
    }

    fn add_block(&mut self, parent: NodeId, element: SourceElement, inherited: &Rc<PropertySet>) -> Step<'c> {
        html_trace_quiet!("add_block: {}/{}", self.context_path(), element.name);
        match block_role(&element.name) {
            BlockRole::Section => self.add_section(parent, element, inherited),
            BlockRole::Paragraph => self.add_paragraph(parent, element, inherited),
            BlockRole::List => self.add_list(parent, element, inherited),
            BlockRole::OrphanListItem => self.add_orphan_list_items(parent, vec![element.handle], inherited),
            BlockRole::Image => {
                self.add_image(&element);
                TreeMapResult::Finished(())
            }
            BlockRole::Table => self.add_table(parent, element, inherited),
            BlockRole::TableFragment => {
                html_trace!("add_block: <{}> outside a table", element.name);
                let children = block_work(parent, children(&element.handle), inherited);
                self.pending(Some(&element.handle), children, |_| ())
            }
            BlockRole::Suppressed => TreeMapResult::Finished(()),
            BlockRole::Default => self.add_implicit_paragraph(parent, vec![element.handle], inherited),
        }
    }

    fn add_section(&mut self, parent: NodeId, element: SourceElement, inherited: &PropertySet) -> Step<'c> {
        if !element.child_tags().any(|tag| is_block(&tag)) {
            // Nothing but inline content.
            return self.add_paragraph(parent, element, inherited);
        }

        let (local, current) = resolve(&element, inherited);
        let section = self.tree.create(FlowKind::Section);
        apply_local_properties(&mut self.tree, section, &local, true);

        let target = if self.tree.node(section).attributes().is_empty() {
            parent
        } else {
            self.tree.append(parent, section);
            section
        };
        let children = block_work(target, children(&element.handle), &Rc::new(current));
        self.pending(Some(&element.handle), children, |_| ())
    }

    fn add_paragraph(&mut self, parent: NodeId, element: SourceElement, inherited: &PropertySet) -> Step<'c> {
        let (local, current) = resolve(&element, inherited);
        let paragraph = self.tree.create(FlowKind::Paragraph);
        apply_local_properties(&mut self.tree, paragraph, &local, true);
        self.tree.append(parent, paragraph);

        let children = inline_work(paragraph, children(&element.handle), &Rc::new(current), false);
        self.pending(Some(&element.handle), children, |_| ())
    }

    /// Collect a run of loose inline siblings into one paragraph, which is
    /// dropped again if nothing in the run produced output.
    fn add_implicit_paragraph(&mut self, parent: NodeId, run: Vec<Handle>, inherited: &Rc<PropertySet>) -> Step<'c> {
        let paragraph = self.tree.create(FlowKind::Paragraph);
        self.tree.append(parent, paragraph);

        let children = inline_work(paragraph, run, inherited, true);
        self.pending(None, children, move |tree| {
            if !tree.has_children(paragraph) {
                tree.detach(paragraph);
            }
        })
    }

    fn add_inline(&mut self, parent: NodeId, handle: Handle, inherited: &Rc<PropertySet>, loose: bool) -> Step<'c> {
        match handle.data {
            NodeData::Comment { ref contents } => {
                self.fragment_marker(contents, (!loose).then_some(parent));
            }
            NodeData::Text { ref contents } => {
                let text = contents.borrow();
                if !(loose && text.trim().is_empty()) {
                    self.add_text_run(parent, &text);
                }
            }
            NodeData::Element { .. } => {
                let Some(element) = SourceElement::from_handle(&handle) else {
                    return TreeMapResult::Finished(());
                };
                match element.name.as_str() {
                    "a" => return self.add_hyperlink(parent, element, inherited),
                    "img" => self.add_image(&element),
                    "br" | "hr" => self.add_break(parent, &element.name),
                    tag if is_inline(tag) || is_block(tag) => {
                        return self.add_span(parent, element, inherited);
                    }
                    _ => {
                        html_trace!("add_inline: ignoring <{}>", element.name);
                    }
                }
            }
            _ => (),
        }
        TreeMapResult::Finished(())
    }

    fn add_span(&mut self, parent: NodeId, element: SourceElement, inherited: &PropertySet) -> Step<'c> {
        let (local, current) = resolve(&element, inherited);
        let span = self.tree.create(FlowKind::Span);
        apply_local_properties(&mut self.tree, span, &local, false);
        self.tree.append(parent, span);

        let children = inline_work(span, children(&element.handle), &Rc::new(current), false);
        self.pending(Some(&element.handle), children, |_| ())
    }

    fn add_text_run(&mut self, parent: NodeId, text: &str) {
        let text = clean_text(text);
        if !text.is_empty() {
            let run = self.tree.create_run(text);
            self.tree.append(parent, run);
        }
    }

    fn add_hyperlink(&mut self, parent: NodeId, element: SourceElement, inherited: &PropertySet) -> Step<'c> {
        let Some(href) = element.attribute("href") else {
            return self.add_span(parent, element, inherited);
        };

        let (local, current) = resolve(&element, inherited);
        let link = self.tree.create(FlowKind::Hyperlink);
        apply_local_properties(&mut self.tree, link, &local, false);

        let parts: Vec<&str> = href.split('#').collect();
        if let Some(uri) = parts.first().map(|p| p.trim()).filter(|p| !p.is_empty()) {
            self.tree.set_attribute(link, "NavigateUri", uri);
        }
        if let [_, target] = parts[..] {
            let target = target.trim();
            if !target.is_empty() {
                self.tree.set_attribute(link, "TargetName", target);
            }
        }
        self.tree.append(parent, link);

        let children = inline_work(link, children(&element.handle), &Rc::new(current), false);
        self.pending(Some(&element.handle), children, |_| ())
    }

    fn add_break(&mut self, parent: NodeId, tag: &str) {
        let line_break = self.tree.create(FlowKind::LineBreak);
        self.tree.append(parent, line_break);

        if tag == "hr" {
            let rule = self.tree.create_run(self.horizontal_rule());
            self.tree.append(parent, rule);
            let line_break = self.tree.create(FlowKind::LineBreak);
            self.tree.append(parent, line_break);
        }
    }

    fn add_image(&mut self, _element: &SourceElement) {
        html_trace!("add_image: images are not converted");
    }

    fn add_list(&mut self, parent: NodeId, element: SourceElement, inherited: &PropertySet) -> Step<'c> {
        let (local, current) = resolve(&element, inherited);
        let list = self.tree.create(FlowKind::List);

        let marker = if element.name == "ol" {
            MarkerStyle::Decimal
        } else {
            MarkerStyle::Disc
        };
        self.tree.set_attribute(list, "MarkerStyle", marker.as_str());
        apply_local_properties(&mut self.tree, list, &local, true);

        let current = Rc::new(current);
        let items: Vec<Work> = children(&element.handle)
            .iter()
            .filter_map(SourceElement::from_handle)
            .filter(|item| item.name == "li")
            .map(|item| Work::ListItem {
                list,
                element: item,
                inherited: current.clone(),
            })
            .collect();
        if items.is_empty() {
            return TreeMapResult::Finished(());
        }
        self.tree.append(parent, list);
        self.pending(Some(&element.handle), items, |_| ())
    }

    /// Gather `li` elements found without a list.  They join the list
    /// immediately before them if there is one.
    fn add_orphan_list_items(&mut self, parent: NodeId, items: Vec<Handle>, inherited: &Rc<PropertySet>) -> Step<'c> {
        let list = match self.tree.last_child(parent) {
            Some(last) if self.tree.kind(last) == FlowKind::List => last,
            _ => {
                let list = self.tree.create(FlowKind::List);
                self.tree.append(parent, list);
                list
            }
        };

        let items = items
            .iter()
            .filter_map(SourceElement::from_handle)
            .map(|item| Work::ListItem {
                list,
                element: item,
                inherited: inherited.clone(),
            })
            .collect();
        self.pending(None, items, |_| ())
    }

    fn add_list_item(&mut self, list: NodeId, element: SourceElement, inherited: &PropertySet) -> Step<'c> {
        let (_local, current) = resolve(&element, inherited);
        let item = self.tree.create(FlowKind::ListItem);
        self.tree.append(list, item);

        let children = block_work(item, children(&element.handle), &Rc::new(current));
        self.pending(Some(&element.handle), children, |_| ())
    }

    fn fragment_marker(&mut self, comment: &str, parent: Option<NodeId>) {
        if comment == START_FRAGMENT {
            html_trace!("fragment_marker: start under {:?}", parent);
            self.ctx.fragment_parent = parent;
        } else if comment == END_FRAGMENT && self.ctx.fragment_parent.is_none() && parent.is_some()
        {
            html_trace!("fragment_marker: end under {:?}", parent);
            self.ctx.fragment_parent = parent;
        }
    }
}
