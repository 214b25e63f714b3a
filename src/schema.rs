//! Knowledge about HTML elements: how each tag is treated at block level,
//! and which tags count as block or inline content.

use markup5ever_rcdom::{Handle, NodeData};

/// How an element found where a block is expected gets converted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BlockRole {
    /// A group of blocks, or a paragraph when it holds no blocks.
    Section,
    /// A paragraph of inline content.
    Paragraph,
    /// A list; only `li` children are kept.
    List,
    /// `li` without a list around it.
    OrphanListItem,
    Image,
    Table,
    /// Table parts outside a table.
    TableFragment,
    /// Dropped with everything inside.
    Suppressed,
    /// Anything else starts an implicit paragraph.
    Default,
}

/// Block level dispatch, sorted by tag name.
static BLOCK_ROLES: &[(&str, BlockRole)] = &[
    ("article", BlockRole::Section),
    ("aside", BlockRole::Section),
    ("blockquote", BlockRole::Section),
    ("body", BlockRole::Section),
    ("caption", BlockRole::Section),
    ("center", BlockRole::Section),
    ("cite", BlockRole::Section),
    ("dd", BlockRole::Paragraph),
    ("details", BlockRole::Section),
    ("dir", BlockRole::List),
    ("div", BlockRole::Section),
    ("dl", BlockRole::Paragraph),
    ("dt", BlockRole::Paragraph),
    ("figcaption", BlockRole::Section),
    ("figure", BlockRole::Section),
    ("footer", BlockRole::Section),
    ("form", BlockRole::Section),
    ("h1", BlockRole::Paragraph),
    ("h2", BlockRole::Paragraph),
    ("h3", BlockRole::Paragraph),
    ("h4", BlockRole::Paragraph),
    ("h5", BlockRole::Paragraph),
    ("h6", BlockRole::Paragraph),
    ("head", BlockRole::Suppressed),
    ("header", BlockRole::Section),
    ("html", BlockRole::Section),
    ("img", BlockRole::Image),
    ("li", BlockRole::OrphanListItem),
    ("main", BlockRole::Section),
    ("menu", BlockRole::List),
    ("meta", BlockRole::Suppressed),
    ("nav", BlockRole::Section),
    ("nsrtitle", BlockRole::Paragraph),
    ("ol", BlockRole::List),
    ("p", BlockRole::Paragraph),
    ("pre", BlockRole::Section),
    ("script", BlockRole::Suppressed),
    ("section", BlockRole::Section),
    ("style", BlockRole::Suppressed),
    ("summary", BlockRole::Section),
    ("table", BlockRole::Table),
    ("tbody", BlockRole::TableFragment),
    ("td", BlockRole::TableFragment),
    ("textarea", BlockRole::Paragraph),
    ("tfoot", BlockRole::TableFragment),
    ("th", BlockRole::TableFragment),
    ("thead", BlockRole::TableFragment),
    ("title", BlockRole::Suppressed),
    ("tr", BlockRole::TableFragment),
    ("tt", BlockRole::Paragraph),
    ("ul", BlockRole::List),
];

/// Tags which end a run of inline content.  Sorted.
static BLOCK_TAGS: &[&str] = &[
    "article", "aside", "blockquote", "body", "caption", "center", "cite", "dd", "details", "dir",
    "div", "dl", "dt", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5",
    "h6", "header", "html", "li", "main", "menu", "nav", "ol", "p", "pre", "section", "summary",
    "table", "tbody", "td", "textarea", "tfoot", "th", "thead", "tr", "tt", "ul",
];

/// Tags which format text within a line.  Sorted.
static INLINE_TAGS: &[&str] = &[
    "a", "abbr", "acronym", "address", "b", "bdo", "big", "bold", "button", "code", "del", "dfn",
    "em", "font", "i", "ins", "italic", "kbd", "label", "legend", "q", "s", "samp", "small",
    "span", "strike", "strong", "sub", "sup", "u", "underline", "var",
];

/// The block level treatment of a tag.
pub(crate) fn block_role(tag: &str) -> BlockRole {
    match BLOCK_ROLES.binary_search_by(|(name, _)| (*name).cmp(tag)) {
        Ok(idx) => BLOCK_ROLES[idx].1,
        Err(_) => BlockRole::Default,
    }
}

pub(crate) fn is_block(tag: &str) -> bool {
    BLOCK_TAGS.binary_search(&tag).is_ok()
}

pub(crate) fn is_inline(tag: &str) -> bool {
    INLINE_TAGS.binary_search(&tag).is_ok()
}

/// An HTML element of the source tree, with its lower case tag name.
#[derive(Clone)]
pub(crate) struct SourceElement {
    pub name: String,
    pub handle: Handle,
}

impl SourceElement {
    /// Wrap `handle` if it's an element in the HTML namespace.
    pub fn from_handle(handle: &Handle) -> Option<SourceElement> {
        match handle.data {
            NodeData::Element { ref name, .. } if name.ns == ns!(html) => Some(SourceElement {
                name: (*name.local).to_ascii_lowercase(),
                handle: handle.clone(),
            }),
            _ => None,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<String> {
        attribute(&self.handle, name)
    }

    /// The tag names of the element children.
    pub fn child_tags(&self) -> impl Iterator<Item = String> + '_ {
        children(&self.handle)
            .into_iter()
            .filter_map(|child| element_name(&child))
    }
}

/// A snapshot of the child nodes of `handle`.
pub(crate) fn children(handle: &Handle) -> Vec<Handle> {
    handle.children.borrow().clone()
}

/// The lower case tag name of `handle`, if it's an element of any namespace.
pub(crate) fn element_name(handle: &Handle) -> Option<String> {
    match handle.data {
        NodeData::Element { ref name, .. } => Some((*name.local).to_ascii_lowercase()),
        _ => None,
    }
}

/// Look up an attribute, ignoring case.
pub(crate) fn attribute(handle: &Handle, name: &str) -> Option<String> {
    match handle.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| (*attr.name.local).eq_ignore_ascii_case(name))
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::{block_role, is_block, is_inline, BlockRole, BLOCK_ROLES, BLOCK_TAGS, INLINE_TAGS};

    #[test]
    fn test_tables_sorted() {
        assert!(BLOCK_ROLES.windows(2).all(|w| w[0].0 < w[1].0));
        assert!(BLOCK_TAGS.windows(2).all(|w| w[0] < w[1]));
        assert!(INLINE_TAGS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_block_roles() {
        assert_eq!(block_role("div"), BlockRole::Section);
        assert_eq!(block_role("h3"), BlockRole::Paragraph);
        assert_eq!(block_role("menu"), BlockRole::List);
        assert_eq!(block_role("li"), BlockRole::OrphanListItem);
        assert_eq!(block_role("td"), BlockRole::TableFragment);
        assert_eq!(block_role("script"), BlockRole::Suppressed);
        assert_eq!(block_role("span"), BlockRole::Default);
        assert_eq!(block_role("blink"), BlockRole::Default);
    }

    #[test]
    fn test_block_and_inline() {
        assert!(is_block("p"));
        assert!(is_block("td"));
        assert!(!is_block("span"));
        assert!(is_inline("span"));
        assert!(is_inline("strong"));
        assert!(!is_inline("img"));
        assert!(!is_inline("br"));
    }
}
