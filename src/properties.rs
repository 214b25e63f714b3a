//! Formatting properties of source elements, and how they end up as
//! attributes of flow nodes.

use std::collections::BTreeMap;

use crate::css;
use crate::flow::{FlowKind, FlowTree, MarkerStyle, NodeId};
use crate::schema::{attribute, SourceElement};

pub(crate) const MARGIN: [&str; 4] = ["margin-top", "margin-right", "margin-bottom", "margin-left"];
pub(crate) const PADDING: [&str; 4] = [
    "padding-top",
    "padding-right",
    "padding-bottom",
    "padding-left",
];
pub(crate) const BORDER_WIDTH: [&str; 4] = [
    "border-width-top",
    "border-width-right",
    "border-width-bottom",
    "border-width-left",
];
pub(crate) const BORDER_COLOR: [&str; 4] = [
    "border-color-top",
    "border-color-right",
    "border-color-bottom",
    "border-color-left",
];

/// Heading sizes, largest first.  Also used for the CSS size keywords.
pub(crate) const FONT_SIZES: [&str; 7] = ["22pt", "20pt", "18pt", "16pt", "12pt", "10pt", "8pt"];

const MONOSPACE_FAMILY: &str = "Courier New";
const BLOCKQUOTE_INDENT: &str = "16";

/// A set of named formatting properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct PropertySet(BTreeMap<&'static str, String>);

impl PropertySet {
    pub fn new() -> PropertySet {
        Default::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn set(&mut self, key: &'static str, value: impl Into<String>) {
        self.0.insert(key, value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Copy every property of `other` into this set, replacing any with the
    /// same name.
    pub fn merge(&mut self, other: &PropertySet) {
        for (k, v) in &other.0 {
            self.0.insert(k, v.clone());
        }
    }
}

/// Format a number without a trailing `.0`.
pub(crate) fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", (value * 100.0).round() / 100.0)
    }
}

/// Map an HTML/CSS alignment keyword to its XAML name.
pub(crate) fn text_alignment(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "left" => Some("Left"),
        "right" => Some("Right"),
        "center" => Some("Center"),
        "justify" => Some("Justify"),
        _ => None,
    }
}

fn font_tag_size(value: &str) -> Option<String> {
    let size: f32 = value.trim().parse().ok()?;
    if !size.is_finite() {
        return None;
    }
    Some(format_number((size * (12.0 / 3.0)).clamp(1.0, 1000.0)))
}

/// Compute the properties `element` sets itself, and the properties its
/// children inherit.
pub(crate) fn resolve(
    element: &SourceElement,
    inherited: &PropertySet,
) -> (PropertySet, PropertySet) {
    let mut local = PropertySet::new();

    match element.name.as_str() {
        "i" | "italic" | "em" => local.set("font-style", "italic"),
        "b" | "bold" | "strong" | "dfn" => local.set("font-weight", "bold"),
        "u" | "underline" => local.set("text-decoration-underline", "true"),
        "font" => {
            if let Some(face) = attribute(&element.handle, "face") {
                local.set("font-family", face);
            }
            if let Some(size) = attribute(&element.handle, "size").and_then(|s| font_tag_size(&s)) {
                local.set("font-size", size);
            }
            if let Some(color) = attribute(&element.handle, "color") {
                local.set("color", color);
            }
        }
        "samp" | "pre" => {
            local.set("font-family", MONOSPACE_FAMILY);
            local.set("font-size", FONT_SIZES[6]);
            local.set("text-align", "Left");
        }
        "blockquote" => local.set("margin-left", BLOCKQUOTE_INDENT),
        "h1" => local.set("font-size", FONT_SIZES[0]),
        "h2" => local.set("font-size", FONT_SIZES[1]),
        "h3" => local.set("font-size", FONT_SIZES[2]),
        "h4" => local.set("font-size", FONT_SIZES[3]),
        "h5" => local.set("font-size", FONT_SIZES[4]),
        "h6" => local.set("font-size", FONT_SIZES[5]),
        "ul" => local.set("list-style-type", "disc"),
        "ol" => local.set("list-style-type", "decimal"),
        "center" => local.set("text-align", "Center"),
        _ => (),
    }

    if let Some(align) = attribute(&element.handle, "align").and_then(|a| text_alignment(&a)) {
        local.set("text-align", align);
    }
    if let Some(style) = attribute(&element.handle, "style") {
        css::apply_style(&style, &mut local);
    }

    let mut current = inherited.clone();
    current.merge(&local);
    (local, current)
}

/// Build a XAML thickness from four sides, using the shortest form which
/// describes them.
pub(crate) fn compose_thickness(left: &str, right: &str, top: &str, bottom: &str) -> String {
    fn side(value: &str) -> &str {
        if value.is_empty() || value.starts_with('0') || value.starts_with('-') {
            "0"
        } else {
            value
        }
    }
    let (left, right, top, bottom) = (side(left), side(right), side(top), side(bottom));

    if left == right && top == bottom {
        if left == top {
            left.to_string()
        } else {
            format!("{},{}", left, top)
        }
    } else {
        format!("{},{},{},{}", left, top, right, bottom)
    }
}

fn thickness(props: &PropertySet, keys: &[&str; 4]) -> Option<String> {
    if keys.iter().all(|k| props.get(k).is_none()) {
        return None;
    }
    let [top, right, bottom, left] = (*keys).map(|k| props.get(k).unwrap_or("0"));
    Some(compose_thickness(left, right, top, bottom))
}

/// Set the attributes of `node` which correspond to `local`.  Paragraph
/// level formatting is only used on block nodes, and decorations only on
/// inline ones.
pub(crate) fn apply_local_properties(
    tree: &mut FlowTree,
    node: NodeId,
    local: &PropertySet,
    is_block: bool,
) {
    const DIRECT: [(&str, &str); 6] = [
        ("font-family", "FontFamily"),
        ("font-style", "FontStyle"),
        ("font-weight", "FontWeight"),
        ("font-size", "FontSize"),
        ("color", "Foreground"),
        ("background-color", "Background"),
    ];
    for (key, attr) in DIRECT {
        if let Some(value) = local.get(key) {
            tree.set_attribute(node, attr, value);
        }
    }

    if !is_block {
        if local.get("text-decoration-underline") == Some("true") {
            tree.set_attribute(node, "TextDecorations", "Underline");
        }
        return;
    }

    if let Some(indent) = local.get("text-indent") {
        tree.set_attribute(node, "TextIndent", indent);
    }
    if let Some(align) = local.get("text-align") {
        tree.set_attribute(node, "TextAlignment", align);
    }
    if tree.kind(node) == FlowKind::List {
        if let Some(marker) = local.get("list-style-type") {
            tree.set_attribute(node, "MarkerStyle", MarkerStyle::from_css(marker).as_str());
        }
    }
    if let Some(margin) = thickness(local, &MARGIN) {
        tree.set_attribute(node, "Margin", margin);
    }
    if let Some(padding) = thickness(local, &PADDING) {
        tree.set_attribute(node, "Padding", padding);
    }
    // Only one brush per element; the last side given wins.
    if let Some(brush) = BORDER_COLOR.iter().rev().find_map(|k| local.get(k)) {
        tree.set_attribute(node, "BorderBrush", brush);
    }
    if let Some(border) = thickness(local, &BORDER_WIDTH) {
        tree.set_attribute(node, "BorderThickness", border);
    }
}

#[cfg(test)]
mod test {
    use super::{compose_thickness, format_number, PropertySet};

    #[test]
    fn test_compose_thickness() {
        assert_eq!(compose_thickness("4", "4", "4", "4"), "4");
        assert_eq!(compose_thickness("4", "4", "2", "2"), "4,2");
        assert_eq!(compose_thickness("1", "2", "3", "4"), "1,3,2,4");
        assert_eq!(compose_thickness("-5", "0", "0.5", "0"), "0");
        assert_eq!(compose_thickness("16", "0", "0", "0"), "16,0,0,0");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(16.0), "16");
        assert_eq!(format_number(13.333333), "13.33");
        assert_eq!(format_number(-2.5), "-2.5");
    }

    #[test]
    fn test_merge() {
        let mut inherited = PropertySet::new();
        inherited.set("font-weight", "bold");
        inherited.set("font-style", "normal");
        let mut local = PropertySet::new();
        local.set("font-style", "italic");

        inherited.merge(&local);
        assert_eq!(inherited.get("font-weight"), Some("bold"));
        assert_eq!(inherited.get("font-style"), Some("italic"));
    }
}
