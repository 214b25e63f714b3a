//! Some basic CSS support: the declarations of inline `style` attributes
//! which have a flow document equivalent.

pub(crate) mod parser;

use self::parser::{component_values, length, parse_style};
use crate::properties::{
    format_number, text_alignment, PropertySet, BORDER_COLOR, BORDER_WIDTH, FONT_SIZES, MARGIN,
    PADDING,
};

const MARKER_KEYWORDS: [&str; 10] = [
    "none",
    "decimal",
    "disc",
    "circle",
    "square",
    "box",
    "lower-latin",
    "upper-latin",
    "lower-roman",
    "upper-roman",
];

const BORDER_STYLES: [&str; 10] = [
    "none", "hidden", "dotted", "dashed", "solid", "double", "groove", "ridge", "inset", "outset",
];

/// Convert a CSS length into a pixel count.  Relative units aren't
/// supported.
pub(crate) fn length_px(text: &str) -> Option<f32> {
    length(text)?.to_px()
}

/// Find the value of the last declaration of `name` in a style attribute.
pub(crate) fn declared(style: &str, name: &str) -> Option<String> {
    parse_style(style)
        .into_iter()
        .rev()
        .find(|decl| decl.name.0 == name)
        .map(|decl| decl.value)
}

fn box_length(token: &str) -> Option<String> {
    length_px(token).map(format_number)
}

fn border_width(token: &str) -> Option<String> {
    match token.to_ascii_lowercase().as_str() {
        "thin" => Some("1".into()),
        "medium" => Some("3".into()),
        "thick" => Some("5".into()),
        _ => box_length(token),
    }
}

fn font_size(value: &str) -> Option<String> {
    use self::parser::LengthUnit;

    let index = match value.to_ascii_lowercase().as_str() {
        "xx-large" => Some(0),
        "x-large" => Some(1),
        "large" => Some(2),
        "medium" => Some(3),
        "small" => Some(4),
        "x-small" => Some(5),
        "xx-small" => Some(6),
        _ => None,
    };
    if let Some(index) = index {
        return Some(FONT_SIZES[index].into());
    }
    let len = length(value)?;
    match len.unit {
        Some(LengthUnit::Pt) if len.value > 0.0 => Some(format!("{}pt", format_number(len.value))),
        _ => len
            .to_px()
            .filter(|px| *px > 0.0)
            .map(format_number),
    }
}

/// Expand a 1 to 4 value box shorthand into top, right, bottom, left.
fn expand_sides<T: Clone>(values: &[T]) -> Option<[T; 4]> {
    match values {
        [a] => Some([a.clone(), a.clone(), a.clone(), a.clone()]),
        [a, b] => Some([a.clone(), b.clone(), a.clone(), b.clone()]),
        [a, b, c] => Some([a.clone(), b.clone(), c.clone(), b.clone()]),
        [a, b, c, d] => Some([a.clone(), b.clone(), c.clone(), d.clone()]),
        _ => None,
    }
}

fn set_sides(
    props: &mut PropertySet,
    keys: &[&'static str; 4],
    value: &str,
    convert: fn(&str) -> Option<String>,
) {
    let values: Option<Vec<String>> = component_values(value).into_iter().map(convert).collect();
    if let Some(sides) = values.as_deref().and_then(expand_sides) {
        for (key, side) in keys.iter().zip(sides) {
            props.set(*key, side);
        }
    }
}

fn set_colours(props: &mut PropertySet, keys: &[&'static str; 4], value: &str) {
    let values = component_values(value);
    if let Some(sides) = expand_sides(&values) {
        for (key, side) in keys.iter().zip(sides) {
            props.set(*key, side);
        }
    }
}

/// Apply a `border` or `border-<side>` shorthand to the given sides.
fn set_border(props: &mut PropertySet, sides: &[usize], value: &str) {
    for token in component_values(value) {
        if BORDER_STYLES.contains(&token.to_ascii_lowercase().as_str()) {
            continue;
        }
        match border_width(token) {
            Some(width) => {
                for &side in sides {
                    props.set(BORDER_WIDTH[side], width.clone());
                }
            }
            None => {
                for &side in sides {
                    props.set(BORDER_COLOR[side], token);
                }
            }
        }
    }
}

fn side_index(side: &str) -> Option<usize> {
    match side {
        "top" => Some(0),
        "right" => Some(1),
        "bottom" => Some(2),
        "left" => Some(3),
        _ => None,
    }
}

/// Parse an inline style attribute, and add the properties it sets to
/// `props`.  Later declarations override earlier ones.
pub(crate) fn apply_style(style: &str, props: &mut PropertySet) {
    for decl in parse_style(style) {
        let name = decl.name.0.as_str();
        let value = decl.value.as_str();
        if value.is_empty() {
            continue;
        }
        match name {
            "font-family" => {
                let family = value.replace(['"', '\''], "");
                props.set("font-family", family.trim());
            }
            "font-style" => {
                let style = value.to_ascii_lowercase();
                if matches!(style.as_str(), "normal" | "italic" | "oblique") {
                    props.set("font-style", style);
                }
            }
            "font-weight" => {
                let weight = match value.to_ascii_lowercase().as_str() {
                    "bolder" => "bold".to_string(),
                    "lighter" => "normal".to_string(),
                    w @ ("normal" | "bold") => w.to_string(),
                    w if w.len() == 3 && w.ends_with("00") && matches!(w.as_bytes()[0], b'1'..=b'9') => {
                        w.to_string()
                    }
                    _ => continue,
                };
                props.set("font-weight", weight);
            }
            "font-size" => {
                if let Some(size) = font_size(value) {
                    props.set("font-size", size);
                }
            }
            "color" => props.set("color", value),
            "background-color" => props.set("background-color", value),
            "background" => {
                if let [colour] = component_values(value)[..] {
                    props.set("background-color", colour);
                }
            }
            "text-decoration" | "text-decoration-line" => {
                let value = value.to_ascii_lowercase();
                if value.split_whitespace().any(|v| v == "underline") {
                    props.set("text-decoration-underline", "true");
                } else if value == "none" {
                    props.set("text-decoration-underline", "false");
                }
            }
            "text-indent" => {
                if let Some(indent) = box_length(value) {
                    props.set("text-indent", indent);
                }
            }
            "text-align" => {
                if let Some(align) = text_alignment(value) {
                    props.set("text-align", align);
                }
            }
            "margin" => set_sides(props, &MARGIN, value, box_length),
            "padding" => set_sides(props, &PADDING, value, box_length),
            "border" => set_border(props, &[0, 1, 2, 3], value),
            "border-width" => set_sides(props, &BORDER_WIDTH, value, border_width),
            "border-color" => set_colours(props, &BORDER_COLOR, value),
            "list-style-type" => props.set("list-style-type", value.to_ascii_lowercase()),
            "list-style" => {
                let marker = component_values(value)
                    .into_iter()
                    .map(str::to_ascii_lowercase)
                    .find(|v| MARKER_KEYWORDS.contains(&v.as_str()));
                if let Some(marker) = marker {
                    props.set("list-style-type", marker);
                }
            }
            "width" => props.set("width", value),
            "height" => props.set("height", value),
            _ => {
                // Per-side properties: margin-top, border-left-color, etc.
                let mut parts = name.splitn(3, '-');
                let (Some(group), Some(side)) = (parts.next(), parts.next()) else {
                    continue;
                };
                let Some(side) = side_index(side) else {
                    continue;
                };
                match (group, parts.next()) {
                    ("margin", None) => {
                        if let Some(v) = box_length(value) {
                            props.set(MARGIN[side], v);
                        }
                    }
                    ("padding", None) => {
                        if let Some(v) = box_length(value) {
                            props.set(PADDING[side], v);
                        }
                    }
                    ("border", None) => set_border(props, &[side], value),
                    ("border", Some("width")) => {
                        if let Some(v) = border_width(value) {
                            props.set(BORDER_WIDTH[side], v);
                        }
                    }
                    ("border", Some("color")) => props.set(BORDER_COLOR[side], value),
                    _ => {
                        html_trace_quiet!("apply_style: ignoring {}", name);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::apply_style;
    use crate::properties::PropertySet;

    fn style(text: &str) -> PropertySet {
        let mut props = PropertySet::new();
        apply_style(text, &mut props);
        props
    }

    #[test]
    fn test_fonts() {
        let props = style("font-family: 'Times New Roman', serif; font-weight: 700; font-style: Italic");
        assert_eq!(props.get("font-family"), Some("Times New Roman, serif"));
        assert_eq!(props.get("font-weight"), Some("700"));
        assert_eq!(props.get("font-style"), Some("italic"));
    }

    #[test]
    fn test_font_size() {
        assert_eq!(style("font-size: 12pt").get("font-size"), Some("12pt"));
        assert_eq!(style("font-size: 14px").get("font-size"), Some("14"));
        assert_eq!(style("font-size: x-large").get("font-size"), Some("20pt"));
        assert_eq!(style("font-size: 120%").get("font-size"), None);
    }

    #[test]
    fn test_margin_shorthand() {
        let props = style("margin: 1px 2px 3px");
        assert_eq!(props.get("margin-top"), Some("1"));
        assert_eq!(props.get("margin-right"), Some("2"));
        assert_eq!(props.get("margin-bottom"), Some("3"));
        assert_eq!(props.get("margin-left"), Some("2"));
    }

    #[test]
    fn test_margin_side_overrides() {
        let props = style("margin: 4pt; margin-left: 0");
        assert_eq!(props.get("margin-top"), Some("5.33"));
        assert_eq!(props.get("margin-left"), Some("0"));
    }

    #[test]
    fn test_border_shorthand() {
        let props = style("border: thin solid #ff0000; border-left-width: 4px");
        assert_eq!(props.get("border-width-top"), Some("1"));
        assert_eq!(props.get("border-width-left"), Some("4"));
        assert_eq!(props.get("border-color-bottom"), Some("#ff0000"));
    }

    #[test]
    fn test_unknown_ignored() {
        assert!(style("float: left; margin-middle: 3px; zoom: 2").is_empty());
    }

    #[test]
    fn test_list_style() {
        assert_eq!(
            style("list-style: inside Upper-Roman").get("list-style-type"),
            Some("upper-roman")
        );
    }

    #[test]
    fn test_text_decoration() {
        assert_eq!(
            style("text-decoration: underline overline").get("text-decoration-underline"),
            Some("true")
        );
        assert_eq!(
            style("text-decoration: none").get("text-decoration-underline"),
            Some("false")
        );
    }
}
