//! Implementation of `Renderer` which writes XAML presentation markup.

use html_escape::{encode_double_quoted_attribute, encode_text};

use super::Renderer;

/// The namespace declared on the root element.
pub const XAML_NAMESPACE: &str = "http://schemas.microsoft.com/winfx/2006/xaml/presentation";

/// A renderer which writes a flow document tree as a XAML string.
#[derive(Debug, Clone)]
pub struct XamlRenderer {
    out: String,
    depth: usize,
    preserve_whitespace: bool,
}

impl XamlRenderer {
    /// Create a new renderer.  With `preserve_whitespace`, the root element
    /// asks XAML readers to keep the whitespace inside text runs.
    pub fn new(preserve_whitespace: bool) -> XamlRenderer {
        XamlRenderer {
            out: String::new(),
            depth: 0,
            preserve_whitespace,
        }
    }

    fn write_attribute(&mut self, name: &str, value: &str) {
        self.out.push(' ');
        self.out.push_str(name);
        self.out.push_str("=\"");
        self.out.push_str(&encode_double_quoted_attribute(value));
        self.out.push('"');
    }

    fn write_open(&mut self, name: &str, attributes: &[(String, String)]) {
        self.out.push('<');
        self.out.push_str(name);
        if self.depth == 0 {
            self.write_attribute("xmlns", XAML_NAMESPACE);
            if self.preserve_whitespace {
                self.write_attribute("xml:space", "preserve");
            }
        }
        for (name, value) in attributes {
            self.write_attribute(name, value);
        }
    }
}

impl Renderer for XamlRenderer {
    type Output = String;

    fn start_element(&mut self, name: &str, attributes: &[(String, String)]) {
        self.write_open(name, attributes);
        self.out.push('>');
        self.depth += 1;
    }

    fn empty_element(&mut self, name: &str, attributes: &[(String, String)]) {
        self.write_open(name, attributes);
        self.out.push_str(" />");
    }

    fn end_element(&mut self, name: &str) {
        self.depth = self.depth.saturating_sub(1);
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push('>');
    }

    fn add_text(&mut self, text: &str) {
        self.out.push_str(&encode_text(text));
    }

    fn finish(self) -> String {
        self.out
    }
}
