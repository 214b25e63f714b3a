use std::io;

use crate::config::{self, Config};
use crate::flow::FlowKind;
use crate::render::xaml_renderer::XAML_NAMESPACE;
use crate::{convert, from_read, Error, RcDom};

/// Like assert_eq!(), but prints out the results normally as well
macro_rules! assert_eq_str {
    ($a:expr, $b:expr) => {
        if $a != $b {
            println!("<<<\n{}\n===\n{}\n>>>", $a, $b);
            assert_eq!($a, $b);
        }
    };
}

/// The full output for a root element named `root` with `body` inside.
fn wrap(root: &str, body: &str) -> String {
    if body.is_empty() {
        format!(r#"<{} xmlns="{}" />"#, root, XAML_NAMESPACE)
    } else {
        format!(r#"<{} xmlns="{}">{}</{}>"#, root, XAML_NAMESPACE, body, root)
    }
}

#[track_caller]
fn test_html_conf<F>(conf: Config, input: &str, root: &str, expected: &str, f: F)
where
    F: Fn(Config) -> Config,
{
    let result = f(conf.preserve_whitespace(false))
        .string_from_str(input)
        .unwrap();
    assert_eq_str!(result, wrap(root, expected));
}

/// Convert a whole document, and compare what's inside the `FlowDocument`.
#[track_caller]
fn test_html(input: &str, expected: &str) {
    test_html_conf(config::document(), input, "FlowDocument", expected, |c| c)
}

/// Convert in fragment mode, and compare the whole output.
#[track_caller]
fn test_fragment(input: &str, root: &str, expected: &str) {
    test_html_conf(config::fragment(), input, root, expected, |c| c)
}

const CELL: &str = r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black">"#;

#[test]
fn test_paragraph() {
    test_html(
        "<p>Hi <b>there</b></p>",
        r#"<Paragraph>Hi <Run FontWeight="bold">there</Run></Paragraph>"#,
    );
}

#[test]
fn test_standalone_preserves_whitespace() {
    assert_eq_str!(
        convert("<p>x</p>", true).unwrap(),
        format!(
            r#"<FlowDocument xmlns="{}" xml:space="preserve"><Paragraph>x</Paragraph></FlowDocument>"#,
            XAML_NAMESPACE
        )
    );
    assert_eq_str!(
        convert("<p>x</p>", false).unwrap(),
        format!(
            r#"<Section xmlns="{}" xml:space="preserve"><Paragraph>x</Paragraph></Section>"#,
            XAML_NAMESPACE
        )
    );
}

#[test]
fn test_empty_input() {
    test_html("", "<Paragraph />");
}

#[test]
fn test_div_without_blocks() {
    test_html("<div>text</div>", "<Paragraph>text</Paragraph>");
}

#[test]
fn test_div_unwrapped() {
    test_html("<div><p>x</p></div>", "<Paragraph>x</Paragraph>");
    test_html(
        "<div><div><section><p>x</p></section></div></div>",
        "<Paragraph>x</Paragraph>",
    );
}

#[test]
fn test_div_with_style() {
    test_html(
        r#"<div style="margin-left: 10px"><p>x</p></div>"#,
        r#"<Section Margin="10,0,0,0"><Paragraph>x</Paragraph></Section>"#,
    );
    test_html(
        r#"<div style="font-weight: bold"><p>x</p></div>"#,
        r#"<Section FontWeight="bold"><Paragraph>x</Paragraph></Section>"#,
    );
}

#[test]
fn test_section_borders() {
    test_html(
        r#"<div style="border: 2px solid black; padding: 4px"><p>x</p></div>"#,
        r#"<Section Padding="4" BorderBrush="black" BorderThickness="2"><Paragraph>x</Paragraph></Section>"#,
    );
}

#[test]
fn test_blockquote() {
    test_html(
        "<blockquote><p>q</p></blockquote>",
        r#"<Section Margin="16,0,0,0"><Paragraph>q</Paragraph></Section>"#,
    );
}

#[test]
fn test_implicit_paragraphs() {
    test_html(
        "Some <i>text</i><p>para</p>tail",
        concat!(
            r#"<Paragraph>Some <Run FontStyle="italic">text</Run></Paragraph>"#,
            "<Paragraph>para</Paragraph>",
            "<Paragraph>tail</Paragraph>"
        ),
    );
}

#[test]
fn test_whitespace_between_blocks() {
    test_html(
        "<p>a</p>\n  <p>b</p>\n",
        "<Paragraph>a</Paragraph><Paragraph>b</Paragraph>",
    );
}

#[test]
fn test_headings() {
    test_html(
        "<h1>Title</h1><h6>Small</h6>",
        r#"<Paragraph FontSize="22pt">Title</Paragraph><Paragraph FontSize="10pt">Small</Paragraph>"#,
    );
}

#[test]
fn test_pre() {
    test_html(
        "<pre>code</pre>",
        r#"<Paragraph FontFamily="Courier New" FontSize="8pt" TextAlignment="Left">code</Paragraph>"#,
    );
}

#[test]
fn test_alignment() {
    test_html(
        r#"<p align="right">r</p><p style="text-indent: 20px; text-align: justify">j</p>"#,
        concat!(
            r#"<Paragraph TextAlignment="Right">r</Paragraph>"#,
            r#"<Paragraph TextIndent="20" TextAlignment="Justify">j</Paragraph>"#
        ),
    );
}

#[test]
fn test_inline_style() {
    test_html(
        r#"<p><span style="color: red; font-size: 14px; text-decoration: underline">x</span></p>"#,
        r#"<Paragraph><Run FontSize="14" Foreground="red" TextDecorations="Underline">x</Run></Paragraph>"#,
    );
}

#[test]
fn test_font_tag() {
    test_html(
        r#"<p><font face="Arial" size="3" color="blue">f</font></p>"#,
        r#"<Paragraph><Run FontFamily="Arial" FontSize="12" Foreground="blue">f</Run></Paragraph>"#,
    );
}

#[test]
fn test_nested_spans() {
    test_html(
        "<p><b>bold <i>both</i></b></p>",
        r#"<Paragraph><Span FontWeight="bold">bold <Run FontStyle="italic">both</Run></Span></Paragraph>"#,
    );
}

#[test]
fn test_plain_and_empty_spans() {
    test_html(
        "<p>a<span>b</span>c</p>",
        "<Paragraph>a<Run>b</Run>c</Paragraph>",
    );
    test_html(
        "<p>a<b></b></p>",
        r#"<Paragraph>a<Run FontWeight="bold" /></Paragraph>"#,
    );
}

#[test]
fn test_unknown_inline_dropped() {
    test_html("<p>a<blink>b</blink>c</p>", "<Paragraph>ac</Paragraph>");
}

#[test]
fn test_foreign_elements_dropped() {
    test_html(
        "<p>a<svg><text>b</text></svg>c</p>",
        "<Paragraph>ac</Paragraph>",
    );
}

#[test]
fn test_suppressed() {
    test_html(
        "<head><title>T</title><style>p { color: red }</style></head><body><script>x()</script><p>a</p></body>",
        "<Paragraph>a</Paragraph>",
    );
}

#[test]
fn test_text_cleanup() {
    test_html("<p>a&nbsp;b</p>", "<Paragraph>a b</Paragraph>");
    test_html("<p>a\tb\nc</p>", "<Paragraph>abc</Paragraph>");
}

#[test]
fn test_escaping() {
    test_html(
        "<p>a &lt; b &amp; c</p>",
        "<Paragraph>a &lt; b &amp; c</Paragraph>",
    );
}

#[test]
fn test_hyperlink() {
    test_html(
        r#"<p><a href="http://example.com/page#sec">link</a></p>"#,
        r#"<Paragraph><Hyperlink NavigateUri="http://example.com/page" TargetName="sec">link</Hyperlink></Paragraph>"#,
    );
}

#[test]
fn test_hyperlink_target_only() {
    test_html(
        r##"<p><a href=" #top ">up</a></p>"##,
        r#"<Paragraph><Hyperlink TargetName="top">up</Hyperlink></Paragraph>"#,
    );
}

#[test]
fn test_hyperlink_extra_hash() {
    test_html(
        r##"<p><a href="a#b#c">x</a></p>"##,
        r#"<Paragraph><Hyperlink NavigateUri="a">x</Hyperlink></Paragraph>"#,
    );
}

#[test]
fn test_hyperlink_without_href() {
    test_html(
        "<p><a name=\"here\">plain</a></p>",
        "<Paragraph><Run>plain</Run></Paragraph>",
    );
}

#[test]
fn test_line_break() {
    test_html(
        "<p>a<br>b</p>",
        "<Paragraph>a<LineBreak />b</Paragraph>",
    );
}

#[test]
fn test_horizontal_rule() {
    test_html(
        "<p>a</p><hr>c",
        "<Paragraph>a</Paragraph><Paragraph><LineBreak />----------------------<LineBreak />c</Paragraph>",
    );
}

#[test]
fn test_custom_horizontal_rule() {
    test_html_conf(
        config::document(),
        "<hr>",
        "FlowDocument",
        "<Paragraph><LineBreak />***<LineBreak /></Paragraph>",
        |c| c.horizontal_rule("***"),
    );
}

#[test]
fn test_image_ignored() {
    test_html(r#"<p>a<img src="x.png">b</p>"#, "<Paragraph>ab</Paragraph>");
}

#[test]
fn test_unordered_list() {
    test_html(
        "<ul><li>A</li><li>B</li></ul>",
        concat!(
            r#"<List MarkerStyle="Disc">"#,
            "<ListItem><Paragraph>A</Paragraph></ListItem>",
            "<ListItem><Paragraph>B</Paragraph></ListItem>",
            "</List>"
        ),
    );
}

#[test]
fn test_ordered_list() {
    test_html(
        "<ol><li>one</li></ol>",
        r#"<List MarkerStyle="Decimal"><ListItem><Paragraph>one</Paragraph></ListItem></List>"#,
    );
}

#[test]
fn test_list_style_override() {
    test_html(
        r#"<ol style="list-style-type: upper-roman"><li>x</li></ol>"#,
        r#"<List MarkerStyle="UpperRoman"><ListItem><Paragraph>x</Paragraph></ListItem></List>"#,
    );
    test_html(
        r#"<ul style="list-style-type: wavy"><li>x</li></ul>"#,
        r#"<List MarkerStyle="Disc"><ListItem><Paragraph>x</Paragraph></ListItem></List>"#,
    );
}

#[test]
fn test_list_item_blocks() {
    test_html(
        "<ul><li><p>a</p><p>b</p></li></ul>",
        r#"<List MarkerStyle="Disc"><ListItem><Paragraph>a</Paragraph><Paragraph>b</Paragraph></ListItem></List>"#,
    );
}

#[test]
fn test_empty_list_dropped() {
    test_html("<ul></ul><p>x</p>", "<Paragraph>x</Paragraph>");
}

#[test]
fn test_orphan_list_items() {
    test_html(
        "<li>a</li><li>b</li><p>x</p><li>c</li>",
        concat!(
            "<List>",
            "<ListItem><Paragraph>a</Paragraph></ListItem>",
            "<ListItem><Paragraph>b</Paragraph></ListItem>",
            "</List>",
            "<Paragraph>x</Paragraph>",
            "<List><ListItem><Paragraph>c</Paragraph></ListItem></List>"
        ),
    );
}

#[test]
fn test_orphan_joins_list() {
    test_html(
        "<ul><li>a</li></ul><li>b</li>",
        concat!(
            r#"<List MarkerStyle="Disc">"#,
            "<ListItem><Paragraph>a</Paragraph></ListItem>",
            "<ListItem><Paragraph>b</Paragraph></ListItem>",
            "</List>"
        ),
    );
}

#[test]
fn test_single_cell_table() {
    test_html(
        "<p>before</p><table><tr><td>X</td></tr></table><p>after</p>",
        "<Paragraph>before</Paragraph><Paragraph>X</Paragraph><Paragraph>after</Paragraph>",
    );
}

#[test]
fn test_table_without_widths() {
    test_html(
        "<table><tr><td>A</td><td>B</td></tr></table>",
        &[
            "<Table><TableRowGroup><TableRow>",
            CELL,
            "<Paragraph>A</Paragraph></TableCell>",
            CELL,
            "<Paragraph>B</Paragraph></TableCell>",
            "</TableRow></TableRowGroup></Table>",
        ]
        .concat(),
    );
}

#[test]
fn test_table_empty_cell_kept() {
    test_html(
        "<table><tr><td></td><td>b</td></tr></table>",
        &[
            "<Table><TableRowGroup><TableRow>",
            r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black" />"#,
            CELL,
            "<Paragraph>b</Paragraph></TableCell>",
            "</TableRow></TableRowGroup></Table>",
        ]
        .concat(),
    );
}

#[test]
fn test_empty_table_dropped() {
    test_html("<table></table>", "");
}

#[test]
fn test_table_head_and_body() {
    test_html(
        "<table><thead><tr><th>H1</th><th>H2</th></tr></thead><tbody><tr><td>a</td><td>b</td></tr></tbody></table>",
        &[
            "<Table>",
            "<TableRowGroup><TableRow>",
            CELL,
            "<Paragraph>H1</Paragraph></TableCell>",
            CELL,
            "<Paragraph>H2</Paragraph></TableCell>",
            "</TableRow></TableRowGroup>",
            "<TableRowGroup><TableRow>",
            CELL,
            "<Paragraph>a</Paragraph></TableCell>",
            CELL,
            "<Paragraph>b</Paragraph></TableCell>",
            "</TableRow></TableRowGroup>",
            "</Table>",
        ]
        .concat(),
    );
}

#[test]
fn test_table_declared_columns() {
    test_html(
        r#"<table><colgroup><col width="30"><col></colgroup><tr><td>a</td><td>b</td></tr></table>"#,
        &[
            r#"<Table><TableColumn Width="30" /><TableColumn />"#,
            "<TableRowGroup><TableRow>",
            CELL,
            "<Paragraph>a</Paragraph></TableCell>",
            CELL,
            "<Paragraph>b</Paragraph></TableCell>",
            "</TableRow></TableRowGroup></Table>",
        ]
        .concat(),
    );
}

#[test]
fn test_table_column_geometry() {
    let spanned = |span: usize| {
        format!(
            r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black" ColumnSpan="{}">"#,
            span
        )
    };
    test_html(
        r#"<table>
        <tr><td width="100">A</td><td width="50">B</td></tr>
        <tr><td width="150">C</td></tr>
        </table>"#,
        &[
            r#"<Table><TableColumn Width="100" /><TableColumn Width="50" />"#,
            "<TableRowGroup>",
            "<TableRow>",
            spanned(1).as_str(),
            "<Paragraph>A</Paragraph></TableCell>",
            spanned(1).as_str(),
            "<Paragraph>B</Paragraph></TableCell>",
            "</TableRow>",
            "<TableRow>",
            spanned(2).as_str(),
            "<Paragraph>C</Paragraph></TableCell>",
            "</TableRow>",
            "</TableRowGroup></Table>",
        ]
        .concat(),
    );
}

#[test]
fn test_table_row_span() {
    test_html(
        r#"<table><tr><td width="50" rowspan="2">A</td><td width="50">B</td></tr><tr><td width="50">C</td></tr></table>"#,
        &[
            r#"<Table><TableColumn Width="50" /><TableColumn Width="50" />"#,
            "<TableRowGroup>",
            "<TableRow>",
            r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black" RowSpan="2" ColumnSpan="1">"#,
            "<Paragraph>A</Paragraph></TableCell>",
            r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black" ColumnSpan="1">"#,
            "<Paragraph>B</Paragraph></TableCell>",
            "</TableRow>",
            "<TableRow>",
            r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black" ColumnSpan="1">"#,
            "<Paragraph>C</Paragraph></TableCell>",
            "</TableRow>",
            "</TableRowGroup></Table>",
        ]
        .concat(),
    );
}

#[test]
fn test_table_row_span_without_widths() {
    test_html(
        r#"<table><tr><td rowspan="2">a</td><td>b</td></tr><tr><td>c</td></tr></table>"#,
        &[
            "<Table><TableRowGroup>",
            "<TableRow>",
            r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black" RowSpan="2">"#,
            "<Paragraph>a</Paragraph></TableCell>",
            CELL,
            "<Paragraph>b</Paragraph></TableCell>",
            "</TableRow>",
            "<TableRow>",
            CELL,
            "<Paragraph>c</Paragraph></TableCell>",
            "</TableRow>",
            "</TableRowGroup></Table>",
        ]
        .concat(),
    );
}

#[test]
fn test_table_row_span_in_middle() {
    let cell = |row_span: &str| {
        format!(
            r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black"{} ColumnSpan="1">"#,
            row_span
        )
    };
    test_html(
        r#"<table>
        <tr><td width="50">a</td><td width="50" rowspan="2">b</td><td width="50">c</td></tr>
        <tr><td width="50">d</td><td width="50">e</td></tr>
        </table>"#,
        &[
            r#"<Table><TableColumn Width="50" /><TableColumn Width="50" /><TableColumn Width="50" />"#,
            "<TableRowGroup>",
            "<TableRow>",
            cell("").as_str(),
            "<Paragraph>a</Paragraph></TableCell>",
            cell(r#" RowSpan="2""#).as_str(),
            "<Paragraph>b</Paragraph></TableCell>",
            cell("").as_str(),
            "<Paragraph>c</Paragraph></TableCell>",
            "</TableRow>",
            "<TableRow>",
            cell("").as_str(),
            "<Paragraph>d</Paragraph></TableCell>",
            cell("").as_str(),
            "<Paragraph>e</Paragraph></TableCell>",
            "</TableRow>",
            "</TableRowGroup></Table>",
        ]
        .concat(),
    );
}

// Some of the tracing output can overflow the stack when tracing some values.
#[cfg(not(feature = "html_trace"))]
#[test]
fn test_deeply_nested() {
    let html = "<div>".repeat(3000) + "x";
    test_html(&html, "<Paragraph>x</Paragraph>");

    let html = String::from("<p>") + &"<span>".repeat(1000) + "x";
    let expected = String::from("<Paragraph>")
        + &"<Span>".repeat(999)
        + "<Run>x</Run>"
        + &"</Span>".repeat(999)
        + "</Paragraph>";
    test_html(&html, &expected);
}

// Some of the tracing output can overflow the stack when tracing some values.
#[cfg(not(feature = "html_trace"))]
#[test]
fn test_deeply_nested_table() {
    let rpt = 1000;
    let html = "<table><tr><td>hi</td><td>".repeat(rpt) + &"</td></tr></table>".repeat(rpt);

    let open = String::from("<Table><TableRowGroup><TableRow>")
        + CELL
        + "<Paragraph>hi</Paragraph></TableCell>";
    let innermost = open.clone()
        + r#"<TableCell BorderThickness="1,1,1,1" BorderBrush="Black" />"#
        + "</TableRow></TableRowGroup></Table>";
    let expected = (open + CELL).repeat(rpt - 1)
        + &innermost
        + &"</TableCell></TableRow></TableRowGroup></Table>".repeat(rpt - 1);
    test_html(&html, &expected);
}

#[test]
fn test_fragment_without_markers() {
    test_fragment("<p>x</p>", "Section", "<Paragraph>x</Paragraph>");
}

#[test]
fn test_fragment_block_markers() {
    // Markers between blocks don't select an inline range.
    test_fragment(
        "<!--StartFragment--><p>a</p><p>b</p><!--EndFragment-->",
        "Section",
        "<Paragraph>a</Paragraph><Paragraph>b</Paragraph>",
    );
}

#[test]
fn test_fragment_in_paragraph() {
    test_fragment(
        "<p><!--StartFragment-->x <i>y</i><!--EndFragment--></p>",
        "Span",
        r#"x <Run FontStyle="italic">y</Run>"#,
    );
}

#[test]
fn test_fragment_in_span() {
    let result = config::fragment()
        .preserve_whitespace(false)
        .string_from_str("<p><b><!--StartFragment-->bold<!--EndFragment--></b></p>")
        .unwrap();
    assert_eq_str!(
        result,
        format!(
            r#"<Span xmlns="{}" FontWeight="bold">bold</Span>"#,
            XAML_NAMESPACE
        )
    );
}

#[test]
fn test_fragment_end_marker_only() {
    test_fragment("<p>a<!--EndFragment--></p>", "Span", "a");
}

#[test]
fn test_fragment_ignored_for_documents() {
    test_html(
        "<p><!--StartFragment-->x<!--EndFragment--></p>",
        "<Paragraph>x</Paragraph>",
    );
}

#[test]
fn test_conversions_independent() {
    let first = convert("<p><!--StartFragment-->x<!--EndFragment--></p>", false).unwrap();
    assert_eq_str!(
        first,
        format!(r#"<Span xmlns="{}" xml:space="preserve">x</Span>"#, XAML_NAMESPACE)
    );
    let second = convert("<p>x</p>", false).unwrap();
    assert_eq_str!(
        second,
        format!(
            r#"<Section xmlns="{}" xml:space="preserve"><Paragraph>x</Paragraph></Section>"#,
            XAML_NAMESPACE
        )
    );
}

#[test]
fn test_config_reused() {
    let conf = config::fragment().preserve_whitespace(false);
    assert_eq_str!(
        conf.string_from_str("<p><b><!--StartFragment-->a<!--EndFragment--></b></p>")
            .unwrap(),
        format!(r#"<Span xmlns="{}" FontWeight="bold">a</Span>"#, XAML_NAMESPACE)
    );
    assert_eq_str!(
        conf.string_from_str("<p><b>b</b></p>").unwrap(),
        wrap(
            "Section",
            r#"<Paragraph><Run FontWeight="bold">b</Run></Paragraph>"#
        )
    );
}

#[test]
fn test_flow_tree() {
    let tree = config::document()
        .flow_tree_from_str("<ul><li>A</li><li>B</li></ul>")
        .unwrap();
    assert_eq!(tree.kind(tree.root()), FlowKind::Document);

    let lists = tree.find_all(FlowKind::List);
    assert_eq!(lists.len(), 1);
    let list = tree.node(lists[0]);
    assert_eq!(list.attribute("MarkerStyle"), Some("Disc"));
    assert_eq!(list.children().len(), 2);
    for &item in list.children() {
        assert_eq!(tree.kind(item), FlowKind::ListItem);
        assert_eq!(tree.node(item).parent(), Some(lists[0]));
    }
    assert_eq!(tree.text_content(lists[0]), "AB");
}

#[test]
fn test_from_read() {
    let html = b"<p>read</p>";
    assert_eq_str!(
        from_read(&html[..], false).unwrap(),
        format!(
            r#"<Section xmlns="{}" xml:space="preserve"><Paragraph>read</Paragraph></Section>"#,
            XAML_NAMESPACE
        )
    );
}

#[test]
fn test_malformed_input() {
    assert_eq!(
        config::document()
            .dom_to_flow_tree(&RcDom::default())
            .unwrap_err(),
        Error::MalformedInput
    );
}

struct FailingReader;

impl io::Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Other, "broken"))
    }
}

#[test]
fn test_read_error() {
    assert!(matches!(
        from_read(FailingReader, true),
        Err(Error::IoError(_))
    ));
}
