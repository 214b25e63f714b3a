//! Parsing for the subset of CSS found in inline `style` attributes.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_until, take_while, take_while1},
    character::complete::{digit0, digit1, one_of},
    combinator::{all_consuming, map, opt, recognize, value},
    error::ErrorKind,
    multi::many0,
    sequence::delimited,
    IResult, Parser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LengthUnit {
    // Absolute units
    In,
    Cm,
    Mm,
    Pt,
    Pc,
    Px,
    // Relative units
    Em,
    Ex,
    Percent,
}

/// A number with an optional unit.  A bare number has no unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Length {
    pub value: f32,
    pub unit: Option<LengthUnit>,
}

impl Length {
    /// The length in device independent pixels, if it is absolute.
    pub fn to_px(self) -> Option<f32> {
        let px = match self.unit {
            None | Some(LengthUnit::Px) => self.value,
            Some(LengthUnit::Pt) => self.value * 96.0 / 72.0,
            Some(LengthUnit::Pc) => self.value * 16.0,
            Some(LengthUnit::In) => self.value * 96.0,
            Some(LengthUnit::Cm) => self.value * 96.0 / 2.54,
            Some(LengthUnit::Mm) => self.value * 96.0 / 25.4,
            Some(LengthUnit::Em) | Some(LengthUnit::Ex) | Some(LengthUnit::Percent) => {
                return None
            }
        };
        Some(px)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum Importance {
    Default,
    Important,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) struct PropertyName(pub String);

#[derive(Debug, PartialEq)]
pub(crate) struct Declaration {
    pub name: PropertyName,
    pub value: String,
    pub important: Importance,
}

fn fail<T>(text: &str) -> IResult<&str, T> {
    Err(nom::Err::Error(nom::error::Error::new(text, ErrorKind::Fail)))
}

fn match_comment(text: &str) -> IResult<&str, ()> {
    let (rest, _) = tag("/*").parse(text)?;
    let (rest, _) = take_until("*/").parse(rest)?;
    map(tag("*/"), |_| ()).parse(rest)
}

fn match_whitespace_item(text: &str) -> IResult<&str, ()> {
    alt((map(one_of(" \t\r\n\x0c"), |_c| ()), match_comment)).parse(text)
}

fn skip_optional_whitespace(text: &str) -> IResult<&str, ()> {
    map(many0(match_whitespace_item), |_res| ()).parse(text)
}

fn skip_separators(text: &str) -> IResult<&str, ()> {
    map(
        many0(alt((match_whitespace_item, map(tag(";"), |_| ())))),
        |_res| (),
    )
    .parse(text)
}

fn nmstart_char(s: &str) -> IResult<&str, char> {
    let mut iter = s.chars();
    match iter.next() {
        Some(c @ ('_' | 'a'..='z' | 'A'..='Z')) => Ok((iter.as_str(), c.to_ascii_lowercase())),
        _ => fail(s),
    }
}

fn nmchar_char(s: &str) -> IResult<&str, char> {
    let mut iter = s.chars();
    match iter.next() {
        Some(c @ ('_' | 'a'..='z' | 'A'..='Z' | '0'..='9' | '-')) => {
            Ok((iter.as_str(), c.to_ascii_lowercase()))
        }
        _ => fail(s),
    }
}

fn parse_ident(text: &str) -> IResult<&str, String> {
    let (rest, _) = skip_optional_whitespace(text)?;
    let (rest, dash) = opt(tag("-")).parse(rest)?;
    let (rest, start) = nmstart_char(rest)?;
    let (rest, chars) = many0(nmchar_char).parse(rest)?;

    let mut name = String::new();
    if dash.is_some() {
        name.push('-');
    }
    name.push(start);
    name.extend(chars);
    Ok((rest, name))
}

fn parse_property_name(text: &str) -> IResult<&str, PropertyName> {
    map(parse_ident, PropertyName).parse(text)
}

fn parse_value(text: &str) -> IResult<&str, &str> {
    take_while(|c| c != ';' && c != '!').parse(text)
}

fn parse_important(text: &str) -> IResult<&str, Importance> {
    let (rest, (_, _ws1, id, _ws2)) = (
        tag("!"),
        skip_optional_whitespace,
        parse_ident,
        skip_optional_whitespace,
    )
        .parse(text)?;
    if id != "important" {
        return fail(text);
    }
    Ok((rest, Importance::Important))
}

pub(crate) fn parse_declaration(text: &str) -> IResult<&str, Declaration> {
    let (rest, (name, _ws1, _colon, _ws2, value, important)) = (
        parse_property_name,
        skip_optional_whitespace,
        tag(":"),
        skip_optional_whitespace,
        parse_value,
        opt(parse_important),
    )
        .parse(text)?;
    Ok((
        rest,
        Declaration {
            name,
            value: value.trim().to_string(),
            important: important.unwrap_or(Importance::Default),
        },
    ))
}

/// Parse the contents of a `style` attribute.  Declarations which can't be
/// parsed are skipped up to the next `;`.
pub(crate) fn parse_style(text: &str) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut rest = text;
    loop {
        if let Ok((r, ())) = skip_separators(rest) {
            rest = r;
        }
        if rest.is_empty() {
            break;
        }
        match parse_declaration(rest) {
            Ok((r, decl)) => {
                declarations.push(decl);
                rest = r;
            }
            Err(_) => {
                html_trace_quiet!("parse_style: skipping bad declaration in {:?}", rest);
            }
        }
        rest = match rest.find(';') {
            Some(pos) => &rest[pos..],
            None => "",
        };
    }
    declarations
}

fn parse_number(text: &str) -> IResult<&str, f32> {
    let (rest, numstr) = recognize((
        opt(one_of("+-")),
        alt((recognize((digit0, tag("."), digit1)), digit1)),
    ))
    .parse(text)?;
    match numstr.parse::<f32>() {
        Ok(val) => Ok((rest, val)),
        Err(_) => fail(text),
    }
}

fn parse_unit(text: &str) -> IResult<&str, LengthUnit> {
    alt((
        value(LengthUnit::Percent, tag("%")),
        value(LengthUnit::In, tag_no_case("in")),
        value(LengthUnit::Cm, tag_no_case("cm")),
        value(LengthUnit::Mm, tag_no_case("mm")),
        value(LengthUnit::Pt, tag_no_case("pt")),
        value(LengthUnit::Pc, tag_no_case("pc")),
        value(LengthUnit::Px, tag_no_case("px")),
        value(LengthUnit::Em, tag_no_case("em")),
        value(LengthUnit::Ex, tag_no_case("ex")),
    ))
    .parse(text)
}

fn parse_length(text: &str) -> IResult<&str, Length> {
    let (rest, _) = skip_optional_whitespace(text)?;
    let (rest, (value, unit)) = (parse_number, opt(parse_unit)).parse(rest)?;
    let (rest, _) = skip_optional_whitespace(rest)?;
    Ok((rest, Length { value, unit }))
}

/// Parse a complete value as a single length.
pub(crate) fn length(text: &str) -> Option<Length> {
    all_consuming(parse_length)
        .parse(text)
        .ok()
        .map(|(_, len)| len)
}

fn component_value(text: &str) -> IResult<&str, &str> {
    alt((
        recognize((
            take_while1(|c: char| c != '(' && !c.is_whitespace()),
            tag("("),
            take_until(")"),
            tag(")"),
        )),
        take_while1(|c: char| !c.is_whitespace()),
    ))
    .parse(text)
}

/// Split a property value into its space separated components, keeping
/// function calls such as `rgb(1, 2, 3)` together.
pub(crate) fn component_values(text: &str) -> Vec<&str> {
    match many0(delimited(
        skip_optional_whitespace,
        component_value,
        skip_optional_whitespace,
    ))
    .parse(text)
    {
        Ok((_, values)) => values,
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod test {
    use super::{Declaration, Importance, Length, LengthUnit, PropertyName};

    fn decl(name: &str, value: &str) -> Declaration {
        Declaration {
            name: PropertyName(name.into()),
            value: value.into(),
            important: Importance::Default,
        }
    }

    #[test]
    fn test_parse_decl() {
        assert_eq!(
            super::parse_declaration("foo:bar;"),
            Ok((";", decl("foo", "bar")))
        );
    }

    #[test]
    fn test_parse_style() {
        assert_eq!(
            super::parse_style("Color: red; font-weight :bold"),
            vec![decl("color", "red"), decl("font-weight", "bold")]
        );
    }

    #[test]
    fn test_parse_important() {
        assert_eq!(
            super::parse_style("color: red !important; margin: 0"),
            vec![
                Declaration {
                    name: PropertyName("color".into()),
                    value: "red".into(),
                    important: Importance::Important,
                },
                decl("margin", "0"),
            ]
        );
    }

    #[test]
    fn test_parse_style_skips_junk() {
        assert_eq!(
            super::parse_style(";; 12: x; /* note */ width: 10px;;garbage;height:2pt"),
            vec![decl("width", "10px"), decl("height", "2pt")]
        );
    }

    #[test]
    fn test_parse_empty_style() {
        assert_eq!(super::parse_style(""), vec![]);
        assert_eq!(super::parse_style("  ;  "), vec![]);
    }

    #[test]
    fn test_length() {
        assert_eq!(
            super::length("12pt"),
            Some(Length {
                value: 12.0,
                unit: Some(LengthUnit::Pt)
            })
        );
        assert_eq!(
            super::length(" -1.5em "),
            Some(Length {
                value: -1.5,
                unit: Some(LengthUnit::Em)
            })
        );
        assert_eq!(
            super::length("40"),
            Some(Length {
                value: 40.0,
                unit: None
            })
        );
        assert_eq!(super::length("12pts"), None);
        assert_eq!(super::length("wide"), None);
    }

    #[test]
    fn test_length_to_px() {
        assert_eq!(super::length("72pt").and_then(Length::to_px), Some(96.0));
        assert_eq!(super::length("1in").and_then(Length::to_px), Some(96.0));
        assert_eq!(super::length("50%").and_then(Length::to_px), None);
    }

    #[test]
    fn test_component_values() {
        assert_eq!(
            super::component_values(" 1px  solid rgb(1, 2, 3) "),
            vec!["1px", "solid", "rgb(1, 2, 3)"]
        );
        assert_eq!(super::component_values(""), Vec::<&str>::new());
    }
}
