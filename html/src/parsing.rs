use lazy_static::lazy_static;
use nom::{
    branch::alt,
    bytes::complete::{is_not, tag, tag_no_case, take_until, take_while1},
    character::complete::{
        alpha1, alphanumeric1, char, digit1, hex_digit1, multispace0, multispace1, one_of,
    },
    combinator::{map, map_opt, not, opt, recognize, value, verify},
    error::{Error as NomError, ErrorKind},
    multi::many0,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, span, trace, Level};

use super::dom::*;

/// Deepest element nesting the parser accepts
pub const MAX_NESTING: usize = 512;

lazy_static! {
    static ref VOID_ELEMENTS: HashSet<&'static str> = [
        "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param",
        "source", "track", "wbr",
    ]
    .into_iter()
    .collect();
    // Contents are kept verbatim up to the matching close tag
    static ref RAW_TEXT_ELEMENTS: HashSet<&'static str> = ["script", "style"].into_iter().collect();
    static ref NAMED_ENTITIES: HashMap<&'static str, char> = [
        ("amp", '&'),
        ("lt", '<'),
        ("gt", '>'),
        ("quot", '"'),
        ("apos", '\''),
        ("nbsp", '\u{a0}'),
        ("copy", '\u{a9}'),
        ("reg", '\u{ae}'),
        ("hellip", '\u{2026}'),
        ("mdash", '\u{2014}'),
        ("ndash", '\u{2013}'),
    ]
    .into_iter()
    .collect();
}

#[derive(Debug, Clone, Error, Eq, PartialEq)]
pub enum ParseError {
    #[error("malformed markup at byte {offset}")]
    Syntax { offset: usize },
    #[error("closing tag </{found}> at byte {offset} does not match <{expected}>")]
    MismatchedTag {
        offset: usize,
        expected: String,
        found: String,
    },
    #[error("closing tag </{name}> at byte {offset} has no open element")]
    UnexpectedCloseTag { offset: usize, name: String },
    #[error("element <{name}> is never closed")]
    UnclosedTag { name: String },
    #[error("unexpected content after the root node at byte {offset}")]
    TrailingContent { offset: usize },
    #[error("elements nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

#[derive(Debug, Clone, Eq, PartialEq)]
enum Token<'a> {
    Doctype,
    Comment,
    Open {
        element: DOMElement,
        self_closing: bool,
    },
    Close(String),
    Text(&'a str),
}

/// Attempt to parse a string as a valid tag name, lower-cased
fn parse_tag_name(input: &str) -> IResult<&str, String> {
    let name = verify(
        take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':')),
        |s: &str| s.starts_with(|c: char| c.is_ascii_alphabetic()),
    );
    map(name, str::to_ascii_lowercase)(input)
}

/// Parse a tag in the form `</name>`, returning `name`
fn parse_close_tag(input: &str) -> IResult<&str, String> {
    let (remaining, (_, name, _, _)) =
        tuple((tag("</"), parse_tag_name, multispace0, char('>')))(input)?;
    Ok((remaining, name))
}

/// Parse a tag in the form `<name attr=value ...>` or `<name ... />`, returning the
/// [`DOMElement`] and whether the tag closed itself
fn parse_open_tag(input: &str) -> IResult<&str, (DOMElement, bool)> {
    let (rest, (_, name, attrs, _, self_closing, _)) = tuple((
        char('<'),
        parse_tag_name,
        many0(preceded(multispace1, single_attr_parser)),
        multispace0,
        opt(char('/')),
        char('>'),
    ))(input)?;
    let attributes = attrs
        .into_iter()
        .map(|(k, v)| (k.to_ascii_lowercase(), decode_entities(v).into_owned()))
        .collect();
    Ok((
        rest,
        (DOMElement::new(name, Some(attributes)), self_closing.is_some()),
    ))
}

fn parse_comment(input: &str) -> IResult<&str, &str> {
    delimited(tag("<!--"), take_until("-->"), tag("-->"))(input)
}

fn parse_doctype(input: &str) -> IResult<&str, &str> {
    recognize(tuple((tag_no_case("<!doctype"), take_until(">"), char('>'))))(input)
}

/// Parse the text up to the next tag
fn parse_text(input: &str) -> IResult<&str, &str> {
    is_not("<")(input)
}

/// A `<` that cannot start any tag is ordinary text
fn parse_stray_lt(input: &str) -> IResult<&str, &str> {
    terminated(tag("<"), not(alt((tag("/"), tag("!"), alpha1))))(input)
}

fn parse_token(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::Comment, parse_comment),
        value(Token::Doctype, parse_doctype),
        map(parse_close_tag, Token::Close),
        map(parse_open_tag, |(element, self_closing)| Token::Open {
            element,
            self_closing,
        }),
        map(alt((parse_text, parse_stray_lt)), Token::Text),
    ))(input)
}

/// Consume the body of a raw text element along with its closing tag. The closing tag
/// matches in any case and must end right after the name (`</script >`, not `</scripts>`).
fn parse_raw_text<'a>(input: &'a str, name: &str) -> IResult<&'a str, &'a str> {
    let close = format!("</{}", name);
    let mut closing = tuple((tag_no_case(close.as_str()), multispace0, char('>')));
    let mut from = 0;
    while let Some(pos) = input[from..].find('<') {
        let start = from + pos;
        let attempt: IResult<&str, _> = closing(&input[start..]);
        if let Ok((rest, _)) = attempt {
            return Ok((rest, &input[..start]));
        }
        from = start + 1;
    }
    Err(nom::Err::Error(NomError::new(input, ErrorKind::TakeUntil)))
}

// Attribute parsing below

fn parse_single_quoted(input: &str) -> IResult<&str, &str> {
    map(delimited(char('\''), opt(is_not("'")), char('\'')), |v| {
        v.unwrap_or("")
    })(input)
}

fn parse_double_quoted(input: &str) -> IResult<&str, &str> {
    map(delimited(char('"'), opt(is_not("\"")), char('"')), |v| {
        v.unwrap_or("")
    })(input)
}

fn parse_unquoted(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n\"'=<>`")(input)
}

fn value_parser(input: &str) -> IResult<&str, &str> {
    alt((parse_single_quoted, parse_double_quoted, parse_unquoted))(input)
}

fn name_parser(input: &str) -> IResult<&str, &str> {
    is_not(" \t\r\n\"'<>/=")(input)
}

/// `name`, `name=value`, `name='value'` or `name="value"`; a bare name has an empty value
fn single_attr_parser(input: &str) -> IResult<&str, (&str, &str)> {
    let assignment = preceded(tuple((multispace0, char('='), multispace0)), value_parser);
    map(pair(name_parser, opt(assignment)), |(k, v)| {
        (k, v.unwrap_or(""))
    })(input)
}

// Character references

fn numeric_reference(input: &str) -> IResult<&str, char> {
    let hex = map_opt(preceded(one_of("xX"), hex_digit1), |h: &str| {
        u32::from_str_radix(h, 16).ok().and_then(char::from_u32)
    });
    let dec = map_opt(digit1, |d: &str| d.parse::<u32>().ok().and_then(char::from_u32));
    preceded(char('#'), alt((hex, dec)))(input)
}

fn named_reference(input: &str) -> IResult<&str, char> {
    map_opt(alphanumeric1, |name: &str| NAMED_ENTITIES.get(name).copied())(input)
}

fn character_reference(input: &str) -> IResult<&str, char> {
    delimited(char('&'), alt((numeric_reference, named_reference)), char(';'))(input)
}

/// Replace character references such as `&amp;` or `&#x41;`. Unknown references are kept as written.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
    if !input.contains('&') {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match character_reference(rest) {
            Ok((remaining, c)) => {
                out.push(c);
                rest = remaining;
            }
            Err(_) => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Builds a [`Document`] out of the token stream
struct TreeBuilder<'a> {
    input: &'a str,
    document: Document,
    open: Vec<(NodeId, String)>,
    pending_text: String,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input,
            document: Document::new(),
            open: vec![],
            pending_text: String::new(),
        }
    }

    fn offset(&self, rest: &str) -> usize {
        self.input.len() - rest.len()
    }

    /// Attach `id` to the current open element, or make it the root
    fn attach(&mut self, id: NodeId, offset: usize) -> Result<(), ParseError> {
        match self.open.last() {
            Some(&(parent, _)) => {
                self.document.append_child(parent, id);
            }
            None if self.document.root().is_none() => self.document.set_root(Some(id)),
            None => return Err(ParseError::TrailingContent { offset }),
        }
        Ok(())
    }

    /// Turn the text gathered since the last tag into a node. Whitespace outside the
    /// root element is dropped.
    fn flush_text(&mut self, offset: usize) -> Result<(), ParseError> {
        if self.pending_text.is_empty() {
            return Ok(());
        }
        let text = std::mem::take(&mut self.pending_text);
        if self.open.is_empty() && text.trim().is_empty() {
            return Ok(());
        }
        let id = self.document.create_text(text);
        self.attach(id, offset)
    }

    fn run(mut self) -> Result<Document, ParseError> {
        let mut rest = self.input;
        while !rest.is_empty() {
            let offset = self.offset(rest);
            let (remaining, token) =
                parse_token(rest).map_err(|_| ParseError::Syntax { offset })?;
            trace!(offset, ?token, "Token");
            rest = remaining;
            if let Token::Text(text) = token {
                self.pending_text.push_str(&decode_entities(text));
                continue;
            }
            self.flush_text(offset)?;
            match token {
                Token::Text(_) | Token::Comment => {}
                Token::Doctype => {
                    if self.document.root().is_some() || !self.open.is_empty() {
                        return Err(ParseError::Syntax { offset });
                    }
                }
                Token::Open {
                    element,
                    self_closing,
                } => {
                    if self.open.len() >= MAX_NESTING {
                        return Err(ParseError::NestingTooDeep(MAX_NESTING));
                    }
                    let name = element.tag_name.clone();
                    let id = self
                        .document
                        .create_element(&name, element.attributes);
                    self.attach(id, offset)?;
                    if self_closing || VOID_ELEMENTS.contains(name.as_str()) {
                        continue;
                    }
                    if RAW_TEXT_ELEMENTS.contains(name.as_str()) {
                        let (remaining, body) = parse_raw_text(rest, &name)
                            .map_err(|_| ParseError::UnclosedTag { name: name.clone() })?;
                        if !body.is_empty() {
                            let text = self.document.create_text(body);
                            self.document.append_child(id, text);
                        }
                        rest = remaining;
                        continue;
                    }
                    self.open.push((id, name));
                }
                Token::Close(name) => {
                    if VOID_ELEMENTS.contains(name.as_str()) {
                        continue;
                    }
                    match self.open.pop() {
                        Some((_, expected)) if expected == name => {}
                        Some((_, expected)) => {
                            return Err(ParseError::MismatchedTag {
                                offset,
                                expected,
                                found: name,
                            })
                        }
                        None => return Err(ParseError::UnexpectedCloseTag { offset, name }),
                    }
                }
            }
        }
        self.flush_text(self.input.len())?;
        if let Some((_, name)) = self.open.pop() {
            return Err(ParseError::UnclosedTag { name });
        }
        Ok(self.document)
    }
}

/// Parse a complete HTML document. Empty (or whitespace and comment only) input gives
/// a document without a root.
pub fn parse(input: &str) -> Result<Document, ParseError> {
    let span = span!(Level::DEBUG, "Parsing document", bytes = input.len());
    let _enter = span.enter();
    let document = TreeBuilder::new(input).run()?;
    debug!(nodes = document.len(), "Parsed document");
    Ok(document)
}

#[cfg(test)]
#[test]
fn test_tag_parse() {
    let data = r#"<div>"#;
    let target = DOMElement {
        tag_name: "div".to_string(),
        attributes: DOMAttributes::empty(),
    };
    assert_eq!(parse_open_tag(data).unwrap(), ("", (target, false)));

    let data = r#"<DIV class=nothing>"#;
    let target = DOMElement::new("div", Some(crate::attributes!("class" => "nothing")));
    assert_eq!(parse_open_tag(data).unwrap(), ("", (target, false)));

    let data = r#"<div attr1 attr2=two attr3='three' attr4="number four">"#;
    let target = DOMElement::new(
        "div",
        Some(crate::attributes!(
            "attr1" => "",
            "attr2" => "two",
            "attr3" => "three",
            "attr4" => "number four",
        )),
    );
    assert_eq!(parse_open_tag(data).unwrap(), ("", (target, false)));

    let data = r#"<br/>"#;
    let target = DOMElement::new("br", None);
    assert_eq!(parse_open_tag(data).unwrap(), ("", (target, true)));

    let data = r#"<img src = "a.png" alt='' />"#;
    let target = DOMElement::new(
        "img",
        Some(crate::attributes!("src" => "a.png", "alt" => "")),
    );
    assert_eq!(parse_open_tag(data).unwrap(), ("", (target, true)));
}

#[cfg(test)]
#[test]
fn test_attribute_order_and_duplicates() {
    let (_, (element, _)) = parse_open_tag(r#"<a z=1 b=2 z=3 m=4>"#).unwrap();
    let names: Vec<_> = element.attributes.iter().collect();
    assert_eq!(names, vec![("z", "1"), ("b", "2"), ("m", "4")]);
    assert_eq!(element.attributes.len(), 3);
    assert_eq!(element.attributes.get("z"), Some("1"));
}

#[cfg(test)]
#[test]
fn test_close_tag_parse() {
    assert_eq!(parse_close_tag("</p>").unwrap(), ("", "p".to_string()));
    assert_eq!(parse_close_tag("</H1 >rest").unwrap(), ("rest", "h1".to_string()));
    assert!(parse_close_tag("</--->").is_err());
}

#[cfg(test)]
#[test]
fn test_token_parse() {
    assert_eq!(parse_token("<!-- note --><p>").unwrap(), ("<p>", Token::Comment));
    assert_eq!(parse_token("<!DOCTYPE html>\n").unwrap(), ("\n", Token::Doctype));
    assert_eq!(parse_token("a < b").unwrap(), ("< b", Token::Text("a ")));
    assert_eq!(parse_token("< b").unwrap(), (" b", Token::Text("<")));
    assert!(parse_token("<!bogus>").is_err());
    assert!(parse_token("<div").is_err());
}

#[cfg(test)]
#[test]
fn test_decode_entities() {
    assert_eq!(decode_entities("plain"), Cow::Borrowed("plain"));
    assert_eq!(decode_entities("a &amp; b &lt;c&gt;"), "a & b <c>");
    assert_eq!(decode_entities("&#65;&#x42;&#X43;"), "ABC");
    assert_eq!(decode_entities("&quot;&apos;&nbsp;"), "\"'\u{a0}");
    assert_eq!(decode_entities("&bogus; & &amp"), "&bogus; & &amp");
}

#[cfg(test)]
#[test]
fn test_raw_text() {
    assert_eq!(
        parse_raw_text("if (a < b) {}</script >tail", "script").unwrap(),
        ("tail", "if (a < b) {}")
    );
    assert_eq!(
        parse_raw_text("a</scripts>b</SCRIPT>", "script").unwrap(),
        ("", "a</scripts>b")
    );
    assert!(parse_raw_text("never closed", "style").is_err());
    assert!(parse_raw_text("only a prefix </styl>", "style").is_err());
}
