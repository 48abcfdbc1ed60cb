use nom::IResult;
use nom::Parser;
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until, take_while};
use nom::character::complete::{anychar, satisfy};
use nom::combinator::{all_consuming, map, recognize, rest, verify};
use nom::multi::many0;
use nom::sequence::{delimited, pair};

use crate::template::{Template, TemplatePart};

/// Parses a prompt body into literal and placeholder parts.
///
/// Never fails on well-formed UTF-8: a `{{` that does not open a valid token is
/// consumed as literal text, one character at a time.
pub fn parse_template(input: &str) -> IResult<&str, Template> {
    all_consuming(map(many0(parse_element), |parts| Template {
        parts: merge_literals(parts),
    }))
    .parse(input)
}

pub fn parse_element(input: &str) -> IResult<&str, TemplatePart> {
    alt((
        map(parse_placeholder, |key| TemplatePart::Placeholder(key.to_string())),
        map(parse_literal_text, |text| TemplatePart::Literal(text.to_string())),
        map(recognize(anychar), |text: &str| TemplatePart::Literal(text.to_string())),
    ))
    .parse(input)
}

pub fn parse_literal_text(input: &str) -> IResult<&str, &str> {
    verify(alt((take_until("{{"), rest)), |s: &&str| !s.is_empty()).parse(input)
}

pub fn parse_placeholder(input: &str) -> IResult<&str, &str> {
    delimited(tag("{{"), identifier, tag("}}")).parse(input)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    // [A-Za-z][A-Za-z0-9_]*
    recognize(pair(
        satisfy(|c: char| c.is_ascii_alphabetic()),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))
    .parse(input)
}

fn merge_literals(parts: Vec<TemplatePart>) -> Vec<TemplatePart> {
    let mut merged: Vec<TemplatePart> = Vec::with_capacity(parts.len());
    for part in parts {
        if let TemplatePart::Literal(text) = &part {
            if let Some(TemplatePart::Literal(prev)) = merged.last_mut() {
                prev.push_str(text);
                continue;
            }
        }
        merged.push(part);
    }
    merged
}
