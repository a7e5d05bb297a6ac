//! Patch path grammar
//!
//! Paths address a field inside a serialized entity: dotted fields with
//! an optional array index or append sentinel on each step.
//!
//! ```text
//! power            scalar field
//! art.tint         nested field
//! modifiers[2]     array element at index 2
//! modifiers[-]     array append position
//! ```

use crate::{EngineError, Result};
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, digit1},
    combinator::{all_consuming, map, map_res, opt, recognize},
    multi::separated_list1,
    sequence::{delimited, pair},
    IResult,
};

/// One step of a parsed patch path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Named field of an object
    Field(String),
    /// Existing element of an array
    Index(usize),
    /// One past the end of an array; only valid as the final step of an
    /// add operation
    Append,
}

/// Parse a full path, rejecting trailing garbage
pub fn parse(input: &str) -> Result<Vec<PathSegment>> {
    match all_consuming(path)(input) {
        Ok((_, segments)) => Ok(segments),
        Err(_) => Err(EngineError::InvalidCommand(format!(
            "bad patch path {input:?}"
        ))),
    }
}

/// Render segments back to the wire grammar. Inverse of [`parse`] for
/// every path `parse` accepts.
pub fn format(segments: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            PathSegment::Field(name) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(name);
            }
            PathSegment::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            PathSegment::Append => out.push_str("[-]"),
        }
    }
    out
}

fn path(input: &str) -> IResult<&str, Vec<PathSegment>> {
    map(separated_list1(char('.'), segment), |segments| {
        segments.into_iter().flatten().collect()
    })(input)
}

/// `field` or `field[idx]`; the index binds to the field before it
fn segment(input: &str) -> IResult<&str, Vec<PathSegment>> {
    map(pair(ident, opt(index)), |(field, idx)| {
        let mut out = vec![PathSegment::Field(field.to_string())];
        out.extend(idx);
        out
    })(input)
}

fn ident(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

fn index(input: &str) -> IResult<&str, PathSegment> {
    delimited(
        char('['),
        alt((
            map(char('-'), |_| PathSegment::Append),
            map_res(digit1, |digits: &str| {
                digits.parse::<usize>().map(PathSegment::Index)
            }),
        )),
        char(']'),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_field() {
        assert_eq!(
            parse("power").unwrap(),
            vec![PathSegment::Field("power".to_string())]
        );
    }

    #[test]
    fn test_nested_field() {
        assert_eq!(
            parse("art.tint").unwrap(),
            vec![
                PathSegment::Field("art".to_string()),
                PathSegment::Field("tint".to_string()),
            ]
        );
    }

    #[test]
    fn test_array_index() {
        assert_eq!(
            parse("modifiers[2]").unwrap(),
            vec![
                PathSegment::Field("modifiers".to_string()),
                PathSegment::Index(2),
            ]
        );
    }

    #[test]
    fn test_append_sentinel() {
        assert_eq!(
            parse("modifiers[-]").unwrap(),
            vec![
                PathSegment::Field("modifiers".to_string()),
                PathSegment::Append,
            ]
        );
    }

    #[test]
    fn test_index_then_nested_field() {
        assert_eq!(
            parse("slots[3].card").unwrap(),
            vec![
                PathSegment::Field("slots".to_string()),
                PathSegment::Index(3),
                PathSegment::Field("card".to_string()),
            ]
        );
    }

    #[test]
    fn test_rejects_malformed_paths() {
        for bad in ["", ".", "a.", ".a", "[2]", "a[2", "a[]", "a[2]b", "a..b", "a[-2]"] {
            assert!(parse(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_format_round_trips() {
        for path in ["power", "art.tint", "modifiers[2]", "modifiers[-]", "slots[0].card"] {
            assert_eq!(format(&parse(path).unwrap()), path);
        }
    }
}
