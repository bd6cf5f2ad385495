//! Structural queries
//!
//! Every rule kind maps onto one of four selector shapes. Backends either
//! hand the rendered CSS to a native selector engine or evaluate the shape
//! directly; [`Query::check`] gives the direct evaluators the same notion of
//! "this would not parse" that a native engine has.
//!
//! Values are rendered verbatim. Nothing is escaped.

use std::fmt;

use crate::error::SelectorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query<'a> {
    /// `.name`
    Class(&'a str),
    /// `tag[attr*="value"]`
    AttrContains {
        tag: &'a str,
        attr: &'a str,
        value: &'a str,
    },
    /// `tag`
    Tag(&'a str),
    /// `[attr="value"]`
    AttrEquals { attr: &'a str, value: &'a str },
}

impl Query<'_> {
    /// Verify that the rendered selector is syntactically valid.
    pub fn check(&self) -> Result<(), SelectorError> {
        match *self {
            Query::Class(name) => check_ident("class", name),
            Query::AttrContains { tag, attr, value } => {
                check_ident("tag", tag)?;
                check_ident("attribute", attr)?;
                check_string(value)
            }
            Query::Tag(tag) => check_ident("tag", tag),
            Query::AttrEquals { attr, value } => {
                check_ident("attribute", attr)?;
                check_string(value)
            }
        }
    }
}

impl fmt::Display for Query<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Class(name) => write!(f, ".{}", name),
            Query::AttrContains { tag, attr, value } => write!(f, "{}[{}*=\"{}\"]", tag, attr, value),
            Query::Tag(tag) => f.write_str(tag),
            Query::AttrEquals { attr, value } => write!(f, "[{}=\"{}\"]", attr, value),
        }
    }
}

fn is_ident_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || !ch.is_ascii()
}

fn is_ident_char(ch: char) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit() || ch == '-'
}

/// CSS identifier without escapes: `-`? ident-start ident-char*, or `--` ident-char*.
fn check_ident(part: &'static str, value: &str) -> Result<(), SelectorError> {
    let invalid = || SelectorError::InvalidIdentifier {
        part,
        value: value.to_string(),
    };

    let mut chars = value.chars();
    let first = chars.next().ok_or_else(invalid)?;
    let valid_start = match first {
        '-' => match chars.clone().next() {
            Some(second) => second == '-' || is_ident_start(second),
            None => false,
        },
        ch => is_ident_start(ch),
    };

    if !valid_start || !chars.all(is_ident_char) {
        return Err(invalid());
    }
    Ok(())
}

/// Contents of a double-quoted CSS string.
fn check_string(value: &str) -> Result<(), SelectorError> {
    let breaks = value.contains(&['"', '\n', '\r', '\u{c}'][..]) || value.ends_with('\\');
    if breaks {
        return Err(SelectorError::UnterminatedString {
            value: value.to_string(),
        });
    }
    Ok(())
}
