use std::fmt;

use veil_core::{Rule, RuleKind};

use crate::schema::{RawRule, ShapeError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    pub rule: Rule,
    pub list_id: u16,
    /// 1-based line (text lists) or 0-based entry index (JSON lists)
    pub position: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Line(usize),
    Entry(usize),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line(line) => write!(f, "line {}", line),
            Location::Entry(index) => write!(f, "entry {}", index),
        }
    }
}

/// A rule-list entry that did not compile. The rest of the list still does.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid JSON rule list: {0}")]
    InvalidJson(String),
    #[error("{location}: {source}")]
    Shape {
        location: Location,
        #[source]
        source: ShapeError,
    },
    #[error("{location}: malformed rule: {reason}")]
    Malformed { location: Location, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseReport {
    pub rules: Vec<CompiledRule>,
    pub errors: Vec<ParseError>,
}

impl ParseReport {
    fn push(&mut self, location: Location, parsed: Result<Rule, ParseError>) {
        match parsed {
            Ok(rule) => {
                let position = match location {
                    Location::Line(line) => line,
                    Location::Entry(index) => index,
                };
                self.rules.push(CompiledRule {
                    rule,
                    list_id: 0,
                    position,
                });
            }
            Err(e) => {
                log::warn!("skipping rule: {}", e);
                self.errors.push(e);
            }
        }
    }

    /// Tag every rule with the list it came from.
    pub fn with_list_id(mut self, list_id: u16) -> Self {
        for rule in &mut self.rules {
            rule.list_id = list_id;
        }
        self
    }
}

/// Parse a rule list, picking the format from the first non-blank character.
pub fn parse_rule_list(text: &str) -> ParseReport {
    if text.trim_start().starts_with('[') {
        parse_rule_list_json(text)
    } else {
        parse_rule_list_text(text)
    }
}

/// Parse a JSON array of rule objects. Entries are decoded one by one so a
/// single bad entry only drops itself.
pub fn parse_rule_list_json(text: &str) -> ParseReport {
    let mut report = ParseReport::default();

    let entries: Vec<serde_json::Value> = match serde_json::from_str(text) {
        Ok(entries) => entries,
        Err(e) => {
            let error = ParseError::InvalidJson(e.to_string());
            log::warn!("{}", error);
            report.errors.push(error);
            return report;
        }
    };

    for (index, entry) in entries.into_iter().enumerate() {
        let location = Location::Entry(index);
        let parsed = serde_json::from_value::<RawRule>(entry)
            .map_err(|e| ParseError::Malformed {
                location,
                reason: e.to_string(),
            })
            .and_then(|raw| raw.into_rule().map_err(|source| ParseError::Shape { location, source }));
        report.push(location, parsed);
    }

    report
}

/// Parse the text format: one `kind=value` or `kind:qualifier=value` per line.
///
/// ```text
/// ! comment
/// class=BIG_BROTHER_BRASIL
/// href=bbb
/// content:span=Yasmin Brunet
/// title:a=Paredão
/// attribute:data-area=splash
/// ```
pub fn parse_rule_list_text(text: &str) -> ParseReport {
    let mut report = ParseReport::default();

    for (idx, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || is_comment_line(line) {
            continue;
        }
        let location = Location::Line(idx + 1);
        report.push(location, parse_line(line, location));
    }

    report
}

fn is_comment_line(line: &str) -> bool {
    line.starts_with('!') || line.starts_with('#')
}

fn parse_line(line: &str, location: Location) -> Result<Rule, ParseError> {
    let malformed = |reason: &str| ParseError::Malformed {
        location,
        reason: reason.to_string(),
    };

    let (head, value) = line.split_once('=').ok_or_else(|| malformed("expected '='"))?;
    let (tag, qualifier) = match head.split_once(':') {
        Some((tag, qualifier)) => (tag.trim(), Some(qualifier.trim())),
        None => (head.trim(), None),
    };
    let value = value.trim().to_string();

    let kind = RuleKind::try_from(tag).map_err(|_| ParseError::Shape {
        location,
        source: ShapeError::UnknownType(tag.to_string()),
    })?;

    let required = |field: &'static str| match qualifier {
        Some(q) if !q.is_empty() => Ok(q.to_string()),
        _ => Err(ParseError::Shape {
            location,
            source: ShapeError::MissingField { kind, field },
        }),
    };

    match kind {
        RuleKind::Class | RuleKind::Href if qualifier.is_some() => {
            Err(malformed("class and href rules take no qualifier"))
        }
        RuleKind::Class => Ok(Rule::Class { value }),
        RuleKind::Href => Ok(Rule::Href { value }),
        RuleKind::Content => Ok(Rule::Content {
            selector: required("selector")?,
            value,
        }),
        RuleKind::Title => Ok(Rule::Title {
            selector: required("selector")?,
            value,
        }),
        RuleKind::Attribute => Ok(Rule::Attribute {
            attr: required("attr")?,
            value,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_list() {
        let report = parse_rule_list_text(
            "! Big Brother Brasil\n\
             class=BIG_BROTHER_BRASIL\n\
             \n\
             href=bbb\n\
             content:span=Yasmin Brunet\n\
             title:a = Paredão\n\
             attribute:data-area=splash\n\
             href=/busca?q=bbb\n",
        );

        assert!(report.errors.is_empty(), "{:?}", report.errors);
        let rules: Vec<_> = report.rules.iter().map(|r| r.rule.clone()).collect();
        assert_eq!(
            rules,
            vec![
                Rule::class("BIG_BROTHER_BRASIL"),
                Rule::href("bbb"),
                Rule::content("span", "Yasmin Brunet"),
                Rule::title("a", "Paredão"),
                Rule::attribute("data-area", "splash"),
                Rule::href("/busca?q=bbb"),
            ]
        );
        assert_eq!(report.rules[0].position, 2);
        assert_eq!(report.rules[1].position, 4);
    }

    #[test]
    fn test_text_errors_do_not_stop_parsing() {
        let report = parse_rule_list_text("regex=b+\ncontent=Yasmin\nclass:div=x\nnonsense\nclass=ok\n");

        assert_eq!(report.rules.len(), 1);
        assert_eq!(report.rules[0].rule, Rule::class("ok"));
        assert_eq!(report.errors.len(), 4);
        assert!(matches!(
            &report.errors[0],
            ParseError::Shape { location: Location::Line(1), source: ShapeError::UnknownType(tag) } if tag == "regex"
        ));
        assert!(matches!(
            &report.errors[1],
            ParseError::Shape {
                source: ShapeError::MissingField { kind: RuleKind::Content, field: "selector" },
                ..
            }
        ));
        assert!(matches!(&report.errors[2], ParseError::Malformed { .. }));
        assert_eq!(report.errors[3].to_string(), "line 4: malformed rule: expected '='");
    }

    #[test]
    fn test_attribute_qualifier_may_contain_colon() {
        let report = parse_rule_list_text("attribute:xlink:href=#bbb");
        assert_eq!(report.rules[0].rule, Rule::attribute("xlink:href", "#bbb"));
    }

    #[test]
    fn test_parse_json_list() {
        let report = parse_rule_list(
            r#"[
                {"type": "class", "value": "BIG_BROTHER_BRASIL"},
                {"type": "href", "value": "bbb"},
                {"type": "content", "selector": "span", "value": "Yasmin Brunet"},
                {"type": "unknown", "value": "x"},
                {"type": "attribute", "value": "splash"},
                {"type": 3},
                {"type": "attribute", "attr": "data-area", "value": "splash"}
            ]"#,
        );

        let rules: Vec<_> = report.rules.iter().map(|r| r.rule.clone()).collect();
        assert_eq!(
            rules,
            vec![
                Rule::class("BIG_BROTHER_BRASIL"),
                Rule::href("bbb"),
                Rule::content("span", "Yasmin Brunet"),
                Rule::attribute("data-area", "splash"),
            ]
        );
        assert_eq!(report.rules[3].position, 6);
        assert_eq!(report.errors.len(), 3);
        assert_eq!(report.errors[0].to_string(), "entry 3: unknown rule type 'unknown'");
        assert!(matches!(&report.errors[2], ParseError::Malformed { location: Location::Entry(5), .. }));
    }

    #[test]
    fn test_invalid_json() {
        let report = parse_rule_list_json("[{\"type\": ");
        assert!(report.rules.is_empty());
        assert!(matches!(&report.errors[..], [ParseError::InvalidJson(_)]));
    }

    #[test]
    fn test_with_list_id() {
        let report = parse_rule_list("class=a\nclass=b").with_list_id(3);
        assert!(report.rules.iter().all(|r| r.list_id == 3));
    }
}
