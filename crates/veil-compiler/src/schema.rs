//! JSON rule shape
//!
//! Rule lists are arrays of flat objects tagged by `type`:
//!
//! ```json
//! [
//!   { "type": "class", "value": "BIG_BROTHER_BRASIL" },
//!   { "type": "content", "selector": "span", "value": "Yasmin Brunet" },
//!   { "type": "attribute", "attr": "data-area", "value": "splash" }
//! ]
//! ```
//!
//! TypeScript bindings for [`RawRule`] are written to `bindings/` by the
//! `ts-rs` export test.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use veil_core::{Rule, RuleKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawRule {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub attr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub value: Option<String>,
}

/// Why a raw entry does not describe a rule.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("unknown rule type '{0}'")]
    UnknownType(String),
    #[error("{kind} rule needs '{field}'")]
    MissingField { kind: RuleKind, field: &'static str },
}

impl RawRule {
    pub fn into_rule(self) -> Result<Rule, ShapeError> {
        let kind = RuleKind::try_from(self.kind.as_str()).map_err(|_| ShapeError::UnknownType(self.kind.clone()))?;
        let field = |value: Option<String>, field: &'static str| value.ok_or(ShapeError::MissingField { kind, field });

        let rule = match kind {
            RuleKind::Class => Rule::Class {
                value: field(self.value, "value")?,
            },
            RuleKind::Href => Rule::Href {
                value: field(self.value, "value")?,
            },
            RuleKind::Content => Rule::Content {
                selector: field(self.selector, "selector")?,
                value: field(self.value, "value")?,
            },
            RuleKind::Title => Rule::Title {
                selector: field(self.selector, "selector")?,
                value: field(self.value, "value")?,
            },
            RuleKind::Attribute => Rule::Attribute {
                attr: field(self.attr, "attr")?,
                value: field(self.value, "value")?,
            },
        };
        Ok(rule)
    }
}

impl From<&Rule> for RawRule {
    fn from(rule: &Rule) -> Self {
        let (selector, attr) = match rule {
            Rule::Content { selector, .. } | Rule::Title { selector, .. } => (Some(selector.clone()), None),
            Rule::Attribute { attr, .. } => (None, Some(attr.clone())),
            Rule::Class { .. } | Rule::Href { .. } => (None, None),
        };
        Self {
            kind: rule.kind().as_str().to_string(),
            selector,
            attr,
            value: Some(rule.value().to_string()),
        }
    }
}
