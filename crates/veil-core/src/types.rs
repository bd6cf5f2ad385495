//! Core type definitions for Veil
//!
//! Rules are plain data: one variant per matching strategy. Everything that
//! evaluates them lives in [`crate::matcher`].

use std::fmt;

use crate::selector::Query;

// =============================================================================
// Rule Kinds
// =============================================================================

/// Discriminant of a [`Rule`], as it appears in the `type` tag of a rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum RuleKind {
    /// Element carries a class
    Class = 0,
    /// Anchor whose href contains a substring
    Href = 1,
    /// Tag whose text content contains a substring (case-insensitive)
    Content = 2,
    /// Tag whose title attribute contains a substring (case-insensitive)
    Title = 3,
    /// Attribute equals a value exactly
    Attribute = 4,
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::Class,
        RuleKind::Href,
        RuleKind::Content,
        RuleKind::Title,
        RuleKind::Attribute,
    ];

    /// Tag used in rule lists.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Href => "href",
            Self::Content => "content",
            Self::Title => "title",
            Self::Attribute => "attribute",
        }
    }

    pub const fn mask(self) -> KindMask {
        match self {
            Self::Class => KindMask::CLASS,
            Self::Href => KindMask::HREF,
            Self::Content => KindMask::CONTENT,
            Self::Title => KindMask::TITLE,
            Self::Attribute => KindMask::ATTRIBUTE,
        }
    }
}

impl TryFrom<&str> for RuleKind {
    type Error = ();

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "class" => Ok(Self::Class),
            "href" => Ok(Self::Href),
            "content" => Ok(Self::Content),
            "title" => Ok(Self::Title),
            "attribute" => Ok(Self::Attribute),
            _ => Err(()),
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags::bitflags! {
    /// Set of rule kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct KindMask: u8 {
        const CLASS = 1 << 0;
        const HREF = 1 << 1;
        const CONTENT = 1 << 2;
        const TITLE = 1 << 3;
        const ATTRIBUTE = 1 << 4;

        const ALL = 0x1F;
    }
}

impl KindMask {
    /// Kinds contained in this mask, in declaration order.
    pub fn kinds(self) -> impl Iterator<Item = RuleKind> {
        RuleKind::ALL.into_iter().filter(move |kind| self.contains(kind.mask()))
    }
}

// =============================================================================
// Rules
// =============================================================================

/// One declarative matching strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Rule {
    Class { value: String },
    Href { value: String },
    Content { selector: String, value: String },
    Title { selector: String, value: String },
    Attribute { attr: String, value: String },
}

impl Rule {
    pub fn class(value: impl Into<String>) -> Self {
        Self::Class { value: value.into() }
    }

    pub fn href(value: impl Into<String>) -> Self {
        Self::Href { value: value.into() }
    }

    pub fn content(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Content {
            selector: selector.into(),
            value: value.into(),
        }
    }

    pub fn title(selector: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Title {
            selector: selector.into(),
            value: value.into(),
        }
    }

    pub fn attribute(attr: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Attribute {
            attr: attr.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> RuleKind {
        match self {
            Self::Class { .. } => RuleKind::Class,
            Self::Href { .. } => RuleKind::Href,
            Self::Content { .. } => RuleKind::Content,
            Self::Title { .. } => RuleKind::Title,
            Self::Attribute { .. } => RuleKind::Attribute,
        }
    }

    /// The value the rule compares against.
    pub fn value(&self) -> &str {
        match self {
            Self::Class { value }
            | Self::Href { value }
            | Self::Content { value, .. }
            | Self::Title { value, .. }
            | Self::Attribute { value, .. } => value,
        }
    }

    /// Structural query used for bulk descendant search.
    ///
    /// Content and title rules only narrow by tag here; the text and title
    /// predicates are applied to each candidate afterwards.
    pub fn query(&self) -> Query<'_> {
        match self {
            Self::Class { value } => Query::Class(value),
            Self::Href { value } => Query::AttrContains {
                tag: "a",
                attr: "href",
                value,
            },
            Self::Content { selector, .. } | Self::Title { selector, .. } => Query::Tag(selector),
            Self::Attribute { attr, value } => Query::AttrEquals { attr, value },
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Class { value } | Self::Href { value } => write!(f, "{}={}", self.kind(), value),
            Self::Content { selector, value } | Self::Title { selector, value } => {
                write!(f, "{}:{}={}", self.kind(), selector, value)
            }
            Self::Attribute { attr, value } => write!(f, "{}:{}={}", self.kind(), attr, value),
        }
    }
}

// =============================================================================
// Rule Set
// =============================================================================

/// Ordered, read-only collection of rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn as_slice(&self) -> &[Rule] {
        &self.rules
    }

    /// Kinds present in this set.
    pub fn kinds(&self) -> KindMask {
        self.rules
            .iter()
            .fold(KindMask::empty(), |mask, rule| mask | rule.kind().mask())
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self::new(rules)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

// =============================================================================
// Tree Events
// =============================================================================

/// Loading state of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    Loading,
    Interactive,
    Complete,
}

impl ReadyState {
    pub fn is_loading(self) -> bool {
        self == Self::Loading
    }
}

/// Kind of a tree-change record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    /// Children were added or removed
    ChildList,
    Attributes,
    CharacterData,
}

/// One tree-change record, as delivered inside a mutation batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub kind: MutationKind,
    /// Node whose children (or attributes, or data) changed
    pub target: N,
    /// Inserted nodes in host order; empty for non child-list records
    pub added: Vec<N>,
}

impl<N> MutationRecord<N> {
    pub fn child_list(target: N, added: Vec<N>) -> Self {
        Self {
            kind: MutationKind::ChildList,
            target,
            added,
        }
    }
}
