//! Rule Matcher
//!
//! Decides whether a single node satisfies a rule, and finds every matching
//! descendant of a node. Bulk search is delegated to the document's own
//! structural query; only content and title rules need a per-candidate
//! check on top of the tag query.

use crate::dom::Document;
use crate::error::QueryError;
use crate::types::Rule;

// =============================================================================
// Matcher
// =============================================================================

/// Read-only matcher over one document.
pub struct Matcher<'a, D: Document> {
    doc: &'a D,
}

impl<'a, D: Document> Matcher<'a, D> {
    pub fn new(doc: &'a D) -> Self {
        Self { doc }
    }

    /// Does `node` itself satisfy `rule`?
    pub fn matches(&self, node: &D::Node, rule: &Rule) -> bool {
        if !self.doc.is_element(node) {
            return false;
        }

        match rule {
            Rule::Class { value } => self.doc.has_class(node, value),
            Rule::Href { value } => {
                !value.is_empty()
                    && self.has_tag(node, "a")
                    && self
                        .doc
                        .attribute(node, "href")
                        .is_some_and(|href| href.contains(value.as_str()))
            }
            Rule::Content { selector, .. } | Rule::Title { selector, .. } => {
                self.has_tag(node, selector) && refine(self.doc, node, rule)
            }
            Rule::Attribute { attr, value } => {
                self.doc.attribute(node, attr).as_deref() == Some(value.as_str())
            }
        }
    }

    /// Every descendant of `root` (not `root` itself) that satisfies `rule`.
    ///
    /// The structural query runs eagerly; per-candidate predicates run as the
    /// returned iterator is consumed. A selector the document rejects comes
    /// back as `Err` and is left to the caller to handle.
    pub fn find_matching_descendants<'r>(
        &self,
        root: &D::Node,
        rule: &'r Rule,
    ) -> Result<Descendants<'a, 'r, D>, QueryError> {
        let candidates = self.doc.query_all(root, &rule.query())?;
        Ok(Descendants {
            doc: self.doc,
            rule,
            candidates: candidates.into_iter(),
        })
    }

    fn has_tag(&self, node: &D::Node, tag: &str) -> bool {
        self.doc.tag_name(node).eq_ignore_ascii_case(tag)
    }
}

/// Lazy, one-shot sequence of matching descendants.
pub struct Descendants<'a, 'r, D: Document> {
    doc: &'a D,
    rule: &'r Rule,
    candidates: std::vec::IntoIter<D::Node>,
}

impl<D: Document> Iterator for Descendants<'_, '_, D> {
    type Item = D::Node;

    fn next(&mut self) -> Option<D::Node> {
        let doc = self.doc;
        let rule = self.rule;
        self.candidates.by_ref().find(|node| refine(doc, node, rule))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.candidates.len()))
    }
}

/// Predicate applied on top of a rule's structural query.
fn refine<D: Document>(doc: &D, node: &D::Node, rule: &Rule) -> bool {
    match rule {
        Rule::Content { value, .. } => contains_ignore_case(&doc.text_content(node), value),
        Rule::Title { value, .. } => doc
            .attribute(node, "title")
            .is_some_and(|title| contains_ignore_case(&title, value)),
        Rule::Class { .. } | Rule::Href { .. } | Rule::Attribute { .. } => true,
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    if haystack.is_ascii() && needle.is_ascii() {
        return find_ascii_case_insensitive(haystack.as_bytes(), needle.as_bytes()).is_some();
    }
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn find_ascii_case_insensitive(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.len() > haystack.len() {
        return None;
    }

    let last = haystack.len() - needle.len();
    (0..=last).find(|&i| haystack[i..i + needle.len()].eq_ignore_ascii_case(needle))
}
