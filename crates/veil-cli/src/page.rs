//! JSON page fixtures
//!
//! A fixture describes the `<body>` of a page and, optionally, batches of
//! later insertions:
//!
//! ```json
//! {
//!   "loading": false,
//!   "body": [
//!     { "tag": "div", "attrs": { "class": "BIG_BROTHER_BRASIL" }, "children": [ { "text": "..." } ] }
//!   ],
//!   "batches": [
//!     [ { "parent": [0], "nodes": [ { "tag": "span", "children": [ { "text": "..." } ] } ] } ]
//!   ]
//! }
//! ```
//!
//! `parent` is a path of child indexes starting at `<body>`; an empty path
//! inserts directly into `<body>`.

use std::collections::BTreeMap;
use std::fs;

use serde::Deserialize;
use veil_core::dom::NodeId;
use veil_core::{MemoryDocument, NodeSpec};

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PageNode {
    Element {
        tag: String,
        #[serde(default)]
        attrs: BTreeMap<String, String>,
        #[serde(default)]
        children: Vec<PageNode>,
    },
    Text {
        text: String,
    },
    Comment {
        comment: String,
    },
}

impl PageNode {
    pub fn to_spec(&self) -> NodeSpec {
        match self {
            PageNode::Element { tag, attrs, children } => {
                let spec = attrs
                    .iter()
                    .fold(NodeSpec::element(tag.as_str()), |spec, (name, value)| spec.attr(name.as_str(), value.as_str()));
                children.iter().fold(spec, |spec, child| spec.child(child.to_spec()))
            }
            PageNode::Text { text } => NodeSpec::text(text.as_str()),
            PageNode::Comment { comment } => NodeSpec::comment(comment.as_str()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Insertion {
    #[serde(default)]
    pub parent: Vec<usize>,
    pub nodes: Vec<PageNode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageFixture {
    #[serde(default)]
    pub loading: bool,
    #[serde(default)]
    pub body: Vec<PageNode>,
    #[serde(default)]
    pub batches: Vec<Vec<Insertion>>,
}

impl PageFixture {
    pub fn load(path: &str) -> Result<Self, String> {
        let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
        serde_json::from_str(&content).map_err(|e| format!("Invalid page fixture '{}': {}", path, e))
    }

    /// Build the document with the initial body attached. Loading fixtures
    /// stay in the loading state until the caller finishes them.
    pub fn build(&self) -> MemoryDocument {
        let doc = if self.loading {
            MemoryDocument::loading()
        } else {
            MemoryDocument::new()
        };
        let body = doc.body_id();
        for node in &self.body {
            doc.append(body, &node.to_spec());
        }
        // The initial body is not an insertion anyone observes.
        doc.flush_mutations();
        doc
    }
}

/// Follow a child-index path from `<body>`.
pub fn resolve(doc: &MemoryDocument, path: &[usize]) -> Result<NodeId, String> {
    path.iter().try_fold(doc.body_id(), |node, &index| {
        doc.children(node)
            .get(index)
            .copied()
            .ok_or_else(|| format!("No child {} under {}", index, doc.describe(node)))
    })
}

/// Apply one batch of insertions without delivering it.
pub fn insert_batch(doc: &MemoryDocument, batch: &[Insertion]) -> Result<Vec<NodeId>, String> {
    let mut inserted = Vec::new();
    for insertion in batch {
        let parent = resolve(doc, &insertion.parent)?;
        for node in &insertion.nodes {
            inserted.push(doc.append(parent, &node.to_spec()));
        }
    }
    Ok(inserted)
}
