//! In-memory document
//!
//! Arena-backed tree implementing [`Document`]. Insertions into the attached
//! tree are buffered as child-list records and handed to observers when
//! [`MemoryDocument::flush_mutations`] runs, which is the point where a
//! browser would deliver its MutationObserver batch.
//!
//! Used by the unit tests, the CLI fixture runner and the benchmarks.

use std::cell::{Cell, RefCell};
use std::fmt::{self, Write as _};
use std::rc::Rc;

use crate::dom::{Document, MutationHandler, ReadyCallback, Subscription};
use crate::error::{ObserveError, QueryError};
use crate::selector::Query;
use crate::types::{MutationRecord, ReadyState};

/// Index of a node in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// =============================================================================
// Node Specs
// =============================================================================

/// Detached description of a subtree, materialized by [`MemoryDocument::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<NodeSpec>,
    },
    Text(String),
    Comment(String),
}

impl NodeSpec {
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn comment(text: impl Into<String>) -> Self {
        Self::Comment(text.into())
    }

    /// Set an attribute. No effect on text and comment specs.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attrs, .. } = &mut self {
            let name = name.into().to_ascii_lowercase();
            let value = value.into();
            match attrs.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value,
                None => attrs.push((name, value)),
            }
        }
        self
    }

    /// Append a class token.
    pub fn class(self, class: &str) -> Self {
        let current = match &self {
            Self::Element { attrs, .. } => attrs
                .iter()
                .find(|(name, _)| name == "class")
                .map(|(_, value)| value.clone()),
            _ => None,
        };
        let value = match current {
            Some(existing) if !existing.is_empty() => format!("{} {}", existing, class),
            _ => class.to_string(),
        };
        self.attr("class", value)
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        if let Self::Element { children, .. } = &mut self {
            children.push(child);
        }
        self
    }

    /// Append a text child.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.child(NodeSpec::text(text))
    }
}

// =============================================================================
// Arena
// =============================================================================

#[derive(Debug)]
enum NodeData {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    hidden: bool,
}

type HandlerSlot = Rc<RefCell<Option<MutationHandler<NodeId>>>>;

struct Observer {
    target: NodeId,
    active: Rc<Cell<bool>>,
    handler: HandlerSlot,
}

/// Handle returned by [`MemoryDocument::observe_insertions`].
///
/// Cancelling drops the handler right away, together with whatever it
/// captured.
pub struct MemorySubscription {
    active: Rc<Cell<bool>>,
    handler: HandlerSlot,
}

impl fmt::Debug for MemorySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySubscription")
            .field("active", &self.active.get())
            .finish_non_exhaustive()
    }
}

impl Subscription for MemorySubscription {
    fn cancel(&mut self) {
        self.active.set(false);
        let handler = self.handler.borrow_mut().take();
        drop(handler);
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }
}

/// Single-threaded in-memory document tree.
pub struct MemoryDocument {
    nodes: RefCell<Vec<Node>>,
    root: NodeId,
    body: NodeId,
    ready_state: Cell<ReadyState>,
    ready_callbacks: RefCell<Vec<ReadyCallback>>,
    pending: RefCell<Vec<MutationRecord<NodeId>>>,
    observers: RefCell<Vec<Observer>>,
    query_scopes: RefCell<Vec<NodeId>>,
}

impl Default for MemoryDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDocument {
    /// Empty `html > (head, body)` document that has finished loading.
    pub fn new() -> Self {
        Self::with_state(ReadyState::Complete)
    }

    /// Empty document still in the loading state.
    pub fn loading() -> Self {
        Self::with_state(ReadyState::Loading)
    }

    fn with_state(state: ReadyState) -> Self {
        let mut nodes = Vec::with_capacity(64);
        nodes.push(Node {
            data: NodeData::Element {
                tag: "html".to_string(),
                attrs: Vec::new(),
            },
            parent: None,
            children: vec![NodeId(1), NodeId(2)],
            hidden: false,
        });
        for tag in ["head", "body"] {
            nodes.push(Node {
                data: NodeData::Element {
                    tag: tag.to_string(),
                    attrs: Vec::new(),
                },
                parent: Some(NodeId(0)),
                children: Vec::new(),
                hidden: false,
            });
        }

        Self {
            nodes: RefCell::new(nodes),
            root: NodeId(0),
            body: NodeId(2),
            ready_state: Cell::new(state),
            ready_callbacks: RefCell::new(Vec::new()),
            pending: RefCell::new(Vec::new()),
            observers: RefCell::new(Vec::new()),
            query_scopes: RefCell::new(Vec::new()),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn body_id(&self) -> NodeId {
        self.body
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes.borrow().get(node.index()).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .get(node.index())
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Materialize a detached subtree and return its root.
    pub fn build(&self, spec: &NodeSpec) -> NodeId {
        let mut nodes = self.nodes.borrow_mut();
        build_into(&mut nodes, spec, None)
    }

    /// Build `spec` and append it under `parent`.
    pub fn append(&self, parent: NodeId, spec: &NodeSpec) -> NodeId {
        let node = self.build(spec);
        self.append_child(parent, node);
        node
    }

    /// Attach a detached node as the last child of `parent`.
    ///
    /// Queues a child-list record when `parent` is part of the document.
    /// Attached nodes and out-of-range ids are ignored.
    pub fn append_child(&self, parent: NodeId, child: NodeId) {
        if self.is_inclusive_ancestor(child, parent) {
            log::debug!("append_child({:?}, {:?}) would create a cycle", parent, child);
            return;
        }
        {
            let mut nodes = self.nodes.borrow_mut();
            let valid = parent.index() < nodes.len()
                && child.index() < nodes.len()
                && nodes[child.index()].parent.is_none()
                && child != self.root
                && matches!(nodes[parent.index()].data, NodeData::Element { .. });
            if !valid {
                log::debug!("append_child({:?}, {:?}) ignored", parent, child);
                return;
            }
            nodes[child.index()].parent = Some(parent);
            nodes[parent.index()].children.push(child);
        }

        if self.is_connected(parent) {
            self.pending
                .borrow_mut()
                .push(MutationRecord::child_list(parent, vec![child]));
        }
    }

    /// Set an attribute without producing a mutation record.
    pub fn set_attribute(&self, node: NodeId, name: &str, value: &str) {
        let mut nodes = self.nodes.borrow_mut();
        if let Some(Node {
            data: NodeData::Element { attrs, .. },
            ..
        }) = nodes.get_mut(node.index())
        {
            let name = name.to_ascii_lowercase();
            match attrs.iter_mut().find(|(existing, _)| *existing == name) {
                Some(slot) => slot.1 = value.to_string(),
                None => attrs.push((name, value.to_string())),
            }
        }
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root, node)
    }

    fn is_inclusive_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let nodes = self.nodes.borrow();
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = nodes.get(id.index()).and_then(|n| n.parent);
        }
        false
    }

    /// Leave the loading state and fire pending readiness callbacks.
    pub fn finish_loading(&self) {
        if !self.ready_state.get().is_loading() {
            return;
        }
        self.ready_state.set(ReadyState::Complete);
        let callbacks: Vec<ReadyCallback> = self.ready_callbacks.borrow_mut().drain(..).collect();
        for callback in callbacks {
            callback();
        }
    }

    /// Number of records waiting for delivery.
    pub fn pending_records(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Deliver buffered records as one batch to every active observer whose
    /// target contains the record's target. Returns the number of records
    /// drained.
    pub fn flush_mutations(&self) -> usize {
        let records: Vec<MutationRecord<NodeId>> = self.pending.borrow_mut().drain(..).collect();
        if records.is_empty() {
            return 0;
        }

        self.observers.borrow_mut().retain(|observer| observer.active.get());
        let observer_count = self.observers.borrow().len();

        for idx in 0..observer_count {
            let (target, active, slot) = {
                let observers = self.observers.borrow();
                match observers.get(idx) {
                    Some(observer) if observer.active.get() => (
                        observer.target,
                        Rc::clone(&observer.active),
                        Rc::clone(&observer.handler),
                    ),
                    _ => continue,
                }
            };
            let handler = slot.borrow_mut().take();
            let Some(mut handler) = handler else {
                continue;
            };

            let batch: Vec<MutationRecord<NodeId>> = records
                .iter()
                .filter(|record| self.is_inclusive_ancestor(target, record.target))
                .cloned()
                .collect();
            if !batch.is_empty() {
                handler(&batch);
            }

            // A handler that cancelled its own subscription is not put back.
            if active.get() {
                *slot.borrow_mut() = Some(handler);
            }
        }

        records.len()
    }

    pub fn active_observers(&self) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|observer| observer.active.get())
            .count()
    }

    /// Scopes passed to `query_all` since the last [`Self::clear_query_log`].
    pub fn query_scopes(&self) -> Vec<NodeId> {
        self.query_scopes.borrow().clone()
    }

    pub fn clear_query_log(&self) {
        self.query_scopes.borrow_mut().clear();
    }

    /// Hidden nodes in arena order.
    pub fn hidden_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .borrow()
            .iter()
            .enumerate()
            .filter(|(_, node)| node.hidden)
            .map(|(idx, _)| NodeId(idx as u32))
            .collect()
    }

    /// Opening-tag rendering of an element, e.g. `<a href="/bbb">`.
    pub fn describe(&self, node: NodeId) -> String {
        let nodes = self.nodes.borrow();
        match nodes.get(node.index()).map(|n| &n.data) {
            Some(NodeData::Element { tag, attrs }) => {
                let mut out = format!("<{}", tag);
                for (name, value) in attrs {
                    let _ = write!(out, " {}=\"{}\"", name, value);
                }
                out.push('>');
                out
            }
            Some(NodeData::Text(text)) => format!("#text {:?}", text),
            Some(NodeData::Comment(text)) => format!("<!--{}-->", text),
            None => format!("#invalid {}", node.index()),
        }
    }

    fn collect_text(nodes: &[Node], id: NodeId, out: &mut String) {
        let Some(node) = nodes.get(id.index()) else {
            return;
        };
        match &node.data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Comment(_) => {}
            NodeData::Element { .. } => {
                for child in &node.children {
                    Self::collect_text(nodes, *child, out);
                }
            }
        }
    }

    fn element_matches(node: &Node, query: &Query<'_>) -> bool {
        let NodeData::Element { tag, attrs } = &node.data else {
            return false;
        };
        let attr = |name: &str| {
            attrs
                .iter()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        };

        match *query {
            Query::Class(class) => {
                attr("class").is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
            }
            Query::AttrContains { tag: want, attr: name, value } => {
                // `[attr*=""]` never matches.
                tag.eq_ignore_ascii_case(want)
                    && !value.is_empty()
                    && attr(name).is_some_and(|actual| actual.contains(value))
            }
            Query::Tag(want) => tag.eq_ignore_ascii_case(want),
            Query::AttrEquals { attr: name, value } => attr(name) == Some(value),
        }
    }
}

fn build_into(nodes: &mut Vec<Node>, spec: &NodeSpec, parent: Option<NodeId>) -> NodeId {
    let id = NodeId(nodes.len() as u32);
    let (data, children) = match spec {
        NodeSpec::Element { tag, attrs, children } => (
            NodeData::Element {
                tag: tag.to_ascii_lowercase(),
                attrs: attrs.clone(),
            },
            children.as_slice(),
        ),
        NodeSpec::Text(text) => (NodeData::Text(text.clone()), &[][..]),
        NodeSpec::Comment(text) => (NodeData::Comment(text.clone()), &[][..]),
    };
    nodes.push(Node {
        data,
        parent,
        children: Vec::with_capacity(children.len()),
        hidden: false,
    });

    for child in children {
        let child_id = build_into(nodes, child, Some(id));
        nodes[id.index()].children.push(child_id);
    }
    id
}

impl Document for MemoryDocument {
    type Node = NodeId;
    type Subscription = MemorySubscription;

    fn ready_state(&self) -> ReadyState {
        self.ready_state.get()
    }

    fn document_element(&self) -> Option<NodeId> {
        Some(self.root)
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.body)
    }

    fn is_element(&self, node: &NodeId) -> bool {
        matches!(
            self.nodes.borrow().get(node.index()).map(|n| &n.data),
            Some(NodeData::Element { .. })
        )
    }

    fn tag_name(&self, node: &NodeId) -> String {
        match self.nodes.borrow().get(node.index()).map(|n| &n.data) {
            Some(NodeData::Element { tag, .. }) => tag.to_ascii_uppercase(),
            Some(NodeData::Text(_)) => "#text".to_string(),
            Some(NodeData::Comment(_)) => "#comment".to_string(),
            None => String::new(),
        }
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.attribute(node, "class")
            .is_some_and(|value| value.split_ascii_whitespace().any(|c| c == class))
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        match self.nodes.borrow().get(node.index()).map(|n| &n.data) {
            Some(NodeData::Element { attrs, .. }) => attrs
                .iter()
                .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone()),
            _ => None,
        }
    }

    fn text_content(&self, node: &NodeId) -> String {
        let nodes = self.nodes.borrow();
        match nodes.get(node.index()).map(|n| &n.data) {
            Some(NodeData::Comment(text)) => text.clone(),
            _ => {
                let mut out = String::new();
                Self::collect_text(&nodes, *node, &mut out);
                out
            }
        }
    }

    fn query_all(&self, scope: &NodeId, query: &Query<'_>) -> Result<Vec<NodeId>, QueryError> {
        query
            .check()
            .map_err(|e| QueryError::invalid_selector(query.to_string(), e))?;
        self.query_scopes.borrow_mut().push(*scope);

        let nodes = self.nodes.borrow();
        let Some(root) = nodes.get(scope.index()) else {
            return Ok(Vec::new());
        };

        let mut found = Vec::new();
        let mut stack: Vec<NodeId> = root.children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &nodes[id.index()];
            if Self::element_matches(node, query) {
                found.push(id);
            }
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(found)
    }

    fn hide(&self, node: &NodeId) {
        if let Some(n) = self.nodes.borrow_mut().get_mut(node.index()) {
            n.hidden = true;
        }
    }

    fn is_hidden(&self, node: &NodeId) -> bool {
        self.nodes
            .borrow()
            .get(node.index())
            .is_some_and(|n| n.hidden)
    }

    /// Fires immediately when the document is no longer loading.
    fn on_ready(&self, callback: ReadyCallback) {
        if self.ready_state.get().is_loading() {
            self.ready_callbacks.borrow_mut().push(callback);
        } else {
            callback();
        }
    }

    fn observe_insertions(
        &self,
        target: &NodeId,
        handler: MutationHandler<NodeId>,
    ) -> Result<MemorySubscription, ObserveError> {
        if !self.is_connected(*target) {
            return Err(ObserveError::Detached);
        }
        let active = Rc::new(Cell::new(true));
        let slot: HandlerSlot = Rc::new(RefCell::new(Some(handler)));
        self.observers.borrow_mut().push(Observer {
            target: *target,
            active: Rc::clone(&active),
            handler: Rc::clone(&slot),
        });
        Ok(MemorySubscription { active, handler: slot })
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::types::MutationKind;

    fn sample(doc: &MemoryDocument) -> (NodeId, NodeId) {
        let list = doc.append(
            doc.body_id(),
            &NodeSpec::element("ul")
                .class("feed")
                .child(NodeSpec::element("li").class("item").with_text("one "))
                .child(
                    NodeSpec::element("li")
                        .class("item promo")
                        .child(NodeSpec::element("a").attr("href", "https://site.com/bbb/post").with_text("two"))
                        .child(NodeSpec::comment("ignored")),
                ),
        );
        let footer = doc.append(doc.body_id(), &NodeSpec::element("footer").attr("data-area", "splash"));
        (list, footer)
    }

    #[test]
    fn test_build_and_read() {
        let doc = MemoryDocument::new();
        let (list, footer) = sample(&doc);

        assert_eq!(doc.tag_name(&list), "UL");
        assert!(doc.has_class(&list, "feed"));
        assert_eq!(doc.attribute(&footer, "DATA-AREA").as_deref(), Some("splash"));
        assert_eq!(doc.text_content(&list), "one two");
        assert_eq!(doc.children(doc.body_id()), vec![list, footer]);
        assert_eq!(doc.parent(list), Some(doc.body_id()));
        assert_eq!(doc.describe(footer), "<footer data-area=\"splash\">");
    }

    #[test]
    fn test_query_all_excludes_scope_and_keeps_order() {
        let doc = MemoryDocument::new();
        let (list, _) = sample(&doc);

        let items = doc.query_all(&list, &Query::Tag("LI")).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0] < items[1]);

        let lists = doc.query_all(&list, &Query::Class("feed")).unwrap();
        assert!(lists.is_empty());

        let promos = doc.query_all(&doc.root(), &Query::Class("promo")).unwrap();
        assert_eq!(promos, vec![items[1]]);

        let anchors = doc
            .query_all(&doc.root(), &Query::AttrContains { tag: "a", attr: "href", value: "bbb" })
            .unwrap();
        assert_eq!(anchors.len(), 1);

        let empty = doc
            .query_all(&doc.root(), &Query::AttrContains { tag: "a", attr: "href", value: "" })
            .unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_query_all_rejects_broken_selector() {
        let doc = MemoryDocument::new();
        sample(&doc);

        let err = doc
            .query_all(&doc.root(), &Query::AttrEquals { attr: "data-area", value: "a\"b" })
            .unwrap_err();
        assert!(matches!(err, QueryError::InvalidSelector { .. }));
        assert!(doc.query_scopes().is_empty());
    }

    #[test]
    fn test_insertions_are_batched_until_flush() {
        let doc = MemoryDocument::new();
        let seen: Rc<RefCell<Vec<MutationRecord<NodeId>>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let body = doc.body_id();
        let _sub = doc
            .observe_insertions(&body, Box::new(move |batch| sink.borrow_mut().extend_from_slice(batch)))
            .unwrap();

        let detached = doc.build(&NodeSpec::element("div").child(NodeSpec::element("a")));
        assert_eq!(doc.pending_records(), 0);

        doc.append_child(body, detached);
        assert_eq!(doc.pending_records(), 1);
        assert!(seen.borrow().is_empty());

        assert_eq!(doc.flush_mutations(), 1);
        let records = seen.borrow();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, MutationKind::ChildList);
        assert_eq!(records[0].target, body);
        assert_eq!(records[0].added, vec![detached]);
    }

    #[test]
    fn test_observer_scope_and_cancel() {
        let doc = MemoryDocument::new();
        let count = Rc::new(Cell::new(0usize));
        let sink = Rc::clone(&count);
        let mut sub = doc
            .observe_insertions(&doc.body_id(), Box::new(move |batch| sink.set(sink.get() + batch.len())))
            .unwrap();

        // head is outside the observed subtree
        doc.append(NodeId(1), &NodeSpec::element("meta"));
        doc.flush_mutations();
        assert_eq!(count.get(), 0);

        doc.append(doc.body_id(), &NodeSpec::element("p"));
        doc.flush_mutations();
        assert_eq!(count.get(), 1);

        sub.cancel();
        assert!(!sub.is_active());
        doc.append(doc.body_id(), &NodeSpec::element("p"));
        doc.flush_mutations();
        assert_eq!(count.get(), 1);
        assert_eq!(doc.active_observers(), 0);
    }

    #[test]
    fn test_cancel_releases_handler() {
        let doc = MemoryDocument::new();
        let captured = Rc::new(());
        let held = Rc::clone(&captured);
        let mut sub = doc
            .observe_insertions(&doc.body_id(), Box::new(move |_| drop(Rc::clone(&held))))
            .unwrap();
        assert_eq!(Rc::strong_count(&captured), 2);

        doc.append(doc.body_id(), &NodeSpec::element("p"));
        doc.flush_mutations();
        assert_eq!(Rc::strong_count(&captured), 2);

        sub.cancel();
        assert_eq!(Rc::strong_count(&captured), 1);
    }

    #[test]
    fn test_handler_may_cancel_itself() {
        let doc = MemoryDocument::new();
        let own: Rc<RefCell<Option<MemorySubscription>>> = Rc::new(RefCell::new(None));
        let calls = Rc::new(Cell::new(0));
        let (slot, counter) = (Rc::clone(&own), Rc::clone(&calls));
        let sub = doc
            .observe_insertions(
                &doc.body_id(),
                Box::new(move |_| {
                    counter.set(counter.get() + 1);
                    if let Some(mut sub) = slot.borrow_mut().take() {
                        sub.cancel();
                    }
                }),
            )
            .unwrap();
        *own.borrow_mut() = Some(sub);

        doc.append(doc.body_id(), &NodeSpec::element("p"));
        doc.flush_mutations();
        doc.append(doc.body_id(), &NodeSpec::element("p"));
        doc.flush_mutations();
        assert_eq!(calls.get(), 1);
        assert_eq!(doc.active_observers(), 0);
    }

    #[test]
    fn test_observe_detached_target_fails() {
        let doc = MemoryDocument::new();
        let detached = doc.build(&NodeSpec::element("div"));
        let result = doc.observe_insertions(&detached, Box::new(|_| {}));
        assert!(matches!(result, Err(ObserveError::Detached)));
    }

    #[test]
    fn test_ready_callbacks() {
        let doc = MemoryDocument::loading();
        let fired = Rc::new(Cell::new(0));
        let a = Rc::clone(&fired);
        doc.on_ready(Box::new(move || a.set(a.get() + 1)));
        assert_eq!(fired.get(), 0);

        doc.finish_loading();
        assert_eq!(fired.get(), 1);
        assert_eq!(doc.ready_state(), ReadyState::Complete);

        doc.finish_loading();
        assert_eq!(fired.get(), 1);

        let b = Rc::clone(&fired);
        doc.on_ready(Box::new(move || b.set(b.get() + 10)));
        assert_eq!(fired.get(), 11);
    }

    #[test]
    fn test_hide_is_idempotent() {
        let doc = MemoryDocument::new();
        let (list, footer) = sample(&doc);
        doc.hide(&list);
        doc.hide(&list);
        assert!(doc.is_hidden(&list));
        assert!(!doc.is_hidden(&footer));
        assert_eq!(doc.hidden_nodes(), vec![list]);
    }
}
