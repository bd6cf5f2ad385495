//! Document interface
//!
//! The tree is owned by the host. Matcher and coordinator reach it only
//! through [`Document`]: structural queries, a handful of node reads, the
//! hide action, and two notification hooks.

pub mod memory;

use crate::error::{ObserveError, QueryError};
use crate::selector::Query;
use crate::types::{MutationRecord, ReadyState};

pub use memory::{MemoryDocument, NodeId, NodeSpec};

/// One-shot readiness notification.
pub type ReadyCallback = Box<dyn FnOnce()>;

/// Receives one mutation batch per call, records in host order.
pub type MutationHandler<N> = Box<dyn FnMut(&[MutationRecord<N>])>;

/// Handle to an installed mutation subscription.
pub trait Subscription {
    /// Stop delivering batches. Calling twice is harmless.
    fn cancel(&mut self);

    fn is_active(&self) -> bool;
}

/// Narrow query/mutate surface of a live document tree.
pub trait Document {
    /// Handle to any tree node (element, text, comment).
    type Node: Clone;
    type Subscription: Subscription;

    fn ready_state(&self) -> ReadyState;

    /// Root element (`<html>`).
    fn document_element(&self) -> Option<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    fn is_element(&self, node: &Self::Node) -> bool;

    /// Tag name as reported by the host. Callers compare case-insensitively.
    fn tag_name(&self, node: &Self::Node) -> String;

    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;

    fn text_content(&self, node: &Self::Node) -> String;

    /// Descendants of `scope` (excluding `scope`) matching `query`, in document order.
    fn query_all(&self, scope: &Self::Node, query: &Query<'_>) -> Result<Vec<Self::Node>, QueryError>;

    /// Remove the element from rendered layout. Must be idempotent.
    fn hide(&self, node: &Self::Node);

    fn is_hidden(&self, node: &Self::Node) -> bool;

    /// Register a callback fired once when the document stops loading.
    fn on_ready(&self, callback: ReadyCallback);

    /// Observe child-list insertions on `target` and all its descendants.
    fn observe_insertions(
        &self,
        target: &Self::Node,
        handler: MutationHandler<Self::Node>,
    ) -> Result<Self::Subscription, ObserveError>;
}
