//! Veil Core Library
//!
//! This crate provides the rule matching engine and the incremental hiding
//! coordinator for the Veil content hider.
//!
//! # Architecture
//!
//! The document tree belongs to the host. Everything here reaches it through
//! the [`Document`] trait: structural selector queries, a few node reads, the
//! hide action, and readiness/mutation hooks. A full sweep runs once the
//! document is ready; afterwards only inserted subtrees are re-examined, so
//! the cost of a mutation batch follows the size of the inserted fragments.
//!
//! # Modules
//!
//! - `types`: Rules, rule sets, mutation records
//! - `selector`: Structural queries and selector syntax checks
//! - `dom`: The document interface and an in-memory implementation
//! - `matcher`: Per-node and per-subtree rule matching
//! - `coordinator`: Sweep, observation and the hide action
//! - `error`: Shared error types

pub mod coordinator;
pub mod dom;
pub mod error;
pub mod matcher;
pub mod selector;
pub mod types;

// Re-export commonly used types
pub use coordinator::{HideReport, HidingCoordinator, Phase};
pub use dom::{Document, MemoryDocument, NodeSpec, Subscription};
pub use error::{ObserveError, QueryError, SelectorError};
pub use matcher::Matcher;
pub use selector::Query;
pub use types::{KindMask, MutationKind, MutationRecord, ReadyState, Rule, RuleKind, RuleSet};
