//! Hiding Coordinator
//!
//! Owns the rule set, sweeps the document once it is ready, then keeps a
//! subscription on the body subtree and re-runs the matcher only against
//! freshly inserted subtrees.
//!
//! Once started, the coordinator is kept alive by the callbacks it hands to
//! the document, so the handle returned by [`HidingCoordinator::new`] may be
//! dropped. Observation ends with [`HidingCoordinator::stop`] or with the
//! document itself.

use std::cell::{Cell, RefCell};
use std::ops::AddAssign;
use std::rc::Rc;

use crate::dom::{Document, Subscription};
use crate::matcher::Matcher;
use crate::types::{MutationKind, MutationRecord, Rule, RuleSet};

/// Lifecycle of a [`HidingCoordinator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Constructed, possibly waiting for the document to finish loading
    Uninitialized,
    /// Full-document sweep running, or finished without a subscription
    Sweeping,
    /// Subscription installed; every insertion batch is processed
    Observing,
    /// Subscription cancelled through [`HidingCoordinator::stop`]
    Stopped,
}

/// Outcome of a sweep or of one mutation batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HideReport {
    /// Nodes newly hidden
    pub hidden: usize,
    /// Rule evaluations skipped because the document rejected the query
    pub rule_failures: usize,
}

impl AddAssign for HideReport {
    fn add_assign(&mut self, rhs: Self) {
        self.hidden += rhs.hidden;
        self.rule_failures += rhs.rule_failures;
    }
}

pub struct HidingCoordinator<D: Document> {
    doc: Rc<D>,
    rules: RuleSet,
    phase: Cell<Phase>,
    subscription: RefCell<Option<D::Subscription>>,
    totals: Cell<HideReport>,
    /// Per-rule flag so a broken rule warns once instead of on every batch
    reported: RefCell<Vec<bool>>,
}

impl<D> HidingCoordinator<D>
where
    D: Document + 'static,
    D::Node: 'static,
{
    pub fn new(doc: Rc<D>, rules: RuleSet) -> Rc<Self> {
        let reported = vec![false; rules.len()];
        Rc::new(Self {
            doc,
            rules,
            phase: Cell::new(Phase::Uninitialized),
            subscription: RefCell::new(None),
            totals: Cell::new(HideReport::default()),
            reported: RefCell::new(reported),
        })
    }

    pub fn phase(&self) -> Phase {
        self.phase.get()
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn document(&self) -> &Rc<D> {
        &self.doc
    }

    /// Running totals over the sweep and every processed batch.
    pub fn totals(&self) -> HideReport {
        self.totals.get()
    }

    /// Sweep now, or once the document stops loading, then start observing.
    pub fn start(self: &Rc<Self>) {
        if self.phase.get() != Phase::Uninitialized {
            log::debug!("start() ignored in phase {:?}", self.phase.get());
            return;
        }

        if self.doc.ready_state().is_loading() {
            log::debug!("document still loading; deferring sweep");
            let coordinator = Rc::clone(self);
            self.doc.on_ready(Box::new(move || coordinator.activate()));
        } else {
            self.activate();
        }
    }

    /// Cancel the mutation subscription and release the handler installed on
    /// the document. Already hidden nodes stay hidden.
    pub fn stop(&self) {
        let subscription = self.subscription.borrow_mut().take();
        if let Some(mut subscription) = subscription {
            subscription.cancel();
        }
        self.phase.set(Phase::Stopped);
        log::info!("hiding stopped after {} nodes", self.totals.get().hidden);
    }

    fn activate(self: &Rc<Self>) {
        if self.phase.get() != Phase::Uninitialized {
            return;
        }

        self.phase.set(Phase::Sweeping);
        let report = self.sweep();
        log::info!(
            "sweep hid {} nodes with {} rules ({} rule failures)",
            report.hidden,
            self.rules.len(),
            report.rule_failures
        );
        self.observe();
    }

    fn observe(self: &Rc<Self>) {
        let Some(body) = self.doc.body() else {
            log::warn!("document has no body; inserted content will not be hidden");
            return;
        };

        let coordinator = Rc::clone(self);
        let handler = Box::new(move |batch: &[MutationRecord<D::Node>]| {
            coordinator.handle_batch(batch);
        });

        match self.doc.observe_insertions(&body, handler) {
            Ok(subscription) => {
                *self.subscription.borrow_mut() = Some(subscription);
                self.phase.set(Phase::Observing);
                log::debug!("observing insertions under body");
            }
            Err(e) => log::warn!("cannot observe insertions: {}", e),
        }
    }

    /// Apply every rule to the whole document.
    pub fn sweep(&self) -> HideReport {
        let Some(root) = self.doc.document_element() else {
            log::warn!("document has no root element; nothing to sweep");
            return HideReport::default();
        };

        let report = self.apply_subtree(&root);
        self.record(report);
        report
    }

    /// Process one mutation batch: every element added by a child-list record
    /// is checked itself and has its subtree searched, for every rule.
    pub fn handle_batch(&self, batch: &[MutationRecord<D::Node>]) -> HideReport {
        let mut report = HideReport::default();

        for record in batch {
            if record.kind != MutationKind::ChildList {
                continue;
            }
            for node in &record.added {
                if self.doc.is_element(node) {
                    report += self.apply_subtree(node);
                }
            }
        }

        if report.hidden > 0 {
            log::debug!("batch of {} records hid {} nodes", batch.len(), report.hidden);
        }
        self.record(report);
        report
    }

    /// Self-check `scope` and hide its matching descendants, rule by rule.
    fn apply_subtree(&self, scope: &D::Node) -> HideReport {
        let matcher = Matcher::new(&*self.doc);
        let mut report = HideReport::default();

        for (idx, rule) in self.rules.iter().enumerate() {
            if matcher.matches(scope, rule) {
                self.hide(scope, &mut report);
            }

            match matcher.find_matching_descendants(scope, rule) {
                Ok(found) => {
                    for node in found {
                        self.hide(&node, &mut report);
                    }
                }
                Err(e) => {
                    report.rule_failures += 1;
                    self.report_failure(idx, rule, &e);
                }
            }
        }

        report
    }

    fn hide(&self, node: &D::Node, report: &mut HideReport) {
        if self.doc.is_hidden(node) {
            return;
        }
        self.doc.hide(node);
        report.hidden += 1;
    }

    fn report_failure(&self, idx: usize, rule: &Rule, error: &dyn std::fmt::Display) {
        let mut reported = self.reported.borrow_mut();
        match reported.get_mut(idx) {
            Some(seen) if !*seen => {
                *seen = true;
                log::warn!("rule '{}' matches nothing: {}", rule, error);
            }
            _ => log::debug!("rule '{}' skipped: {}", rule, error),
        }
    }

    fn record(&self, report: HideReport) {
        let mut totals = self.totals.get();
        totals += report;
        self.totals.set(totals);
    }
}
