use std::collections::HashSet;

use veil_core::{KindMask, Rule};

use crate::parser::CompiledRule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
    pub disabled: usize,
}

/// Drop rules of kinds outside `enabled`, then drop exact duplicates across
/// all lists. The first occurrence wins, so list order is kept.
pub fn optimize_rules(rules: &mut Vec<CompiledRule>, enabled: KindMask) -> OptimizeStats {
    let before = rules.len();

    let mut disabled = 0usize;
    rules.retain(|compiled| {
        if enabled.contains(compiled.rule.kind().mask()) {
            true
        } else {
            disabled += 1;
            false
        }
    });

    let mut seen: HashSet<Rule> = HashSet::with_capacity(rules.len());
    let mut deduped = 0usize;
    rules.retain(|compiled| {
        if seen.contains(&compiled.rule) {
            deduped += 1;
            false
        } else {
            seen.insert(compiled.rule.clone());
            true
        }
    });

    let after = rules.len();
    log::debug!(
        "optimized {} rules to {} ({} duplicates, {} disabled)",
        before,
        after,
        deduped,
        disabled
    );

    OptimizeStats {
        before,
        after,
        deduped,
        disabled,
    }
}
