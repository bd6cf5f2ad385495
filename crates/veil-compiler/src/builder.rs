use veil_core::{Rule, RuleSet, SelectorError};

use crate::parser::CompiledRule;
use crate::schema::RawRule;

/// Freeze compiled rules into the set handed to the coordinator.
pub fn build_rule_set(rules: &[CompiledRule]) -> RuleSet {
    rules.iter().map(|compiled| compiled.rule.clone()).collect()
}

/// Canonical JSON rendering of a rule set.
pub fn to_json(rules: &RuleSet) -> Result<String, serde_json::Error> {
    let raw: Vec<RawRule> = rules.iter().map(RawRule::from).collect();
    serde_json::to_string_pretty(&raw)
}

/// A rule whose structural query would be rejected by a selector engine.
/// Such a rule compiles but never hides anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleIssue {
    pub index: usize,
    pub rule: Rule,
    pub error: SelectorError,
}

pub fn check_rules(rules: &RuleSet) -> Vec<RuleIssue> {
    rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            rule.query().check().err().map(|error| RuleIssue {
                index,
                rule: rule.clone(),
                error,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use veil_core::KindMask;

    use super::*;
    use crate::optimizer::optimize_rules;
    use crate::parser::{parse_rule_list, parse_rule_list_json};

    #[test]
    fn test_json_round_trip_through_text_list() {
        let mut compiled = parse_rule_list(
            "class=BIG_BROTHER_BRASIL\ncontent:span=Yasmin Brunet\nattribute:data-area=splash\nclass=BIG_BROTHER_BRASIL",
        )
        .rules;
        optimize_rules(&mut compiled, KindMask::ALL);
        let rules = build_rule_set(&compiled);

        let json = to_json(&rules).unwrap();
        let reparsed = parse_rule_list_json(&json);
        assert!(reparsed.errors.is_empty());
        assert_eq!(build_rule_set(&reparsed.rules), rules);
        assert_eq!(rules.len(), 3);
    }

    #[test]
    fn test_check_rules_flags_broken_selectors() {
        let compiled = parse_rule_list(
            "class=BIG BROTHER\nhref=bbb\nattribute:data-area=say \"hi\"\ncontent:span.big=x\ntitle:a=\"quoted\" is fine",
        )
        .rules;
        let issues = check_rules(&build_rule_set(&compiled));

        let indexes: Vec<_> = issues.iter().map(|issue| issue.index).collect();
        assert_eq!(indexes, vec![0, 2, 3]);
        assert!(matches!(issues[1].error, SelectorError::UnterminatedString { .. }));
    }
}
