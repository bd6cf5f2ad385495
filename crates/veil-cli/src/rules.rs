use std::fs;
use std::path::Path;
use std::time::Instant;

use veil_compiler::{build_rule_set, optimize_rules, parse_rule_list};
use veil_core::{KindMask, RuleKind, RuleSet};

#[derive(Debug, Clone)]
pub struct CompileStats {
    pub lines: usize,
    pub rules_before: usize,
    pub rules_after: usize,
    pub rules_deduped: usize,
    pub rules_disabled: usize,
    pub errors: Vec<String>,
    pub total_ms: f64,
}

/// Kinds left enabled after removing the named ones.
pub fn enabled_kinds(disabled: &[String]) -> Result<KindMask, String> {
    let mut enabled = KindMask::ALL;
    for name in disabled {
        let kind = RuleKind::try_from(name.as_str()).map_err(|_| format!("Unknown rule kind '{}'", name))?;
        enabled.remove(kind.mask());
    }
    Ok(enabled)
}

/// Read, parse, merge and dedupe rule lists in the order given.
pub fn compile_rule_lists(inputs: &[String], enabled: KindMask, verbose: bool) -> Result<(RuleSet, CompileStats), String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }

    let start = Instant::now();
    let mut all_rules = Vec::new();
    let mut errors = Vec::new();
    let mut lines = 0usize;

    for (list_id, path) in inputs.iter().enumerate() {
        let content = fs::read_to_string(path).map_err(|e| format!("Failed to read '{}': {}", path, e))?;
        let line_count = content.lines().count();
        lines += line_count;

        let report = parse_rule_list(&content).with_list_id(list_id as u16);
        let name = Path::new(path).file_name().unwrap_or_default().to_string_lossy();

        if verbose {
            println!(
                "  [{}] {} - {} lines, {} rules, {} errors",
                list_id,
                name,
                line_count,
                report.rules.len(),
                report.errors.len()
            );
        }

        errors.extend(report.errors.iter().map(|e| format!("{}: {}", name, e)));
        all_rules.extend(report.rules);
    }

    let optimize_stats = optimize_rules(&mut all_rules, enabled);
    let rules = build_rule_set(&all_rules);

    let stats = CompileStats {
        lines,
        rules_before: optimize_stats.before,
        rules_after: optimize_stats.after,
        rules_deduped: optimize_stats.deduped,
        rules_disabled: optimize_stats.disabled,
        errors,
        total_ms: start.elapsed().as_secs_f64() * 1000.0,
    };

    Ok((rules, stats))
}
