//! Veil Rule List Compiler
//!
//! This crate turns rule lists (JSON or the line-oriented text format) into
//! a deduplicated [`veil_core::RuleSet`].

pub mod builder;
pub mod optimizer;
pub mod parser;
pub mod schema;

pub use builder::{build_rule_set, check_rules, to_json, RuleIssue};
pub use optimizer::{optimize_rules, OptimizeStats};
pub use parser::{parse_rule_list, parse_rule_list_json, parse_rule_list_text, CompiledRule, ParseError, ParseReport};
pub use schema::RawRule;
