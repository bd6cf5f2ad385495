//! Veil CLI
//!
//! Compiles rule lists, checks them for rules a browser would reject, and
//! runs them against JSON page fixtures.

mod bench;
mod page;
mod rules;

use std::fs;
use std::rc::Rc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use veil_compiler::{check_rules, to_json};
use veil_core::{HidingCoordinator, KindMask};

use crate::bench::BenchOptions;
use crate::page::PageFixture;

#[derive(Parser)]
#[command(name = "veil-cli")]
#[command(about = "Veil rule list compiler and tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge rule lists into one canonical JSON list
    Compile {
        /// Input rule list files (JSON or text)
        #[arg(short, long, required = true)]
        input: Vec<String>,

        /// Output JSON file
        #[arg(short, long, default_value = "rules.json")]
        output: String,

        /// Drop every rule of this kind
        #[arg(long = "disable", value_name = "KIND")]
        disable: Vec<String>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Report entries that do not compile and rules whose selector is invalid
    Check {
        /// Rule list files to check
        #[arg(short, long, required = true)]
        input: Vec<String>,
    },

    /// Run rule lists against a page fixture and print what gets hidden
    Apply {
        /// Rule list files
        #[arg(short, long, required = true)]
        rules: Vec<String>,

        /// Page fixture (JSON)
        #[arg(short, long)]
        page: String,

        /// Log matcher and coordinator activity to stderr
        #[arg(short, long)]
        verbose: bool,
    },

    /// Time the sweep and insertion batches on a synthetic feed page
    Bench {
        /// Rule list files (defaults to a built-in list)
        #[arg(short, long)]
        rules: Vec<String>,

        /// Cards on the initial page
        #[arg(long, default_value_t = 2000)]
        cards: usize,

        /// Insertion batches per run
        #[arg(long, default_value_t = 50)]
        batches: usize,

        /// Cards per insertion batch
        #[arg(long, default_value_t = 10)]
        batch_size: usize,

        /// Runs, each on a fresh page
        #[arg(long, default_value_t = 20)]
        iterations: usize,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Compile {
            input,
            output,
            disable,
            verbose,
        } => cmd_compile(&input, &output, &disable, verbose),
        Commands::Check { input } => cmd_check(&input),
        Commands::Apply { rules, page, verbose } => cmd_apply(&rules, &page, verbose),
        Commands::Bench {
            rules,
            cards,
            batches,
            batch_size,
            iterations,
        } => bench::run_bench(BenchOptions {
            rule_paths: rules,
            cards,
            batches,
            batch_size,
            iterations,
        }),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins when set and valid; otherwise `--verbose` picks the level.
fn log_filter(verbose: bool, env: Option<&str>) -> EnvFilter {
    let default = if verbose { "debug" } else { "warn" };
    env.and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Route the `log` records of the library crates to stderr.
fn init_logging(verbose: bool) {
    let env = std::env::var("RUST_LOG").ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, env.as_deref()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn cmd_compile(inputs: &[String], output: &str, disable: &[String], verbose: bool) -> Result<(), String> {
    init_logging(verbose);
    let enabled = rules::enabled_kinds(disable)?;
    let (rule_set, stats) = rules::compile_rule_lists(inputs, enabled, verbose)?;

    let json = to_json(&rule_set).map_err(|e| format!("Failed to serialize rules: {}", e))?;
    fs::write(output, json).map_err(|e| format!("Failed to write '{}': {}", output, e))?;

    println!("Compiled {} rule lists to '{}'", inputs.len(), output);
    println!("  Lines:    {}", stats.lines);
    println!(
        "  Rules:    {} -> {} (dedupe removed {}, disabled {})",
        stats.rules_before, stats.rules_after, stats.rules_deduped, stats.rules_disabled
    );
    println!("  Errors:   {}", stats.errors.len());
    println!("  Time:     {:.1}ms", stats.total_ms);

    for error in &stats.errors {
        println!("    {}", error);
    }

    Ok(())
}

fn cmd_check(inputs: &[String]) -> Result<(), String> {
    init_logging(false);
    let (rule_set, stats) = rules::compile_rule_lists(inputs, KindMask::ALL, false)?;
    let issues = check_rules(&rule_set);

    for error in &stats.errors {
        println!("  ✗ {}", error);
    }
    for issue in &issues {
        println!("  ✗ rule {} ({}): {}", issue.index, issue.rule, issue.error);
    }

    let problems = stats.errors.len() + issues.len();
    if problems == 0 {
        println!("✓ {} rules OK", rule_set.len());
        Ok(())
    } else {
        Err(format!("{} problem(s) in {} rule(s)", problems, stats.rules_before + stats.errors.len()))
    }
}

fn cmd_apply(rule_paths: &[String], page_path: &str, verbose: bool) -> Result<(), String> {
    init_logging(verbose);
    let (rule_set, stats) = rules::compile_rule_lists(rule_paths, KindMask::ALL, false)?;
    for error in &stats.errors {
        eprintln!("warning: {}", error);
    }

    let fixture = PageFixture::load(page_path)?;
    let doc = Rc::new(fixture.build());
    let coordinator = HidingCoordinator::new(Rc::clone(&doc), rule_set);

    coordinator.start();
    if fixture.loading {
        println!("Document loading; sweep deferred ({:?})", coordinator.phase());
        doc.finish_loading();
    }

    let swept = coordinator.totals();
    println!("Sweep:      {} hidden, {} rule failures", swept.hidden, swept.rule_failures);

    for (idx, batch) in fixture.batches.iter().enumerate() {
        let before = coordinator.totals().hidden;
        let inserted = page::insert_batch(&doc, batch)?;
        doc.flush_mutations();
        println!(
            "Batch {:<4} {} inserted, {} hidden",
            idx,
            inserted.len(),
            coordinator.totals().hidden - before
        );
    }

    println!("Phase:      {:?}", coordinator.phase());
    let hidden = doc.hidden_nodes();
    println!();
    println!("Hidden nodes:");
    for node in &hidden {
        println!("  {}", doc.describe(*node));
    }
    println!("Total:      {}", hidden.len());

    Ok(())
}
