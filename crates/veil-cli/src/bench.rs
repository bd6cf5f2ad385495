use std::rc::Rc;
use std::time::Instant;

use veil_compiler::{build_rule_set, parse_rule_list};
use veil_core::dom::NodeId;
use veil_core::{HidingCoordinator, KindMask, MemoryDocument, NodeSpec, RuleSet};

use crate::rules;

pub struct BenchOptions {
    pub rule_paths: Vec<String>,
    pub cards: usize,
    pub batches: usize,
    pub batch_size: usize,
    pub iterations: usize,
}

const DEFAULT_RULES: &str = "\
class=BIG_BROTHER_BRASIL
href=bbb
content:span=Yasmin Brunet
title:a=Paredão
attribute:data-area=splash
";

/// One feed card. Every tenth card carries content the default rules hide.
fn card(index: usize) -> NodeSpec {
    let flagged = index % 10 == 0;
    let href = if flagged {
        format!("/bbb/noticia-{}", index)
    } else {
        format!("/economia/noticia-{}", index)
    };
    let headline = if flagged {
        "Yasmin Brunet deixa a casa"
    } else {
        "Dólar fecha em queda"
    };

    NodeSpec::element("div")
        .class("card")
        .attr("data-index", index.to_string())
        .child(NodeSpec::element("a").attr("href", href).attr("title", "Ver notícia"))
        .child(NodeSpec::element("span").with_text(headline))
        .child(NodeSpec::element("p").with_text("Lorem ipsum dolor sit amet"))
}

fn page(cards: usize) -> (Rc<MemoryDocument>, NodeId) {
    let doc = Rc::new(MemoryDocument::new());
    let feed = doc.append(doc.body_id(), &NodeSpec::element("main").attr("id", "feed"));
    for index in 0..cards {
        doc.append(feed, &card(index));
    }
    doc.flush_mutations();
    (doc, feed)
}

fn load_rules(paths: &[String]) -> Result<RuleSet, String> {
    if paths.is_empty() {
        return Ok(build_rule_set(&parse_rule_list(DEFAULT_RULES).rules));
    }
    let (rules, stats) = rules::compile_rule_lists(paths, KindMask::ALL, false)?;
    println!("Loaded {} rules from {} list(s)", stats.rules_after, paths.len());
    Ok(rules)
}

pub fn run_bench(opts: BenchOptions) -> Result<(), String> {
    if opts.iterations == 0 {
        return Err("--iterations must be at least 1".to_string());
    }
    let rules = load_rules(&opts.rule_paths)?;

    println!("Hiding Benchmark");
    println!("==================================================");
    println!("  Rules:      {}", rules.len());
    println!("  Cards:      {}", opts.cards);
    println!("  Batches:    {} x {} cards", opts.batches, opts.batch_size);
    println!();

    let mut sweep_ms = Vec::with_capacity(opts.iterations);
    let mut batch_us = Vec::with_capacity(opts.iterations * opts.batches);
    let mut hidden = 0usize;

    for _ in 0..opts.iterations {
        let (doc, feed) = page(opts.cards);
        let coordinator = HidingCoordinator::new(Rc::clone(&doc), rules.clone());

        let start = Instant::now();
        coordinator.start();
        sweep_ms.push(start.elapsed().as_secs_f64() * 1000.0);

        let mut next = opts.cards;
        for _ in 0..opts.batches {
            for _ in 0..opts.batch_size {
                doc.append(feed, &card(next));
                next += 1;
            }
            let start = Instant::now();
            doc.flush_mutations();
            batch_us.push(start.elapsed().as_secs_f64() * 1_000_000.0);
        }

        hidden = coordinator.totals().hidden;
    }

    sort_samples(&mut sweep_ms);
    sort_samples(&mut batch_us);

    println!("Results");
    println!("--------------------------------------------------");
    println!(
        "  Sweep:      p50 {:.3} ms, p99 {:.3} ms, max {:.3} ms",
        percentile(&sweep_ms, 0.50),
        percentile(&sweep_ms, 0.99),
        percentile(&sweep_ms, 1.0)
    );
    if !batch_us.is_empty() {
        println!(
            "  Batch:      p50 {:.1} μs, p99 {:.1} μs, max {:.1} μs",
            percentile(&batch_us, 0.50),
            percentile(&batch_us, 0.99),
            percentile(&batch_us, 1.0)
        );
    }
    println!("  Hidden:     {} nodes per run", hidden);

    Ok(())
}

fn sort_samples(samples: &mut [f64]) {
    samples.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
}

fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64) * p).ceil() as usize;
    let idx = idx.saturating_sub(1).min(sorted.len() - 1);
    sorted[idx]
}
