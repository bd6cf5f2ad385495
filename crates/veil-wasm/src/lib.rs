//! WebAssembly bindings for Veil

pub mod logger;
pub mod web;

use std::cell::RefCell;
use std::rc::Rc;

use veil_compiler::{build_rule_set, optimize_rules, parse_rule_list, to_json};
use veil_core::{HidingCoordinator, KindMask, Phase};
use wasm_bindgen::prelude::*;

pub use web::{WebDocument, WebSubscription};

thread_local! {
    static COORDINATOR: RefCell<Option<Rc<HidingCoordinator<WebDocument>>>> = const { RefCell::new(None) };
}

fn set_prop(target: &js_sys::Object, key: &str, value: &JsValue) {
    let _ = js_sys::Reflect::set(target, &key.into(), value);
}

/// Compile a rule list (JSON or text) and start hiding on `window.document`.
///
/// Entries that fail to compile are skipped and reported in `errors`.
#[wasm_bindgen]
pub fn start(rule_list: &str, log_level: Option<String>) -> Result<JsValue, JsValue> {
    logger::init(logger::parse_level(log_level.as_deref().unwrap_or("warn")));

    if is_started() {
        return Err(JsValue::from_str("Already started. Reload the page to restart."));
    }

    let document = WebDocument::current().ok_or_else(|| JsValue::from_str("No document available"))?;

    let report = parse_rule_list(rule_list);
    let mut compiled = report.rules;
    optimize_rules(&mut compiled, KindMask::ALL);
    let rules = build_rule_set(&compiled);
    let rule_count = rules.len();

    let coordinator = HidingCoordinator::new(Rc::new(document), rules);
    COORDINATOR.with(|slot| *slot.borrow_mut() = Some(Rc::clone(&coordinator)));
    coordinator.start();

    let errors = js_sys::Array::new();
    for error in &report.errors {
        errors.push(&JsValue::from_str(&error.to_string()));
    }

    let result = js_sys::Object::new();
    set_prop(&result, "rules", &JsValue::from(rule_count as u32));
    set_prop(&result, "errors", &errors);
    set_prop(&result, "phase", &JsValue::from_str(phase_name(coordinator.phase())));
    Ok(result.into())
}

#[wasm_bindgen]
pub fn is_started() -> bool {
    COORDINATOR.with(|slot| slot.borrow().is_some())
}

/// Stop observing insertions. Hidden elements stay hidden.
#[wasm_bindgen]
pub fn stop() {
    COORDINATOR.with(|slot| {
        if let Some(coordinator) = slot.borrow().as_ref() {
            coordinator.stop();
        }
    });
}

#[wasm_bindgen]
pub fn hidden_count() -> u32 {
    COORDINATOR.with(|slot| {
        slot.borrow()
            .as_ref()
            .map_or(0, |coordinator| coordinator.totals().hidden as u32)
    })
}

#[wasm_bindgen]
pub fn phase() -> String {
    COORDINATOR.with(|slot| {
        let phase = slot
            .borrow()
            .as_ref()
            .map_or(Phase::Uninitialized, |coordinator| coordinator.phase());
        phase_name(phase).to_string()
    })
}

fn phase_name(phase: Phase) -> &'static str {
    match phase {
        Phase::Uninitialized => "uninitialized",
        Phase::Sweeping => "sweeping",
        Phase::Observing => "observing",
        Phase::Stopped => "stopped",
    }
}

/// Compile several rule lists into one canonical JSON list.
#[wasm_bindgen]
pub fn compile_rule_lists(list_texts: JsValue) -> Result<JsValue, JsValue> {
    let list_array = js_sys::Array::from(&list_texts);
    let list_count = list_array.length() as usize;

    if list_count == 0 {
        return Err(JsValue::from_str("No list texts provided"));
    }

    let mut all_rules = Vec::new();
    let errors = js_sys::Array::new();
    let mut rules_before_per_list: Vec<usize> = Vec::with_capacity(list_count);

    for (idx, value) in list_array.iter().enumerate() {
        let text = value
            .as_string()
            .ok_or_else(|| JsValue::from_str("List text must be a string"))?;

        let report = parse_rule_list(&text).with_list_id(idx as u16);
        for error in &report.errors {
            errors.push(&JsValue::from_str(&format!("list {}: {}", idx, error)));
        }
        rules_before_per_list.push(report.rules.len());
        all_rules.extend(report.rules);
    }

    let stats = optimize_rules(&mut all_rules, KindMask::ALL);

    let mut rules_after_per_list = vec![0usize; list_count];
    for rule in &all_rules {
        let list_id = rule.list_id as usize;
        if list_id < list_count {
            rules_after_per_list[list_id] += 1;
        }
    }

    let json = to_json(&build_rule_set(&all_rules)).map_err(|e| JsValue::from_str(&e.to_string()))?;

    let js_result = js_sys::Object::new();
    set_prop(&js_result, "rules", &JsValue::from_str(&json));
    set_prop(&js_result, "rulesBefore", &JsValue::from(stats.before as u32));
    set_prop(&js_result, "rulesAfter", &JsValue::from(stats.after as u32));
    set_prop(&js_result, "rulesDeduped", &JsValue::from(stats.deduped as u32));
    set_prop(&js_result, "errors", &errors);

    let list_stats = js_sys::Array::new_with_length(list_count as u32);
    for i in 0..list_count {
        let stat = js_sys::Object::new();
        set_prop(&stat, "rulesBefore", &JsValue::from(rules_before_per_list[i] as u32));
        set_prop(&stat, "rulesAfter", &JsValue::from(rules_after_per_list[i] as u32));
        list_stats.set(i as u32, stat.into());
    }
    set_prop(&js_result, "listStats", &list_stats);

    Ok(js_result.into())
}
