//! Browser tests for the `web-sys` document backend.
//!
//! Run with `wasm-pack test --headless --firefox crates/veil-wasm`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use veil_core::{Document, HidingCoordinator, MutationKind, Query, QueryError, Rule, RuleSet, Subscription};
use veil_wasm::WebDocument;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::{Element, Node};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> web_sys::Document {
    web_sys::window().unwrap().document().unwrap()
}

fn element(tag: &str) -> Element {
    document().create_element(tag).unwrap()
}

fn mount(node: &Element) {
    document().body().unwrap().append_child(node).unwrap();
}

/// Let pending MutationObserver callbacks run. They are queued as
/// microtasks ahead of this promise's continuation.
async fn next_microtask() {
    let _ = JsFuture::from(js_sys::Promise::resolve(&JsValue::NULL)).await;
}

fn bbb_widget(href: &str) -> (Element, Element) {
    let widget = element("div");
    let link = element("a");
    link.set_attribute("href", href).unwrap();
    widget.append_child(&link).unwrap();
    (widget, link)
}

fn display(node: &Element) -> String {
    let style = node.get_attribute("style").unwrap_or_default();
    style.replace(' ', "")
}

#[wasm_bindgen_test]
fn sweep_hides_matching_elements() {
    let root = element("section");
    root.set_id("sweep-fixture");

    let card = element("div");
    card.set_class_name("BIG_BROTHER_BRASIL card");
    let link = element("a");
    link.set_attribute("href", "https://example.com/bbb/news").unwrap();
    let span = element("span");
    span.set_text_content(Some("Yasmin Brunet no paredão"));
    let keep = element("p");
    keep.set_text_content(Some("Previsão do tempo"));

    for child in [&card, &link, &span, &keep] {
        root.append_child(child).unwrap();
    }
    mount(&root);

    let rules = RuleSet::new(vec![
        Rule::class("BIG_BROTHER_BRASIL"),
        Rule::href("bbb"),
        Rule::content("span", "yasmin brunet"),
    ]);
    let doc = Rc::new(WebDocument::new(document()));
    let coordinator = HidingCoordinator::new(Rc::clone(&doc), rules);
    coordinator.start();
    coordinator.stop();

    assert_eq!(display(&card), "display:none!important;");
    assert_eq!(display(&link), "display:none!important;");
    assert_eq!(display(&span), "display:none!important;");
    assert_eq!(display(&keep), "");
    assert!(doc.is_hidden(&Node::from(card.clone())));
    assert!(coordinator.totals().hidden >= 3);

    root.remove();
}

#[wasm_bindgen_test]
fn invalid_selector_is_reported() {
    let doc = WebDocument::new(document());
    let scope = doc.document_element().unwrap();
    let result = doc.query_all(&scope, &Query::Tag("span["));
    assert!(matches!(result, Err(QueryError::InvalidSelector { .. })));
}

#[wasm_bindgen_test]
fn reads_element_attributes() {
    let node = element("a");
    node.set_attribute("title", "Paredão BBB").unwrap();
    node.set_class_name("a b");
    let node = Node::from(node);

    let doc = WebDocument::new(document());
    assert!(doc.is_element(&node));
    assert_eq!(doc.tag_name(&node), "A");
    assert!(doc.has_class(&node, "b"));
    assert!(!doc.has_class(&node, "c"));
    assert_eq!(doc.attribute(&node, "title").as_deref(), Some("Paredão BBB"));
    assert_eq!(doc.attribute(&node, "href"), None);
}

#[wasm_bindgen_test]
fn compile_rule_lists_merges_and_dedupes() {
    let lists = js_sys::Array::new();
    lists.push(&"class=BIG_BROTHER_BRASIL\nhref=bbb".into());
    lists.push(&r#"[{"type":"href","value":"bbb"},{"type":"regex","value":"x"}]"#.into());

    let result = veil_wasm::compile_rule_lists(lists.into()).unwrap();
    let get = |key: &str| js_sys::Reflect::get(&result, &key.into()).unwrap();

    assert_eq!(get("rulesBefore").as_f64(), Some(3.0));
    assert_eq!(get("rulesAfter").as_f64(), Some(2.0));
    assert_eq!(js_sys::Array::from(&get("errors")).length(), 1);
}

#[wasm_bindgen_test]
fn hide_overrides_important_stylesheet_rule() {
    let style = element("style");
    style.set_text_content(Some(".forced { display: block !important; }"));
    mount(&style);

    let node = element("div");
    node.set_class_name("forced");
    mount(&node);

    let doc = WebDocument::new(document());
    let node_ref = Node::from(node.clone());
    doc.hide(&node_ref);
    assert!(doc.is_hidden(&node_ref));

    let computed = web_sys::window().unwrap().get_computed_style(&node).unwrap().unwrap();
    assert_eq!(computed.get_property_value("display").unwrap(), "none");

    node.remove();
    style.remove();
}

#[wasm_bindgen_test]
fn hide_falls_back_to_style_attribute() {
    let math = document()
        .create_element_ns(Some("http://www.w3.org/1998/Math/MathML"), "math")
        .unwrap();
    math.set_attribute("style", "color: red").unwrap();
    mount(&math);

    let doc = WebDocument::new(document());
    let node = Node::from(math.clone());
    doc.hide(&node);
    assert!(doc.is_hidden(&node));
    assert!(display(&math).contains("display:none!important"));

    math.remove();
}

#[wasm_bindgen_test]
fn ready_callback_fires_on_dom_content_loaded() {
    let doc = WebDocument::new(document());
    let fired = Rc::new(Cell::new(0));
    let counter = Rc::clone(&fired);
    doc.on_ready(Box::new(move || counter.set(counter.get() + 1)));
    assert_eq!(fired.get(), 0);

    let event = web_sys::Event::new("DOMContentLoaded").unwrap();
    document().dispatch_event(&event).unwrap();
    document().dispatch_event(&event).unwrap();
    assert_eq!(fired.get(), 1);
}

#[wasm_bindgen_test]
async fn subscription_delivers_insertions_until_cancelled() {
    let doc = WebDocument::new(document());
    let body = doc.body().unwrap();
    let seen: Rc<RefCell<Vec<(MutationKind, usize)>>> = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut subscription = doc
        .observe_insertions(
            &body,
            Box::new(move |batch| {
                for record in batch {
                    sink.borrow_mut().push((record.kind, record.added.len()));
                }
            }),
        )
        .unwrap();

    let (first, _) = bbb_widget("/noticia");
    mount(&first);
    next_microtask().await;
    assert_eq!(seen.borrow().as_slice(), &[(MutationKind::ChildList, 1)]);

    subscription.cancel();
    assert!(!subscription.is_active());
    let (second, _) = bbb_widget("/noticia/2");
    mount(&second);
    next_microtask().await;
    assert_eq!(seen.borrow().len(), 1);

    first.remove();
    second.remove();
}

#[wasm_bindgen_test]
async fn started_hider_follows_insertions_until_stopped() {
    let report = veil_wasm::start("href=bbb", None).unwrap();
    let errors = js_sys::Reflect::get(&report, &"errors".into()).unwrap();
    assert_eq!(js_sys::Array::from(&errors).length(), 0);
    assert!(veil_wasm::is_started());
    assert_eq!(veil_wasm::phase(), "observing");
    assert!(veil_wasm::start("href=bbb", None).is_err());

    let before = veil_wasm::hidden_count();
    let (widget, link) = bbb_widget("https://example.com/bbb/ao-vivo");
    mount(&widget);
    next_microtask().await;

    assert_eq!(display(&link), "display:none!important;");
    assert_eq!(display(&widget), "");
    assert_eq!(veil_wasm::hidden_count(), before + 1);

    veil_wasm::stop();
    assert_eq!(veil_wasm::phase(), "stopped");

    let (late_widget, late_link) = bbb_widget("https://example.com/bbb/replay");
    mount(&late_widget);
    next_microtask().await;
    assert_eq!(display(&late_link), "");
    assert_eq!(veil_wasm::hidden_count(), before + 1);

    widget.remove();
    late_widget.remove();
}
