//! `web-sys` backend for the document interface.
//!
//! Queries go straight to `querySelectorAll`, so the browser's selector
//! engine decides what is valid. The hide action sets an inline
//! `display: none !important`, so page stylesheets cannot bring the node back.

use veil_core::dom::{MutationHandler, ReadyCallback};
use veil_core::{Document, MutationKind, MutationRecord, ObserveError, Query, QueryError, ReadyState, Subscription};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{
    AddEventListenerOptions, CssStyleDeclaration, Element, HtmlElement, MutationObserver,
    MutationObserverInit, Node, NodeList, SvgElement,
};

pub struct WebDocument {
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(document: web_sys::Document) -> Self {
        Self { document }
    }

    /// `window.document`, if there is one.
    pub fn current() -> Option<Self> {
        web_sys::window().and_then(|window| window.document()).map(Self::new)
    }
}

/// Cancellable MutationObserver registration. Owns the JS callback, so the
/// observer is disconnected before the callback is freed.
pub struct WebSubscription {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
    active: bool,
}

impl Subscription for WebSubscription {
    fn cancel(&mut self) {
        if self.active {
            self.observer.disconnect();
            self.active = false;
        }
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

impl Drop for WebSubscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

fn js_error_message(error: &JsValue) -> String {
    error
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| error.as_string())
        .unwrap_or_else(|| "unknown error".to_string())
}

fn collect_nodes(list: &NodeList) -> Vec<Node> {
    (0..list.length()).filter_map(|i| list.item(i)).collect()
}

const HIDDEN_DECLARATION: &str = "display: none !important";

pub(crate) fn append_hidden_declaration(style: &str) -> String {
    let style = style.trim_end();
    if style.is_empty() {
        format!("{};", HIDDEN_DECLARATION)
    } else if style.ends_with(';') {
        format!("{} {};", style, HIDDEN_DECLARATION)
    } else {
        format!("{}; {};", style, HIDDEN_DECLARATION)
    }
}

fn inline_style(node: &Node) -> Option<CssStyleDeclaration> {
    if let Some(element) = node.dyn_ref::<HtmlElement>() {
        return Some(element.style());
    }
    node.dyn_ref::<SvgElement>().map(|element| element.style())
}

fn convert_records(records: &js_sys::Array) -> Vec<MutationRecord<Node>> {
    records
        .iter()
        .filter_map(|value| {
            let record: web_sys::MutationRecord = value.unchecked_into();
            let target = record.target()?;
            let kind = match record.type_().as_str() {
                "childList" => MutationKind::ChildList,
                "attributes" => MutationKind::Attributes,
                _ => MutationKind::CharacterData,
            };
            let added = match kind {
                MutationKind::ChildList => collect_nodes(&record.added_nodes()),
                _ => Vec::new(),
            };
            Some(MutationRecord { kind, target, added })
        })
        .collect()
}

impl Document for WebDocument {
    type Node = Node;
    type Subscription = WebSubscription;

    fn ready_state(&self) -> ReadyState {
        match self.document.ready_state().as_str() {
            "loading" => ReadyState::Loading,
            "interactive" => ReadyState::Interactive,
            _ => ReadyState::Complete,
        }
    }

    fn document_element(&self) -> Option<Node> {
        self.document.document_element().map(Node::from)
    }

    fn body(&self) -> Option<Node> {
        self.document.body().map(Node::from)
    }

    fn is_element(&self, node: &Node) -> bool {
        node.node_type() == Node::ELEMENT_NODE
    }

    fn tag_name(&self, node: &Node) -> String {
        node.dyn_ref::<Element>().map(Element::tag_name).unwrap_or_default()
    }

    fn has_class(&self, node: &Node, class: &str) -> bool {
        node.dyn_ref::<Element>()
            .is_some_and(|element| element.class_list().contains(class))
    }

    fn attribute(&self, node: &Node, name: &str) -> Option<String> {
        node.dyn_ref::<Element>().and_then(|element| element.get_attribute(name))
    }

    fn text_content(&self, node: &Node) -> String {
        node.text_content().unwrap_or_default()
    }

    fn query_all(&self, scope: &Node, query: &Query<'_>) -> Result<Vec<Node>, QueryError> {
        let Some(element) = scope.dyn_ref::<Element>() else {
            return Ok(Vec::new());
        };
        let selector = query.to_string();
        element
            .query_selector_all(&selector)
            .map(|list| collect_nodes(&list))
            .map_err(|e| QueryError::invalid_selector(selector, js_error_message(&e)))
    }

    fn hide(&self, node: &Node) {
        if let Some(style) = inline_style(node) {
            if let Err(e) = style.set_property_with_priority("display", "none", "important") {
                log::debug!("cannot set display: {}", js_error_message(&e));
            }
            return;
        }

        // Elements without a CSSOM `style` (MathML in older engines) get the
        // declaration appended to their style attribute.
        let Some(element) = node.dyn_ref::<Element>() else {
            return;
        };
        let current = element.get_attribute("style").unwrap_or_default();
        if let Err(e) = element.set_attribute("style", &append_hidden_declaration(&current)) {
            log::debug!("cannot set style attribute: {}", js_error_message(&e));
        }
    }

    fn is_hidden(&self, node: &Node) -> bool {
        if let Some(style) = inline_style(node) {
            return style.get_property_value("display").is_ok_and(|display| display == "none")
                && style.get_property_priority("display") == "important";
        }
        node.dyn_ref::<Element>()
            .and_then(|element| element.get_attribute("style"))
            .is_some_and(|style| style.contains(HIDDEN_DECLARATION))
    }

    fn on_ready(&self, callback: ReadyCallback) {
        let listener = Closure::once_into_js(move || callback());
        let options = AddEventListenerOptions::new();
        options.set_once(true);
        if let Err(e) = self.document.add_event_listener_with_callback_and_add_event_listener_options(
            "DOMContentLoaded",
            listener.unchecked_ref(),
            &options,
        ) {
            log::warn!("cannot wait for DOMContentLoaded: {}", js_error_message(&e));
        }
    }

    fn observe_insertions(
        &self,
        target: &Node,
        handler: MutationHandler<Node>,
    ) -> Result<WebSubscription, ObserveError> {
        let mut handler = handler;
        let callback = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |records: js_sys::Array, _observer: MutationObserver| {
                let batch = convert_records(&records);
                handler(&batch);
            },
        );

        let observer = MutationObserver::new(callback.as_ref().unchecked_ref())
            .map_err(|e| ObserveError::Host(js_error_message(&e)))?;

        let init = MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        observer
            .observe_with_options(target, &init)
            .map_err(|e| ObserveError::Host(js_error_message(&e)))?;

        Ok(WebSubscription {
            observer,
            _callback: callback,
            active: true,
        })
    }
}
