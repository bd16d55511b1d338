//! DOM implementations of the sleeve-forms element capabilities

use std::rc::Rc;

use sleeve_forms::{
    read_value, ChangeListener, ChangeSource, Container, ElementKind, ElementRef, FieldElement,
    FormError, FormResult,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Element, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement};

/// A DOM element bound as a form field
#[derive(Clone)]
pub struct DomElement {
    element: Element,
}

impl DomElement {
    pub fn new(element: Element) -> Self {
        Self { element }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    /// Native event signalling a value change for this element
    pub fn change_event(&self) -> &'static str {
        match self.kind() {
            ElementKind::Select => "change",
            _ => "input",
        }
    }
}

impl ChangeSource for DomElement {
    fn subscribe(&self, listener: ChangeListener) -> FormResult<()> {
        let source = self.clone();
        let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
            listener(read_value(&source));
        }) as Box<dyn FnMut(web_sys::Event)>);

        self.element
            .add_event_listener_with_callback(self.change_event(), closure.as_ref().unchecked_ref())
            .map_err(|err| FormError::Subscription {
                field: self
                    .element
                    .get_attribute("name")
                    .unwrap_or_else(|| self.element.tag_name()),
                reason: describe_js_error(&err),
            })?;

        // Listeners live as long as the element
        closure.forget();
        Ok(())
    }
}

impl FieldElement for DomElement {
    fn kind(&self) -> ElementKind {
        ElementKind::from_tag_name(&self.element.tag_name())
    }

    fn attribute(&self, name: &str) -> Option<String> {
        self.element.get_attribute(name)
    }

    fn value(&self) -> Option<String> {
        if let Some(input) = self.element.dyn_ref::<HtmlInputElement>() {
            return Some(input.value());
        }
        if let Some(textarea) = self.element.dyn_ref::<HtmlTextAreaElement>() {
            return Some(textarea.value());
        }
        if let Some(select) = self.element.dyn_ref::<HtmlSelectElement>() {
            return Some(select.value());
        }

        // Custom elements may still expose a `value` property
        js_sys::Reflect::get(&self.element, &JsValue::from_str("value"))
            .ok()
            .and_then(|value| value.as_string())
    }

    fn text_content(&self) -> Option<String> {
        self.element.text_content()
    }
}

impl From<DomElement> for ElementRef {
    fn from(element: DomElement) -> Self {
        Rc::new(element)
    }
}

/// Whatever JavaScript handed to `bind`
pub struct DomContainer {
    target: JsValue,
}

impl DomContainer {
    /// `None` for `null`/`undefined`
    pub fn from_js(target: JsValue) -> Option<Self> {
        if target.is_null() || target.is_undefined() {
            None
        } else {
            Some(Self { target })
        }
    }

    fn element(&self) -> Option<&Element> {
        self.target.dyn_ref::<Element>()
    }
}

impl Container for DomContainer {
    fn is_traversable(&self) -> bool {
        self.element().is_some()
    }

    fn descendants_with_attribute(&self, attribute: &str) -> Vec<ElementRef> {
        let Some(element) = self.element() else {
            return Vec::new();
        };

        let nodes = match element.query_selector_all(&format!("[{}]", attribute)) {
            Ok(nodes) => nodes,
            Err(err) => {
                tracing::warn!(
                    "Invalid field attribute selector [{}]: {}",
                    attribute,
                    describe_js_error(&err)
                );
                return Vec::new();
            }
        };

        (0..nodes.length())
            .filter_map(|index| nodes.item(index))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .map(|element| ElementRef::from(DomElement::new(element)))
            .collect()
    }
}

pub(crate) fn describe_js_error(err: &JsValue) -> String {
    if let Some(message) = err.as_string() {
        return message;
    }
    if let Some(error) = err.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", err)
}
