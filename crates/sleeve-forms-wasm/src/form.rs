//! The `Form` class exported to JavaScript

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use js_sys::Function;
use serde::Serialize;
use sleeve_forms::{Container, Fields, Form, FormConfig, FormError};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

use crate::dom::{DomContainer, DomElement};

/// Plain-object view of a field handed to `onChange`
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldView<'a> {
    value: &'a str,
    rules: &'a str,
    is_valid: bool,
}

fn fields_to_js(fields: &Fields) -> Result<JsValue, serde_wasm_bindgen::Error> {
    let view: BTreeMap<&str, FieldView<'_>> = fields
        .iter()
        .map(|(name, field)| {
            (
                name.as_str(),
                FieldView {
                    value: field.value(),
                    rules: field.rule_pattern(),
                    is_valid: field.is_valid(),
                },
            )
        })
        .collect();

    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    view.serialize(&serializer)
}

pub(crate) fn to_js_error(err: FormError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

/// Form controller for DOM elements
///
/// # Example (JavaScript)
/// ```javascript
/// const form = new Form();
/// form.setRules({ qty: "^[0-9]+$", email: fieldRule("email-address") });
/// form.bind(document.querySelector("form"));
/// form.onChange = (isValid, fields) => {
///     submit.disabled = !isValid;
/// };
/// ```
#[wasm_bindgen(js_name = Form)]
pub struct JsForm {
    form: Form,
    on_change: Rc<RefCell<Option<Function>>>,
}

impl JsForm {
    fn wrap(form: Form) -> Self {
        let on_change: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));

        let callback = Rc::clone(&on_change);
        form.set_on_change(move |is_valid, fields| {
            let Some(function) = callback.borrow().clone() else {
                return;
            };

            let fields = match fields_to_js(fields) {
                Ok(fields) => fields,
                Err(err) => {
                    web_sys::console::error_2(
                        &JsValue::from_str("Failed to convert fields"),
                        &JsValue::from(err),
                    );
                    return;
                }
            };

            if let Err(err) = function.call2(&JsValue::NULL, &JsValue::from_bool(is_valid), &fields)
            {
                web_sys::console::error_2(&JsValue::from_str("onChange callback threw"), &err);
            }
        });

        Self { form, on_change }
    }
}

#[wasm_bindgen(js_class = Form)]
impl JsForm {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JsForm {
        Self::wrap(Form::new())
    }

    /// Build a form from a configuration object, e.g.
    /// `{ fieldAttribute: "data-field", rules: { qty: { preset: "positive-integer" } } }`
    #[wasm_bindgen(js_name = withConfig)]
    pub fn with_config(config: JsValue) -> Result<JsForm, JsValue> {
        let config: FormConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse form config: {}", e)))?;
        Form::with_config(config)
            .map(Self::wrap)
            .map_err(to_js_error)
    }

    /// Register every descendant of `element` carrying the field attribute.
    /// Throws when `element` is missing or has no children to traverse.
    ///
    /// Event listeners are never removed. Rebinding the same element adds
    /// another listener per field; only the newest one is acted upon.
    pub fn bind(&self, element: JsValue) -> Result<(), JsValue> {
        let container = DomContainer::from_js(element);
        self.form
            .bind(container.as_ref().map(|c| c as &dyn Container))
            .map_err(to_js_error)
    }

    /// `{ fieldName: "pattern" }`
    #[wasm_bindgen(js_name = setRules)]
    pub fn set_rules(&self, rules: JsValue) -> Result<(), JsValue> {
        let rules: BTreeMap<String, String> = serde_wasm_bindgen::from_value(rules)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse rules: {}", e)))?;
        self.form.set_rules(rules).map_err(to_js_error)
    }

    /// `{ fieldName: "preset-name" }`
    #[wasm_bindgen(js_name = setRulePresets)]
    pub fn set_rule_presets(&self, presets: JsValue) -> Result<(), JsValue> {
        let presets: BTreeMap<String, String> = serde_wasm_bindgen::from_value(presets)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse presets: {}", e)))?;
        self.form.set_rule_presets(presets).map_err(to_js_error)
    }

    /// `{ fieldName: element }`
    #[wasm_bindgen(js_name = setFields)]
    pub fn set_fields(&self, fields: JsValue) -> Result<(), JsValue> {
        let fields: js_sys::Object = fields
            .dyn_into()
            .map_err(|_| JsValue::from_str("setFields expects an object of elements"))?;

        let mut elements = Vec::new();
        for entry in js_sys::Object::entries(&fields).iter() {
            let pair: js_sys::Array = entry.unchecked_into();
            let name = pair
                .get(0)
                .as_string()
                .ok_or_else(|| JsValue::from_str("field names must be strings"))?;
            let element: Element = pair.get(1).dyn_into().map_err(|_| {
                JsValue::from_str(&format!("field `{}` is not an element", name))
            })?;
            elements.push((name, DomElement::new(element)));
        }

        self.form.set_fields(elements).map_err(to_js_error)
    }

    #[wasm_bindgen(getter = onChange)]
    pub fn on_change(&self) -> Option<Function> {
        self.on_change.borrow().clone()
    }

    #[wasm_bindgen(setter = onChange)]
    pub fn set_on_change(&self, callback: Option<Function>) {
        *self.on_change.borrow_mut() = callback;
    }

    #[wasm_bindgen(getter = isValid)]
    pub fn is_valid(&self) -> bool {
        self.form.is_valid()
    }

    #[wasm_bindgen(getter)]
    pub fn fields(&self) -> Result<JsValue, JsValue> {
        Ok(fields_to_js(&self.form.fields())?)
    }

    /// Push a value for `name` without a DOM event
    #[wasm_bindgen(js_name = handleChange)]
    pub fn handle_change(&self, name: &str, value: &str) -> Result<bool, JsValue> {
        self.form.handle_change(name, value).map_err(to_js_error)
    }
}

impl Default for JsForm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn document() -> web_sys::Document {
        web_sys::window().unwrap().document().unwrap()
    }

    fn named_input(name: &str) -> web_sys::HtmlInputElement {
        let input: web_sys::HtmlInputElement = document()
            .create_element("input")
            .unwrap()
            .dyn_into()
            .unwrap();
        input.set_attribute("name", name).unwrap();
        input
    }

    #[wasm_bindgen_test]
    fn test_bind_rejects_missing_and_plain_objects() {
        let form = JsForm::new();
        assert!(form.bind(JsValue::UNDEFINED).is_err());
        assert!(form.bind(js_sys::Object::new().into()).is_err());
    }

    #[wasm_bindgen_test]
    fn test_on_change_receives_plain_objects() {
        let root = document().create_element("form").unwrap();
        let qty = named_input("qty");
        root.append_child(&qty).unwrap();

        let form = JsForm::new();
        let rules = js_sys::Object::new();
        js_sys::Reflect::set(&rules, &"qty".into(), &r"^\d+$".into()).unwrap();
        form.set_rules(rules.into()).unwrap();
        form.bind(root.into()).unwrap();

        let seen = js_sys::Array::new();
        let sink = seen.clone();
        let callback = Closure::wrap(Box::new(move |is_valid: JsValue, fields: JsValue| {
            sink.push(&is_valid);
            sink.push(&fields);
        }) as Box<dyn FnMut(JsValue, JsValue)>);
        form.set_on_change(Some(callback.as_ref().unchecked_ref::<Function>().clone()));
        callback.forget();

        qty.set_value("-5");
        qty.dispatch_event(&web_sys::Event::new("input").unwrap())
            .unwrap();

        assert_eq!(seen.length(), 2);
        assert_eq!(seen.get(0).as_bool(), Some(false));
        let field = js_sys::Reflect::get(&seen.get(1), &"qty".into()).unwrap();
        let is_valid = js_sys::Reflect::get(&field, &"isValid".into()).unwrap();
        assert_eq!(is_valid.as_bool(), Some(false));
        let value = js_sys::Reflect::get(&field, &"value".into()).unwrap();
        assert_eq!(value.as_string().as_deref(), Some("-5"));
    }

    #[wasm_bindgen_test]
    fn test_set_fields_by_name() {
        let form = JsForm::new();
        let fields = js_sys::Object::new();
        let amount = named_input("ignored");
        amount.set_value("10");
        js_sys::Reflect::set(&fields, &"amount".into(), &amount).unwrap();

        form.set_fields(fields.into()).unwrap();
        assert!(form.is_valid());
        assert_eq!(form.handle_change("amount", " ").unwrap(), false);
    }
}
