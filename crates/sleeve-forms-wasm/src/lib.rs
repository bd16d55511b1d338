//! Sleeve Forms WASM
//!
//! Browser binding for sleeve-forms. Exposes a `Form` class that binds to a
//! DOM element, tracks every descendant carrying a `name` attribute, and
//! calls `onChange(isValid, fields)` whenever one of them changes.

use std::collections::BTreeMap;

use sleeve_forms::RuleRegistry;
use wasm_bindgen::prelude::*;

pub mod dom;
pub mod form;

pub use dom::{DomContainer, DomElement};
pub use form::JsForm;

/// Set panic hook for better error messages in the browser
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Pattern of a built-in rule, e.g. `fieldRule("email-address")`
#[wasm_bindgen(js_name = fieldRule)]
pub fn field_rule(name: &str) -> Option<String> {
    RuleRegistry::builtin().pattern(name).map(str::to_string)
}

/// Every built-in rule as `{ name: pattern }`
#[wasm_bindgen(js_name = fieldRules)]
pub fn field_rules() -> Result<JsValue, JsValue> {
    let registry = RuleRegistry::builtin();
    let rules: BTreeMap<&str, &str> = registry.iter().collect();
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    Ok(serde::Serialize::serialize(&rules, &serializer)?)
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_field_rule_lookup() {
        assert_eq!(field_rule("positive-integer").as_deref(), Some(r"^\d+$"));
        assert!(field_rule("email-address").is_some());
        assert!(field_rule("unknown").is_none());
    }

    #[wasm_bindgen_test]
    fn test_field_rules_object() {
        let rules = field_rules().unwrap();
        let pattern = js_sys::Reflect::get(&rules, &"not-empty".into()).unwrap();
        assert_eq!(pattern.as_string().as_deref(), Some(".+"));
    }
}
